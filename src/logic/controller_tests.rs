use super::*;
use crate::model::{BannerKind, HostFields, HostRecord, StatusTracker};
use crate::service::{ApiCall, AuthContext, MemoryApi, NetworkToolsApi, auth};
use std::sync::{Arc, Mutex};

const ALL_CAPABILITIES: [&str; 2] = ["edit_network_hosts", "wake_on_lan"];

fn srv1() -> HostFields {
    HostFields::new("srv1", "10.0.0.5", "00:11:22:33:44:55", "9")
}

fn controller_with(api: &Arc<MemoryApi>, auth: Authorization) -> HostListController {
    let handle = Handle::current();
    let store = HostStore::new(api.clone(), handle.clone());
    let tracker: SharedTracker = Arc::new(Mutex::new(StatusTracker::new()));
    let state: SharedState = Arc::new(Mutex::new(AppState::default()));
    HostListController::new(store, tracker, state, auth, Config::default(), handle)
}

fn controller(api: &Arc<MemoryApi>) -> HostListController {
    let ctx = AuthContext::new(ALL_CAPABILITIES, Duration::from_secs(300));
    controller_with(api, auth::fixed(ctx))
}

async fn loaded(api: &Arc<MemoryApi>) -> HostListController {
    let controller = controller(api);
    controller.store().refresh().await.unwrap();
    controller
}

fn banner(controller: &HostListController) -> Option<(BannerKind, String)> {
    lock(controller.state())
        .banner
        .as_ref()
        .map(|b| (b.kind, b.message.clone()))
}

fn form_open(controller: &HostListController) -> bool {
    lock(controller.state()).form.is_some()
}

#[tokio::test]
async fn test_create_saves_once_and_refreshes() {
    let api = Arc::new(MemoryApi::new());
    let mut controller = controller(&api);

    controller.open_create_form();
    for field in HostField::ALL {
        controller.set_field(field, srv1().get(field));
    }
    controller.submit_form().unwrap();
    controller.wait_idle().await;

    let creates: Vec<ApiCall> = api
        .calls()
        .into_iter()
        .filter(|c| matches!(c, ApiCall::Create(_)))
        .collect();
    assert_eq!(creates, vec![ApiCall::Create(srv1())]);
    assert_eq!(api.list_calls(), 1);
    assert!(!form_open(&controller));
    assert_eq!(
        banner(&controller),
        Some((BannerKind::Success, tr!("Host successfully created")))
    );
    assert_eq!(controller.store().cached().len(), 1);
}

#[tokio::test]
async fn test_edit_updates_in_place_without_refetch() {
    let api = Arc::new(MemoryApi::new().with_hosts(vec![HostRecord::new("k1", srv1())]));
    let mut controller = loaded(&api).await;
    let lists_before = api.list_calls();

    assert!(controller.open_edit_form("k1"));
    controller.set_field(HostField::IpAddress, "10.0.0.6");
    controller.submit_form().unwrap();
    controller.wait_idle().await;

    let expected = HostFields::new("srv1", "10.0.0.6", "00:11:22:33:44:55", "9");
    let updates: Vec<ApiCall> = api
        .calls()
        .into_iter()
        .filter(|c| matches!(c, ApiCall::Update(..)))
        .collect();
    assert_eq!(updates, vec![ApiCall::Update("k1".to_string(), expected)]);
    assert_eq!(api.list_calls(), lists_before);
    assert_eq!(controller.store().get("k1").unwrap().ip_address(), "10.0.0.6");
    assert!(!form_open(&controller));
    assert_eq!(
        banner(&controller),
        Some((BannerKind::Success, tr!("Host successfully saved")))
    );
}

#[tokio::test]
async fn test_invalid_form_stays_open_with_errors() {
    let api = Arc::new(MemoryApi::new());
    let mut controller = controller(&api);

    controller.open_create_form();
    controller.set_field(HostField::MacAddress, "00:11:22:33:44");
    let err = controller.submit_form().unwrap_err();
    assert!(matches!(err, Error::Validation(2)));

    let view = lock(controller.state());
    let form = view.form.as_ref().unwrap();
    assert!(form.errors.name.is_some());
    assert!(form.errors.mac_address.is_some());
    assert!(form.errors.ip_address.is_none());
    assert!(!form.submitting);
    drop(view);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_blur_validates_single_field() {
    let api = Arc::new(MemoryApi::new());
    let controller = controller(&api);

    controller.open_create_form();
    controller.set_field(HostField::IpAddress, "10.0.0.256");
    controller.blur_field(HostField::IpAddress);
    {
        let view = lock(controller.state());
        let errors = &view.form.as_ref().unwrap().errors;
        assert!(errors.ip_address.is_some());
        assert_eq!(errors.count(), 1);
    }

    controller.set_field(HostField::IpAddress, "10.0.0.250");
    controller.blur_field(HostField::IpAddress);
    assert!(lock(controller.state()).form.as_ref().unwrap().errors.is_empty());
}

#[tokio::test]
async fn test_edit_of_unknown_host_shows_failure() {
    let api = Arc::new(MemoryApi::new());
    let controller = controller(&api);

    assert!(!controller.open_edit_form("missing"));
    assert!(!form_open(&controller));
    assert_eq!(
        banner(&controller),
        Some((BannerKind::Failure, tr!("Unable to find the host to edit")))
    );
}

#[tokio::test]
async fn test_update_after_delete_is_tolerated() {
    let api = Arc::new(MemoryApi::new().with_hosts(vec![HostRecord::new("k1", srv1())]));
    let mut controller = loaded(&api).await;

    assert!(controller.open_edit_form("k1"));
    // Someone else removed the host in the meantime
    api.delete_host("k1").await.unwrap();
    controller.set_field(HostField::Name, "srv2");
    controller.submit_form().unwrap();
    controller.wait_idle().await;

    assert!(!form_open(&controller));
    assert_eq!(
        banner(&controller),
        Some((BannerKind::Failure, tr!("Unable to find the host to edit")))
    );
    assert!(controller.store().cached().is_empty());
}

#[tokio::test]
async fn test_late_save_leaves_newer_form_alone() {
    let api = Arc::new(MemoryApi::new().with_hosts(vec![HostRecord::new("k1", srv1())]));
    let mut controller = loaded(&api).await;

    controller.open_create_form();
    let fields = HostFields::new("srv2", "10.0.0.6", "00:11:22:33:44:66", "");
    for field in HostField::ALL {
        controller.set_field(field, fields.get(field));
    }
    controller.submit_form().unwrap();
    // Cancel the create while it is in flight and start editing another host
    controller.close_form();
    assert!(controller.open_edit_form("k1"));
    controller.wait_idle().await;

    assert!(api.calls().contains(&ApiCall::Create(fields)));
    let view = lock(controller.state());
    let form = view.form.as_ref().unwrap();
    assert_eq!(form.key.as_deref(), Some("k1"));
    assert!(!form.submitting);
    assert_eq!(form.fields.name, "srv1");
}

#[tokio::test]
async fn test_delete_needs_confirmation() {
    let api = Arc::new(MemoryApi::new().with_hosts(vec![HostRecord::new("k1", srv1())]));
    let mut controller = loaded(&api).await;

    assert!(!controller.request_delete("missing"));
    assert!(controller.request_delete("k1"));
    controller.cancel_delete();
    controller.confirm_delete().unwrap();
    controller.wait_idle().await;
    assert!(!api.calls().iter().any(|c| matches!(c, ApiCall::Delete(_))));

    assert!(controller.request_delete("k1"));
    assert_eq!(lock(controller.state()).pending_delete.as_deref(), Some("k1"));
    controller.confirm_delete().unwrap();
    controller.wait_idle().await;

    assert!(api.calls().contains(&ApiCall::Delete("k1".to_string())));
    assert!(lock(controller.state()).pending_delete.is_none());
    assert!(controller.store().cached().is_empty());
    assert_eq!(
        banner(&controller),
        Some((BannerKind::Success, tr!("Host successfully deleted")))
    );
}

#[tokio::test]
async fn test_wake_reports_sent() {
    let api = Arc::new(MemoryApi::new().with_hosts(vec![HostRecord::new("k1", srv1())]));
    let mut controller = loaded(&api).await;

    controller.wake("k1").unwrap();
    controller.wait_idle().await;

    assert!(api.calls().contains(&ApiCall::Wake("srv1".to_string())));
    assert_eq!(
        banner(&controller),
        Some((BannerKind::Success, tr!("Wake-on-lan request sent to host")))
    );
    // No immediate re-check; the poller takes care of it
    assert!(api.pinged().is_empty());
}

#[tokio::test]
async fn test_wake_forbidden_changes_nothing_else() {
    let api = Arc::new(MemoryApi::new().with_hosts(vec![HostRecord::new("k1", srv1())]));
    let mut controller = loaded(&api).await;
    api.set_wake_status(Some(403));
    let hosts_before = controller.store().cached();

    controller.wake("k1").unwrap();
    controller.wait_idle().await;

    assert_eq!(
        banner(&controller),
        Some((
            BannerKind::Failure,
            tr!("Inadequate permissions to send a wake-on-lan request")
        ))
    );
    assert!(lock(controller.tracker()).is_empty());
    assert_eq!(controller.store().cached(), hosts_before);
}

#[tokio::test]
async fn test_wake_failure_reports_error() {
    let api = Arc::new(MemoryApi::new().with_hosts(vec![HostRecord::new("k1", srv1())]));
    let mut controller = loaded(&api).await;
    api.set_wake_failure(Some("No MAC address"));

    controller.wake("k1").unwrap();
    controller.wait_idle().await;

    assert_eq!(
        banner(&controller),
        Some((
            BannerKind::Failure,
            tr!("Error when attempting to send a wake-on-lan request")
        ))
    );
}

#[tokio::test]
async fn test_actions_hidden_until_authorized() {
    let api = Arc::new(MemoryApi::new().with_hosts(vec![HostRecord::new("k1", srv1())]));
    let (_tx, rx) = tokio::sync::watch::channel(None);
    let mut controller = controller_with(&api, rx);
    controller.store().refresh().await.unwrap();

    assert_eq!(controller.affordances(), Affordances::default());
    assert!(controller.wake("k1").unwrap_err().is_permission_denied());
    assert!(controller.request_delete("k1"));
    assert!(controller.confirm_delete().unwrap_err().is_permission_denied());
    assert!(api.calls().iter().all(|c| matches!(c, ApiCall::List)));
}

#[tokio::test]
async fn test_wake_only_user() {
    let api = Arc::new(MemoryApi::new());
    let ctx = AuthContext::new(["wake_on_lan"], Duration::from_secs(300));
    let controller = controller_with(&api, auth::fixed(ctx));

    assert_eq!(
        controller.affordances(),
        Affordances {
            manage_hosts: false,
            wake: true
        }
    );
}

#[tokio::test]
async fn test_missing_collection_hides_management() {
    let api = Arc::new(MemoryApi::new());
    api.set_list_status(Some(404));
    let controller = loaded(&api).await;

    let affordances = controller.affordances();
    assert!(!affordances.manage_hosts);
    assert!(affordances.wake);
}

#[tokio::test]
async fn test_same_filter_does_not_redraw() {
    let api = Arc::new(MemoryApi::new().with_hosts(vec![
        HostRecord::new("k1", srv1()),
        HostRecord::new("k2", HostFields::new("db", "10.0.0.7", "", "")),
    ]));
    let controller = loaded(&api).await;

    assert!(controller.apply_filter("srv"));
    assert!(!controller.apply_filter("srv"));
    assert_eq!(lock(controller.state()).table.redraws, 1);

    let page = controller.page();
    assert_eq!(page.matching, 1);
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn test_sweep_banner_clears_expired() {
    let api = Arc::new(MemoryApi::new());
    let controller = controller(&api);
    lock(controller.state()).show_success("done");

    assert!(!controller.sweep_banner(Instant::now()));
    assert!(controller.sweep_banner(Instant::now() + Duration::from_secs(6)));
    assert!(banner(&controller).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_activate_loads_and_polls() {
    let api = Arc::new(MemoryApi::new().with_hosts(vec![HostRecord::new("k1", srv1())]));
    let mut controller = controller(&api);
    let mut revisions = controller.store().subscribe();

    controller.activate();
    controller.activate();
    assert!(controller.is_active());
    revisions.changed().await.unwrap();

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(api.list_calls(), 1);
    assert_eq!(api.pinged(), vec!["10.0.0.5"]);
    assert_eq!(
        lock(controller.tracker()).reachability("10.0.0.5"),
        crate::model::Reachability::Online
    );
}
