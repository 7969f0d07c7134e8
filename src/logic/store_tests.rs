use super::*;
use crate::service::{ApiCall, MemoryApi, NetworkToolsApi};
use std::sync::Arc;

fn fields(name: &str, ip: &str) -> HostFields {
    HostFields::new(name, ip, "00:11:22:33:44:55", "9")
}

fn store_with(api: &Arc<MemoryApi>) -> HostStore {
    HostStore::new(api.clone(), Handle::current())
}

#[tokio::test]
async fn test_refresh_replaces_cache_and_notifies() {
    let api = Arc::new(MemoryApi::new().with_hosts(vec![HostRecord::new("k1", fields("srv1", "10.0.0.5"))]));
    let store = store_with(&api);
    let mut revisions = store.subscribe();

    assert!(store.cached().is_empty());
    assert!(store.refresh().await.unwrap());
    assert_eq!(store.cached().len(), 1);
    assert!(revisions.has_changed().unwrap());
    assert_eq!(*revisions.borrow_and_update(), 1);
    assert_eq!(store.get("k1").unwrap().name(), "srv1");
}

#[tokio::test]
async fn test_list_returns_cache_and_refreshes_in_background() {
    let api = Arc::new(MemoryApi::new().with_hosts(vec![HostRecord::new("k1", fields("srv1", "10.0.0.5"))]));
    let store = store_with(&api);
    let mut revisions = store.subscribe();

    assert!(store.list().is_empty());
    revisions.changed().await.unwrap();
    assert_eq!(store.list().len(), 1);
}

#[tokio::test]
async fn test_missing_collection_degrades_to_empty() {
    let api = Arc::new(MemoryApi::new().with_hosts(vec![HostRecord::new("k1", fields("srv1", "10.0.0.5"))]));
    let store = store_with(&api);
    store.refresh().await.unwrap();
    assert!(store.is_available());

    api.set_list_status(Some(404));
    assert!(store.refresh().await.unwrap());
    assert!(store.cached().is_empty());
    assert!(!store.is_available());
}

#[tokio::test]
async fn test_other_list_failures_keep_cache() {
    let api = Arc::new(MemoryApi::new().with_hosts(vec![HostRecord::new("k1", fields("srv1", "10.0.0.5"))]));
    let store = store_with(&api);
    store.refresh().await.unwrap();

    api.set_list_status(Some(500));
    assert!(store.refresh().await.is_err());
    assert_eq!(store.cached().len(), 1);
}

#[tokio::test]
async fn test_superseded_refresh_is_discarded() {
    let api = Arc::new(MemoryApi::new().with_hosts(vec![HostRecord::new("k1", fields("old", "10.0.0.1"))]));
    let store = store_with(&api);
    api.hold_lists();

    let first = tokio::spawn({
        let store = store.clone();
        async move { store.refresh().await }
    });
    // Let the first request read the old collection
    while api.list_calls() < 1 {
        tokio::task::yield_now().await;
    }

    api.create_host(&fields("new", "10.0.0.2")).await.unwrap();
    let second = tokio::spawn({
        let store = store.clone();
        async move { store.refresh().await }
    });
    while api.list_calls() < 2 {
        tokio::task::yield_now().await;
    }

    api.release_lists(2);
    assert!(!first.await.unwrap().unwrap());
    assert!(second.await.unwrap().unwrap());

    let names: Vec<String> = store.cached().iter().map(|h| h.name().to_string()).collect();
    assert_eq!(names, vec!["old", "new"]);
}

#[tokio::test]
async fn test_create_assigns_key() {
    let api = Arc::new(MemoryApi::new());
    let store = store_with(&api);

    let record = store.create(fields("srv1", "10.0.0.5")).await.unwrap();
    assert!(record.key().is_some());
    assert_eq!(api.calls(), vec![ApiCall::Create(fields("srv1", "10.0.0.5"))]);
    // The cache only changes on the next refresh
    assert!(store.cached().is_empty());
}

#[tokio::test]
async fn test_update_replaces_all_fields_in_place() {
    let api = Arc::new(MemoryApi::new().with_hosts(vec![HostRecord::new("k1", fields("srv1", "10.0.0.5"))]));
    let store = store_with(&api);
    store.refresh().await.unwrap();
    let mut revisions = store.subscribe();
    revisions.borrow_and_update();

    let updated = fields("srv1", "10.0.0.6");
    store.update("k1", updated.clone()).await.unwrap();

    assert_eq!(store.get("k1").unwrap().ip_address(), "10.0.0.6");
    assert!(revisions.has_changed().unwrap());
    assert_eq!(api.list_calls(), 1);
    assert!(api.calls().contains(&ApiCall::Update("k1".to_string(), updated)));
}

#[tokio::test]
async fn test_update_unknown_key_is_not_found() {
    let api = Arc::new(MemoryApi::new());
    let store = store_with(&api);

    let err = store.update("missing", fields("x", "")).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_remove_leaves_cache_until_refresh() {
    let api = Arc::new(MemoryApi::new().with_hosts(vec![HostRecord::new("k1", fields("srv1", "10.0.0.5"))]));
    let store = store_with(&api);
    store.refresh().await.unwrap();

    store.remove("k1").await.unwrap();
    assert_eq!(store.cached().len(), 1);
    store.refresh().await.unwrap();
    assert!(store.cached().is_empty());
}

#[tokio::test]
async fn test_wake_outcomes() {
    let api = Arc::new(MemoryApi::new().with_hosts(vec![HostRecord::new("k1", fields("srv1", "10.0.0.5"))]));
    let store = store_with(&api);

    assert_eq!(store.wake("srv1").await, WakeOutcome::Sent);

    api.set_wake_status(Some(403));
    assert_eq!(store.wake("srv1").await, WakeOutcome::PermissionDenied);

    api.set_wake_status(Some(500));
    assert!(matches!(store.wake("srv1").await, WakeOutcome::Failed(_)));

    api.set_wake_status(None);
    api.set_wake_failure(Some("No MAC address"));
    assert_eq!(store.wake("srv1").await, WakeOutcome::Failed("No MAC address".to_string()));

    let wakes = api.calls().iter().filter(|c| matches!(c, ApiCall::Wake(_))).count();
    assert_eq!(wakes, 4);
}
