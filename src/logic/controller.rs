use super::poller::{Poller, SharedTracker};
use super::store::{HostStore, WakeOutcome};
use super::validation::{validate_field, validate_host_form};
use super::{SharedState, lock};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{AppState, HostField, HostForm, SortColumn, TablePage};
use crate::service::{Action, Authorization};
use std::sync::MutexGuard;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tr::tr;
use tracing::{debug, warn};

/// Which host actions the current user may see.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Affordances {
    pub manage_hosts: bool,
    pub wake: bool,
}

/// Backs the host list view: owns the store, the status tracker and the view
/// state, and turns user actions into requests.
///
/// Methods are called from the UI thread and never block on the network; the
/// requests run on the runtime behind `handle` and report back through the
/// shared view state.
pub struct HostListController {
    store: HostStore,
    tracker: SharedTracker,
    state: SharedState,
    auth: Authorization,
    config: Config,
    handle: Handle,
    /// Request completions that have not finished yet
    pending: Vec<JoinHandle<()>>,
    /// Poller and banner sweep, aborted on drop
    background: Vec<JoinHandle<()>>,
}

impl HostListController {
    pub fn new(
        store: HostStore,
        tracker: SharedTracker,
        state: SharedState,
        auth: Authorization,
        config: Config,
        handle: Handle,
    ) -> Self {
        Self {
            store,
            tracker,
            state,
            auth,
            config,
            handle,
            pending: Vec::new(),
            background: Vec::new(),
        }
    }

    pub fn store(&self) -> &HostStore {
        &self.store
    }

    pub fn tracker(&self) -> &SharedTracker {
        &self.tracker
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn view(&self) -> MutexGuard<'_, AppState> {
        lock(&self.state)
    }

    fn track(&mut self, task: JoinHandle<()>) {
        self.pending.retain(|t| !t.is_finished());
        self.pending.push(task);
    }

    pub fn is_active(&self) -> bool {
        !self.background.is_empty()
    }

    /// Loads the hosts and starts the poller and the banner sweep.
    pub fn activate(&mut self) {
        if self.is_active() {
            return;
        }
        let refresh = self.store.spawn_refresh();
        self.track(refresh);

        let poller = Poller::new(
            self.store.api().clone(),
            self.tracker.clone(),
            self.config.stale_after(),
            self.handle.clone(),
        );
        self.background
            .push(self.handle.spawn(poller.run(self.store.clone(), self.config.poll_interval())));

        let state = self.state.clone();
        let display_for = self.config.banner_display();
        self.background.push(self.handle.spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(250));
            loop {
                interval.tick().await;
                lock(&state).sweep_banner(Instant::now(), display_for);
            }
        }));
        debug!("host list activated");
    }

    /// Waits for every outstanding request to complete.
    pub async fn wait_idle(&mut self) {
        while let Some(task) = self.pending.pop() {
            if let Err(e) = task.await {
                warn!("request task failed: {}", e);
            }
        }
    }

    pub fn refresh(&mut self) {
        let task = self.store.spawn_refresh();
        self.track(task);
    }

    // Authorization

    pub fn allows(&self, action: Action) -> bool {
        self.auth
            .borrow()
            .as_ref()
            .is_some_and(|ctx| ctx.allows_at(action, &self.config.capabilities, Instant::now()))
    }

    /// Actions stay hidden until the capability lookup has completed.
    pub fn affordances(&self) -> Affordances {
        Affordances {
            manage_hosts: self.allows(Action::ManageHosts) && self.store.is_available(),
            wake: self.allows(Action::Wake),
        }
    }

    fn require(&self, action: Action) -> Result<()> {
        if self.allows(action) {
            return Ok(());
        }
        let message = match action {
            Action::ManageHosts => tr!("You do not have permission to modify hosts"),
            Action::Wake => tr!("Inadequate permissions to send a wake-on-lan request"),
        };
        self.view().show_failure(message.clone());
        Err(Error::PermissionDenied(message))
    }

    // Table

    pub fn page(&self) -> TablePage {
        let hosts = self.store.cached();
        let tracker = lock(&self.tracker);
        self.view().table.page_of(&hosts, &tracker)
    }

    /// Returns true when the table had to be redrawn.
    pub fn apply_filter(&self, text: &str) -> bool {
        self.view().table.apply_filter(text)
    }

    pub fn sort_by(&self, column: SortColumn) {
        self.view().table.sort_by(column);
    }

    pub fn next_page(&self) {
        let pages = self.page().pages;
        self.view().table.next_page(pages);
    }

    pub fn previous_page(&self) {
        self.view().table.previous_page();
    }

    pub fn sweep_banner(&self, now: Instant) -> bool {
        self.view().sweep_banner(now, self.config.banner_display())
    }

    // Create and edit

    pub fn open_create_form(&self) {
        self.view().form = Some(HostForm::blank());
    }

    pub fn open_edit_form(&self, key: &str) -> bool {
        match self.store.get(key) {
            Some(record) => {
                self.view().form = Some(HostForm::for_record(&record));
                true
            }
            None => {
                self.view().show_failure(tr!("Unable to find the host to edit"));
                false
            }
        }
    }

    pub fn close_form(&self) {
        self.view().form = None;
    }

    pub fn set_field(&self, field: HostField, value: &str) {
        if let Some(form) = self.view().form.as_mut() {
            *form.fields.get_mut(field) = value.to_string();
        }
    }

    /// Validates a single field when it loses focus.
    pub fn blur_field(&self, field: HostField) {
        if let Some(form) = self.view().form.as_mut() {
            let message = validate_field(field, form.fields.get(field));
            form.errors.set(field, message);
        }
    }

    /// Validates the form and saves it. New hosts are followed by a full
    /// refresh; edits update the cached record in place.
    pub fn submit_form(&mut self) -> Result<()> {
        let (key, fields) = {
            let mut view = self.view();
            let Some(form) = view.form.as_mut() else {
                return Ok(());
            };
            if form.submitting {
                return Ok(());
            }
            form.errors = validate_host_form(&form.fields);
            let failing = form.errors.count();
            if failing > 0 {
                return Err(Error::Validation(failing));
            }
            let key = if form.is_new() { None } else { form.key.clone() };
            (key, form.fields.clone())
        };
        self.require(Action::ManageHosts)?;

        let Some(id) = self.view().begin_submission() else {
            return Ok(());
        };
        let store = self.store.clone();
        let state = self.state.clone();

        // Completions only touch the form when it is still the one submitted;
        // it may have been cancelled and replaced in the meantime.
        let task = match key {
            None => self.handle.spawn(async move {
                match store.create(fields).await {
                    Ok(_) => {
                        {
                            let mut view = lock(&state);
                            view.close_form_for(id);
                            view.show_success(tr!("Host successfully created"));
                        }
                        if let Err(e) = store.refresh().await {
                            warn!("Unable to fetch the hosts: {}", e);
                        }
                    }
                    Err(e) => save_failed(&state, id, &e),
                }
            }),
            Some(key) => self.handle.spawn(async move {
                match store.update(&key, fields).await {
                    Ok(_) => {
                        let mut view = lock(&state);
                        view.close_form_for(id);
                        view.show_success(tr!("Host successfully saved"));
                    }
                    Err(e) if e.is_not_found() => {
                        {
                            let mut view = lock(&state);
                            view.close_form_for(id);
                            view.show_failure(tr!("Unable to find the host to edit"));
                        }
                        if let Err(e) = store.refresh().await {
                            warn!("Unable to fetch the hosts: {}", e);
                        }
                    }
                    Err(e) => save_failed(&state, id, &e),
                }
            }),
        };
        self.track(task);
        Ok(())
    }

    // Delete

    /// First step of a delete: remember which host to remove.
    pub fn request_delete(&self, key: &str) -> bool {
        if self.store.get(key).is_none() {
            return false;
        }
        self.view().pending_delete = Some(key.to_string());
        true
    }

    pub fn cancel_delete(&self) {
        self.view().pending_delete = None;
    }

    pub fn confirm_delete(&mut self) -> Result<()> {
        let Some(key) = self.view().pending_delete.clone() else {
            return Ok(());
        };
        self.view().pending_delete = None;
        self.require(Action::ManageHosts)?;

        let store = self.store.clone();
        let state = self.state.clone();
        let task = self.handle.spawn(async move {
            match store.remove(&key).await {
                Ok(()) => {
                    lock(&state).show_success(tr!("Host successfully deleted"));
                }
                Err(e) => {
                    warn!(key = %key, "unable to delete host: {}", e);
                    lock(&state).show_failure(format!("{}: {}", tr!("Unable to delete the host"), e));
                }
            }
            if let Err(e) = store.refresh().await {
                warn!("Unable to fetch the hosts: {}", e);
            }
        });
        self.track(task);
        Ok(())
    }

    // Wake

    /// Sends a wake packet to the host with `key`. Does not wait for the host
    /// to come up; the poller picks that up on its own schedule.
    pub fn wake(&mut self, key: &str) -> Result<()> {
        let Some(host) = self.store.get(key) else {
            self.view().show_failure(tr!("Unable to find the host to wake"));
            return Err(Error::not_found("host", key));
        };
        self.require(Action::Wake)?;

        let store = self.store.clone();
        let state = self.state.clone();
        let task = self.handle.spawn(async move {
            let outcome = store.wake(host.name()).await;
            let mut view = lock(&state);
            match outcome {
                WakeOutcome::Sent => view.show_success(tr!("Wake-on-lan request sent to host")),
                WakeOutcome::PermissionDenied => {
                    view.show_failure(tr!("Inadequate permissions to send a wake-on-lan request"))
                }
                WakeOutcome::Failed(_) => {
                    view.show_failure(tr!("Error when attempting to send a wake-on-lan request"))
                }
            }
        });
        self.track(task);
        Ok(())
    }
}

fn save_failed(state: &SharedState, id: u64, error: &Error) {
    warn!("unable to save host: {}", error);
    let mut view = lock(state);
    if let Some(form) = view.form_awaiting(id) {
        form.submitting = false;
    }
    view.show_failure(format!("{}: {}", tr!("Unable to save the host"), error));
}

impl Drop for HostListController {
    fn drop(&mut self) {
        for task in self.background.drain(..) {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
