use super::form::HostForm;
use super::table::TableState;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Failure,
}

/// Transient message shown above the host table.
#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
    pub shown_at: Instant,
}

impl Banner {
    pub fn is_expired(&self, now: Instant, display_for: Duration) -> bool {
        now.saturating_duration_since(self.shown_at) >= display_for
    }
}

/// View state of the host list, shared between the UI thread and request
/// completions.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AppState {
    pub table: TableState,
    #[serde(skip)]
    pub form: Option<HostForm>,
    /// Key of the host awaiting delete confirmation
    #[serde(skip)]
    pub pending_delete: Option<String>,
    #[serde(skip)]
    pub banner: Option<Banner>,
    /// Last save id handed out, see [`HostForm::submission`]
    #[serde(skip)]
    pub last_submission: u64,
}

impl AppState {
    /// A success message replaces any failure message and vice versa.
    pub fn show_success(&mut self, message: impl Into<String>) {
        self.show(BannerKind::Success, message.into());
    }

    pub fn show_failure(&mut self, message: impl Into<String>) {
        self.show(BannerKind::Failure, message.into());
    }

    fn show(&mut self, kind: BannerKind, message: String) {
        self.banner = Some(Banner {
            kind,
            message,
            shown_at: Instant::now(),
        });
    }

    /// Marks the open form as submitted and returns the id of the save.
    pub fn begin_submission(&mut self) -> Option<u64> {
        let form = self.form.as_mut()?;
        self.last_submission += 1;
        form.submitting = true;
        form.submission = Some(self.last_submission);
        Some(self.last_submission)
    }

    /// The form waiting for save `id`, if it is still open.
    pub fn form_awaiting(&mut self, id: u64) -> Option<&mut HostForm> {
        self.form.as_mut().filter(|f| f.awaits(id))
    }

    /// Closes the form only if it is the one that started save `id`.
    pub fn close_form_for(&mut self, id: u64) {
        if self.form_awaiting(id).is_some() {
            self.form = None;
        }
    }

    /// Drops the banner once it has been visible for `display_for`.
    pub fn sweep_banner(&mut self, now: Instant, display_for: Duration) -> bool {
        if self
            .banner
            .as_ref()
            .is_some_and(|b| b.is_expired(now, display_for))
        {
            self.banner = None;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_replaces_previous() {
        let mut state = AppState::default();
        state.show_failure("boom");
        state.show_success("ok");
        let banner = state.banner.as_ref().unwrap();
        assert_eq!(banner.kind, BannerKind::Success);
        assert_eq!(banner.message, "ok");
    }

    #[test]
    fn test_sweep_banner_after_display_time() {
        let mut state = AppState::default();
        state.show_success("Host successfully created");
        let shown = state.banner.as_ref().unwrap().shown_at;
        let display = Duration::from_millis(5000);

        assert!(!state.sweep_banner(shown + Duration::from_millis(4999), display));
        assert!(state.banner.is_some());
        assert!(state.sweep_banner(shown + Duration::from_millis(5000), display));
        assert!(state.banner.is_none());
        assert!(!state.sweep_banner(shown + Duration::from_secs(60), display));
    }

    #[test]
    fn test_submission_ids_target_one_form() {
        let mut state = AppState::default();
        assert_eq!(state.begin_submission(), None);

        state.form = Some(HostForm::blank());
        let first = state.begin_submission().unwrap();
        state.form = Some(HostForm::blank());
        let second = state.begin_submission().unwrap();
        assert_ne!(first, second);

        state.close_form_for(first);
        assert!(state.form.is_some());
        state.close_form_for(second);
        assert!(state.form.is_none());
    }

    #[test]
    fn test_only_table_state_is_persisted() {
        let mut state = AppState::default();
        state.table.apply_filter("srv");
        state.pending_delete = Some("k1".to_string());
        state.show_success("saved");

        let json = serde_json::to_string(&state).unwrap();
        let restored: AppState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.table.filter_text(), "srv");
        assert!(restored.pending_delete.is_none());
        assert!(restored.banner.is_none());
    }
}
