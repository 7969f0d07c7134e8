pub mod controller;
pub mod poller;
pub mod store;
pub mod validation;

use crate::model::AppState;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use controller::{Affordances, HostListController};
pub use poller::{Poller, SharedTracker};
pub use store::{HostStore, WakeOutcome};

pub type SharedState = Arc<Mutex<AppState>>;

/// Locks `mutex`, recovering the data if a previous holder panicked.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
