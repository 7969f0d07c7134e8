pub mod app_state;
pub mod form;
pub mod host;
pub mod status;
pub mod table;

pub use app_state::{AppState, Banner, BannerKind};
pub use form::{FormErrors, HostForm};
pub use host::{HostField, HostFields, HostRecord};
pub use status::{ProbeDetails, Reachability, StatusEntry, StatusTracker};
pub use table::{SortColumn, TablePage, TableState};
