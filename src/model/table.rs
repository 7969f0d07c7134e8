use super::host::HostRecord;
use super::status::{Reachability, StatusTracker};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::net::Ipv4Addr;

pub const DEFAULT_PAGE_SIZE: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortColumn {
    Name,
    IpAddress,
    MacAddress,
    Status,
}

/// Filter, sort and pagination state of the host table.
///
/// Everything here is derived: the visible rows can always be rebuilt from the
/// host list and the filter text. The state is persisted between sessions so
/// the operator gets the same view back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableState {
    /// Last filter that was applied to the table
    #[serde(default)]
    applied_filter: Option<String>,
    #[serde(default = "default_sort_column")]
    pub sort_column: SortColumn,
    #[serde(default = "default_true")]
    pub ascending: bool,
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Number of times the visible rows had to be recomputed
    #[serde(skip)]
    pub redraws: u64,
}

fn default_sort_column() -> SortColumn {
    SortColumn::IpAddress
}
fn default_true() -> bool {
    true
}
fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for TableState {
    fn default() -> Self {
        Self {
            applied_filter: None,
            sort_column: default_sort_column(),
            ascending: true,
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            redraws: 0,
        }
    }
}

/// One page of rows ready for rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TablePage {
    pub rows: Vec<HostRecord>,
    /// Rows matching the filter, across all pages
    pub matching: usize,
    pub total: usize,
    pub page: usize,
    pub pages: usize,
}

impl TableState {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    pub fn filter_text(&self) -> &str {
        self.applied_filter.as_deref().unwrap_or("")
    }

    /// Applies a free-text filter. Returns `false` without touching the table
    /// when `text` equals the filter already applied.
    pub fn apply_filter(&mut self, text: &str) -> bool {
        if self.applied_filter.as_deref() == Some(text) {
            return false;
        }
        self.applied_filter = Some(text.to_string());
        self.page = 0;
        self.redraws += 1;
        true
    }

    /// Sorts by `column`; selecting the current column again flips the order.
    pub fn sort_by(&mut self, column: SortColumn) {
        if self.sort_column == column {
            self.ascending = !self.ascending;
        } else {
            self.sort_column = column;
            self.ascending = true;
        }
        self.redraws += 1;
    }

    pub fn next_page(&mut self, pages: usize) {
        if self.page + 1 < pages {
            self.page += 1;
            self.redraws += 1;
        }
    }

    pub fn previous_page(&mut self) {
        if self.page > 0 {
            self.page -= 1;
            self.redraws += 1;
        }
    }

    /// Only the name and IP address columns are searchable.
    pub fn matches(&self, host: &HostRecord) -> bool {
        let needle = self.filter_text().trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        host.name().to_lowercase().contains(&needle)
            || host.ip_address().to_lowercase().contains(&needle)
    }

    pub fn page_of(&self, hosts: &[HostRecord], tracker: &StatusTracker) -> TablePage {
        let mut rows: Vec<HostRecord> = hosts.iter().filter(|h| self.matches(h)).cloned().collect();
        rows.sort_by(|a, b| {
            let ord = compare(self.sort_column, a, b, tracker);
            if self.ascending { ord } else { ord.reverse() }
        });

        let matching = rows.len();
        let page_size = self.page_size.max(1);
        let pages = matching.div_ceil(page_size).max(1);
        let page = self.page.min(pages - 1);
        let rows = rows
            .into_iter()
            .skip(page * page_size)
            .take(page_size)
            .collect();

        TablePage {
            rows,
            matching,
            total: hosts.len(),
            page,
            pages,
        }
    }
}

fn compare(column: SortColumn, a: &HostRecord, b: &HostRecord, tracker: &StatusTracker) -> Ordering {
    match column {
        SortColumn::Name => a.name().to_lowercase().cmp(&b.name().to_lowercase()),
        SortColumn::IpAddress => compare_addresses(a.ip_address(), b.ip_address()),
        SortColumn::MacAddress => a.mac_address().to_lowercase().cmp(&b.mac_address().to_lowercase()),
        SortColumn::Status => status_rank(tracker.reachability(a.ip_address()))
            .cmp(&status_rank(tracker.reachability(b.ip_address()))),
    }
}

// Numeric order for dotted quads, text order otherwise; quads first.
fn compare_addresses(a: &str, b: &str) -> Ordering {
    match (a.parse::<Ipv4Addr>(), b.parse::<Ipv4Addr>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn status_rank(r: Reachability) -> u8 {
    match r {
        Reachability::Online => 0,
        Reachability::Offline => 1,
        Reachability::Unknown => 2,
    }
}
