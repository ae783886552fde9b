use serde::{Deserialize, Serialize};

use crate::sort::SortSpec;

pub const DEFAULT_LIMIT: u32 = 10;

/// The authoritative client-side request descriptor for one list
/// screen: page size, 1-based page index, sort and search term.
///
/// The page-reset invariant lives here rather than in the callers:
/// changing the search term or the sort always puts the view back on
/// page 1, so a new filter can never leave the screen on a page that
/// no longer exists. Changing the page size deliberately does not
/// touch the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    limit: u32,
    page: u32,
    sort: SortSpec,
    search: String,
}

impl Default for PageState {
    fn default() -> Self {
        Self::new()
    }
}

impl PageState {
    pub fn new() -> Self {
        Self::with_defaults(DEFAULT_LIMIT, SortSpec::new())
    }

    pub fn with_defaults(limit: u32, sort: SortSpec) -> Self {
        Self {
            limit: limit.max(1),
            page: 1,
            sort,
            search: String::new(),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// No upper bound: an out-of-range page is tolerated and simply
    /// yields a short or empty page from the server.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Applies only when `limit` is in the caller-declared allowed
    /// set; returns whether it applied.
    pub fn set_limit(&mut self, limit: u32, allowed: &[u32]) -> bool {
        if allowed.contains(&limit) {
            self.limit = limit;
            true
        } else {
            false
        }
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.page = 1;
    }

    pub fn set_sort(&mut self, sort: SortSpec) {
        self.sort = sort;
        self.page = 1;
    }

    pub fn toggle_sort(&mut self, column: &str) {
        self.sort.toggle(column);
        self.page = 1;
    }
}
