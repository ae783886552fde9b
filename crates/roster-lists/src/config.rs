use std::time::Duration;

use roster_query::{DEFAULT_LIMIT, ExtraParams, SortSpec};

pub const DEFAULT_PAGE_SIZE: u32 = DEFAULT_LIMIT;
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Declarative description of one list screen's data source.
#[derive(Debug, Clone)]
pub struct ListConfig {
    pub endpoint: String,
    /// Page sizes the screen may switch between; `set_limit` rejects
    /// anything else.
    pub page_sizes: Vec<u32>,
    pub default_limit: u32,
    pub default_sort: SortSpec,
    pub search_debounce: Duration,
    /// Static endpoint-specific parameters, part of every request and
    /// of the cache identity.
    pub params: ExtraParams,
}

impl ListConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            page_sizes: vec![DEFAULT_PAGE_SIZE],
            default_limit: DEFAULT_PAGE_SIZE,
            default_sort: SortSpec::new(),
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            params: ExtraParams::new(),
        }
    }
}
