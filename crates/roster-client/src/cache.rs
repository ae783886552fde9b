use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use roster_query::QueryKey;

use crate::error::FetchError;
use crate::page::RecordPage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Fetching,
    Success,
    Error,
}

/// Stored outcome for one query key.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub result: Option<RecordPage>,
    pub status: QueryStatus,
    pub error: Option<Arc<FetchError>>,
}

impl CacheEntry {
    fn idle() -> Self {
        Self {
            result: None,
            status: QueryStatus::Idle,
            error: None,
        }
    }
}

/// Process-wide result cache, keyed by the full query identity.
///
/// Entries are only removed by explicit endpoint-family invalidation;
/// there is no size-based eviction. The lock is never held across an
/// await point.
pub struct QueryCache {
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The stored page for `key`, when its last fetch succeeded.
    pub fn success(&self, key: &QueryKey) -> Option<RecordPage> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .filter(|e| e.status == QueryStatus::Success)
            .and_then(|e| e.result.clone())
    }

    pub fn entry(&self, key: &QueryKey) -> Option<CacheEntry> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn status(&self, key: &QueryKey) -> QueryStatus {
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .map(|e| e.status)
            .unwrap_or(QueryStatus::Idle)
    }

    /// A fetch is starting; any previous result is retained.
    pub fn mark_fetching(&self, key: &QueryKey) {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.entry(key.clone()).or_insert_with(CacheEntry::idle);
        entry.status = QueryStatus::Fetching;
    }

    pub fn store_success(&self, key: &QueryKey, page: RecordPage) {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.entry(key.clone()).or_insert_with(CacheEntry::idle);
        entry.result = Some(page);
        entry.status = QueryStatus::Success;
        entry.error = None;
    }

    pub fn store_error(&self, key: &QueryKey, error: Arc<FetchError>) {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.entry(key.clone()).or_insert_with(CacheEntry::idle);
        entry.status = QueryStatus::Error;
        entry.error = Some(error);
    }

    /// A fetch was cancelled: back to where the entry was, never to
    /// `Error`, never touching the stored result.
    pub fn revert_fetch(&self, key: &QueryKey) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get_mut(key) {
            if entry.status == QueryStatus::Fetching {
                entry.status = if entry.result.is_some() {
                    QueryStatus::Success
                } else {
                    QueryStatus::Idle
                };
            }
        }
    }

    /// Remove every entry for `endpoint`, regardless of page, sort,
    /// search or parameters. Returns how many were dropped.
    pub fn invalidate_endpoint(&self, endpoint: &str) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|key, _| key.endpoint != endpoint);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}
