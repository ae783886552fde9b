use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use roster_client::{FetchError, QueryClient};
use roster_query::{ExtraParams, PageState, QueryKey, SortSpec};

use crate::config::DEFAULT_PAGE_SIZE;

/// Configuration for an append-only feed (notifications, activity).
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub endpoint: String,
    pub limit: u32,
    /// Record field used for de-duplication across pages.
    pub id_field: String,
    pub params: ExtraParams,
}

impl FeedConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            limit: DEFAULT_PAGE_SIZE,
            id_field: "id".to_string(),
            params: ExtraParams::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub records: Vec<serde_json::Value>,
    pub is_fetching: bool,
    pub error: Option<Arc<FetchError>>,
    pub has_more: bool,
}

struct FeedInner {
    next_page: u32,
    total_pages: Option<u32>,
    records: Vec<serde_json::Value>,
    seen: HashSet<String>,
    fetching: bool,
    error: Option<Arc<FetchError>>,
}

/// Append-only sibling of `ListHandle`: pages are fetched in
/// increasing order starting at 1, and each page's records are
/// appended after dropping any record whose id was already seen, so
/// an entry shifting between pages server-side never shows twice.
/// First-seen order is preserved.
#[derive(Clone)]
pub struct FeedHandle {
    client: Arc<QueryClient>,
    config: Arc<FeedConfig>,
    inner: Arc<Mutex<FeedInner>>,
}

impl FeedHandle {
    pub fn new(client: Arc<QueryClient>, config: FeedConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
            inner: Arc::new(Mutex::new(FeedInner {
                next_page: 1,
                total_pages: None,
                records: Vec::new(),
                seen: HashSet::new(),
                fetching: false,
                error: None,
            })),
        }
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let inner = self.inner.lock().unwrap();
        FeedSnapshot {
            records: inner.records.clone(),
            is_fetching: inner.fetching,
            error: inner.error.clone(),
            has_more: Self::has_more(&inner),
        }
    }

    /// Fetch the next page and append its unseen records. Returns
    /// whether another page remains.
    pub async fn load_more(&self) -> Result<bool, Arc<FetchError>> {
        let page = {
            let mut inner = self.inner.lock().unwrap();
            if !Self::has_more(&inner) {
                return Ok(false);
            }
            if inner.fetching {
                // One sequential cursor; a second caller just waits
                // for the next scroll tick.
                return Ok(true);
            }
            inner.fetching = true;
            inner.next_page
        };

        let outcome = self.client.fetch(&self.page_key(page)).await;

        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        inner.fetching = false;
        match outcome {
            Ok(result) => {
                for record in result.records {
                    match record.get(self.config.id_field.as_str()) {
                        Some(id) => {
                            if inner.seen.insert(id.to_string()) {
                                inner.records.push(record);
                            }
                        }
                        // Without the id field there is nothing to
                        // de-duplicate on; keep the record.
                        None => inner.records.push(record),
                    }
                }
                inner.total_pages = Some(result.meta.total_pages);
                inner.next_page = page + 1;
                inner.error = None;
                Ok(page < result.meta.total_pages)
            }
            Err(e) if e.is_cancelled() => Ok(Self::has_more(inner)),
            Err(e) => {
                inner.error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Pull-to-refresh: drop every cached page for this feed and start
    /// over from page 1.
    pub async fn refresh(&self) -> Result<(), Arc<FetchError>> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.next_page = 1;
            inner.total_pages = None;
            inner.records.clear();
            inner.seen.clear();
            inner.error = None;
        }
        self.client.cache().invalidate_endpoint(&self.config.endpoint);
        self.load_more().await.map(|_| ())
    }

    fn page_key(&self, page: u32) -> QueryKey {
        let mut state = PageState::with_defaults(self.config.limit, SortSpec::new());
        state.set_page(page);
        QueryKey::build(&self.config.endpoint, &state, &self.config.params)
    }

    fn has_more(inner: &FeedInner) -> bool {
        match inner.total_pages {
            None => true,
            Some(total) => inner.next_page <= total,
        }
    }
}
