use std::sync::{Arc, Mutex};

use roster_client::{FetchError, FetchOutcome, QueryClient, RecordPage};
use roster_query::{PageState, QueryKey, SortSpec};
use tokio::sync::Notify;

use crate::config::ListConfig;
use crate::debounce::Debouncer;

/// Everything a table renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct ListSnapshot {
    pub data: Option<RecordPage>,
    /// A fetch is outstanding and there is nothing to show yet: the
    /// very first load of a brand-new query.
    pub is_loading: bool,
    /// A fetch is outstanding, whatever is on screen.
    pub is_fetching: bool,
    pub error: Option<Arc<FetchError>>,
    pub page: u32,
    pub limit: u32,
    pub sort: String,
    pub search: String,
}

struct ListInner {
    state: PageState,
    generation: u64,
    fetching: u32,
    data: Option<RecordPage>,
    error: Option<Arc<FetchError>>,
}

/// One screen's paginated view over a remote collection.
///
/// Created on mount, dropped on unmount. Clones share state: a clone
/// given to a driver loop and one kept by the screen observe each
/// other's updates. Renderers read `snapshot()` and call the setters;
/// they never talk to the network.
///
/// Setters bump a generation counter. A `load` commits its outcome
/// only if the generation still matches the one captured at dispatch,
/// so a response for a superseded page/sort/search can never
/// overwrite a newer view, no matter how late it arrives. While a new
/// key is in flight the previous `data` stays visible; the table gets
/// a placeholder instead of a blank.
#[derive(Clone)]
pub struct ListHandle {
    client: Arc<QueryClient>,
    config: Arc<ListConfig>,
    inner: Arc<Mutex<ListInner>>,
    debouncer: Arc<Debouncer>,
    notify: Arc<Notify>,
}

impl ListHandle {
    pub fn new(client: Arc<QueryClient>, config: ListConfig) -> Self {
        let state = PageState::with_defaults(config.default_limit, config.default_sort.clone());
        let debouncer = Debouncer::new(config.search_debounce);
        Self {
            client,
            config: Arc::new(config),
            inner: Arc::new(Mutex::new(ListInner {
                state,
                generation: 0,
                fetching: 0,
                data: None,
                error: None,
            })),
            debouncer: Arc::new(debouncer),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    /// The key the next `load` will request.
    pub fn key(&self) -> QueryKey {
        let inner = self.inner.lock().unwrap();
        QueryKey::build(&self.config.endpoint, &inner.state, &self.config.params)
    }

    pub fn snapshot(&self) -> ListSnapshot {
        let inner = self.inner.lock().unwrap();
        ListSnapshot {
            data: inner.data.clone(),
            is_loading: inner.fetching > 0 && inner.data.is_none(),
            is_fetching: inner.fetching > 0,
            error: inner.error.clone(),
            page: inner.state.page(),
            limit: inner.state.limit(),
            sort: inner.state.sort().to_string(),
            search: inner.state.search().to_string(),
        }
    }

    pub fn set_page(&self, page: u32) {
        self.mutate(|state| state.set_page(page));
    }

    /// Applies only when `limit` is one of the configured page sizes;
    /// returns whether it applied. Deliberately leaves the page alone.
    pub fn set_limit(&self, limit: u32) -> bool {
        let applied = {
            let mut inner = self.inner.lock().unwrap();
            let applied = inner.state.set_limit(limit, &self.config.page_sizes);
            if applied {
                inner.generation += 1;
            }
            applied
        };
        if applied {
            self.notify.notify_waiters();
        } else {
            tracing::debug!(limit, "rejected page size outside the configured set");
        }
        applied
    }

    pub fn set_sort(&self, sort: SortSpec) {
        self.mutate(|state| state.set_sort(sort));
    }

    /// Header-click path: toggles the column through the
    /// ascending/descending cycle and resets to page 1.
    pub fn set_sort_column(&self, column: &str) {
        self.mutate(|state| state.toggle_sort(column));
    }

    /// Commits immediately. The debounced path is `search`.
    pub fn set_search(&self, term: &str) {
        self.mutate(|state| state.set_search(term));
    }

    /// Debounced search: keystrokes coalesce, and once typing pauses
    /// the term commits and the page resets to 1.
    pub fn search(&self, term: impl Into<String>) {
        let term = term.into();
        let handle = self.clone();
        self.debouncer.submit(move || handle.set_search(&term));
    }

    /// Resolves when a setter commits a state change; driver loops use
    /// this to race a pending `load` against user input.
    pub async fn changed(&self) {
        self.notify.notified().await;
    }

    /// Fetch the current key and commit the outcome.
    pub async fn load(&self) -> Result<(), Arc<FetchError>> {
        let (key, generation) = self.begin_fetch();
        let _guard = FetchingGuard {
            inner: self.inner.clone(),
        };
        let outcome = self.client.fetch(&key).await;
        self.commit(generation, outcome)
    }

    /// Manual refresh after a mutation elsewhere: invalidates every
    /// cached variant of this endpoint, then reloads the current key.
    pub async fn refetch(&self) -> Result<(), Arc<FetchError>> {
        let (key, generation) = self.begin_fetch();
        let _guard = FetchingGuard {
            inner: self.inner.clone(),
        };
        let outcome = self.client.refetch(&key).await;
        self.commit(generation, outcome)
    }

    fn mutate(&self, f: impl FnOnce(&mut PageState)) {
        {
            let mut inner = self.inner.lock().unwrap();
            f(&mut inner.state);
            inner.generation += 1;
        }
        self.notify.notify_waiters();
    }

    fn begin_fetch(&self) -> (QueryKey, u64) {
        let mut inner = self.inner.lock().unwrap();
        inner.fetching += 1;
        let key = QueryKey::build(&self.config.endpoint, &inner.state, &self.config.params);
        (key, inner.generation)
    }

    fn commit(&self, generation: u64, outcome: FetchOutcome) -> Result<(), Arc<FetchError>> {
        let mut inner = self.inner.lock().unwrap();
        if inner.generation != generation {
            tracing::debug!(endpoint = %self.config.endpoint, "discarding stale result");
            return Ok(());
        }
        match outcome {
            Ok(page) => {
                inner.data = Some(page);
                inner.error = None;
                Ok(())
            }
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => {
                inner.error = Some(e.clone());
                Err(e)
            }
        }
    }
}

/// Balances `begin_fetch` even when the load future is dropped
/// mid-await.
struct FetchingGuard {
    inner: Arc<Mutex<ListInner>>,
}

impl Drop for FetchingGuard {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fetching = inner.fetching.saturating_sub(1);
    }
}
