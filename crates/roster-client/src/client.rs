use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use roster_query::QueryKey;
use serde::Deserialize;
use tokio::sync::watch;

use crate::cache::QueryCache;
use crate::error::FetchError;
use crate::page::RecordPage;
use crate::transport::Transport;

pub type FetchOutcome = Result<RecordPage, Arc<FetchError>>;

struct Inflight {
    done: watch::Receiver<Option<FetchOutcome>>,
    waiters: Arc<AtomicUsize>,
    cancel: Arc<watch::Sender<bool>>,
}

/// Session-wide fetch coordinator: one network call per distinct query
/// key, shared by every screen that asks for it.
///
/// A fetch runs as a detached task racing the transport against a
/// cancel signal. Every waiter holds a guard on the in-flight entry;
/// when the last waiter drops its future (unmount, or a superseding
/// key change), the signal trips and the HTTP call itself is dropped.
/// A cancelled fetch never writes to the cache and never records an
/// error.
pub struct QueryClient {
    transport: Arc<dyn Transport>,
    cache: QueryCache,
    inflight: Mutex<HashMap<QueryKey, Inflight>>,
}

impl QueryClient {
    pub fn new(transport: Arc<dyn Transport>) -> Arc<Self> {
        Arc::new(Self {
            transport,
            cache: QueryCache::new(),
            inflight: Mutex::new(HashMap::new()),
        })
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Fetch the page for `key`, serving from cache when a successful
    /// result is already stored.
    pub async fn fetch(self: &Arc<Self>, key: &QueryKey) -> FetchOutcome {
        if let Some(page) = self.cache.success(key) {
            tracing::debug!(endpoint = %key.endpoint, page = key.page, "cache hit");
            return Ok(page);
        }
        self.execute(key).await
    }

    /// Fetch bypassing the cached-result fast path.
    pub async fn force_fetch(self: &Arc<Self>, key: &QueryKey) -> FetchOutcome {
        self.execute(key).await
    }

    /// Manual refresh: drop every cached variant of the key's endpoint
    /// (any page, sort, search or parameter set), then fetch fresh.
    pub async fn refetch(self: &Arc<Self>, key: &QueryKey) -> FetchOutcome {
        let removed = self.cache.invalidate_endpoint(&key.endpoint);
        tracing::debug!(endpoint = %key.endpoint, removed, "invalidated endpoint family");
        self.execute(key).await
    }

    async fn execute(self: &Arc<Self>, key: &QueryKey) -> FetchOutcome {
        let (mut done, _guard) = self.join_or_spawn(key);
        loop {
            let settled = done.borrow_and_update().as_ref().cloned();
            if let Some(outcome) = settled {
                return outcome;
            }
            if done.changed().await.is_err() {
                // Fetch task gone without reporting; treat as cancelled.
                return Err(Arc::new(FetchError::Cancelled));
            }
        }
    }

    fn join_or_spawn(
        self: &Arc<Self>,
        key: &QueryKey,
    ) -> (watch::Receiver<Option<FetchOutcome>>, WaiterGuard) {
        let mut inflight = self.inflight.lock().unwrap();
        if let Some(entry) = inflight.get(key) {
            entry.waiters.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(endpoint = %key.endpoint, page = key.page, "joined in-flight request");
            let guard = WaiterGuard {
                waiters: entry.waiters.clone(),
                cancel: entry.cancel.clone(),
            };
            return (entry.done.clone(), guard);
        }

        let (done_tx, done_rx) = watch::channel(None);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let cancel_tx = Arc::new(cancel_tx);
        let waiters = Arc::new(AtomicUsize::new(1));
        inflight.insert(
            key.clone(),
            Inflight {
                done: done_rx.clone(),
                waiters: waiters.clone(),
                cancel: cancel_tx.clone(),
            },
        );
        drop(inflight);

        self.cache.mark_fetching(key);
        tracing::debug!(endpoint = %key.endpoint, page = key.page, "spawning fetch");

        let client = self.clone();
        let task_key = key.clone();
        tokio::spawn(async move {
            client.run_fetch(task_key, done_tx, cancel_rx).await;
        });

        let guard = WaiterGuard {
            waiters,
            cancel: cancel_tx,
        };
        (done_rx, guard)
    }

    async fn run_fetch(
        self: Arc<Self>,
        key: QueryKey,
        done: watch::Sender<Option<FetchOutcome>>,
        mut cancel: watch::Receiver<bool>,
    ) {
        let outcome: FetchOutcome = tokio::select! {
            _ = cancel.wait_for(|cancelled| *cancelled) => Err(Arc::new(FetchError::Cancelled)),
            result = Self::request(self.transport.clone(), key.clone()) => result.map_err(Arc::new),
        };

        self.inflight.lock().unwrap().remove(&key);

        match &outcome {
            Ok(page) => self.cache.store_success(&key, page.clone()),
            Err(e) if e.is_cancelled() => {
                self.cache.revert_fetch(&key);
                tracing::debug!(endpoint = %key.endpoint, page = key.page, "fetch cancelled");
            }
            Err(e) => self.cache.store_error(&key, e.clone()),
        }

        let _ = done.send(Some(outcome));
    }

    async fn request(
        transport: Arc<dyn Transport>,
        key: QueryKey,
    ) -> Result<RecordPage, FetchError> {
        let response = transport.get(&key.request_path()).await?;
        if response.status.is_success() {
            let page = serde_json::from_slice(&response.body)?;
            Ok(page)
        } else {
            let message = serde_json::from_slice::<ServerMessage>(&response.body)
                .ok()
                .map(|m| m.message);
            Err(FetchError::Server {
                status: response.status,
                message,
            })
        }
    }
}

#[derive(Deserialize)]
struct ServerMessage {
    message: String,
}

/// Releases interest in an in-flight request; the last interested
/// waiter to drop trips the cancel signal.
struct WaiterGuard {
    waiters: Arc<AtomicUsize>,
    cancel: Arc<watch::Sender<bool>>,
}

impl Drop for WaiterGuard {
    fn drop(&mut self) {
        if self.waiters.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.cancel.send(true);
        }
    }
}
