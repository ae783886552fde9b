use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use roster_client::{FetchError, QueryClient, Transport, TransportResponse};
use roster_lists::{FeedConfig, FeedHandle};
use serde_json::{Value, json};

fn query_param(path: &str, name: &str) -> Option<String> {
    let query = path.split_once('?')?.1;
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == name).then(|| v.to_string())
    })
}

/// Serves scripted pages; page numbers beyond the script yield empty
/// pages, mimicking a feed that shrank between requests.
struct FeedTransport {
    pages: Vec<Vec<Value>>,
    calls: AtomicUsize,
}

impl FeedTransport {
    fn new(pages: Vec<Vec<Value>>) -> Self {
        Self {
            pages,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FeedTransport {
    async fn get(&self, path: &str) -> Result<TransportResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let page: usize = query_param(path, "page").unwrap().parse().unwrap();
        let records = self.pages.get(page - 1).cloned().unwrap_or_default();
        let total_records: u64 = self.pages.iter().map(|p| p.len() as u64).sum();
        let body = json!({
            "records": records,
            "meta": {
                "total_records": total_records,
                "total_pages": self.pages.len(),
            }
        });
        Ok(TransportResponse {
            status: StatusCode::OK,
            body: body.to_string().into_bytes(),
        })
    }
}

fn notification(id: u64) -> Value {
    json!({ "id": id, "subject": format!("notification-{id}") })
}

fn feed_config() -> FeedConfig {
    let mut config = FeedConfig::new("/notifications");
    config.limit = 3;
    config
}

fn ids(handle: &FeedHandle) -> Vec<u64> {
    handle
        .snapshot()
        .records
        .iter()
        .map(|r| r["id"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn pages_append_in_order() {
    let transport = Arc::new(FeedTransport::new(vec![
        vec![notification(1), notification(2), notification(3)],
        vec![notification(4), notification(5)],
    ]));
    let feed = FeedHandle::new(QueryClient::new(transport.clone()), feed_config());

    assert!(feed.load_more().await.unwrap(), "page 2 remains");
    assert_eq!(ids(&feed), vec![1, 2, 3]);

    assert!(!feed.load_more().await.unwrap(), "feed exhausted");
    assert_eq!(ids(&feed), vec![1, 2, 3, 4, 5]);
    assert!(!feed.snapshot().has_more);
}

#[tokio::test]
async fn overlapping_pages_are_deduplicated() {
    // Record 3 slid from page 1 to page 2 between the two requests.
    let transport = Arc::new(FeedTransport::new(vec![
        vec![notification(1), notification(2), notification(3)],
        vec![notification(3), notification(4), notification(5)],
    ]));
    let feed = FeedHandle::new(QueryClient::new(transport), feed_config());

    feed.load_more().await.unwrap();
    feed.load_more().await.unwrap();
    assert_eq!(ids(&feed), vec![1, 2, 3, 4, 5], "first-seen order, no duplicate");
}

#[tokio::test]
async fn exhausted_feed_stops_requesting() {
    let transport = Arc::new(FeedTransport::new(vec![vec![notification(1)]]));
    let feed = FeedHandle::new(QueryClient::new(transport.clone()), feed_config());

    assert!(!feed.load_more().await.unwrap());
    assert!(!feed.load_more().await.unwrap());
    assert!(!feed.load_more().await.unwrap());
    assert_eq!(transport.calls(), 1, "no request once exhausted");
}

#[tokio::test]
async fn refresh_restarts_from_page_one() {
    let transport = Arc::new(FeedTransport::new(vec![
        vec![notification(1), notification(2), notification(3)],
        vec![notification(4), notification(5)],
    ]));
    let feed = FeedHandle::new(QueryClient::new(transport.clone()), feed_config());

    feed.load_more().await.unwrap();
    feed.load_more().await.unwrap();
    assert_eq!(transport.calls(), 2);

    feed.refresh().await.unwrap();
    assert_eq!(ids(&feed), vec![1, 2, 3], "accumulated list was rebuilt");
    assert!(feed.snapshot().has_more);
    assert_eq!(transport.calls(), 3, "cached page 1 was invalidated, not reused");
}

#[tokio::test]
async fn records_without_the_id_field_are_kept() {
    let transport = Arc::new(FeedTransport::new(vec![vec![
        notification(1),
        json!({ "subject": "no id here" }),
        notification(2),
    ]]));
    let feed = FeedHandle::new(QueryClient::new(transport), feed_config());

    feed.load_more().await.unwrap();
    assert_eq!(feed.snapshot().records.len(), 3);
}

/// Always fails, to exercise the error path.
struct BrokenTransport {
    recovered: AtomicBool,
    calls: AtomicUsize,
}

#[async_trait]
impl Transport for BrokenTransport {
    async fn get(&self, path: &str) -> Result<TransportResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.recovered.load(Ordering::SeqCst) {
            let page: usize = query_param(path, "page").unwrap().parse().unwrap();
            let records = if page == 1 { vec![notification(1)] } else { vec![] };
            let body = json!({
                "records": records,
                "meta": { "total_records": 1, "total_pages": 1 }
            });
            Ok(TransportResponse {
                status: StatusCode::OK,
                body: body.to_string().into_bytes(),
            })
        } else {
            Ok(TransportResponse {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: json!({ "message": "feed offline" }).to_string().into_bytes(),
            })
        }
    }
}

#[tokio::test]
async fn failed_page_surfaces_error_and_allows_retry() {
    let transport = Arc::new(BrokenTransport {
        recovered: AtomicBool::new(false),
        calls: AtomicUsize::new(0),
    });
    let feed = FeedHandle::new(QueryClient::new(transport.clone()), feed_config());

    let err = feed.load_more().await.unwrap_err();
    assert_eq!(err.user_message(), "feed offline");
    assert_eq!(feed.snapshot().error.as_ref().unwrap().user_message(), "feed offline");
    assert!(feed.snapshot().records.is_empty());
    assert!(feed.snapshot().has_more, "a failure does not end the feed");

    transport.recovered.store(true, Ordering::SeqCst);
    assert!(!feed.load_more().await.unwrap());
    assert_eq!(ids(&feed), vec![1]);
    assert!(feed.snapshot().error.is_none());
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
}
