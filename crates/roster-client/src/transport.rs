use async_trait::async_trait;
use http::StatusCode;

use crate::error::FetchError;

/// Response from the wire before any decoding: status plus raw body.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// Trait for issuing list requests against an upstream API.
///
/// Consumers implement this to connect the query client to their HTTP
/// stack; tests implement it with scripted fakes. Only transport-level
/// failures are errors here; an HTTP error status comes back as a
/// normal response and is classified by the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path_and_query: &str) -> Result<TransportResponse, FetchError>;
}

/// Production transport over a shared `reqwest` client.
///
/// No retries and no timeouts beyond the transport defaults; a hung
/// request is resolved by cancellation, not by a clock.
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path_and_query: &str) -> Result<TransportResponse, FetchError> {
        let url = format!(
            "{}/{}",
            self.base_url,
            path_and_query.trim_start_matches('/')
        );
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        Ok(TransportResponse { status, body })
    }
}
