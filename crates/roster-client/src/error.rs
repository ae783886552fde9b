use std::fmt;

use http::StatusCode;

#[derive(Debug)]
pub enum FetchError {
    /// No response at all: connection refused, DNS, timeout at the
    /// transport layer.
    Transport(reqwest::Error),
    /// HTTP error status; `message` carries the server-provided
    /// `{"message": ...}` body field when present.
    Server {
        status: StatusCode,
        message: Option<String>,
    },
    /// The body did not match the expected page shape.
    Decode(serde_json::Error),
    /// The request was aborted before it resolved. Not a failure of
    /// the endpoint.
    Cancelled,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(e) => write!(f, "transport error: {e}"),
            FetchError::Server {
                status,
                message: Some(m),
            } => write!(f, "server error ({status}): {m}"),
            FetchError::Server { status, .. } => write!(f, "server error ({status})"),
            FetchError::Decode(e) => write!(f, "decode error: {e}"),
            FetchError::Cancelled => write!(f, "request cancelled"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transport(e)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Decode(e)
    }
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }

    /// Message fit for direct display: the server-provided one when
    /// the body carried it, otherwise a generic fallback per failure
    /// class.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Server {
                message: Some(m), ..
            } => m.clone(),
            FetchError::Server { .. } => "The server could not complete the request.".to_string(),
            FetchError::Transport(_) => "Could not reach the server.".to_string(),
            FetchError::Decode(_) => "Received an unexpected response.".to_string(),
            FetchError::Cancelled => "Request cancelled.".to_string(),
        }
    }
}
