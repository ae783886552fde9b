mod cache;
mod client;
mod error;
mod page;
mod transport;

pub use cache::{CacheEntry, QueryCache, QueryStatus};
pub use client::{FetchOutcome, QueryClient};
pub use error::FetchError;
pub use page::{PageMeta, RecordPage};
pub use transport::{HttpTransport, Transport, TransportResponse};
