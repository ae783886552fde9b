mod config;
mod debounce;
mod feed;
mod handle;

pub use config::{DEFAULT_PAGE_SIZE, DEFAULT_SEARCH_DEBOUNCE, ListConfig};
pub use debounce::Debouncer;
pub use feed::{FeedConfig, FeedHandle, FeedSnapshot};
pub use handle::{ListHandle, ListSnapshot};
