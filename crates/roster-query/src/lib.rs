mod key;
mod params;
mod sort;
mod state;

pub use key::QueryKey;
pub use params::{ExtraParams, ParamsError};
pub use sort::{Sort, SortDirection, SortSpec};
pub use state::{DEFAULT_LIMIT, PageState};
