use url::form_urlencoded;

use crate::params::ExtraParams;
use crate::state::PageState;

/// Identity of one list request.
///
/// Two keys are equal iff every component is equal; equality is what
/// the fetch coordinator uses for cache lookup and in-flight
/// deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub endpoint: String,
    pub limit: u32,
    pub page: u32,
    pub sort: String,
    pub search: String,
    pub params: String,
}

impl QueryKey {
    pub fn build(endpoint: &str, state: &PageState, params: &ExtraParams) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            limit: state.limit(),
            page: state.page(),
            sort: state.sort().to_string(),
            search: state.search().to_string(),
            params: params.canonical(),
        }
    }

    /// `limit`, `page`, `sort` and `search` first, in that order, then
    /// the extra parameter pairs. Deterministic for equal keys.
    pub fn query_string(&self) -> String {
        let mut ser = form_urlencoded::Serializer::new(String::new());
        ser.append_pair("limit", &self.limit.to_string());
        ser.append_pair("page", &self.page.to_string());
        ser.append_pair("sort", &self.sort);
        ser.append_pair("search", &self.search);
        for pair in self.params.split('&').filter(|p| !p.is_empty()) {
            if let Some((k, v)) = pair.split_once('=') {
                ser.append_pair(k, v);
            }
        }
        ser.finish()
    }

    pub fn request_path(&self) -> String {
        format!("{}?{}", self.endpoint, self.query_string())
    }
}
