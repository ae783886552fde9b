use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// One page of a remote collection, exactly as the server shapes it.
///
/// Records are untyped JSON documents in server order; a new response
/// supersedes a page, it never mutates one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPage {
    pub records: Vec<serde_json::Value>,
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total_records: u64,
    pub total_pages: u32,
}

impl RecordPage {
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            meta: PageMeta {
                total_records: 0,
                total_pages: 0,
            },
        }
    }

    /// Typed view over the untyped records.
    pub fn records_as<T: DeserializeOwned>(&self) -> Result<Vec<T>, serde_json::Error> {
        self.records
            .iter()
            .cloned()
            .map(serde_json::from_value)
            .collect()
    }
}
