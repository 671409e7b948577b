use serde::{Deserialize, Serialize};

/// How a cached entry was obtained.
///
/// Point queries can expose a narrower field set than bulk listings, so
/// entries built from them may carry defaulted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryOrigin {
    /// Built from a page of a bulk collection listing.
    BulkLoad,
    /// Built from a single-item point query after a cache miss.
    PointQuery,
}

impl EntryOrigin {
    pub fn is_point_query(&self) -> bool {
        matches!(self, Self::PointQuery)
    }
}
