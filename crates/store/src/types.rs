use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A document matched by a query, together with the relevance the store
/// assigned to the match. Exact-field queries report a relevance of 1.0;
/// fuzzy queries report a value in (0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryHit {
    pub key: String,
    pub document: Value,
    pub relevance: f64,
}

/// A document returned by a bulk fetch, tagged with the collection it was
/// found in. Keys that resolved nowhere simply produce no entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoundDocument {
    pub collection: String,
    pub key: String,
    pub document: Value,
}

/// One atomic accumulate-or-append step against an array field.
///
/// The store locates the element of `array_field` whose `match_field` equals
/// `match_value` and adds `amount` to its `increment_field`; when no element
/// matches, `template` is appended instead. The whole step is indivisible:
/// two concurrent accumulations against the same document must both land.
#[derive(Debug, Clone)]
pub struct Accumulate {
    pub collection: String,
    pub key: String,
    pub array_field: String,
    pub match_field: String,
    pub match_value: String,
    pub increment_field: String,
    pub amount: f64,
    pub template: Value,
}
