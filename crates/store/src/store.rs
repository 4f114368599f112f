use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::{Accumulate, FoundDocument, QueryHit};

/// Protocol-agnostic async document store.
///
/// Implementations own durability, consistency and transport-level retry;
/// callers treat every operation as a single round trip. Keys are
/// caller-chosen strings, documents are JSON values. Lookup misses are
/// `None` / `false` / empty results, never errors.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create or fully replace the document stored under `key`.
    /// Returns the key the document now lives under.
    async fn upsert(&self, collection: &str, key: &str, document: Value) -> Result<String>;

    /// Create the document under `key` only when nothing is stored there
    /// yet; an existing document is left untouched. Returns whether it was
    /// created. The check and the write are one indivisible step.
    async fn insert_if_absent(&self, collection: &str, key: &str, document: Value)
        -> Result<bool>;

    /// Delete the document under `key`. Returns whether it existed.
    async fn delete(&self, collection: &str, key: &str) -> Result<bool>;

    /// Fetch a single document.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>>;

    /// Fetch many keys across `collections` in one round trip.
    async fn bulk_get(&self, collections: &[&str], keys: &[String]) -> Result<Vec<FoundDocument>>;

    /// All documents whose fields equal every `(path, value)` pair.
    ///
    /// Dotted paths traverse nested objects; when a path segment lands on an
    /// array, any element may satisfy the remainder of the path.
    async fn find_by_fields(
        &self,
        collection: &str,
        fields: &[(String, Value)],
    ) -> Result<Vec<QueryHit>>;

    /// Documents whose `name` field fuzzily matches a token of `text`.
    ///
    /// Tolerance is implementation configuration, not a per-call parameter.
    async fn find_by_fuzzy_text(&self, collection: &str, text: &str) -> Result<Vec<QueryHit>>;

    /// One indivisible accumulate-or-append step, see [`Accumulate`].
    /// Fails with [`StoreError::NotFound`] when the target document does not
    /// exist.
    ///
    /// [`StoreError::NotFound`]: crate::StoreError::NotFound
    async fn atomic_accumulate(&self, op: Accumulate) -> Result<()>;
}
