use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::store::DocumentStore;
use crate::types::{Accumulate, FoundDocument, QueryHit};

/// In-memory [`DocumentStore`] backed by a two-level map
/// (collection → key → document) behind a single async `RwLock`.
///
/// Used by the test suites and for embedding the engine without external
/// infrastructure. Holding the write lock for the whole of
/// [`atomic_accumulate`](DocumentStore::atomic_accumulate) makes that
/// operation one indivisible read-modify-write.
#[derive(Debug)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, HashMap<String, Value>>>,
    max_edits: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            max_edits: 2,
        }
    }

    /// Cap the edit distance tolerated by fuzzy text queries.
    ///
    /// The effective tolerance per query token follows the usual ladder
    /// (exact under 3 chars, one edit up to 5, two beyond) and never exceeds
    /// this cap. `with_fuzziness(0)` turns fuzzy queries into exact token
    /// matches.
    #[must_use]
    pub fn with_fuzziness(mut self, max_edits: usize) -> Self {
        self.max_edits = max_edits;
        self
    }

    /// Number of documents currently held in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, HashMap::len)
    }

    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }

    fn tolerance(&self, token_len: usize) -> usize {
        let auto = match token_len {
            0..=2 => 0,
            3..=5 => 1,
            _ => 2,
        };
        auto.min(self.max_edits)
    }

    /// Best pairwise score between the query tokens and the document name.
    fn name_relevance(&self, name: &str, query_tokens: &[String]) -> f64 {
        let name_tokens = tokenize(name);
        let mut best = 0.0_f64;
        for query in query_tokens {
            let tolerance = self.tolerance(query.chars().count());
            for candidate in &name_tokens {
                let distance = edit_distance_capped(query, candidate, tolerance);
                if distance > tolerance {
                    continue;
                }
                let longest = query.chars().count().max(candidate.chars().count()).max(1);
                let score = 1.0 - distance as f64 / longest as f64;
                best = best.max(score);
            }
        }
        best
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Levenshtein distance capped at `max`: returns `max + 1` as soon as the
/// distance provably exceeds the cap, so long inputs bail out early.
fn edit_distance_capped(a: &str, b: &str, max: usize) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > max {
        return max + 1;
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost)
                .min(prev[j + 1] + 1)
                .min(curr[j] + 1);
            row_min = row_min.min(curr[j + 1]);
        }
        if row_min > max {
            return max + 1;
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Whether `document` satisfies `path = expected`, with dotted-path
/// traversal. Arrays are transparent: any element may satisfy the rest of
/// the path.
fn path_matches(document: &Value, path: &str, expected: &Value) -> bool {
    let segments: Vec<&str> = path.split('.').collect();
    segment_matches(document, &segments, expected)
}

fn segment_matches(current: &Value, segments: &[&str], expected: &Value) -> bool {
    if let Value::Array(items) = current {
        return items
            .iter()
            .any(|item| segment_matches(item, segments, expected));
    }
    match segments.split_first() {
        None => current == expected,
        Some((head, rest)) => match current {
            Value::Object(map) => map
                .get(*head)
                .is_some_and(|value| segment_matches(value, rest, expected)),
            _ => false,
        },
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn upsert(&self, collection: &str, key: &str, document: Value) -> Result<String> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), document);
        log::debug!("stored {collection}/{key}");
        Ok(key.to_string())
    }

    async fn insert_if_absent(
        &self,
        collection: &str,
        key: &str,
        document: Value,
    ) -> Result<bool> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(key) {
            return Ok(false);
        }
        docs.insert(key.to_string(), document);
        log::debug!("created {collection}/{key}");
        Ok(true)
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<bool> {
        let mut collections = self.collections.write().await;
        let removed = collections
            .get_mut(collection)
            .is_some_and(|docs| docs.remove(key).is_some());
        if removed {
            log::debug!("deleted {collection}/{key}");
        }
        Ok(removed)
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(key))
            .cloned())
    }

    async fn bulk_get(&self, collections: &[&str], keys: &[String]) -> Result<Vec<FoundDocument>> {
        let guard = self.collections.read().await;
        let mut found = Vec::new();
        for key in keys {
            for collection in collections {
                if let Some(document) = guard.get(*collection).and_then(|docs| docs.get(key)) {
                    found.push(FoundDocument {
                        collection: (*collection).to_string(),
                        key: key.clone(),
                        document: document.clone(),
                    });
                }
            }
        }
        Ok(found)
    }

    async fn find_by_fields(
        &self,
        collection: &str,
        fields: &[(String, Value)],
    ) -> Result<Vec<QueryHit>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        let mut hits: Vec<QueryHit> = docs
            .iter()
            .filter(|(_, document)| {
                fields
                    .iter()
                    .all(|(path, expected)| path_matches(document, path, expected))
            })
            .map(|(key, document)| QueryHit {
                key: key.clone(),
                document: document.clone(),
                relevance: 1.0,
            })
            .collect();
        hits.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(hits)
    }

    async fn find_by_fuzzy_text(&self, collection: &str, text: &str) -> Result<Vec<QueryHit>> {
        let query_tokens = tokenize(text);
        if query_tokens.is_empty() {
            return Ok(Vec::new());
        }
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        let mut hits = Vec::new();
        for (key, document) in docs {
            let Some(name) = document.get("name").and_then(Value::as_str) else {
                continue;
            };
            let relevance = self.name_relevance(name, &query_tokens);
            if relevance > 0.0 {
                hits.push(QueryHit {
                    key: key.clone(),
                    document: document.clone(),
                    relevance,
                });
            }
        }
        hits.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.key.cmp(&b.key))
        });
        Ok(hits)
    }

    async fn atomic_accumulate(&self, op: Accumulate) -> Result<()> {
        let mut collections = self.collections.write().await;
        let document = collections
            .get_mut(&op.collection)
            .and_then(|docs| docs.get_mut(&op.key))
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", op.collection, op.key)))?;
        let array = document
            .get_mut(&op.array_field)
            .and_then(Value::as_array_mut)
            .ok_or_else(|| StoreError::MalformedDocument {
                collection: op.collection.clone(),
                key: op.key.clone(),
                reason: format!("field '{}' is not an array", op.array_field),
            })?;
        for element in array.iter_mut() {
            if element.get(&op.match_field).and_then(Value::as_str) != Some(op.match_value.as_str())
            {
                continue;
            }
            let current = element
                .get(&op.increment_field)
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            if let Some(fields) = element.as_object_mut() {
                fields.insert(op.increment_field.clone(), Value::from(current + op.amount));
            }
            return Ok(());
        }
        array.push(op.template);
        Ok(())
    }
}
