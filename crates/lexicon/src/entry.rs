use std::collections::BTreeMap;

use intent_catalog::{content_identity, CapabilityNode, Identity, CAPABILITY_COLLECTION};
use intent_store::{Accumulate, DocumentStore};
use serde_json::{json, Value};

use crate::error::{LexiconError, Result};

/// Collection holding term documents, keyed by identity. The wire shape is
/// `{"name": <term>, "usages": [{"node": <identity>, "weight": <number>}]}`.
pub const TERM_COLLECTION: &str = "terms";

/// One indexed term and the accumulated weight of every capability node it
/// has been associated with.
///
/// The usage map is a cache of the stored state, keyed by node identity.
/// Weights are sums: associating the same node twice adds the weights up,
/// both in the store and in the cache.
#[derive(Debug, Clone)]
pub struct WordIndexEntry {
    name: String,
    usages: BTreeMap<Identity, f64>,
    persisted: bool,
}

impl WordIndexEntry {
    /// New transient entry for `term`.
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            name: term.into(),
            usages: BTreeMap::new(),
            persisted: false,
        }
    }

    pub(crate) fn from_document(key: &str, document: &Value) -> Result<Self> {
        let name = document
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| LexiconError::MalformedDocument {
                key: key.to_string(),
                reason: "missing name".to_string(),
            })?;
        Ok(Self {
            name: name.to_string(),
            usages: parse_usages(key, document)?,
            persisted: true,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content-addressed identity: hash of the term text alone.
    pub fn identity(&self) -> Identity {
        content_identity([self.name.as_str()])
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Cached usage weights by node identity.
    pub fn usages(&self) -> &BTreeMap<Identity, f64> {
        &self.usages
    }

    /// Write this entry to the store if it is not there yet.
    ///
    /// An entry that already exists under this identity is adopted as-is;
    /// its accumulated usages are never overwritten. Creation goes through
    /// the store's atomic insert, so two writers racing on a fresh term
    /// cannot wipe each other's accumulations.
    pub async fn persist(&mut self, store: &dyn DocumentStore) -> Result<Identity> {
        let identity = self.identity();
        if self.persisted {
            return Ok(identity);
        }
        let created = store
            .insert_if_absent(
                TERM_COLLECTION,
                &identity,
                json!({"name": self.name, "usages": []}),
            )
            .await?;
        if created {
            log::debug!("persisted term '{}' as {identity}", self.name);
        } else if let Some(existing) = store.get(TERM_COLLECTION, &identity).await? {
            self.usages = parse_usages(&identity, &existing)?;
        }
        self.persisted = true;
        Ok(identity)
    }

    /// Delete this entry from the store. Returns whether it was present.
    /// Erasing a transient entry is a no-op returning `false`.
    pub async fn erase(&mut self, store: &dyn DocumentStore) -> Result<bool> {
        if !self.persisted {
            return Ok(false);
        }
        let found = store.delete(TERM_COLLECTION, &self.identity()).await?;
        self.persisted = false;
        self.usages.clear();
        Ok(found)
    }

    /// Associate `node` with this term, adding `weight` to any weight the
    /// node has already accumulated.
    ///
    /// Both sides are persisted first (the node cascading to its ancestors),
    /// then the stored usage array is updated in one atomic
    /// accumulate-or-append step, so concurrent associations never lose
    /// weight. Accumulate failures propagate.
    pub async fn add_usage(
        &mut self,
        store: &dyn DocumentStore,
        node: &CapabilityNode,
        weight: f64,
    ) -> Result<()> {
        let node_identity = node.persist(store).await?;
        let identity = self.persist(store).await?;
        store
            .atomic_accumulate(Accumulate {
                collection: TERM_COLLECTION.to_string(),
                key: identity,
                array_field: "usages".to_string(),
                match_field: "node".to_string(),
                match_value: node_identity.clone(),
                increment_field: "weight".to_string(),
                amount: weight,
                template: json!({"node": node_identity, "weight": weight}),
            })
            .await?;
        let slot = self.usages.entry(node_identity).or_insert(0.0);
        *slot += weight;
        log::debug!(
            "term '{}' now weighs {:.1} on '{}'",
            self.name,
            *slot,
            node.name()
        );
        Ok(())
    }

    /// Resolve the stored usage set to live capability nodes.
    ///
    /// Re-reads the stored state (refreshing the cache) and bulk-fetches
    /// every referenced node. References that no longer resolve are skipped
    /// with a warning; they stay in the stored document. A transient entry
    /// has nothing stored and yields nothing.
    pub async fn get_usages(
        &mut self,
        store: &dyn DocumentStore,
    ) -> Result<Vec<(CapabilityNode, f64)>> {
        if !self.persisted {
            return Ok(Vec::new());
        }
        let identity = self.identity();
        let Some(document) = store.get(TERM_COLLECTION, &identity).await? else {
            log::debug!("term '{}' vanished from the store", self.name);
            return Ok(Vec::new());
        };
        let stored = parse_usages(&identity, &document)?;
        let keys: Vec<String> = stored.keys().cloned().collect();
        let found = store.bulk_get(&[CAPABILITY_COLLECTION], &keys).await?;
        let mut by_key: BTreeMap<String, Value> = BTreeMap::new();
        for item in found {
            by_key.insert(item.key, item.document);
        }

        let mut resolved = Vec::with_capacity(stored.len());
        for (node_identity, weight) in &stored {
            let Some(node_document) = by_key.get(node_identity) else {
                log::warn!(
                    "term '{}' references missing capability {node_identity}",
                    self.name
                );
                continue;
            };
            let node = CapabilityNode::from_document(store, node_identity, node_document).await?;
            resolved.push((node, *weight));
        }
        self.usages = stored;
        Ok(resolved)
    }
}

pub(crate) fn parse_usages(key: &str, document: &Value) -> Result<BTreeMap<Identity, f64>> {
    let array = document
        .get("usages")
        .and_then(Value::as_array)
        .ok_or_else(|| LexiconError::MalformedDocument {
            key: key.to_string(),
            reason: "missing usages array".to_string(),
        })?;
    let mut usages = BTreeMap::new();
    for element in array {
        let node = element
            .get("node")
            .and_then(Value::as_str)
            .ok_or_else(|| LexiconError::MalformedDocument {
                key: key.to_string(),
                reason: "usage without node".to_string(),
            })?;
        let weight = element.get("weight").and_then(Value::as_f64).unwrap_or(0.0);
        *usages.entry(node.to_string()).or_insert(0.0) += weight;
    }
    Ok(usages)
}
