use intent_catalog::{content_identity, CapabilityNode};
use intent_store::DocumentStore;
use serde_json::Value;

use crate::entry::{WordIndexEntry, TERM_COLLECTION};
use crate::error::Result;

impl WordIndexEntry {
    /// Fetch an entry by identity, `None` when absent.
    pub async fn find_by_identity(
        store: &dyn DocumentStore,
        identity: &str,
    ) -> Result<Option<WordIndexEntry>> {
        let Some(document) = store.get(TERM_COLLECTION, identity).await? else {
            return Ok(None);
        };
        Ok(Some(Self::from_document(identity, &document)?))
    }

    /// Fetch the entry for `term`, or a fresh transient one when the term
    /// has never been indexed. Identities are content-addressed, so the
    /// lookup is a plain key fetch.
    pub async fn find_by_name(store: &dyn DocumentStore, term: &str) -> Result<WordIndexEntry> {
        let identity = content_identity([term]);
        match store.get(TERM_COLLECTION, &identity).await? {
            Some(document) => Self::from_document(&identity, &document),
            None => Ok(WordIndexEntry::new(term)),
        }
    }

    /// Fuzzy-match `sentence` against the indexed terms.
    ///
    /// Each hit comes back with its usage cache populated straight from the
    /// matched document and the relevance the store assigned. Filtering out
    /// weak relevances is the caller's call. Hits with no usable document
    /// are skipped.
    pub async fn find_by_sentence(
        store: &dyn DocumentStore,
        sentence: &str,
    ) -> Result<Vec<(WordIndexEntry, f64)>> {
        let hits = store.find_by_fuzzy_text(TERM_COLLECTION, sentence).await?;
        let mut entries = Vec::with_capacity(hits.len());
        for hit in hits {
            match Self::from_document(&hit.key, &hit.document) {
                Ok(entry) => entries.push((entry, hit.relevance)),
                Err(err) => log::warn!("skipping term hit {}: {err}", hit.key),
            }
        }
        log::debug!("{} terms matched '{}'", entries.len(), sentence);
        Ok(entries)
    }

    /// All entries whose usage set references `node`, each paired with the
    /// weight accumulated for that node. A transient node cannot be
    /// referenced, so it yields nothing.
    pub async fn find_by_node(
        store: &dyn DocumentStore,
        node: &CapabilityNode,
    ) -> Result<Vec<(WordIndexEntry, f64)>> {
        if !node.is_persisted() {
            return Ok(Vec::new());
        }
        let node_identity = node.identity();
        let hits = store
            .find_by_fields(
                TERM_COLLECTION,
                &[("usages.node".to_string(), Value::String(node_identity.clone()))],
            )
            .await?;
        let mut entries = Vec::with_capacity(hits.len());
        for hit in hits {
            let entry = Self::from_document(&hit.key, &hit.document)?;
            let weight = entry.usages().get(&node_identity).copied().unwrap_or(0.0);
            entries.push((entry, weight));
        }
        Ok(entries)
    }
}
