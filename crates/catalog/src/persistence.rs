use intent_store::DocumentStore;
use serde_json::{json, Value};

use crate::error::{CatalogError, Result};
use crate::identity::Identity;
use crate::node::CapabilityNode;

/// Collection holding capability documents, keyed by identity. The wire
/// shape is `{"name": <string>, "parent": <identity or null>}`.
pub const CAPABILITY_COLLECTION: &str = "capabilities";

impl CapabilityNode {
    /// Write this node to the store, ancestors first.
    ///
    /// A node that is already persisted returns its committed identity
    /// without touching the store, so repeated persists of equal trees are
    /// idempotent. No node is ever stored while its parent is missing.
    pub async fn persist(&self, store: &dyn DocumentStore) -> Result<Identity> {
        if let Some(pinned) = self.pinned() {
            return Ok(pinned);
        }
        let parent_identity = match self.parent() {
            Some(parent) => Some(Box::pin(parent.persist(store)).await?),
            None => None,
        };
        let identity = self.identity();
        let document = json!({
            "name": self.name(),
            "parent": parent_identity,
        });
        store
            .upsert(CAPABILITY_COLLECTION, &identity, document)
            .await?;
        self.set_pinned(Some(identity.clone()));
        log::debug!("persisted capability '{}' as {identity}", self.name());
        Ok(identity)
    }

    /// Remove this node's subtree from the store, children first.
    ///
    /// Returns whether this node itself was stored. Erasing a transient
    /// node is a no-op returning `false`; its children still cascade. The
    /// cascade covers the children this handle knows about.
    pub async fn erase(&self, store: &dyn DocumentStore) -> Result<bool> {
        for child in self.children() {
            Box::pin(child.erase(store)).await?;
        }
        let Some(identity) = self.pinned() else {
            return Ok(false);
        };
        let found = store.delete(CAPABILITY_COLLECTION, &identity).await?;
        self.set_pinned(None);
        log::debug!("erased capability '{}' ({identity})", self.name());
        Ok(found)
    }

    /// Fetch a node by identity, `None` when absent.
    ///
    /// The ancestor chain is resolved recursively (parents come back
    /// without their children); with `with_children` the stored children
    /// are loaded recursively as well.
    pub async fn find_by_identity(
        store: &dyn DocumentStore,
        identity: &str,
        with_children: bool,
    ) -> Result<Option<CapabilityNode>> {
        let Some(document) = store.get(CAPABILITY_COLLECTION, identity).await? else {
            return Ok(None);
        };
        let node = Self::from_document(store, identity, &document).await?;
        if with_children {
            node.load_children(store).await?;
        }
        Ok(Some(node))
    }

    /// First stored node with this name, optionally constrained to one
    /// parent. A transient parent cannot have stored children, so passing
    /// one short-circuits to `None`.
    pub async fn find_by_name(
        store: &dyn DocumentStore,
        name: &str,
        parent: Option<&CapabilityNode>,
        with_children: bool,
    ) -> Result<Option<CapabilityNode>> {
        let mut fields = vec![("name".to_string(), Value::String(name.to_string()))];
        if let Some(parent) = parent {
            let Some(parent_identity) = parent.pinned() else {
                return Ok(None);
            };
            fields.push(("parent".to_string(), Value::String(parent_identity)));
        }
        let hits = store.find_by_fields(CAPABILITY_COLLECTION, &fields).await?;
        let Some(hit) = hits.into_iter().next() else {
            return Ok(None);
        };
        let node = Self::from_document(store, &hit.key, &hit.document).await?;
        if with_children {
            node.load_children(store).await?;
        }
        Ok(Some(node))
    }

    /// All stored children of `parent`, each with its back-reference
    /// already resolved. A transient parent yields nothing.
    pub async fn find_by_parent(
        store: &dyn DocumentStore,
        parent: &CapabilityNode,
        with_children: bool,
    ) -> Result<Vec<CapabilityNode>> {
        let Some(parent_identity) = parent.pinned() else {
            return Ok(Vec::new());
        };
        let hits = store
            .find_by_fields(
                CAPABILITY_COLLECTION,
                &[("parent".to_string(), Value::String(parent_identity))],
            )
            .await?;
        let mut children = Vec::with_capacity(hits.len());
        for hit in hits {
            let child = Self::from_hit(parent, &hit.key, &hit.document)?;
            if with_children {
                Box::pin(child.load_children(store)).await?;
            }
            children.push(child);
        }
        Ok(children)
    }

    /// Rebuild a node from its stored document, resolving the ancestor
    /// chain. A parent reference that no longer resolves is logged and
    /// dropped rather than failing the reconstruction.
    pub async fn from_document(
        store: &dyn DocumentStore,
        identity: &str,
        document: &Value,
    ) -> Result<CapabilityNode> {
        let name = node_name(identity, document)?;
        let node = CapabilityNode::from_stored(name, identity.to_string());
        if let Some(parent_identity) = document.get("parent").and_then(Value::as_str) {
            match Box::pin(Self::find_by_identity(store, parent_identity, false)).await? {
                Some(parent) => node.set_parent_resolved(parent),
                None => {
                    log::warn!(
                        "capability {identity} references missing parent {parent_identity}"
                    );
                }
            }
        }
        Ok(node)
    }

    /// Replace this node's children with the stored ones, recursively.
    /// Transient nodes have nothing stored and are left untouched.
    pub async fn load_children(&self, store: &dyn DocumentStore) -> Result<()> {
        if !self.is_persisted() {
            return Ok(());
        }
        let children = Box::pin(Self::find_by_parent(store, self, true)).await?;
        self.clear_children();
        for child in children {
            self.adopt_child(&child);
        }
        Ok(())
    }

    // Reconstruction when the parent is already in hand: no re-fetch.
    fn from_hit(
        parent: &CapabilityNode,
        identity: &str,
        document: &Value,
    ) -> Result<CapabilityNode> {
        let name = node_name(identity, document)?;
        let child = CapabilityNode::from_stored(name, identity.to_string());
        child.set_parent_resolved(parent.clone());
        Ok(child)
    }
}

fn node_name(identity: &str, document: &Value) -> Result<String> {
    document
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| CatalogError::MalformedDocument {
            key: identity.to_string(),
            reason: "missing name".to_string(),
        })
}
