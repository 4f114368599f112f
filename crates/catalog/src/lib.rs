//! # Intent Catalog
//!
//! The hierarchical catalog of executable capabilities: services own
//! methods, methods own arguments. Nodes are content-addressed (identity is
//! a hash over the full name path), persist ancestors-first and erase
//! children-first, so the stored tree never contains a child whose parent
//! is missing.
//!
//! ```text
//! service ── method ── argument
//!    │          │
//!    │          └─ identity = sha256(service_id ++ "method")
//!    └─ identity = sha256("service")
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use intent_catalog::{CapabilityNode, NodeKind};
//! use intent_store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = MemoryStore::new();
//!     let lights = CapabilityNode::new("lights").with_kind(NodeKind::Action);
//!     let turn_on = CapabilityNode::new("turn_on");
//!     lights.attach(&turn_on);
//!
//!     // Persisting the method stores the service first.
//!     let identity = turn_on.persist(&store).await?;
//!     let found = CapabilityNode::find_by_identity(&store, &identity, false).await?;
//!     assert!(found.is_some());
//!     Ok(())
//! }
//! ```

mod error;
mod identity;
mod node;
mod persistence;

pub use error::{CatalogError, Result};
pub use identity::{content_identity, Identity};
pub use node::{CapabilityNode, NodeKind};
pub use persistence::CAPABILITY_COLLECTION;
