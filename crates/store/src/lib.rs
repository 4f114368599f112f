//! # Intent Store
//!
//! Protocol-agnostic document persistence for the intent router.
//!
//! Every higher layer (capability catalog, term lexicon, match engine)
//! talks to storage exclusively through the [`DocumentStore`] trait, so the
//! concrete backend stays swappable: an HTTP document database in
//! production, [`MemoryStore`] in tests and embedded setups.
//!
//! ## Architecture
//!
//! ```text
//! catalog / lexicon / matcher
//!     │
//!     └──> DocumentStore (async trait)
//!            ├─> upsert / delete / get / bulk_get
//!            ├─> find_by_fields      (exact, dotted paths)
//!            ├─> find_by_fuzzy_text  (edit-distance tolerant)
//!            └─> atomic_accumulate   (indivisible array update)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use intent_store::{DocumentStore, MemoryStore};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = MemoryStore::new().with_fuzziness(2);
//!     store.upsert("terms", "t1", json!({"name": "lights"})).await?;
//!
//!     let hits = store.find_by_fuzzy_text("terms", "turn the lihgts on").await?;
//!     for hit in hits {
//!         println!("{}: {:.3}", hit.key, hit.relevance);
//!     }
//!     Ok(())
//! }
//! ```

mod error;
mod memory;
mod store;
mod types;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use store::DocumentStore;
pub use types::{Accumulate, FoundDocument, QueryHit};
