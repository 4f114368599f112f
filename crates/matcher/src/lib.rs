//! # Intent Matcher
//!
//! Turns free-form sentences into ranked capability nodes.
//!
//! ```text
//! sentence
//!     │ TermExtractor (optional collaborator)
//!     ▼
//! augmented text ──> fuzzy term lookup ──> usage resolution
//!                                              │ relevance × weight
//!                                              ▼
//!                              decayed propagation up the tree
//!                                              │
//!                                              ▼
//!                        deduplicated, sorted, nested ranking
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use intent_catalog::CapabilityNode;
//! use intent_lexicon::WordIndexEntry;
//! use intent_matcher::MatchEngine;
//! use intent_store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(MemoryStore::new());
//!     let lights = CapabilityNode::new("lights");
//!     let mut entry = WordIndexEntry::new("bright");
//!     entry.add_usage(&*store, &lights, 10.0).await?;
//!
//!     let engine = MatchEngine::new(store);
//!     for capability in engine.search("make it bright in here").await? {
//!         println!("{}: {:.1}", capability.name(), capability.score());
//!     }
//!     Ok(())
//! }
//! ```

mod engine;
mod error;
mod extract;
mod ranking;

pub use engine::MatchEngine;
pub use error::{MatchError, Result};
pub use extract::TermExtractor;
pub use ranking::ScoreDecay;
