//! # Intent Lexicon
//!
//! The weighted term index: every significant term maps to the capability
//! nodes it has been associated with, each carrying an accumulated weight.
//! Associations add up commutatively through one atomic store operation, so
//! parallel training runs never lose weight.
//!
//! Terms are content-addressed like capabilities, which turns "find or
//! create the entry for this word" into a single key fetch.

mod entry;
mod error;
mod lookup;

pub use entry::{WordIndexEntry, TERM_COLLECTION};
pub use error::{LexiconError, Result};
