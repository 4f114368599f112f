use intent_catalog::CatalogError;
use intent_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LexiconError>;

#[derive(Error, Debug)]
pub enum LexiconError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Malformed term document {key}: {reason}")]
    MalformedDocument { key: String, reason: String },

    #[error("{0}")]
    Other(String),
}
