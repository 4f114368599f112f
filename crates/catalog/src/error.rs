use intent_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Malformed capability document {key}: {reason}")]
    MalformedDocument { key: String, reason: String },

    #[error("{0}")]
    Other(String),
}
