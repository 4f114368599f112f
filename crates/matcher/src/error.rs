use intent_catalog::CatalogError;
use intent_lexicon::LexiconError;
use intent_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MatchError>;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Lexicon error: {0}")]
    Lexicon(#[from] LexiconError),

    #[error("A term extractor is required for sentence association")]
    ExtractorRequired,

    #[error("{0}")]
    Other(String),
}
