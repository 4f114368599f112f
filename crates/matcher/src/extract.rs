use async_trait::async_trait;

use crate::error::Result;

/// Splits free text into the significant terms worth indexing.
///
/// Implementations own the normalization policy: case folding,
/// lemmatization, stop-word removal, synonym expansion. The engine treats
/// the output as an opaque ordered list.
#[async_trait]
pub trait TermExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<Vec<String>>;
}
