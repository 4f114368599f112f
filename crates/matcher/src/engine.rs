use std::sync::Arc;

use intent_catalog::CapabilityNode;
use intent_lexicon::WordIndexEntry;
use intent_store::DocumentStore;

use crate::error::{MatchError, Result};
use crate::extract::TermExtractor;
use crate::ranking::{Ranking, ScoreDecay};

/// Stateless sentence-to-capability resolver.
///
/// Holds only collaborators and configuration; every invocation works off
/// the stored state, so one engine serves concurrent callers.
pub struct MatchEngine {
    store: Arc<dyn DocumentStore>,
    extractor: Option<Arc<dyn TermExtractor>>,
    decay: ScoreDecay,
}

impl MatchEngine {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            extractor: None,
            decay: ScoreDecay::default(),
        }
    }

    /// Collaborator used to augment searched sentences and to pick the
    /// terms for [`associate_sentence`](Self::associate_sentence).
    #[must_use]
    pub fn with_term_extractor(mut self, extractor: Arc<dyn TermExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    #[must_use]
    pub fn with_decay(mut self, decay: ScoreDecay) -> Self {
        self.decay = decay;
        self
    }

    /// Resolve `sentence` to ranked root-level capabilities, each carrying
    /// its matched descendants sorted by score.
    ///
    /// No match is an empty ranking, not an error. Entries whose usages
    /// fail to resolve degrade to "no usages" and are logged; a failing
    /// index query fails the whole search.
    pub async fn search(&self, sentence: &str) -> Result<Vec<CapabilityNode>> {
        let augmented = self.augment(sentence).await;
        let matched: Vec<(WordIndexEntry, f64)> =
            WordIndexEntry::find_by_sentence(&*self.store, &augmented)
                .await?
                .into_iter()
                .filter(|(_, relevance)| *relevance > 0.0)
                .collect();
        log::debug!("{} index entries matched '{sentence}'", matched.len());

        // Usage resolution per entry is independent; fan out and join all
        // before ranking.
        let mut tasks = Vec::with_capacity(matched.len());
        for (mut entry, relevance) in matched {
            let store = Arc::clone(&self.store);
            tasks.push(tokio::spawn(async move {
                let usages = entry.get_usages(&*store).await;
                (entry, relevance, usages)
            }));
        }

        let mut ranking = Ranking::new(self.decay);
        for task in tasks {
            let (entry, relevance, usages) = task
                .await
                .map_err(|err| MatchError::Other(format!("usage resolution failed: {err}")))?;
            let usages = match usages {
                Ok(usages) => usages,
                Err(err) => {
                    log::warn!("skipping usages of term '{}': {err}", entry.name());
                    continue;
                }
            };
            for (node, weight) in usages {
                ranking.contribute(&node, relevance * weight);
            }
        }
        Ok(ranking.into_sorted())
    }

    /// Train the index: persist `node` and associate every significant term
    /// of `sentence` with it at `weight`. Returns how many terms were
    /// associated. Requires a term extractor; accumulate failures propagate.
    pub async fn associate_sentence(
        &self,
        node: &CapabilityNode,
        sentence: &str,
        weight: f64,
    ) -> Result<usize> {
        let Some(extractor) = &self.extractor else {
            return Err(MatchError::ExtractorRequired);
        };
        let terms = extractor.extract(sentence).await?;
        node.persist(&*self.store).await?;
        for term in &terms {
            let mut entry = WordIndexEntry::find_by_name(&*self.store, term).await?;
            entry.add_usage(&*self.store, node, weight).await?;
        }
        log::info!(
            "associated {} terms with capability '{}'",
            terms.len(),
            node.name()
        );
        Ok(terms.len())
    }

    /// Widen the searched text with the extractor's terms; extraction
    /// failures degrade to the raw sentence.
    async fn augment(&self, sentence: &str) -> String {
        let Some(extractor) = &self.extractor else {
            return sentence.to_string();
        };
        match extractor.extract(sentence).await {
            Ok(terms) if !terms.is_empty() => {
                let mut augmented = String::from(sentence);
                for term in terms {
                    augmented.push(' ');
                    augmented.push_str(&term);
                }
                augmented
            }
            Ok(_) => sentence.to_string(),
            Err(err) => {
                log::warn!("term extraction failed, searching the raw sentence: {err}");
                sentence.to_string()
            }
        }
    }
}
