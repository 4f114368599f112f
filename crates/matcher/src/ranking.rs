use std::cmp::Ordering;
use std::collections::HashMap;

use intent_catalog::{CapabilityNode, Identity};

/// Per-hop attenuation applied while a usage's contribution propagates from
/// the matched node toward the root.
///
/// The matched node receives the full base contribution
/// (relevance × weight); each ancestor level receives the level below it
/// times the factor. 0.5 halves per hop, 1.0 propagates undamped, 0.0
/// scores matched nodes only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreDecay {
    factor: f64,
}

impl Default for ScoreDecay {
    fn default() -> Self {
        Self { factor: 0.5 }
    }
}

impl ScoreDecay {
    /// Factors outside [0, 1] are clamped.
    pub fn new(factor: f64) -> Self {
        Self {
            factor: factor.clamp(0.0, 1.0),
        }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    fn attenuate(&self, base: f64, hops: usize) -> f64 {
        base * self.factor.powi(hops as i32)
    }
}

/// Accumulates contributions into one representative node per identity and
/// assembles the final nested ranking.
///
/// Representatives are detached copies: scoring never mutates the catalog
/// handles the contributions came from.
pub(crate) struct Ranking {
    decay: ScoreDecay,
    representatives: HashMap<Identity, CapabilityNode>,
}

impl Ranking {
    pub(crate) fn new(decay: ScoreDecay) -> Self {
        Self {
            decay,
            representatives: HashMap::new(),
        }
    }

    /// Add one usage's contribution: the matched node takes `base`, every
    /// ancestor level an attenuated share. Contributions to the same
    /// identity sum up, regardless of which instance they arrived through.
    pub(crate) fn contribute(&mut self, node: &CapabilityNode, base: f64) {
        let mut chain = Vec::new();
        let mut current = Some(node.clone());
        while let Some(level) = current {
            current = level.parent();
            chain.push(level);
        }

        let mut below: Option<CapabilityNode> = None;
        for (hops, source) in chain.iter().enumerate() {
            let representative = self.representative_for(source);
            representative.add_score(self.decay.attenuate(base, hops));
            if let Some(child) = below.take() {
                if child.parent().is_none() {
                    representative.attach(&child);
                }
            }
            below = Some(representative);
        }
    }

    fn representative_for(&mut self, source: &CapabilityNode) -> CapabilityNode {
        let identity = source.identity();
        if let Some(existing) = self.representatives.get(&identity) {
            return existing.clone();
        }
        let mut representative = CapabilityNode::from_stored(source.name(), identity.clone());
        if let Some(kind) = source.kind() {
            representative = representative.with_kind(kind);
        }
        self.representatives.insert(identity, representative.clone());
        representative
    }

    /// Root-level representatives sorted by score descending, identity
    /// ascending on ties; children nested and sorted the same way.
    pub(crate) fn into_sorted(self) -> Vec<CapabilityNode> {
        let mut roots: Vec<CapabilityNode> = self
            .representatives
            .values()
            .filter(|node| node.parent().is_none())
            .cloned()
            .collect();
        roots.sort_by(|a, b| {
            b.score()
                .partial_cmp(&a.score())
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.identity().cmp(&b.identity()))
        });
        for root in &roots {
            root.sort_by_score();
        }
        roots
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn tree() -> (CapabilityNode, CapabilityNode, CapabilityNode) {
        let service = CapabilityNode::new("media");
        let method = CapabilityNode::new("play");
        let argument = CapabilityNode::new("track");
        assert!(service.attach(&method));
        assert!(method.attach(&argument));
        (service, method, argument)
    }

    #[test]
    fn contributions_decay_per_hop() {
        let (_, _, argument) = tree();
        let mut ranking = Ranking::new(ScoreDecay::default());
        ranking.contribute(&argument, 8.0);

        let roots = ranking.into_sorted();
        assert_eq!(roots.len(), 1);
        let root = &roots[0];
        assert_eq!(root.name(), "media");
        assert_eq!(root.score(), 2.0);
        let method = &root.children()[0];
        assert_eq!(method.score(), 4.0);
        assert_eq!(method.children()[0].score(), 8.0);
    }

    #[test]
    fn equal_identities_merge_across_instances() {
        let (_, method_a, _) = tree();
        let (_, method_b, _) = tree();
        let mut ranking = Ranking::new(ScoreDecay::default());
        ranking.contribute(&method_a, 6.0);
        ranking.contribute(&method_b, 4.0);

        let roots = ranking.into_sorted();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].score(), 5.0);
        let children = roots[0].children();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].score(), 10.0);
    }

    #[test]
    fn ties_order_by_identity() {
        let a = CapabilityNode::new("alpha");
        let b = CapabilityNode::new("beta");
        let mut ranking = Ranking::new(ScoreDecay::default());
        ranking.contribute(&b, 3.0);
        ranking.contribute(&a, 3.0);

        let roots = ranking.into_sorted();
        assert_eq!(roots.len(), 2);
        let expected_first = if a.identity() < b.identity() {
            "alpha"
        } else {
            "beta"
        };
        assert_eq!(roots[0].name(), expected_first);
        assert_eq!(roots[0].score(), 3.0);
    }

    #[test]
    fn undamped_decay_propagates_fully() {
        let (_, _, argument) = tree();
        let mut ranking = Ranking::new(ScoreDecay::new(1.0));
        ranking.contribute(&argument, 8.0);

        let roots = ranking.into_sorted();
        assert_eq!(roots[0].score(), 8.0);
    }

    #[test]
    fn zero_decay_scores_matched_nodes_only() {
        let (_, _, argument) = tree();
        let mut ranking = Ranking::new(ScoreDecay::new(0.0));
        ranking.contribute(&argument, 8.0);

        let roots = ranking.into_sorted();
        assert_eq!(roots[0].score(), 0.0);
        assert_eq!(roots[0].children()[0].children()[0].score(), 8.0);
    }

    #[test]
    fn representatives_leave_sources_untouched() {
        let (service, _, argument) = tree();
        let mut ranking = Ranking::new(ScoreDecay::default());
        ranking.contribute(&argument, 8.0);

        assert_eq!(service.score(), 0.0);
        assert_eq!(argument.score(), 0.0);
        let roots = ranking.into_sorted();
        assert!(!roots[0].same_node(&service));
    }
}
