use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::identity::{content_identity, Identity};

/// What invoking a capability does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Fire-and-forget notification.
    Event,
    /// Request/response invocation.
    Action,
}

/// Handle to one node of the capability catalog tree
/// (service → method → argument).
///
/// Clones are cheap and share the underlying node. A parent owns its
/// children and an attached child holds its parent in turn, so any live
/// handle keeps the whole attached tree reachable and the ancestor path
/// never silently shortens. The mutual link means an attached subtree is
/// released through [`detach`](Self::detach), not by dropping handles.
/// Chains resolved upward from the store hold their parent one way; such
/// a parent does not list the reconstructed child.
#[derive(Clone)]
pub struct CapabilityNode {
    inner: Arc<NodeInner>,
}

#[derive(Debug)]
struct NodeInner {
    state: RwLock<NodeState>,
}

#[derive(Debug)]
struct NodeState {
    name: String,
    kind: Option<NodeKind>,
    parent: ParentLink,
    children: Vec<CapabilityNode>,
    /// Identity committed by a persist or a store reconstruction.
    pinned: Option<Identity>,
    score: f64,
}

/// Back-reference to the parent node.
#[derive(Debug, Clone, Default)]
enum ParentLink {
    #[default]
    None,
    /// The parent also lists this node among its children; the pair stays
    /// alive until detached.
    Attached(CapabilityNode),
    /// The parent was fetched from the store while walking up; it does not
    /// list this node.
    Resolved(CapabilityNode),
}

impl CapabilityNode {
    /// New transient root-level node.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_state(NodeState {
            name: name.into(),
            kind: None,
            parent: ParentLink::None,
            children: Vec::new(),
            pinned: None,
            score: 0.0,
        })
    }

    /// Handle carrying a committed identity, detached from any live tree.
    /// Used when rebuilding nodes from stored documents and when assembling
    /// ranking results.
    pub fn from_stored(name: impl Into<String>, identity: Identity) -> Self {
        Self::from_state(NodeState {
            name: name.into(),
            kind: None,
            parent: ParentLink::None,
            children: Vec::new(),
            pinned: Some(identity),
            score: 0.0,
        })
    }

    #[must_use]
    pub fn with_kind(self, kind: NodeKind) -> Self {
        self.write(|state| state.kind = Some(kind));
        self
    }

    fn from_state(state: NodeState) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                state: RwLock::new(state),
            }),
        }
    }

    // Lock sections are short and never nested: every helper clones what it
    // needs out and releases before any other node is touched.
    fn read<R>(&self, f: impl FnOnce(&NodeState) -> R) -> R {
        let guard = self
            .inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<R>(&self, f: impl FnOnce(&mut NodeState) -> R) -> R {
        let mut guard = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn name(&self) -> String {
        self.read(|state| state.name.clone())
    }

    /// Explicit kind, or the nearest ancestor's. `None` when no node on the
    /// chain declares one.
    pub fn kind(&self) -> Option<NodeKind> {
        if let Some(kind) = self.read(|state| state.kind) {
            return Some(kind);
        }
        self.parent().and_then(|parent| parent.kind())
    }

    /// 0 for root-level nodes, one more per ancestor.
    pub fn depth(&self) -> usize {
        match self.parent() {
            Some(parent) => parent.depth() + 1,
            None => 0,
        }
    }

    pub fn parent(&self) -> Option<CapabilityNode> {
        match self.read(|state| state.parent.clone()) {
            ParentLink::None => None,
            ParentLink::Attached(parent) | ParentLink::Resolved(parent) => Some(parent),
        }
    }

    pub fn children(&self) -> Vec<CapabilityNode> {
        self.read(|state| state.children.clone())
    }

    /// Content-addressed identity: `sha256(name)` for a root,
    /// `sha256(parent_identity ++ name)` otherwise.
    ///
    /// Pure and stable for a given name path; safe for concurrent callers.
    /// Once the node has been persisted or was rebuilt from the store, the
    /// committed identity is returned directly.
    pub fn identity(&self) -> Identity {
        if let Some(pinned) = self.read(|state| state.pinned.clone()) {
            return pinned;
        }
        match self.parent() {
            Some(parent) => content_identity([parent.identity(), self.name()]),
            None => content_identity([self.name()]),
        }
    }

    /// Whether this node currently has a committed identity in the store.
    pub fn is_persisted(&self) -> bool {
        self.read(|state| state.pinned.is_some())
    }

    pub(crate) fn pinned(&self) -> Option<Identity> {
        self.read(|state| state.pinned.clone())
    }

    pub(crate) fn set_pinned(&self, identity: Option<Identity>) {
        self.write(|state| state.pinned = identity);
    }

    pub(crate) fn set_parent_resolved(&self, parent: CapabilityNode) {
        self.write(|state| state.parent = ParentLink::Resolved(parent));
    }

    pub(crate) fn clear_children(&self) {
        self.write(|state| state.children.clear());
    }

    pub(crate) fn adopt_child(&self, child: &CapabilityNode) {
        child.write(|state| state.parent = ParentLink::Attached(self.clone()));
        self.write(|state| state.children.push(child.clone()));
    }

    /// Transient ranking accumulator; meaningful only within one match
    /// engine invocation. Not persisted.
    pub fn score(&self) -> f64 {
        self.read(|state| state.score)
    }

    pub fn set_score(&self, score: f64) {
        self.write(|state| state.score = score);
    }

    pub fn add_score(&self, delta: f64) {
        self.write(|state| state.score += delta);
    }

    pub fn same_node(&self, other: &CapabilityNode) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Attach `child` under this node.
    ///
    /// Rejected (returns `false`, nothing changes) when the attachment would
    /// create a cycle, when the child already hangs somewhere (detach
    /// first), or when a child with the same name is already present.
    pub fn attach(&self, child: &CapabilityNode) -> bool {
        if self.same_node(child) || child.parent().is_some() {
            return false;
        }
        if self.has_ancestor(child) {
            return false;
        }
        let child_name = child.name();
        let duplicate = self
            .children()
            .iter()
            .any(|existing| existing.name() == child_name);
        if duplicate {
            return false;
        }
        self.adopt_child(child);
        true
    }

    /// Remove `child` from this node's children and clear its back
    /// reference, releasing the mutual link that keeps the pair alive.
    /// In-memory only; returns whether it was present.
    pub fn detach(&self, child: &CapabilityNode) -> bool {
        let removed = self.write(|state| {
            let before = state.children.len();
            state.children.retain(|c| !c.same_node(child));
            state.children.len() != before
        });
        if removed {
            child.write(|state| state.parent = ParentLink::None);
        }
        removed
    }

    /// Whether `other` appears on this node's parent chain.
    fn has_ancestor(&self, other: &CapabilityNode) -> bool {
        let mut current = self.parent();
        while let Some(node) = current {
            if node.same_node(other) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Recursively order children by descending score; equal scores order by
    /// identity ascending so rankings stay deterministic.
    pub fn sort_by_score(&self) {
        let mut children = self.write(|state| std::mem::take(&mut state.children));
        children.sort_by(|a, b| {
            b.score()
                .partial_cmp(&a.score())
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.identity().cmp(&b.identity()))
        });
        for child in &children {
            child.sort_by_score();
        }
        self.write(|state| state.children = children);
    }
}

// An attached tree is cyclic; keep Debug to one level.
impl fmt::Debug for CapabilityNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, kind, pinned, score, children) = self.read(|state| {
            (
                state.name.clone(),
                state.kind,
                state.pinned.clone(),
                state.score,
                state.children.len(),
            )
        });
        f.debug_struct("CapabilityNode")
            .field("name", &name)
            .field("kind", &kind)
            .field("pinned", &pinned)
            .field("score", &score)
            .field("children", &children)
            .finish()
    }
}
