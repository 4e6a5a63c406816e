//! Read-only node lookup used by the classifier.

use std::collections::HashMap;

use convoy_id::NodeId;

use crate::model::Node;

/// Source of node records for classification.
///
/// A node that is missing and a node recorded as nil are both reported as
/// `None`; the classifier treats them identically.
pub trait NodeLookup {
    fn node(&self, id: &NodeId) -> Option<&Node>;
}

impl NodeLookup for HashMap<NodeId, Node> {
    fn node(&self, id: &NodeId) -> Option<&Node> {
        self.get(id)
    }
}

/// Snapshot of the nodes referenced by an allocation set.
///
/// Keys may map to `None` when cluster state knows the ID but holds no
/// record for it (for example a node that was garbage-collected while
/// allocations still point at it).
#[derive(Debug, Clone, Default)]
pub struct NodeView {
    nodes: HashMap<NodeId, Option<Node>>,
}

impl NodeView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a node record.
    pub fn insert(&mut self, node: Node) {
        self.nodes.insert(node.id, Some(node));
    }

    /// Record that `id` is known but has no node record.
    pub fn insert_nil(&mut self, id: NodeId) {
        self.nodes.insert(id, None);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true if `id` has an entry, nil or not.
    pub fn contains_key(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }
}

impl NodeLookup for NodeView {
    fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id).and_then(Option::as_ref)
    }
}

impl FromIterator<Node> for NodeView {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        let mut view = Self::new();
        for node in iter {
            view.insert(node);
        }
        view
    }
}
