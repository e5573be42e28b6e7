//! Append-only search tree.

use std::collections::BTreeMap;

use super::node::{Node, NodeId};
use crate::master::{MasterBackend, SimplexMaster};

/// Every node ever created, keyed by id, with parent/child edges.
///
/// Nodes are never removed; pruned and fathomed nodes stay as records.
#[derive(Debug, Clone)]
pub struct SearchTree<M: MasterBackend = SimplexMaster> {
    nodes: BTreeMap<NodeId, Node<M>>,
    children: BTreeMap<NodeId, (NodeId, NodeId)>,
    parents: BTreeMap<NodeId, NodeId>,
    root: Option<NodeId>,
    next_id: NodeId,
}

impl<M: MasterBackend> Default for SearchTree<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: MasterBackend> SearchTree<M> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            children: BTreeMap::new(),
            parents: BTreeMap::new(),
            root: None,
            next_id: 0,
        }
    }

    fn insert(&mut self, mut node: Node<M>) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        node.id = Some(id);
        node.lineage.push(id);
        self.nodes.insert(id, node);
        id
    }

    /// Insert the root and return its id.
    pub fn insert_root(&mut self, node: Node<M>) -> NodeId {
        let id = self.insert(node);
        self.root = Some(id);
        id
    }

    /// Insert the two children of `parent`; returns `(left, right)` ids.
    pub fn insert_children(
        &mut self,
        parent: NodeId,
        left: Node<M>,
        right: Node<M>,
    ) -> (NodeId, NodeId) {
        let l = self.insert(left);
        let r = self.insert(right);
        self.children.insert(parent, (l, r));
        self.parents.insert(l, parent);
        self.parents.insert(r, parent);
        (l, r)
    }

    /// Root id, if inserted.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Node by id.
    pub fn get(&self, id: NodeId) -> Option<&Node<M>> {
        self.nodes.get(&id)
    }

    /// Mutable node by id.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<M>> {
        self.nodes.get_mut(&id)
    }

    /// `(left, right)` children of `id`.
    pub fn children(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        self.children.get(&id).copied()
    }

    /// Parent of `id`.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(&id).copied()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Node<M>> {
        self.nodes.values()
    }

    /// Ids of all leaves.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.is_leaf)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Ids of the leaves below `id` (itself if it is a leaf), left to right.
    ///
    /// These are the terms of the disjunction rooted at `id`.
    pub fn subtree_leaves(&self, id: NodeId) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            match self.children.get(&cur) {
                Some(&(l, r)) => {
                    stack.push(r);
                    stack.push(l);
                }
                None if self.nodes.contains_key(&cur) => leaves.push(cur),
                None => {}
            }
        }
        leaves
    }
}
