//! Open-node priority queue.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::node::NodeId;
use crate::settings::NodeSelection;

/// What the queue knows about an open node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueueEntry {
    /// Node id in the tree.
    pub id: NodeId,

    /// Node's dual bound.
    pub dual_bound: f64,

    /// Node's depth.
    pub depth: usize,
}

/// Priority key of an entry; lower is popped first.
pub type KeyFn = fn(&QueueEntry) -> f64;

/// Key function for a node selection strategy.
pub fn key_fn(selection: NodeSelection) -> KeyFn {
    match selection {
        NodeSelection::BestBound => |e: &QueueEntry| e.dual_bound,
        NodeSelection::DepthFirst => |e: &QueueEntry| -(e.depth as f64),
        NodeSelection::BreadthFirst => |e: &QueueEntry| e.depth as f64,
    }
}

struct Queued {
    key: f64,
    seq: u64,
    entry: QueueEntry,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap: lowest key first, then oldest first
        other
            .key
            .total_cmp(&self.key)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Priority queue of open nodes.
pub struct NodeQueue {
    key: KeyFn,
    heap: BinaryHeap<Queued>,
    next_seq: u64,
    nodes_added: u64,
    nodes_popped: u64,
}

impl NodeQueue {
    /// Create a queue for the given strategy.
    pub fn new(selection: NodeSelection) -> Self {
        Self::with_key(key_fn(selection))
    }

    /// Create a queue ordered by `key`.
    pub fn with_key(key: KeyFn) -> Self {
        Self {
            key,
            heap: BinaryHeap::new(),
            next_seq: 0,
            nodes_added: 0,
            nodes_popped: 0,
        }
    }

    /// Add an entry.
    pub fn push(&mut self, entry: QueueEntry) {
        let key = (self.key)(&entry);
        self.heap.push(Queued {
            key,
            seq: self.next_seq,
            entry,
        });
        self.next_seq += 1;
        self.nodes_added += 1;
    }

    /// Take the entry with the lowest key.
    pub fn pop(&mut self) -> Option<QueueEntry> {
        let queued = self.heap.pop()?;
        self.nodes_popped += 1;
        Some(queued.entry)
    }

    /// Lowest dual bound among open entries (`+inf` when empty).
    pub fn best_bound(&self) -> f64 {
        self.heap
            .iter()
            .map(|q| q.entry.dual_bound)
            .fold(f64::INFINITY, f64::min)
    }

    /// Drop entries whose dual bound cannot beat `primal_bound`.
    ///
    /// Returns the pruned ids.
    pub fn prune_by_bound(&mut self, primal_bound: f64) -> Vec<NodeId> {
        let threshold = primal_bound - 1e-9 * primal_bound.abs().max(1.0);
        let (pruned, kept): (Vec<Queued>, Vec<Queued>) = self
            .heap
            .drain()
            .partition(|q| q.entry.dual_bound >= threshold);
        self.heap = kept.into_iter().collect();
        pruned.into_iter().map(|q| q.entry.id).collect()
    }

    /// Ids of all open entries, in no particular order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.heap.iter().map(|q| q.entry.id).collect()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of open entries.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Total entries ever pushed.
    pub fn total_added(&self) -> u64 {
        self.nodes_added
    }

    /// Total entries popped.
    pub fn total_popped(&self) -> u64 {
        self.nodes_popped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: NodeId, dual_bound: f64, depth: usize) -> QueueEntry {
        QueueEntry {
            id,
            dual_bound,
            depth,
        }
    }

    #[test]
    fn test_best_bound_selection() {
        let mut queue = NodeQueue::new(NodeSelection::BestBound);
        queue.push(entry(1, 10.0, 0));
        queue.push(entry(2, 5.0, 1));
        queue.push(entry(3, 15.0, 1));

        assert_eq!(queue.best_bound(), 5.0);
        assert_eq!(queue.pop().unwrap().id, 2);
        assert_eq!(queue.pop().unwrap().id, 1);
        assert_eq!(queue.pop().unwrap().id, 3);
        assert!(queue.is_empty());
        assert_eq!(queue.best_bound(), f64::INFINITY);
    }

    #[test]
    fn test_depth_and_breadth_first() {
        let mut dfs = NodeQueue::new(NodeSelection::DepthFirst);
        let mut bfs = NodeQueue::new(NodeSelection::BreadthFirst);
        for (id, depth) in [(1, 0), (2, 2), (3, 1), (4, 2)] {
            dfs.push(entry(id, 0.0, depth));
            bfs.push(entry(id, 0.0, depth));
        }

        // Equal keys come out in insertion order.
        let order: Vec<NodeId> = std::iter::from_fn(|| dfs.pop().map(|e| e.id)).collect();
        assert_eq!(order, vec![2, 4, 3, 1]);
        let order: Vec<NodeId> = std::iter::from_fn(|| bfs.pop().map(|e| e.id)).collect();
        assert_eq!(order, vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_custom_key() {
        let mut queue = NodeQueue::with_key(|e: &QueueEntry| -(e.id as f64));
        queue.push(entry(1, 0.0, 0));
        queue.push(entry(7, 0.0, 0));
        assert_eq!(queue.pop().unwrap().id, 7);
    }

    #[test]
    fn test_pruning() {
        let mut queue = NodeQueue::new(NodeSelection::BestBound);
        for i in 0..5 {
            queue.push(entry(i, i as f64 * 10.0, 0)); // 0, 10, 20, 30, 40
        }

        let mut pruned = queue.prune_by_bound(30.0);
        pruned.sort_unstable();
        assert_eq!(pruned, vec![3, 4]);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.total_added(), 5);
        assert_eq!(queue.pop().unwrap().id, 0);
        assert_eq!(queue.total_popped(), 1);
    }
}
