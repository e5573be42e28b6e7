//! Branch-and-bound search: nodes, branching, the tree and the driver.

mod branching;
mod context;
mod driver;
mod node;
mod queue;
mod tree;

pub use branching::{most_fractional, PseudoCost, PseudoCostBrancher};
pub use context::{SolveContext, SolveStats};
pub use driver::BranchAndBound;
pub use node::{BoundOutcome, BranchInfo, Direction, Node, NodeId};
pub use queue::{key_fn, KeyFn, NodeQueue, QueueEntry};
pub use tree::SearchTree;
