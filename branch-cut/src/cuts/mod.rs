//! Cutting planes for the node LPs.
//!
//! - Gomory mixed-integer cuts read off optimal tableau rows
//! - Disjunctive cuts from a cut generating LP over a subtree's leaves
//! - A per-node cut pool and the selection rule that moves cuts into the LP

pub mod cglp;
pub mod gomory;
mod pool;
pub mod selection;

pub use cglp::{Cglp, DisjunctiveTerm};
pub use gomory::GomoryGenerator;
pub use pool::{CutPool, CutPoolStats};
pub use selection::{angle_degrees, CutSelector};
