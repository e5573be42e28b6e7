//! Branch-and-cut core for mixed-integer linear programs.
//!
//! Solves
//!
//! ```text
//! minimize    c^T x
//! subject to  A x >= b
//!             0 <= lb <= x <= ub,  x_j integer for j in I
//! ```
//!
//! by best-first branch-and-bound. Each node owns an LP relaxation (the
//! [`MasterBackend`] oracle) and tightens it with rounds of cutting planes
//! before branching:
//!
//! - **Gomory mixed-integer cuts** read off the optimal tableau, rounded to
//!   safe rationals
//! - **Disjunctive cuts** from a cut generating LP over the leaves of a
//!   subtree; cuts valid for the whole disjunction are shared with its open
//!   nodes
//! - **Pseudo-cost branching** bootstrapped by iteration-limited strong
//!   branching
//!
//! # Example
//!
//! ```
//! use branch_cut::{solve_mip, MipSettings, MipStatus};
//! use lp_core::linalg::sparse;
//! use lp_core::{ObjSense, ProblemData, VarType};
//!
//! // min 2 x0 + 5 x1  s.t.  x0 + 4 x1 >= 27, integer
//! let prob = ProblemData {
//!     A: sparse::from_triplets(1, 2, vec![(0, 0, 1.0), (0, 1, 4.0)]),
//!     b: vec![27.0],
//!     c: vec![2.0, 5.0],
//!     sense: ObjSense::Minimize,
//!     var_bounds: None,
//!     integrality: Some(vec![VarType::Integer; 2]),
//! };
//!
//! let sol = solve_mip(&prob, &MipSettings::default())?;
//! assert_eq!(sol.status, MipStatus::Optimal);
//! assert!((sol.obj_val - 35.0).abs() < 1e-6);
//! # Ok::<(), branch_cut::MipError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::needless_range_loop)]

pub mod cuts;
pub mod error;
pub mod master;
pub mod model;
pub mod numeric;
pub mod search;
pub mod settings;

pub use error::{MipError, MipResult};
pub use master::{CutSource, LinearCut, MasterBackend, MasterResult, MasterStatus, SimplexMaster};
pub use model::{Incumbent, MipProblem, MipSolution, MipStatus};
pub use search::{BranchAndBound, Node, SearchTree, SolveStats};
pub use settings::{
    BranchingRule, CglpReuse, CglpSeparation, CglpSettings, CutSettings, MipSettings,
    NodeSelection,
};

use lp_core::ProblemData;

/// Solve a MILP with the built-in simplex as node LP oracle.
///
/// Objective values in the result are in the problem's own sense.
pub fn solve_mip(prob: &ProblemData, settings: &MipSettings) -> MipResult<MipSolution> {
    let problem = MipProblem::new(prob.clone())?;
    let mut bb = BranchAndBound::new(problem, settings.clone())?;
    bb.solve()
}
