//! Dense bounded-variable simplex used as the LP oracle of the branch-and-cut core.
//!
//! The crate solves problems of the form
//!
//! ```text
//! minimize    c^T x
//! subject to  lo <= A x <= hi
//!             lb <= x <= ub
//! ```
//!
//! with a primal (two-phase) or dual simplex on a dense tableau. It keeps the
//! final basis and tableau of every solve so callers can:
//!
//! - warm-start after bound changes or appended rows (dual simplex),
//! - read tableau rows and basic columns (Gomory cuts),
//! - run iteration-limited probes (strong branching).
//!
//! # Example
//!
//! ```
//! use lp_core::{LpStatus, SimplexLp, SimplexSettings};
//!
//! // min x0 + x1  s.t.  x0 + 2 x1 >= 4,  3 x0 + x1 >= 3
//! let mut lp = SimplexLp::new(vec![1.0, 1.0], SimplexSettings::default());
//! lp.add_row(vec![1.0, 2.0], 4.0, f64::INFINITY, "a")?;
//! lp.add_row(vec![3.0, 1.0], 3.0, f64::INFINITY, "b")?;
//!
//! assert_eq!(lp.solve(), LpStatus::Optimal);
//! assert!((lp.objective_value() - 2.2).abs() < 1e-9);
//! # Ok::<(), lp_core::LpError>(())
//! ```

#![warn(clippy::all)]
#![allow(clippy::needless_range_loop)]

pub mod error;
pub mod linalg;
pub mod problem;
pub mod simplex;

pub use error::{LpError, LpResult};
pub use problem::{
    LpStatus, ObjSense, ProblemData, SimplexMethod, SimplexSettings, VarBound, VarType,
};
pub use simplex::{Basis, SimplexLp, VarStatus};
