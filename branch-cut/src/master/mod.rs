//! Master problem (LP relaxation) management.

mod backend;
mod simplex_backend;

pub use backend::{CutSource, LinearCut, MasterBackend, MasterResult, MasterStatus};
pub use simplex_backend::SimplexMaster;
