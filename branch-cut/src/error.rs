//! Error types for the MIP solver.

use lp_core::LpError;
use thiserror::Error;

/// Errors that can occur during MIP solving.
#[derive(Error, Debug)]
pub enum MipError {
    /// Problem validation failed
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// Internal solver error
    #[error("Internal error: {0}")]
    InternalError(String),

    /// LP oracle rejected an edit
    #[error("LP error: {0}")]
    Lp(#[from] LpError),
}

/// Result type for MIP operations.
pub type MipResult<T> = Result<T, MipError>;
