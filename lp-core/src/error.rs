//! Error types for the simplex oracle.

use thiserror::Error;

/// Errors that can occur while building or querying an LP.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LpError {
    /// Problem data failed validation
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// A vector did not match the LP dimensions
    #[error("Dimension mismatch: {what} has length {got}, expected {expected}")]
    DimensionMismatch {
        /// Which input was wrong
        what: &'static str,
        /// Length supplied
        got: usize,
        /// Length required
        expected: usize,
    },

    /// Column or row index out of range
    #[error("Index {index} out of range (len={len})")]
    IndexOutOfRange {
        /// Offending index
        index: usize,
        /// Valid length
        len: usize,
    },

    /// Lower bound above upper bound, or NaN bound
    #[error("Invalid bounds on column {col}: [{lower}, {upper}]")]
    InvalidBounds {
        /// Column index
        col: usize,
        /// Lower bound supplied
        lower: f64,
        /// Upper bound supplied
        upper: f64,
    },
}

/// Result type for LP operations.
pub type LpResult<T> = Result<T, LpError>;
