//! Linear algebra helpers.
//!
//! Sparse problem matrices and the dense vector kernels the simplex uses.

pub mod sparse;
