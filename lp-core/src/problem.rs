//! Problem data structures and validation.
//!
//! This module defines the canonical linear problem representation handed to
//! the simplex oracle and all associated types.

use std::fmt;

use crate::linalg::sparse::SparseCsc;

/// Linear problem in normalized covering form.
///
/// ```text
/// minimize    c^T x          (or maximize, see `sense`)
/// subject to  A x >= b
///             l <= x <= u
/// ```
///
/// Variables without an explicit bound default to `0 <= x < +inf`, which is the
/// `x >= 0` normalization the branch-and-cut layer relies on.
///
/// # Dimensions
///
/// - `n`: number of variables (length of c)
/// - `m`: number of constraints (length of b, number of rows in A)
#[derive(Debug, Clone)]
#[allow(non_snake_case)] // A is standard mathematical notation
pub struct ProblemData {
    /// Constraint matrix A (m × n, CSC format)
    pub A: SparseCsc,

    /// Constraint right-hand side b (length m)
    pub b: Vec<f64>,

    /// Linear cost vector c (length n)
    pub c: Vec<f64>,

    /// Objective direction
    pub sense: ObjSense,

    /// Optional variable bounds
    pub var_bounds: Option<Vec<VarBound>>,

    /// Optional integrality constraints for mixed-integer problems
    pub integrality: Option<Vec<VarType>>,
}

/// Objective direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjSense {
    /// Minimize c^T x
    #[default]
    Minimize,
    /// Maximize c^T x (solved internally as minimize -c^T x)
    Maximize,
}

impl ObjSense {
    /// Multiplier mapping the caller's objective to the internal minimization.
    pub fn sign(&self) -> f64 {
        match self {
            ObjSense::Minimize => 1.0,
            ObjSense::Maximize => -1.0,
        }
    }
}

/// Variable bound specification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarBound {
    /// Variable index
    pub var: usize,
    /// Lower bound (None = keep the default of 0)
    pub lower: Option<f64>,
    /// Upper bound (None = +∞)
    pub upper: Option<f64>,
}

/// Variable type for mixed-integer problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    /// Continuous variable
    Continuous,
    /// Integer variable
    Integer,
    /// Binary variable (0 or 1)
    Binary,
}

/// Simplex settings and tolerances.
#[derive(Debug, Clone)]
pub struct SimplexSettings {
    /// Maximum number of simplex iterations per solve
    pub max_iter: usize,

    /// Primal feasibility tolerance (relative to the bound magnitude)
    pub tol_primal: f64,

    /// Dual feasibility (reduced cost) tolerance
    pub tol_dual: f64,

    /// Smallest tableau entry accepted as a pivot
    pub tol_pivot: f64,

    /// Consecutive degenerate pivots before switching to Bland's rule
    pub bland_after: usize,
}

impl Default for SimplexSettings {
    fn default() -> Self {
        Self {
            max_iter: 20_000,
            tol_primal: 1e-9,
            tol_dual: 1e-9,
            tol_pivot: 1e-9,
            bland_after: 50,
        }
    }
}

/// Which simplex variant drives the solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimplexMethod {
    /// Dual simplex when the starting basis is dual feasible, primal otherwise.
    #[default]
    Auto,
    /// Always primal simplex (phase one if needed, then phase two).
    Primal,
}

/// Solution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpStatus {
    /// Optimal basis found
    Optimal,

    /// No point satisfies the constraints
    Infeasible,

    /// Objective is unbounded below
    Unbounded,

    /// Iteration limit reached before a verdict
    IterationLimit,

    /// Pivoting broke down numerically
    NumericalError,
}

impl fmt::Display for LpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LpStatus::Optimal => write!(f, "Optimal"),
            LpStatus::Infeasible => write!(f, "Infeasible"),
            LpStatus::Unbounded => write!(f, "Unbounded"),
            LpStatus::IterationLimit => write!(f, "Iteration Limit"),
            LpStatus::NumericalError => write!(f, "Numerical Error"),
        }
    }
}

impl ProblemData {
    /// Get the number of variables (n)
    pub fn num_vars(&self) -> usize {
        self.c.len()
    }

    /// Get the number of constraints (m)
    pub fn num_constraints(&self) -> usize {
        self.b.len()
    }

    /// Validate problem dimensions and bounds
    pub fn validate(&self) -> Result<(), String> {
        let n = self.num_vars();
        let m = self.num_constraints();

        if self.A.rows() != m {
            return Err(format!("A has {} rows, expected {}", self.A.rows(), m));
        }
        if self.A.cols() != n {
            return Err(format!("A has {} cols, expected {}", self.A.cols(), n));
        }

        if let Some((i, _)) = self.b.iter().enumerate().find(|(_, v)| v.is_nan()) {
            return Err(format!("b[{}] is NaN", i));
        }
        if let Some((j, _)) = self.c.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(format!("c[{}] is not finite", j));
        }

        if let Some(ref bounds) = self.var_bounds {
            for bound in bounds {
                if bound.var >= n {
                    return Err(format!(
                        "Bound on variable {} out of range (n={})",
                        bound.var, n
                    ));
                }
                if let Some(l) = bound.lower {
                    if !l.is_finite() {
                        return Err(format!(
                            "Variable {} has non-finite lower bound {}",
                            bound.var, l
                        ));
                    }
                }
            }
        }

        if let Some(ref int_types) = self.integrality {
            if int_types.len() != n {
                return Err(format!(
                    "Integrality vector has length {}, expected {}",
                    int_types.len(),
                    n
                ));
            }
        }

        Ok(())
    }

    /// Resolve the effective column bounds (defaults `[0, +inf)`).
    ///
    /// Later entries for the same variable override earlier ones.
    pub fn column_bounds(&self) -> (Vec<f64>, Vec<f64>) {
        let n = self.num_vars();
        let mut lb = vec![0.0; n];
        let mut ub = vec![f64::INFINITY; n];

        if let Some(ref bounds) = self.var_bounds {
            for bound in bounds {
                if let Some(l) = bound.lower {
                    lb[bound.var] = l;
                }
                if let Some(u) = bound.upper {
                    ub[bound.var] = u;
                }
            }
        }

        (lb, ub)
    }

    /// Objective coefficients in the internal minimization direction.
    pub fn min_objective(&self) -> Vec<f64> {
        let sign = self.sense.sign();
        self.c.iter().map(|&cj| sign * cj).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::sparse;

    fn small_problem() -> ProblemData {
        ProblemData {
            A: sparse::from_triplets(1, 2, vec![(0, 0, 1.0), (0, 1, 1.0)]),
            b: vec![1.0],
            c: vec![1.0, 2.0],
            sense: ObjSense::Maximize,
            var_bounds: Some(vec![VarBound {
                var: 1,
                lower: Some(0.5),
                upper: Some(3.0),
            }]),
            integrality: None,
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(small_problem().validate().is_ok());
    }

    #[test]
    fn test_validate_bad_dims() {
        let mut prob = small_problem();
        prob.b.push(2.0);
        assert!(prob.validate().is_err());

        let mut prob = small_problem();
        prob.integrality = Some(vec![VarType::Integer]);
        assert!(prob.validate().is_err());
    }

    #[test]
    fn test_validate_bounds() {
        let mut prob = small_problem();
        prob.var_bounds = Some(vec![VarBound {
            var: 7,
            lower: None,
            upper: None,
        }]);
        assert!(prob.validate().is_err());

        let mut prob = small_problem();
        prob.var_bounds = Some(vec![VarBound {
            var: 0,
            lower: Some(f64::NEG_INFINITY),
            upper: None,
        }]);
        assert!(prob.validate().is_err());
    }

    #[test]
    fn test_column_bounds_defaults() {
        let (lb, ub) = small_problem().column_bounds();
        assert_eq!(lb, vec![0.0, 0.5]);
        assert_eq!(ub[0], f64::INFINITY);
        assert_eq!(ub[1], 3.0);
    }

    #[test]
    fn test_min_objective_flips_for_max() {
        assert_eq!(small_problem().min_objective(), vec![-1.0, -2.0]);
    }
}
