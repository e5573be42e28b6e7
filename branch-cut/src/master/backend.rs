//! Master problem backend trait and types.

use lp_core::{Basis, VarStatus};

use crate::error::MipResult;

/// Status of master problem solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterStatus {
    /// Optimal solution found.
    Optimal,

    /// Master LP is infeasible (node can be pruned).
    Infeasible,

    /// Master LP is unbounded.
    Unbounded,

    /// Iteration budget ran out; the objective is a dual bound only when
    /// [`MasterResult::bound_valid`] is set.
    IterationLimit,

    /// Numerical difficulties.
    NumericalError,
}

/// Result from solving the master problem.
#[derive(Debug, Clone)]
pub struct MasterResult {
    /// Solve status.
    pub status: MasterStatus,

    /// Primal solution x (empty unless a point is available).
    pub x: Vec<f64>,

    /// Objective value (minimization direction).
    pub obj_val: f64,

    /// Row duals, one per master row.
    pub duals: Vec<f64>,

    /// Simplex iterations used.
    pub iterations: usize,

    /// Whether `obj_val` is a lower bound on the relaxation optimum.
    pub bound_valid: bool,
}

impl MasterResult {
    /// Create an infeasible result.
    pub fn infeasible() -> Self {
        Self {
            status: MasterStatus::Infeasible,
            x: Vec::new(),
            obj_val: f64::INFINITY,
            duals: Vec::new(),
            iterations: 0,
            bound_valid: true,
        }
    }
}

/// Source of a cut (for tracking and debugging).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutSource {
    /// Gomory mixed-integer cut read off a tableau row.
    Gomory {
        /// Tableau row the cut came from.
        row: usize,
    },

    /// Disjunctive cut from a CGLP.
    Cglp {
        /// Whether the cut holds for the whole disjunction it was derived
        /// from, so it may be shared with every open node of that disjunction.
        broadcastable: bool,
    },

    /// User-provided cut.
    User,
}

/// A linear cut: a^T x >= rhs.
#[derive(Debug, Clone)]
pub struct LinearCut {
    /// Coefficient vector (dense, length n).
    pub coefs: Vec<f64>,

    /// Right-hand side.
    pub rhs: f64,

    /// Optional name for debugging.
    pub name: Option<String>,

    /// Source of this cut.
    pub source: CutSource,
}

impl LinearCut {
    /// Create a new cut.
    pub fn new(coefs: Vec<f64>, rhs: f64, source: CutSource) -> Self {
        Self {
            coefs,
            rhs,
            name: None,
            source,
        }
    }

    /// Create a cut with a name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Left-hand side a^T x.
    pub fn activity(&self, x: &[f64]) -> f64 {
        self.coefs.iter().zip(x.iter()).map(|(a, x)| a * x).sum()
    }

    /// Compute violation: rhs - a^T x (positive means violated).
    pub fn violation(&self, x: &[f64]) -> f64 {
        self.rhs - self.activity(x)
    }

    /// Check if cut is violated by more than tolerance.
    pub fn is_violated(&self, x: &[f64], tol: f64) -> bool {
        self.violation(x) > tol
    }

    /// Euclidean norm of the coefficients.
    pub fn norm(&self) -> f64 {
        self.coefs.iter().map(|c| c * c).sum::<f64>().sqrt()
    }

    /// Signed distance `(a^T x - rhs) / ||a||`; negative when violated.
    pub fn depth(&self, x: &[f64]) -> f64 {
        let norm = self.norm();
        if norm < 1e-12 {
            return f64::INFINITY;
        }
        -self.violation(x) / norm
    }

    /// Number of nonzero coefficients.
    pub fn nnz(&self) -> usize {
        self.coefs.iter().filter(|c| c.abs() > 1e-12).count()
    }

    /// Largest absolute coefficient.
    pub fn max_abs_coef(&self) -> f64 {
        self.coefs.iter().fold(0.0_f64, |m, c| m.max(c.abs()))
    }

    /// Scale to `max |a_j| = 1`. Cuts with no usable coefficient are left alone.
    pub fn normalize(&mut self) {
        let scale = self.max_abs_coef();
        if scale <= 1e-12 {
            return;
        }
        self.coefs.iter_mut().for_each(|c| *c /= scale);
        self.rhs /= scale;
    }

    /// A cut is usable when every entry is finite and some coefficient is nonzero.
    pub fn is_valid(&self) -> bool {
        self.rhs.is_finite()
            && self.coefs.iter().all(|c| c.is_finite())
            && self.max_abs_coef() > 1e-12
    }

    /// Whether the cut may be shared with every open node of its disjunction.
    pub fn is_broadcastable(&self) -> bool {
        matches!(
            self.source,
            CutSource::Cglp {
                broadcastable: true
            }
        )
    }
}

/// Trait for master problem backends (LP solvers).
///
/// The master backend owns one LP relaxation: the root rows, the cut rows
/// added so far and the current variable bounds. Each search node holds its
/// own backend, so implementations must be cheap enough to clone.
pub trait MasterBackend: Clone {
    /// Number of structural variables.
    fn num_vars(&self) -> usize;

    /// Number of rows (root rows plus cuts).
    fn num_rows(&self) -> usize;

    /// Append a cut as a row `a^T x >= rhs`; returns its row index.
    fn add_cut(&mut self, cut: &LinearCut) -> MipResult<usize>;

    /// Add multiple cuts.
    fn add_cuts(&mut self, cuts: &[LinearCut]) -> MipResult<Vec<usize>> {
        cuts.iter().map(|c| self.add_cut(c)).collect()
    }

    /// Remove rows by index; later rows shift down.
    fn remove_rows(&mut self, rows: &[usize]) -> MipResult<()>;

    /// Name of row `i`.
    fn row_name(&self, i: usize) -> &str;

    /// Coefficients of row `i`.
    fn row(&self, i: usize) -> &[f64];

    /// Bounds `(lo, hi)` of row `i`.
    fn row_bounds(&self, i: usize) -> (f64, f64);

    /// Update variable bounds (for branching).
    fn set_var_bounds(&mut self, var: usize, lb: f64, ub: f64) -> MipResult<()>;

    /// Current bounds of a variable.
    fn var_bounds(&self, var: usize) -> (f64, f64);

    /// Solve the current master LP, warm-starting from the last basis.
    fn solve(&mut self) -> MasterResult;

    /// Solve with at most `max_iters` simplex iterations.
    fn solve_with_limit(&mut self, max_iters: usize) -> MasterResult;

    /// Final basis of the last solve.
    fn basis(&self) -> Option<Basis>;

    /// Warm-start the next solve from `basis`.
    fn set_basis(&mut self, basis: Basis) -> MipResult<()>;

    /// Basic column of each tableau row (columns `n..n+m` are row activities).
    fn basic_columns(&self) -> Option<&[usize]>;

    /// Tableau row `r`: `x_head[r] + sum_k t[k] x_k = 0`.
    fn tableau_row(&self, r: usize) -> Option<&[f64]>;

    /// Status of column `k` (structural or row activity).
    fn column_status(&self, k: usize) -> Option<VarStatus>;

    /// Bounds of column `k` (structural or row activity).
    fn column_bounds(&self, k: usize) -> (f64, f64);

    /// Value of column `k` at the current point.
    fn column_value(&self, k: usize) -> Option<f64>;
}
