//! MIP solution types.

use std::fmt;

use crate::search::SolveStats;

/// Status of the MIP solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MipStatus {
    /// Optimal solution found within the gap tolerance.
    Optimal,

    /// Problem is infeasible.
    Infeasible,

    /// An LP relaxation is unbounded; the search stopped at once.
    Unbounded,

    /// Node limit reached, best solution returned.
    NodeLimit,

    /// Time limit reached, best solution returned.
    TimeLimit,

    /// Search exhausted, but some node LPs failed numerically.
    NumericalError,
}

impl MipStatus {
    /// Returns true if the search stopped on a limit rather than a proof.
    pub fn is_limit(&self) -> bool {
        matches!(self, MipStatus::NodeLimit | MipStatus::TimeLimit)
    }

    /// Returns true if optimality was proven.
    pub fn is_optimal(&self) -> bool {
        matches!(self, MipStatus::Optimal)
    }
}

impl fmt::Display for MipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MipStatus::Optimal => "Optimal",
            MipStatus::Infeasible => "Infeasible",
            MipStatus::Unbounded => "Unbounded",
            MipStatus::NodeLimit => "Node Limit",
            MipStatus::TimeLimit => "Time Limit",
            MipStatus::NumericalError => "Numerical Error",
        };
        write!(f, "{}", s)
    }
}

/// Complete MIP solution with diagnostics.
///
/// Objective values are reported in the caller's objective sense.
#[derive(Debug, Clone)]
pub struct MipSolution {
    /// Solve status.
    pub status: MipStatus,

    /// Best integer feasible solution (if found).
    pub x: Option<Vec<f64>>,

    /// Objective value of `x` (infinite when there is none).
    pub obj_val: f64,

    /// Best known primal bound. May be finite without `x` when an initial
    /// primal bound was supplied.
    pub primal_bound: f64,

    /// Best dual bound (from LP relaxations).
    pub bound: f64,

    /// Relative optimality gap: |primal_bound - bound| / |primal_bound|.
    pub gap: f64,

    /// Number of B&B nodes evaluated.
    pub nodes_explored: u64,

    /// Number of cuts added to node LPs.
    pub cuts_added: u64,

    /// Total solve time in milliseconds.
    pub solve_time_ms: u64,

    /// Number of times incumbent was updated.
    pub incumbent_updates: u64,

    /// Counters collected during the search.
    pub stats: SolveStats,
}

impl Default for MipSolution {
    fn default() -> Self {
        Self {
            status: MipStatus::Infeasible,
            x: None,
            obj_val: f64::INFINITY,
            primal_bound: f64::INFINITY,
            bound: f64::NEG_INFINITY,
            gap: f64::INFINITY,
            nodes_explored: 0,
            cuts_added: 0,
            solve_time_ms: 0,
            incumbent_updates: 0,
            stats: SolveStats::default(),
        }
    }
}

impl MipSolution {
    /// Returns true if an integer feasible point is attached.
    pub fn has_solution(&self) -> bool {
        self.x.is_some()
    }

    /// Relative gap `|primal - dual| / |primal|`, infinite while either side is.
    pub fn compute_gap(primal: f64, dual: f64) -> f64 {
        if !(primal.is_finite() && dual.is_finite()) {
            return f64::INFINITY;
        }
        (primal - dual).abs() / primal.abs().max(1e-10)
    }
}

/// Best integer feasible point found so far, in the internal (minimization) sense.
///
/// The primal bound may start finite without a point when the caller
/// supplies a cutoff.
#[derive(Debug, Clone)]
pub struct Incumbent {
    x: Option<Vec<f64>>,
    primal_bound: f64,
    updates: u64,
}

impl Default for Incumbent {
    fn default() -> Self {
        Self::with_cutoff(f64::INFINITY)
    }
}

impl Incumbent {
    /// Incumbent with no point and primal bound `cutoff`.
    pub fn with_cutoff(cutoff: f64) -> Self {
        Self {
            x: None,
            primal_bound: cutoff,
            updates: 0,
        }
    }

    /// Current point, if one was accepted.
    pub fn x(&self) -> Option<&[f64]> {
        self.x.as_deref()
    }

    /// Objective of the current point, or the cutoff when there is none.
    pub fn primal_bound(&self) -> f64 {
        self.primal_bound
    }

    /// Number of accepted points.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Whether a point has been accepted.
    pub fn is_set(&self) -> bool {
        self.x.is_some()
    }

    /// Accept `x` if `obj` improves the primal bound by more than 1e-9.
    pub fn offer(&mut self, x: &[f64], obj: f64) -> bool {
        if obj >= self.primal_bound - 1e-9 {
            return false;
        }
        self.x = Some(x.to_vec());
        self.primal_bound = obj;
        self.updates += 1;
        true
    }

    /// Relative gap between the primal bound and `dual_bound`.
    pub fn gap(&self, dual_bound: f64) -> f64 {
        MipSolution::compute_gap(self.primal_bound, dual_bound)
    }

    /// Whether a point exists and its gap to `dual_bound` is within `tol`.
    pub fn closes_gap(&self, dual_bound: f64, tol: f64) -> bool {
        self.is_set() && self.gap(dual_bound) <= tol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offer_keeps_best_point() {
        let mut inc = Incumbent::default();
        assert!(!inc.is_set());
        assert!(inc.primal_bound().is_infinite());

        assert!(inc.offer(&[3.0, 0.0], 12.0));
        assert!(!inc.offer(&[2.0, 2.0], 14.0));
        // Within 1e-9 counts as no improvement.
        assert!(!inc.offer(&[2.0, 2.0], 12.0 - 1e-12));
        assert!(inc.offer(&[1.0, 2.0], 9.0));

        assert_eq!(inc.x(), Some(&[1.0, 2.0][..]));
        assert_eq!(inc.primal_bound(), 9.0);
        assert_eq!(inc.updates(), 2);
    }

    #[test]
    fn test_cutoff_rejects_worse_points() {
        let mut inc = Incumbent::with_cutoff(7.0);
        assert!(!inc.is_set());
        assert!(!inc.offer(&[1.0], 8.0));
        assert!(!inc.closes_gap(7.0, 1e-4));

        assert!(inc.offer(&[1.0], 6.0));
        assert!(inc.closes_gap(6.0, 1e-4));
        assert!(!inc.closes_gap(5.0, 1e-4));
    }

    #[test]
    fn test_compute_gap() {
        assert!((MipSolution::compute_gap(-20.0, -25.0) - 0.25).abs() < 1e-12);
        assert_eq!(MipSolution::compute_gap(4.0, 4.0), 0.0);
        assert_eq!(MipSolution::compute_gap(f64::INFINITY, 1.0), f64::INFINITY);
        assert_eq!(MipSolution::compute_gap(3.0, f64::NEG_INFINITY), f64::INFINITY);
    }

    #[test]
    fn test_status_display_and_kind() {
        assert!(MipStatus::TimeLimit.is_limit());
        assert!(!MipStatus::NumericalError.is_limit());
        assert!(MipStatus::Optimal.is_optimal());
        assert!(!MipStatus::Infeasible.is_optimal());
        assert_eq!(MipStatus::NodeLimit.to_string(), "Node Limit");
        assert!(!MipSolution::default().has_solution());
    }
}
