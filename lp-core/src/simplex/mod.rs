//! Dense bounded-variable simplex.
//!
//! [`SimplexLp`] holds an editable LP
//!
//! ```text
//! minimize    c^T x
//! subject to  lo_i <= a_i x <= hi_i
//!             lb_j <= x_j <= ub_j
//! ```
//!
//! and solves it with a primal or dual simplex on a dense tableau. The final
//! basis is kept between solves so that bound changes and appended rows
//! warm-start from it, and the final tableau stays queryable until the LP is
//! edited again.

mod basis;
mod dual;
mod primal;
mod tableau;

pub use basis::{Basis, VarStatus};

use crate::error::{LpError, LpResult};
use crate::linalg::sparse;
use crate::problem::{LpStatus, ProblemData, SimplexMethod, SimplexSettings};
use dual::{dual_simplex, DualOutcome};
use primal::{primal_simplex, Phase, PrimalOutcome};
use tableau::Tableau;

/// Editable LP with a warm-startable simplex solver.
#[derive(Debug, Clone)]
pub struct SimplexLp {
    n: usize,
    obj: Vec<f64>,
    col_lb: Vec<f64>,
    col_ub: Vec<f64>,
    rows: Vec<Vec<f64>>,
    row_lo: Vec<f64>,
    row_hi: Vec<f64>,
    row_names: Vec<String>,
    settings: SimplexSettings,
    method: SimplexMethod,
    basis: Option<Basis>,
    tableau: Option<Tableau>,
    status: Option<LpStatus>,
    iterations: usize,
    limit_in_dual: bool,
}

impl SimplexLp {
    /// Empty LP over `n` columns with objective `obj` and bounds `[0, +inf)`.
    pub fn new(obj: Vec<f64>, settings: SimplexSettings) -> Self {
        let n = obj.len();
        Self {
            n,
            obj,
            col_lb: vec![0.0; n],
            col_ub: vec![f64::INFINITY; n],
            rows: Vec::new(),
            row_lo: Vec::new(),
            row_hi: Vec::new(),
            row_names: Vec::new(),
            settings,
            method: SimplexMethod::default(),
            basis: None,
            tableau: None,
            status: None,
            iterations: 0,
            limit_in_dual: false,
        }
    }

    /// Build the LP relaxation of `prob`: rows `A x >= b`, objective in the
    /// minimization direction, bounds from `var_bounds`.
    pub fn from_problem(prob: &ProblemData, settings: SimplexSettings) -> LpResult<Self> {
        prob.validate().map_err(LpError::InvalidProblem)?;

        let mut lp = Self::new(prob.min_objective(), settings);
        let (lb, ub) = prob.column_bounds();
        for (j, (&l, &u)) in lb.iter().zip(&ub).enumerate() {
            lp.set_col_bounds(j, l, u)?;
        }
        for (i, row) in sparse::to_dense_rows(&prob.A).into_iter().enumerate() {
            lp.add_row(row, prob.b[i], f64::INFINITY, format!("row_{}", i))?;
        }
        Ok(lp)
    }

    /// Append a row `lo <= coefs·x <= hi`; returns its index.
    ///
    /// The row activity enters the saved basis as basic, so the next solve
    /// warm-starts from a dual feasible basis.
    pub fn add_row(
        &mut self,
        coefs: Vec<f64>,
        lo: f64,
        hi: f64,
        name: impl Into<String>,
    ) -> LpResult<usize> {
        if coefs.len() != self.n {
            return Err(LpError::DimensionMismatch {
                what: "row coefficients",
                got: coefs.len(),
                expected: self.n,
            });
        }
        if lo.is_nan() || hi.is_nan() {
            return Err(LpError::InvalidBounds {
                col: self.n + self.rows.len(),
                lower: lo,
                upper: hi,
            });
        }
        self.rows.push(coefs);
        self.row_lo.push(lo);
        self.row_hi.push(hi);
        self.row_names.push(name.into());
        if let Some(basis) = self.basis.as_mut() {
            basis.push_row();
        }
        self.invalidate();
        Ok(self.rows.len() - 1)
    }

    /// Remove the given rows; later rows shift down.
    pub fn remove_rows(&mut self, rows: &[usize]) -> LpResult<()> {
        if let Some(&bad) = rows.iter().find(|&&r| r >= self.rows.len()) {
            return Err(LpError::IndexOutOfRange {
                index: bad,
                len: self.rows.len(),
            });
        }
        let mut sorted = rows.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        for &r in sorted.iter().rev() {
            self.rows.remove(r);
            self.row_lo.remove(r);
            self.row_hi.remove(r);
            self.row_names.remove(r);
        }
        if let Some(basis) = self.basis.as_mut() {
            basis.remove_rows(&sorted);
        }
        self.invalidate();
        Ok(())
    }

    /// Set the bounds of column `j`. Crossed bounds are accepted and make the LP infeasible.
    pub fn set_col_bounds(&mut self, j: usize, lb: f64, ub: f64) -> LpResult<()> {
        if j >= self.n {
            return Err(LpError::IndexOutOfRange {
                index: j,
                len: self.n,
            });
        }
        if lb.is_nan() || ub.is_nan() || lb == f64::INFINITY || ub == f64::NEG_INFINITY {
            return Err(LpError::InvalidBounds {
                col: j,
                lower: lb,
                upper: ub,
            });
        }
        self.col_lb[j] = lb;
        self.col_ub[j] = ub;
        self.invalidate();
        Ok(())
    }

    /// Bounds `(lb, ub)` of structural column `j`.
    pub fn col_bounds(&self, j: usize) -> (f64, f64) {
        (self.col_lb[j], self.col_ub[j])
    }

    /// Replace the objective.
    pub fn set_objective(&mut self, obj: Vec<f64>) -> LpResult<()> {
        if obj.len() != self.n {
            return Err(LpError::DimensionMismatch {
                what: "objective",
                got: obj.len(),
                expected: self.n,
            });
        }
        self.obj = obj;
        self.invalidate();
        Ok(())
    }

    /// Objective coefficients.
    pub fn objective(&self) -> &[f64] {
        &self.obj
    }

    /// Choose the simplex variant.
    pub fn set_method(&mut self, method: SimplexMethod) {
        self.method = method;
    }

    /// Warm-start the next solve from `basis`.
    pub fn set_basis(&mut self, basis: Basis) -> LpResult<()> {
        if !basis.fits(self.n, self.rows.len()) {
            return Err(LpError::DimensionMismatch {
                what: "basis",
                got: basis.cols.len() + basis.rows.len(),
                expected: self.n + self.rows.len(),
            });
        }
        self.basis = Some(basis);
        self.invalidate();
        Ok(())
    }

    /// Forget the saved basis; the next solve starts from the slack basis.
    pub fn clear_basis(&mut self) {
        self.basis = None;
        self.invalidate();
    }

    /// Solve with the configured iteration cap.
    pub fn solve(&mut self) -> LpStatus {
        self.solve_with_limit(self.settings.max_iter)
    }

    /// Solve with at most `limit` pivots.
    ///
    /// On `IterationLimit` from a dual feasible start the objective value is
    /// still a valid lower bound on the LP optimum.
    pub fn solve_with_limit(&mut self, limit: usize) -> LpStatus {
        self.limit_in_dual = false;
        let status = if self.has_crossed_bounds() {
            self.tableau = None;
            LpStatus::Infeasible
        } else {
            let mut tab = self.starting_tableau();
            let mut iters = 0;
            let mut in_dual = false;
            let status = self.run(&mut tab, &mut iters, limit, &mut in_dual);
            self.iterations = iters;
            self.limit_in_dual = status == LpStatus::IterationLimit && in_dual;
            self.basis = Some(tab.basis());
            self.tableau = Some(tab);
            status
        };
        log::debug!(
            "simplex: {} rows x {} cols -> {} after {} iterations",
            self.rows.len(),
            self.n,
            status,
            self.iterations
        );
        self.status = Some(status);
        status
    }

    fn run(
        &self,
        tab: &mut Tableau,
        iters: &mut usize,
        limit: usize,
        in_dual: &mut bool,
    ) -> LpStatus {
        let tol = &self.settings;

        if !tab.is_primal_feasible(tol.tol_primal) {
            let d = tab.reduced_costs(&tab.cost);
            if self.method == SimplexMethod::Auto && tab.is_dual_feasible(&d, tol.tol_dual) {
                *in_dual = true;
                match dual_simplex(tab, tol, iters, limit) {
                    DualOutcome::Optimal => {}
                    DualOutcome::Infeasible => return LpStatus::Infeasible,
                    DualOutcome::IterationLimit => return LpStatus::IterationLimit,
                }
            } else {
                match primal_simplex(tab, Phase::One, tol, iters, limit) {
                    PrimalOutcome::Optimal => {}
                    PrimalOutcome::Infeasible => return LpStatus::Infeasible,
                    PrimalOutcome::IterationLimit => return LpStatus::IterationLimit,
                    PrimalOutcome::Unbounded | PrimalOutcome::Numerical => {
                        return LpStatus::NumericalError
                    }
                }
            }
        }

        match primal_simplex(tab, Phase::Two, tol, iters, limit) {
            PrimalOutcome::Optimal => LpStatus::Optimal,
            PrimalOutcome::Unbounded => LpStatus::Unbounded,
            PrimalOutcome::IterationLimit => LpStatus::IterationLimit,
            PrimalOutcome::Infeasible | PrimalOutcome::Numerical => LpStatus::NumericalError,
        }
    }

    fn starting_tableau(&self) -> Tableau {
        let slack = || {
            Tableau::slack_basis(
                &self.rows,
                &self.row_lo,
                &self.row_hi,
                &self.col_lb,
                &self.col_ub,
                &self.obj,
            )
        };
        let mut tab = slack();
        if let Some(basis) = self.basis.as_ref() {
            if basis.fits(self.n, self.rows.len())
                && !tab.apply_basis(basis, self.settings.tol_pivot)
            {
                log::warn!("simplex: saved basis is singular, restarting from slack basis");
                tab = slack();
            }
        }
        tab
    }

    fn has_crossed_bounds(&self) -> bool {
        let cols = self.col_lb.iter().zip(&self.col_ub);
        let rows = self.row_lo.iter().zip(&self.row_hi);
        cols.chain(rows).any(|(&l, &u)| l > u)
    }

    fn invalidate(&mut self) {
        self.tableau = None;
        self.status = None;
    }

    /// Status of the last solve, `None` if the LP changed since.
    pub fn status(&self) -> Option<LpStatus> {
        self.status
    }

    /// Whether [`objective_value`](Self::objective_value) bounds the LP
    /// optimum from below: the last solve was optimal, or stopped on its
    /// iteration cap inside the dual simplex.
    pub fn objective_is_bound(&self) -> bool {
        match self.status {
            Some(LpStatus::Optimal) | Some(LpStatus::Infeasible) => true,
            Some(LpStatus::IterationLimit) => self.limit_in_dual,
            _ => false,
        }
    }

    /// Objective value at the current point (minimization direction).
    pub fn objective_value(&self) -> f64 {
        match (&self.tableau, self.status) {
            (_, Some(LpStatus::Infeasible)) => f64::INFINITY,
            (_, Some(LpStatus::Unbounded)) => f64::NEG_INFINITY,
            (Some(tab), _) => tab.objective(),
            (None, _) => f64::NAN,
        }
    }

    /// Structural values at the current point.
    pub fn primal(&self) -> Option<Vec<f64>> {
        self.tableau.as_ref().map(|tab| tab.x[..self.n].to_vec())
    }

    /// Row activities `a_i x` at the current point.
    pub fn row_activity(&self) -> Option<Vec<f64>> {
        self.tableau.as_ref().map(|tab| tab.x[self.n..].to_vec())
    }

    /// Row duals: the reduced cost of each row activity. Nonnegative on rows
    /// tight at their lower bound at an optimal basis.
    pub fn duals(&self) -> Option<Vec<f64>> {
        self.tableau
            .as_ref()
            .map(|tab| tab.reduced_costs(&tab.cost)[self.n..].to_vec())
    }

    /// Reduced costs of the structural columns.
    pub fn reduced_costs(&self) -> Option<Vec<f64>> {
        self.tableau
            .as_ref()
            .map(|tab| tab.reduced_costs(&tab.cost)[..self.n].to_vec())
    }

    /// Saved basis (the final basis of the last solve, adjusted for row edits).
    pub fn basis(&self) -> Option<&Basis> {
        self.basis.as_ref()
    }

    /// Pivots performed by the last solve.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Basic column (combined numbering) of each tableau row.
    pub fn basic_columns(&self) -> Option<&[usize]> {
        self.tableau.as_ref().map(|tab| tab.head.as_slice())
    }

    /// Tableau row `r`: `x_head[r] + sum_k t[k] x_k = 0` over all columns.
    pub fn tableau_row(&self, r: usize) -> Option<&[f64]> {
        self.tableau
            .as_ref()
            .and_then(|tab| tab.t.get(r))
            .map(|row| row.as_slice())
    }

    /// Status of column `k` in the combined `[structural | row]` numbering.
    pub fn column_status(&self, k: usize) -> Option<VarStatus> {
        self.tableau
            .as_ref()
            .map(|tab| tab.status[k])
            .or_else(|| self.basis.as_ref().map(|b| b.status(k)))
    }

    /// Bounds of column `k` in the combined numbering.
    pub fn column_bounds(&self, k: usize) -> (f64, f64) {
        if k < self.n {
            (self.col_lb[k], self.col_ub[k])
        } else {
            (self.row_lo[k - self.n], self.row_hi[k - self.n])
        }
    }

    /// Value of column `k` in the combined numbering at the current point.
    pub fn column_value(&self, k: usize) -> Option<f64> {
        self.tableau.as_ref().map(|tab| tab.x[k])
    }

    /// Coefficients of row `i`.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.rows[i]
    }

    /// Bounds `(lo, hi)` of row `i`.
    pub fn row_bounds(&self, i: usize) -> (f64, f64) {
        (self.row_lo[i], self.row_hi[i])
    }

    /// Name of row `i`.
    pub fn row_name(&self, i: usize) -> &str {
        &self.row_names[i]
    }

    /// Index of the row called `name`.
    pub fn find_row(&self, name: &str) -> Option<usize> {
        self.row_names.iter().position(|r| r == name)
    }

    /// Number of structural columns.
    pub fn num_cols(&self) -> usize {
        self.n
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Simplex tolerances in use.
    pub fn settings(&self) -> &SimplexSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> SimplexLp {
        // min x0 + x1  s.t.  x0 + 2 x1 >= 4,  3 x0 + x1 >= 3
        let mut lp = SimplexLp::new(vec![1.0, 1.0], SimplexSettings::default());
        lp.add_row(vec![1.0, 2.0], 4.0, f64::INFINITY, "a").unwrap();
        lp.add_row(vec![3.0, 1.0], 3.0, f64::INFINITY, "b").unwrap();
        lp
    }

    #[test]
    fn test_solve_basic() {
        let mut lp = two_by_two();
        assert_eq!(lp.solve(), LpStatus::Optimal);
        assert!((lp.objective_value() - 2.2).abs() < 1e-9);
        let x = lp.primal().unwrap();
        assert!((x[0] - 0.4).abs() < 1e-9);
        assert!((x[1] - 1.8).abs() < 1e-9);

        // Both rows tight, duals positive and certify the objective.
        let y = lp.duals().unwrap();
        assert!(y.iter().all(|&v| v > 0.0));
        let dual_obj = 4.0 * y[0] + 3.0 * y[1];
        assert!((dual_obj - 2.2).abs() < 1e-9);
    }

    #[test]
    fn test_warm_start_after_bound_change() {
        let mut lp = two_by_two();
        lp.solve();
        let cold_iters = lp.iterations();

        lp.set_col_bounds(0, 1.0, f64::INFINITY).unwrap();
        assert_eq!(lp.solve(), LpStatus::Optimal);
        // x0 = 1, x1 = 1.5
        assert!((lp.objective_value() - 2.5).abs() < 1e-9);
        assert!(lp.iterations() <= cold_iters);
    }

    #[test]
    fn test_add_and_remove_rows() {
        let mut lp = two_by_two();
        lp.solve();
        let r = lp.add_row(vec![1.0, 0.0], 1.0, f64::INFINITY, "cut").unwrap();
        assert_eq!(r, 2);
        assert_eq!(lp.find_row("cut"), Some(2));
        assert_eq!(lp.solve(), LpStatus::Optimal);
        assert!((lp.objective_value() - 2.5).abs() < 1e-9);

        lp.remove_rows(&[2]).unwrap();
        assert_eq!(lp.num_rows(), 2);
        assert_eq!(lp.solve(), LpStatus::Optimal);
        assert!((lp.objective_value() - 2.2).abs() < 1e-9);

        assert!(lp.remove_rows(&[5]).is_err());
        assert!(lp.add_row(vec![1.0], 0.0, 1.0, "short").is_err());
    }

    #[test]
    fn test_crossed_bounds_infeasible() {
        let mut lp = two_by_two();
        lp.set_col_bounds(0, 2.0, 1.0).unwrap();
        assert_eq!(lp.solve(), LpStatus::Infeasible);
        assert_eq!(lp.objective_value(), f64::INFINITY);
    }

    #[test]
    fn test_tableau_row_identity() {
        let mut lp = two_by_two();
        lp.solve();
        let n = lp.num_cols();
        let heads = lp.basic_columns().unwrap().to_vec();
        for (r, &h) in heads.iter().enumerate() {
            let row = lp.tableau_row(r).unwrap();
            assert!((row[h] - 1.0).abs() < 1e-12);
            let mut lhs = lp.column_value(h).unwrap();
            for k in 0..n + lp.num_rows() {
                if k != h {
                    lhs += row[k] * lp.column_value(k).unwrap();
                }
            }
            assert!(lhs.abs() < 1e-9);
        }
    }

    #[test]
    fn test_iteration_limit() {
        let mut lp = two_by_two();
        assert_eq!(lp.solve_with_limit(0), LpStatus::IterationLimit);
        assert_eq!(lp.solve(), LpStatus::Optimal);
        assert!(lp.objective_is_bound());
    }

    #[test]
    fn test_iteration_limit_bound_validity() {
        // Slack basis is dual feasible: the dual simplex stops below the optimum.
        let mut lp = two_by_two();
        assert_eq!(lp.solve_with_limit(0), LpStatus::IterationLimit);
        assert!(lp.objective_is_bound());
        assert!(lp.objective_value() <= 2.2 + 1e-9);

        // Negative cost on x0 breaks dual feasibility, so phase one runs instead.
        let mut lp = two_by_two();
        lp.set_objective(vec![-1.0, 1.0]).unwrap();
        lp.set_col_bounds(0, 0.0, 10.0).unwrap();
        assert_eq!(lp.solve_with_limit(0), LpStatus::IterationLimit);
        assert!(!lp.objective_is_bound());
    }
}
