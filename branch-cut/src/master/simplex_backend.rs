//! Master backend on the dense simplex from `lp-core`.

use lp_core::{Basis, LpStatus, SimplexLp, SimplexSettings, VarStatus};

use super::{LinearCut, MasterBackend, MasterResult, MasterStatus};
use crate::error::MipResult;
use crate::model::MipProblem;

/// Master backend using the lp-core simplex.
#[derive(Debug, Clone)]
pub struct SimplexMaster {
    lp: SimplexLp,
    next_cut: usize,
}

impl SimplexMaster {
    /// Build the root relaxation of `prob`.
    pub fn new(prob: &MipProblem, settings: SimplexSettings) -> MipResult<Self> {
        Ok(Self {
            lp: prob.root_lp(settings)?,
            next_cut: 0,
        })
    }

    /// Underlying LP.
    pub fn lp(&self) -> &SimplexLp {
        &self.lp
    }

    fn result(&self, status: LpStatus) -> MasterResult {
        let status = match status {
            LpStatus::Optimal => MasterStatus::Optimal,
            LpStatus::Infeasible => MasterStatus::Infeasible,
            LpStatus::Unbounded => MasterStatus::Unbounded,
            LpStatus::IterationLimit => MasterStatus::IterationLimit,
            LpStatus::NumericalError => MasterStatus::NumericalError,
        };
        if status == MasterStatus::Infeasible {
            return MasterResult {
                iterations: self.lp.iterations(),
                ..MasterResult::infeasible()
            };
        }
        MasterResult {
            status,
            x: self.lp.primal().unwrap_or_default(),
            obj_val: self.lp.objective_value(),
            duals: self.lp.duals().unwrap_or_default(),
            iterations: self.lp.iterations(),
            bound_valid: self.lp.objective_is_bound(),
        }
    }
}

impl MasterBackend for SimplexMaster {
    fn num_vars(&self) -> usize {
        self.lp.num_cols()
    }

    fn num_rows(&self) -> usize {
        self.lp.num_rows()
    }

    fn add_cut(&mut self, cut: &LinearCut) -> MipResult<usize> {
        let name = match &cut.name {
            Some(name) => name.clone(),
            None => format!("cut_{}", self.next_cut),
        };
        self.next_cut += 1;
        Ok(self
            .lp
            .add_row(cut.coefs.clone(), cut.rhs, f64::INFINITY, name)?)
    }

    fn remove_rows(&mut self, rows: &[usize]) -> MipResult<()> {
        Ok(self.lp.remove_rows(rows)?)
    }

    fn row_name(&self, i: usize) -> &str {
        self.lp.row_name(i)
    }

    fn row(&self, i: usize) -> &[f64] {
        self.lp.row(i)
    }

    fn row_bounds(&self, i: usize) -> (f64, f64) {
        self.lp.row_bounds(i)
    }

    fn set_var_bounds(&mut self, var: usize, lb: f64, ub: f64) -> MipResult<()> {
        Ok(self.lp.set_col_bounds(var, lb, ub)?)
    }

    fn var_bounds(&self, var: usize) -> (f64, f64) {
        self.lp.col_bounds(var)
    }

    fn solve(&mut self) -> MasterResult {
        let status = self.lp.solve();
        self.result(status)
    }

    fn solve_with_limit(&mut self, max_iters: usize) -> MasterResult {
        let status = self.lp.solve_with_limit(max_iters);
        self.result(status)
    }

    fn basis(&self) -> Option<Basis> {
        self.lp.basis().cloned()
    }

    fn set_basis(&mut self, basis: Basis) -> MipResult<()> {
        Ok(self.lp.set_basis(basis)?)
    }

    fn basic_columns(&self) -> Option<&[usize]> {
        self.lp.basic_columns()
    }

    fn tableau_row(&self, r: usize) -> Option<&[f64]> {
        self.lp.tableau_row(r)
    }

    fn column_status(&self, k: usize) -> Option<VarStatus> {
        self.lp.column_status(k)
    }

    fn column_bounds(&self, k: usize) -> (f64, f64) {
        self.lp.column_bounds(k)
    }

    fn column_value(&self, k: usize) -> Option<f64> {
        self.lp.column_value(k)
    }
}
