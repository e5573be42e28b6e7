//! MIP problem representation.

use lp_core::linalg::sparse;
use lp_core::{ProblemData, SimplexLp, SimplexSettings, VarType};

use crate::error::{MipError, MipResult};
use crate::numeric::{frac, is_integral};

/// Mixed-integer problem wrapper.
///
/// Holds the root data in the normalized form the cut generators rely on:
/// rows `A x >= b`, finite nonnegative lower bounds, objective in the
/// minimization direction.
#[derive(Debug, Clone)]
pub struct MipProblem {
    /// Original problem data.
    pub data: ProblemData,

    /// Integer-constrained columns (binaries included), ascending.
    pub integer_vars: Vec<usize>,

    /// Integrality flag per variable.
    pub is_integer: Vec<bool>,

    /// Root lower bounds for all variables.
    pub var_lb: Vec<f64>,

    /// Root upper bounds for all variables.
    pub var_ub: Vec<f64>,

    /// Objective in the minimization direction.
    pub obj: Vec<f64>,

    /// Dense rows of A.
    pub rows: Vec<Vec<f64>>,
}

impl MipProblem {
    /// Create a MipProblem from ProblemData.
    ///
    /// Rejects lower bounds that are negative or infinite. Binary variables
    /// are clamped to `[0, 1]` and integer bounds are rounded inward.
    pub fn new(prob: ProblemData) -> MipResult<Self> {
        prob.validate().map_err(MipError::InvalidProblem)?;
        let n = prob.num_vars();

        let types: Vec<VarType> = prob
            .integrality
            .clone()
            .unwrap_or_else(|| vec![VarType::Continuous; n]);
        let is_integer: Vec<bool> = types.iter().map(|t| *t != VarType::Continuous).collect();
        let integer_vars: Vec<usize> = (0..n).filter(|&j| is_integer[j]).collect();

        let (mut var_lb, mut var_ub) = prob.column_bounds();
        for (j, &lb) in var_lb.iter().enumerate() {
            if !lb.is_finite() || lb < 0.0 {
                return Err(MipError::InvalidProblem(format!(
                    "Variable {} has lower bound {}; bounds must be finite and >= 0",
                    j, lb
                )));
            }
        }
        if let Some(i) = prob.b.iter().position(|b| !b.is_finite()) {
            return Err(MipError::InvalidProblem(format!(
                "b[{}] = {} is not finite",
                i, prob.b[i]
            )));
        }

        for &j in &integer_vars {
            if types[j] == VarType::Binary {
                var_ub[j] = var_ub[j].min(1.0);
            }
            var_lb[j] = (var_lb[j] - 1e-9).ceil();
            var_ub[j] = (var_ub[j] + 1e-9).floor();
        }

        let obj = prob.min_objective();
        let rows = sparse::to_dense_rows(&prob.A);

        Ok(Self {
            data: prob,
            integer_vars,
            is_integer,
            var_lb,
            var_ub,
            obj,
            rows,
        })
    }

    /// Number of variables.
    pub fn num_vars(&self) -> usize {
        self.data.num_vars()
    }

    /// Number of constraints.
    pub fn num_constraints(&self) -> usize {
        self.data.num_constraints()
    }

    /// Number of integer variables (including binary).
    pub fn num_integers(&self) -> usize {
        self.integer_vars.len()
    }

    /// Map an internal (minimization) objective value to the caller's sense.
    pub fn caller_objective(&self, internal: f64) -> f64 {
        self.data.sense.sign() * internal
    }

    /// Map a caller-sense objective value to the internal minimization.
    pub fn internal_objective(&self, caller: f64) -> f64 {
        self.data.sense.sign() * caller
    }

    /// Objective value of `x` in the minimization direction.
    pub fn objective_of(&self, x: &[f64]) -> f64 {
        sparse::dot(&self.obj, x)
    }

    /// Root LP relaxation with rows named `row_<i>`.
    pub fn root_lp(&self, settings: SimplexSettings) -> MipResult<SimplexLp> {
        let mut lp = SimplexLp::new(self.obj.clone(), settings);
        for j in 0..self.num_vars() {
            lp.set_col_bounds(j, self.var_lb[j], self.var_ub[j])?;
        }
        for (i, row) in self.rows.iter().enumerate() {
            lp.add_row(row.clone(), self.data.b[i], f64::INFINITY, format!("row_{}", i))?;
        }
        Ok(lp)
    }

    /// Whether every integer-constrained entry of `x` is within `tol` of an integer.
    pub fn is_integer_feasible(&self, x: &[f64], tol: f64) -> bool {
        self.integer_vars.iter().all(|&j| is_integral(x[j], tol))
    }

    /// `(index, value, distance to nearest integer)` for each integer
    /// variable further than `tol` from an integer, in index order.
    pub fn fractional_vars(&self, x: &[f64], tol: f64) -> Vec<(usize, f64, f64)> {
        self.integer_vars
            .iter()
            .map(|&j| (j, x[j], integrality_gap(x[j])))
            .filter(|&(_, _, gap)| gap > tol)
            .collect()
    }

    /// Whether `x` satisfies the rows and root bounds within `tol`.
    pub fn is_feasible(&self, x: &[f64], tol: f64) -> bool {
        let bounds_ok = (0..self.num_vars())
            .all(|i| x[i] >= self.var_lb[i] - tol && x[i] <= self.var_ub[i] + tol);
        bounds_ok
            && self
                .rows
                .iter()
                .zip(&self.data.b)
                .all(|(row, &b)| sparse::dot(row, x) >= b - tol)
    }
}

/// Distance from `v` to the nearest integer.
fn integrality_gap(v: f64) -> f64 {
    let f = frac(v);
    f.min(1.0 - f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lp_core::{ObjSense, VarBound};

    /// min 2 x0 + 5 x1 + x2  s.t.  x0 + 4 x1 >= 27,  x0 - x2 >= -3
    /// x0 integer, x1 binary, x2 continuous.
    fn mixed() -> ProblemData {
        ProblemData {
            A: sparse::from_triplets(
                2,
                3,
                vec![(0, 0, 1.0), (0, 1, 4.0), (1, 0, 1.0), (1, 2, -1.0)],
            ),
            b: vec![27.0, -3.0],
            c: vec![2.0, 5.0, 1.0],
            sense: ObjSense::Minimize,
            var_bounds: None,
            integrality: Some(vec![VarType::Integer, VarType::Binary, VarType::Continuous]),
        }
    }

    #[test]
    fn test_integrality_and_bounds() {
        let mip = MipProblem::new(mixed()).unwrap();
        assert_eq!(mip.num_vars(), 3);
        assert_eq!(mip.num_constraints(), 2);
        assert_eq!(mip.num_integers(), 2);
        assert_eq!(mip.integer_vars, vec![0, 1]);
        assert_eq!(mip.is_integer, vec![true, true, false]);
        assert_eq!(mip.var_ub, vec![f64::INFINITY, 1.0, f64::INFINITY]);
        assert_eq!(mip.rows[1], vec![1.0, 0.0, -1.0]);
    }

    #[test]
    fn test_no_integrality_means_continuous() {
        let mut prob = mixed();
        prob.integrality = None;
        let mip = MipProblem::new(prob).unwrap();
        assert!(mip.integer_vars.is_empty());
        assert!(mip.is_integer_feasible(&[0.5, 0.5, 0.5], 1e-6));
    }

    #[test]
    fn test_integer_bounds_rounded_inward() {
        let mut prob = mixed();
        prob.var_bounds = Some(vec![VarBound {
            var: 0,
            lower: Some(0.5),
            upper: Some(3.7),
        }]);
        let mip = MipProblem::new(prob).unwrap();
        assert_eq!((mip.var_lb[0], mip.var_ub[0]), (1.0, 3.0));
    }

    #[test]
    fn test_bad_lower_bounds_rejected() {
        for lower in [-1.0, f64::NEG_INFINITY] {
            let mut prob = mixed();
            prob.var_bounds = Some(vec![VarBound {
                var: 2,
                lower: Some(lower),
                upper: None,
            }]);
            assert!(matches!(
                MipProblem::new(prob),
                Err(MipError::InvalidProblem(_))
            ));
        }
    }

    #[test]
    fn test_fractional_vars() {
        let mip = MipProblem::new(mixed()).unwrap();
        // The continuous x2 is never reported.
        let fr = mip.fractional_vars(&[2.3, 0.9999999, 0.5], 1e-6);
        assert_eq!(fr.len(), 1);
        assert_eq!(fr[0].0, 0);
        assert!((fr[0].2 - 0.3).abs() < 1e-12);

        assert!(mip.is_integer_feasible(&[3.0, 0.9999999, 0.5], 1e-6));
        assert!(!mip.is_integer_feasible(&[3.0, 0.75, 0.5], 1e-6));
    }

    #[test]
    fn test_feasibility_and_sense() {
        let mut prob = mixed();
        prob.sense = ObjSense::Maximize;
        let mip = MipProblem::new(prob).unwrap();
        assert!(mip.is_feasible(&[27.0, 0.0, 0.0], 1e-9));
        // Second row: 23 - 30 < -3.
        assert!(!mip.is_feasible(&[23.0, 1.0, 30.0], 1e-9));
        assert_eq!(mip.objective_of(&[1.0, 1.0, 1.0]), -8.0);
        assert_eq!(mip.caller_objective(-8.0), 8.0);
        assert_eq!(mip.internal_objective(8.0), -8.0);
    }
}
