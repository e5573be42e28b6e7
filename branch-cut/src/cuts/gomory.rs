//! Gomory mixed-integer cuts from the optimal simplex tableau.
//!
//! For a basic integer column with fractional value `x*_B`, complementing
//! every nonbasic column at its active bound (`z = x - lb` or `z = ub - x`)
//! turns its tableau row into
//!
//! ```text
//! x_B + sum_j a_j z_j = x*_B,    z >= 0
//! ```
//!
//! With `f0 = frac(x*_B)` the mixed-integer rounding inequality
//! `sum_j g_j z_j >= 1` holds for every point of the node region, where
//!
//! ```text
//! integer j:     g_j = f_j / f0            if f_j <= f0
//!                      (1 - f_j) / (1 - f0) otherwise      (f_j = frac(a_j))
//! continuous j:  g_j = a_j / f0            if a_j >= 0
//!                      -a_j / (1 - f0)      otherwise
//! ```
//!
//! Row activities are continuous columns; substituting them and the
//! complemented bounds back gives a cut over the structural variables only.

use crate::master::{CutSource, LinearCut, MasterBackend};
use crate::numeric::{frac, safe_round_cut, COEF_EPS};
use lp_core::VarStatus;

/// Gomory mixed-integer cut generator.
#[derive(Debug, Clone)]
pub struct GomoryGenerator {
    /// Rows whose basic value is within this of an integer are skipped.
    pub int_tol: f64,

    /// Largest denominator for safe rational rounding.
    pub max_denominator: u64,
}

impl GomoryGenerator {
    /// Create a generator.
    pub fn new(int_tol: f64, max_denominator: u64) -> Self {
        Self {
            int_tol,
            max_denominator,
        }
    }

    /// One cut per fractional integer basic row of the master's last tableau.
    ///
    /// `tag` prefixes the cut names. Returns nothing when the master has no
    /// current tableau.
    pub fn generate<M: MasterBackend>(
        &self,
        master: &M,
        is_integer: &[bool],
        tag: &str,
    ) -> Vec<LinearCut> {
        let Some(heads) = master.basic_columns() else {
            return Vec::new();
        };

        let mut cuts = Vec::new();
        for (r, &head) in heads.iter().enumerate() {
            if head >= is_integer.len() || !is_integer[head] {
                continue;
            }
            let Some(value) = master.column_value(head) else {
                continue;
            };
            let f0 = frac(value);
            if f0 <= self.int_tol || f0 >= 1.0 - self.int_tol {
                continue;
            }
            if let Some(cut) = self.cut_from_row(master, is_integer, r, f0) {
                cuts.push(cut.with_name(format!("{}_gomory_{}", tag, r)));
            }
        }

        log::debug!("gomory: {} cuts from {} rows", cuts.len(), heads.len());
        cuts
    }

    fn cut_from_row<M: MasterBackend>(
        &self,
        master: &M,
        is_integer: &[bool],
        r: usize,
        f0: f64,
    ) -> Option<LinearCut> {
        let row = master.tableau_row(r)?;
        let n = master.num_vars();

        let mut coefs = vec![0.0; n];
        let mut rhs = 1.0;

        for (k, &t) in row.iter().enumerate() {
            if t.abs() <= COEF_EPS {
                continue;
            }
            let status = master.column_status(k)?;
            let (lb, ub) = master.column_bounds(k);
            // z = x_k - lb  or  z = ub - x_k, with x_k = a_i x for row activities
            let (sign, bound) = match status {
                VarStatus::Basic => continue,
                _ if lb == ub => continue,
                VarStatus::AtLower => (1.0, lb),
                VarStatus::AtUpper => (-1.0, ub),
                // A free nonbasic column cannot be complemented.
                VarStatus::Free => return None,
            };
            let a = sign * t;

            // z is integer only for an integer column sitting at an integral bound
            let integral = k < n && is_integer[k] && bound.fract() == 0.0;
            let g = if integral {
                let fj = frac(a);
                if fj <= f0 {
                    fj / f0
                } else {
                    (1.0 - fj) / (1.0 - f0)
                }
            } else if a >= 0.0 {
                a / f0
            } else {
                -a / (1.0 - f0)
            };
            if g == 0.0 {
                continue;
            }

            if k < n {
                coefs[k] += sign * g;
            } else {
                for (c, &aij) in coefs.iter_mut().zip(master.row(k - n)) {
                    *c += sign * g * aij;
                }
            }
            rhs += sign * g * bound;
        }

        safe_round_cut(&mut coefs, &mut rhs, self.max_denominator);
        let cut = LinearCut::new(coefs, rhs, CutSource::Gomory { row: r });
        cut.is_valid().then_some(cut)
    }
}
