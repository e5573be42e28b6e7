//! Bounded-variable dual simplex.
//!
//! Runs from a dual feasible basis (the usual situation after a bound change
//! or an appended cut row) and restores primal feasibility while keeping the
//! reduced costs sign-correct.

use super::basis::VarStatus;
use super::tableau::Tableau;
use crate::problem::SimplexSettings;

/// Outcome of a dual simplex run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DualOutcome {
    /// Primal and dual feasible.
    Optimal,
    /// A row with no eligible entering column: the LP is infeasible.
    Infeasible,
    /// Iteration budget exhausted.
    IterationLimit,
}

pub(crate) fn dual_simplex(
    tab: &mut Tableau,
    settings: &SimplexSettings,
    iters: &mut usize,
    limit: usize,
) -> DualOutcome {
    let mut bland = false;
    let mut degenerate = 0usize;

    loop {
        let Some((r, below)) = select_leaving(tab, settings.tol_primal, bland) else {
            return DualOutcome::Optimal;
        };

        if *iters >= limit {
            return DualOutcome::IterationLimit;
        }

        let d = tab.reduced_costs(&tab.cost);
        let Some((q, ratio)) = select_entering(tab, &d, r, below, settings, bland) else {
            return DualOutcome::Infeasible;
        };
        *iters += 1;

        let leaving = tab.head[r];
        tab.pivot(r, q);
        tab.status[leaving] = if below {
            VarStatus::AtLower
        } else {
            VarStatus::AtUpper
        };
        tab.recompute_values();

        if ratio <= 1e-12 {
            degenerate += 1;
            if degenerate > settings.bland_after {
                bland = true;
            }
        } else {
            degenerate = 0;
        }
    }
}

/// Row whose basic column is most infeasible, and whether it sits below its bound.
fn select_leaving(tab: &Tableau, tol: f64, bland: bool) -> Option<(usize, bool)> {
    let mut best: Option<(usize, f64)> = None;
    for r in 0..tab.m {
        let v = tab.violation(tab.head[r], tol);
        if v == 0.0 {
            continue;
        }
        let better = match best {
            None => true,
            Some((br, bv)) if bland => tab.head[r] < tab.head[br] && bv != 0.0,
            Some((_, bv)) => v.abs() > bv.abs(),
        };
        if better {
            best = Some((r, v));
        }
    }
    best.map(|(r, v)| (r, v < 0.0))
}

/// Dual ratio test on row `r`.
fn select_entering(
    tab: &Tableau,
    d: &[f64],
    r: usize,
    below: bool,
    settings: &SimplexSettings,
    bland: bool,
) -> Option<(usize, f64)> {
    let row = &tab.t[r];
    let mut best: Option<(usize, f64, f64)> = None;

    for k in 0..tab.ncols() {
        let status = tab.status[k];
        if !status.is_nonbasic() || tab.is_fixed(k) {
            continue;
        }
        let a = row[k];
        if a.abs() <= settings.tol_pivot {
            continue;
        }
        // x_B moves by -a per unit increase of x_k.
        let eligible = match (status, below) {
            (VarStatus::Free, _) => true,
            (VarStatus::AtLower, true) => a < 0.0,
            (VarStatus::AtUpper, true) => a > 0.0,
            (VarStatus::AtLower, false) => a > 0.0,
            (VarStatus::AtUpper, false) => a < 0.0,
            (VarStatus::Basic, _) => false,
        };
        if !eligible {
            continue;
        }

        let ratio = d[k].abs() / a.abs();
        let better = match best {
            None => true,
            Some((bk, br, ba)) => {
                if ratio < br - 1e-12 {
                    true
                } else if ratio <= br + 1e-12 {
                    if bland {
                        k < bk
                    } else {
                        a.abs() > ba
                    }
                } else {
                    false
                }
            }
        };
        if better {
            best = Some((k, ratio, a.abs()));
        }
    }

    best.map(|(k, ratio, _)| (k, ratio))
}
