//! Bounded-variable primal simplex.
//!
//! Phase one minimizes the sum of bound violations of the basic columns
//! (composite pricing, stopping at the first breakpoint); phase two minimizes
//! the true objective from a primal feasible basis.

use super::basis::VarStatus;
use super::tableau::Tableau;
use crate::problem::SimplexSettings;

/// Which objective the primal simplex is driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Sum of infeasibilities.
    One,
    /// True objective.
    Two,
}

/// Outcome of a primal simplex run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PrimalOutcome {
    /// Phase one: feasible basis found. Phase two: optimal.
    Optimal,
    /// Phase one stalled with violations left.
    Infeasible,
    /// Phase two found an improving ray.
    Unbounded,
    /// Iteration budget exhausted.
    IterationLimit,
    /// No usable pivot where one must exist.
    Numerical,
}

pub(crate) fn primal_simplex(
    tab: &mut Tableau,
    phase: Phase,
    settings: &SimplexSettings,
    iters: &mut usize,
    limit: usize,
) -> PrimalOutcome {
    let mut bland = false;
    let mut degenerate = 0usize;

    loop {
        let pricing = match phase {
            Phase::One => {
                let weights: Vec<f64> = tab
                    .head
                    .iter()
                    .map(|&k| tab.violation(k, settings.tol_primal).signum_or_zero())
                    .collect();
                if weights.iter().all(|&w| w == 0.0) {
                    return PrimalOutcome::Optimal;
                }
                phase_one_pricing(tab, &weights)
            }
            Phase::Two => tab.reduced_costs(&tab.cost),
        };

        let Some((q, dir)) = select_entering(tab, &pricing, settings.tol_dual, bland) else {
            return match phase {
                Phase::One => PrimalOutcome::Infeasible,
                Phase::Two => PrimalOutcome::Optimal,
            };
        };

        if *iters >= limit {
            return PrimalOutcome::IterationLimit;
        }
        *iters += 1;

        let (step, leaving) = ratio_test(tab, q, dir, phase, settings, bland);
        if step.is_infinite() {
            return match phase {
                Phase::One => PrimalOutcome::Numerical,
                Phase::Two => PrimalOutcome::Unbounded,
            };
        }

        match leaving {
            None => {
                // Entering column runs into its own opposite bound.
                tab.status[q] = if dir > 0.0 {
                    VarStatus::AtUpper
                } else {
                    VarStatus::AtLower
                };
            }
            Some((r, leave_status)) => {
                let j = tab.head[r];
                tab.pivot(r, q);
                tab.status[j] = leave_status;
            }
        }
        tab.recompute_values();

        if step <= 1e-12 {
            degenerate += 1;
            if degenerate > settings.bland_after {
                bland = true;
            }
        } else {
            degenerate = 0;
        }
    }
}

trait SignumOrZero {
    fn signum_or_zero(self) -> f64;
}

impl SignumOrZero for f64 {
    fn signum_or_zero(self) -> f64 {
        if self > 0.0 {
            1.0
        } else if self < 0.0 {
            -1.0
        } else {
            0.0
        }
    }
}

/// Derivative of the infeasibility sum with respect to each nonbasic column.
fn phase_one_pricing(tab: &Tableau, weights: &[f64]) -> Vec<f64> {
    let mut g = vec![0.0; tab.ncols()];
    for (r, &w) in weights.iter().enumerate() {
        if w == 0.0 {
            continue;
        }
        for (gk, &a) in g.iter_mut().zip(&tab.t[r]) {
            *gk -= w * a;
        }
    }
    g
}

/// Pick an entering column and its direction (+1 increase, -1 decrease).
fn select_entering(tab: &Tableau, pricing: &[f64], tol: f64, bland: bool) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64, f64)> = None;
    for k in 0..tab.ncols() {
        let status = tab.status[k];
        if !status.is_nonbasic() || tab.is_fixed(k) {
            continue;
        }
        let g = pricing[k];
        let can_inc = matches!(status, VarStatus::AtLower | VarStatus::Free);
        let can_dec = matches!(status, VarStatus::AtUpper | VarStatus::Free);
        let dir = if g < -tol && can_inc {
            1.0
        } else if g > tol && can_dec {
            -1.0
        } else {
            continue;
        };
        if bland {
            return Some((k, dir));
        }
        if best.map_or(true, |(_, _, score)| g.abs() > score) {
            best = Some((k, dir, g.abs()));
        }
    }
    best.map(|(k, dir, _)| (k, dir))
}

/// Longest step the entering column can take, and the blocking row if any.
fn ratio_test(
    tab: &Tableau,
    q: usize,
    dir: f64,
    phase: Phase,
    settings: &SimplexSettings,
    bland: bool,
) -> (f64, Option<(usize, VarStatus)>) {
    let mut step = if tab.lb[q].is_finite() && tab.ub[q].is_finite() {
        tab.ub[q] - tab.lb[q]
    } else {
        f64::INFINITY
    };
    let mut leaving: Option<(usize, VarStatus)> = None;
    let mut leaving_alpha = 0.0_f64;

    for r in 0..tab.m {
        // Rate at which the basic value of row r moves per unit step.
        let alpha = -tab.t[r][q] * dir;
        if alpha.abs() <= settings.tol_pivot {
            continue;
        }
        let j = tab.head[r];
        let xb = tab.x[j];
        let (lb, ub) = (tab.lb[j], tab.ub[j]);
        let violation = tab.violation(j, settings.tol_primal);

        let limit = if phase == Phase::One && violation < 0.0 {
            (alpha > 0.0).then(|| ((lb - xb) / alpha, VarStatus::AtLower))
        } else if phase == Phase::One && violation > 0.0 {
            (alpha < 0.0).then(|| ((ub - xb) / alpha, VarStatus::AtUpper))
        } else if alpha > 0.0 {
            ub.is_finite()
                .then(|| ((ub - xb) / alpha, VarStatus::AtUpper))
        } else {
            lb.is_finite()
                .then(|| ((lb - xb) / alpha, VarStatus::AtLower))
        };

        let Some((lim, status)) = limit else {
            continue;
        };
        let lim = lim.max(0.0);
        let better = if lim < step - 1e-12 {
            true
        } else if lim <= step + 1e-12 && leaving.is_some() {
            if bland {
                leaving.map_or(false, |(lr, _)| tab.head[r] < tab.head[lr])
            } else {
                alpha.abs() > leaving_alpha
            }
        } else {
            false
        };
        if better {
            step = lim;
            leaving = Some((r, status));
            leaving_alpha = alpha.abs();
        }
    }

    (step, leaving)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_one_then_two() {
        // min x0 + x1  s.t.  x0 + 2 x1 >= 4,  3 x0 + x1 >= 3
        let rows = vec![vec![1.0, 2.0], vec![3.0, 1.0]];
        let inf = f64::INFINITY;
        let mut tab = Tableau::slack_basis(
            &rows,
            &[4.0, 3.0],
            &[inf, inf],
            &[0.0, 0.0],
            &[inf, inf],
            &[1.0, 1.0],
        );
        let settings = SimplexSettings::default();
        let mut iters = 0;

        let p1 = primal_simplex(&mut tab, Phase::One, &settings, &mut iters, 100);
        assert_eq!(p1, PrimalOutcome::Optimal);
        assert!(tab.is_primal_feasible(1e-9));

        let p2 = primal_simplex(&mut tab, Phase::Two, &settings, &mut iters, 100);
        assert_eq!(p2, PrimalOutcome::Optimal);
        // Vertex (0.4, 1.8), objective 2.2
        assert!((tab.objective() - 2.2).abs() < 1e-9);
    }

    #[test]
    fn test_unbounded() {
        // min -x0  s.t.  x0 - x1 >= 0
        let rows = vec![vec![1.0, -1.0]];
        let inf = f64::INFINITY;
        let mut tab =
            Tableau::slack_basis(&rows, &[0.0], &[inf], &[0.0, 0.0], &[inf, inf], &[-1.0, 0.0]);
        let settings = SimplexSettings::default();
        let mut iters = 0;
        let out = primal_simplex(&mut tab, Phase::Two, &settings, &mut iters, 100);
        assert_eq!(out, PrimalOutcome::Unbounded);
    }

    #[test]
    fn test_bound_flip() {
        // min -x0 - x1  s.t.  x0 + x1 >= 0, 0 <= x <= 1
        let rows = vec![vec![1.0, 1.0]];
        let inf = f64::INFINITY;
        let mut tab =
            Tableau::slack_basis(&rows, &[0.0], &[inf], &[0.0, 0.0], &[1.0, 1.0], &[-1.0, -1.0]);
        // Negative costs start both columns at their upper bound already.
        assert_eq!(tab.status[0], VarStatus::AtUpper);

        tab.status[0] = VarStatus::AtLower;
        tab.recompute_values();
        let settings = SimplexSettings::default();
        let mut iters = 0;
        let out = primal_simplex(&mut tab, Phase::Two, &settings, &mut iters, 100);
        assert_eq!(out, PrimalOutcome::Optimal);
        assert!((tab.objective() + 2.0).abs() < 1e-12);
    }
}
