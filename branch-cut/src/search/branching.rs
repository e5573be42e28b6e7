//! Branching variable selection.
//!
//! Pseudo-costs record, per variable and direction, the average objective
//! gain per unit of distance moved by a branch. Variables never seen before
//! are probed with a few iterations of strong branching.

use std::collections::BTreeMap;

use super::node::{Direction, Node};
use super::SolveContext;
use crate::master::{MasterBackend, MasterStatus};
use crate::model::MipProblem;

/// Running average of observed objective gains per unit change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PseudoCost {
    /// Average gain; `+inf` when every probe was infeasible.
    pub cost: f64,

    /// Number of observations.
    pub times: u64,
}

/// Index furthest from both its floor and ceiling; first wins on ties.
///
/// Returns `None` when every integer variable is within `tol` of an integer.
pub fn most_fractional(prob: &MipProblem, x: &[f64], tol: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (var, _, frac) in prob.fractional_vars(x, tol) {
        if best.map_or(true, |(_, f)| frac > f) {
            best = Some((var, frac));
        }
    }
    best.map(|(var, _)| var)
}

/// Pseudo-cost branching with strong-branching initialization.
#[derive(Debug, Clone, Default)]
pub struct PseudoCostBrancher {
    table: BTreeMap<(usize, Direction), PseudoCost>,
    strong_branch_iters: usize,
    probes: u64,
}

impl PseudoCostBrancher {
    /// Create a brancher whose probes run at most `strong_branch_iters` pivots.
    pub fn new(strong_branch_iters: usize) -> Self {
        Self {
            table: BTreeMap::new(),
            strong_branch_iters,
            probes: 0,
        }
    }

    /// Pseudo-cost of `var` in direction `dir`, if observed.
    pub fn cost(&self, var: usize, dir: Direction) -> Option<PseudoCost> {
        self.table.get(&(var, dir)).copied()
    }

    /// Number of strong-branching LP probes run so far.
    pub fn probes(&self) -> u64 {
        self.probes
    }

    /// Mean finite cost over all variables in direction `dir`.
    pub fn direction_average(&self, dir: Direction) -> Option<f64> {
        let costs: Vec<f64> = self
            .table
            .iter()
            .filter(|((_, d), pc)| *d == dir && pc.cost.is_finite())
            .map(|(_, pc)| pc.cost)
            .collect();
        (!costs.is_empty()).then(|| costs.iter().sum::<f64>() / costs.len() as f64)
    }

    /// Fold one observation into the table.
    ///
    /// An infinite observation never overwrites a finite average, and a
    /// finite one replaces an infinite entry.
    pub fn observe(&mut self, var: usize, dir: Direction, gain: f64) {
        if gain.is_nan() {
            return;
        }
        let fresh = PseudoCost {
            cost: gain,
            times: 1,
        };
        match self.table.get_mut(&(var, dir)) {
            None => {
                self.table.insert((var, dir), fresh);
            }
            Some(pc) if pc.cost.is_infinite() && gain.is_finite() => *pc = fresh,
            Some(pc) if gain.is_infinite() => {
                if pc.cost.is_infinite() {
                    pc.times += 1;
                }
            }
            Some(pc) => {
                pc.cost = (pc.cost * pc.times as f64 + gain) / (pc.times + 1) as f64;
                pc.times += 1;
            }
        }
    }

    /// Update from a freshly bounded node using the branch that created it.
    pub fn update<M: MasterBackend>(&mut self, node: &Node<M>) {
        let Some(info) = node.branch else {
            return;
        };
        if !node.evaluated || node.numerical_failure || node.unbounded || info.gap <= 0.0 {
            return;
        }
        let gain = (node.objective_value - node.dual_bound).max(0.0) / info.gap;
        self.observe(info.var, info.direction, gain);
    }

    /// Pick the fractional variable with the best pseudo-cost score.
    ///
    /// The score is `min(cost_up * ceil_gap, cost_down * floor_gap)`; the
    /// largest score wins, first index on ties.
    pub fn select<M: MasterBackend>(
        &mut self,
        master: &M,
        x: &[f64],
        parent_obj: f64,
        ctx: &SolveContext,
    ) -> Option<usize> {
        let fractional = ctx
            .problem
            .fractional_vars(x, ctx.settings.int_feas_tol);

        let mut best: Option<(usize, f64)> = None;
        for (var, value, _) in fractional {
            for dir in [Direction::Down, Direction::Up] {
                if self.cost(var, dir).is_none() {
                    self.strong_branch(master, var, value, dir, parent_obj);
                }
            }
            let down = self.cost(var, Direction::Down).map_or(1.0, |pc| pc.cost);
            let up = self.cost(var, Direction::Up).map_or(1.0, |pc| pc.cost);
            let score = (up * (value.ceil() - value)).min(down * (value - value.floor()));
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((var, score));
            }
        }

        if let Some((var, score)) = best {
            log::debug!("pseudocost: x{} scores {:.6}", var, score);
        }
        best.map(|(var, _)| var)
    }

    /// Probe one side of a split with an iteration-capped LP solve.
    fn strong_branch<M: MasterBackend>(
        &mut self,
        master: &M,
        var: usize,
        value: f64,
        dir: Direction,
        parent_obj: f64,
    ) {
        let (lb, ub) = master.var_bounds(var);
        let mut probe = master.clone();
        let (bounds, gap) = match dir {
            Direction::Down => ((lb, value.floor()), value - value.floor()),
            Direction::Up => ((value.ceil(), ub), value.ceil() - value),
        };
        self.probes += 1;
        if probe.set_var_bounds(var, bounds.0, bounds.1).is_err() {
            return;
        }

        let result = probe.solve_with_limit(self.strong_branch_iters);
        let gain = match result.status {
            MasterStatus::Infeasible => f64::INFINITY,
            MasterStatus::Optimal | MasterStatus::IterationLimit
                if result.bound_valid && result.obj_val.is_finite() =>
            {
                (result.obj_val - parent_obj).max(0.0) / gap
            }
            _ => self.direction_average(dir).unwrap_or(1.0),
        };
        self.observe(var, dir, gain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::node::BranchInfo;
    use crate::master::SimplexMaster;
    use crate::settings::MipSettings;
    use lp_core::linalg::sparse;
    use lp_core::{ObjSense, ProblemData, VarType};

    fn identity_ctx() -> SolveContext {
        // min x0 + x1  s.t.  x0 >= 1.5, x1 >= 1.5, integer
        let data = ProblemData {
            A: sparse::from_triplets(2, 2, vec![(0, 0, 1.0), (1, 1, 1.0)]),
            b: vec![1.5, 1.5],
            c: vec![1.0, 1.0],
            sense: ObjSense::Minimize,
            var_bounds: None,
            integrality: Some(vec![VarType::Integer; 2]),
        };
        SolveContext::new(MipProblem::new(data).unwrap(), MipSettings::default())
    }

    #[test]
    fn test_running_average() {
        let mut brancher = PseudoCostBrancher::new(10);
        brancher.observe(0, Direction::Up, 2.0);
        brancher.observe(0, Direction::Up, 4.0);
        let pc = brancher.cost(0, Direction::Up).unwrap();
        assert_eq!(pc.times, 2);
        assert!((pc.cost - 3.0).abs() < 1e-12);
        assert!(brancher.cost(0, Direction::Down).is_none());
    }

    #[test]
    fn test_infinite_observations() {
        let mut brancher = PseudoCostBrancher::new(10);
        brancher.observe(1, Direction::Down, f64::INFINITY);
        assert_eq!(brancher.cost(1, Direction::Down).unwrap().cost, f64::INFINITY);

        // Finite replaces infinite.
        brancher.observe(1, Direction::Down, 0.5);
        assert_eq!(
            brancher.cost(1, Direction::Down),
            Some(PseudoCost { cost: 0.5, times: 1 })
        );

        // Infinite never overwrites finite.
        brancher.observe(1, Direction::Down, f64::INFINITY);
        assert_eq!(brancher.cost(1, Direction::Down).unwrap().cost, 0.5);
        assert_eq!(brancher.direction_average(Direction::Down), Some(0.5));
        assert_eq!(brancher.direction_average(Direction::Up), None);
    }

    #[test]
    fn test_most_fractional() {
        let ctx = identity_ctx();
        assert_eq!(most_fractional(&ctx.problem, &[1.2, 1.5], 1e-6), Some(1));
        assert_eq!(most_fractional(&ctx.problem, &[1.5, 0.5], 1e-6), Some(0));
        assert_eq!(most_fractional(&ctx.problem, &[1.0, 2.0], 1e-6), None);
    }

    #[test]
    fn test_strong_branching_bootstrap() {
        let ctx = identity_ctx();
        let mut master =
            SimplexMaster::new(&ctx.problem, ctx.settings.master_settings.clone()).unwrap();
        let res = master.solve();

        let mut brancher = PseudoCostBrancher::new(ctx.settings.strong_branch_iters);
        let var = brancher.select(&master, &res.x, res.obj_val, &ctx);
        assert_eq!(var, Some(0));
        assert_eq!(brancher.probes(), 4);

        // x_i <= 1 contradicts x_i >= 1.5; x_i >= 2 costs 0.5 over half a unit.
        assert_eq!(brancher.cost(0, Direction::Down).unwrap().cost, f64::INFINITY);
        assert!((brancher.cost(0, Direction::Up).unwrap().cost - 1.0).abs() < 1e-9);

        // Known costs are not probed again.
        brancher.select(&master, &res.x, res.obj_val, &ctx);
        assert_eq!(brancher.probes(), 4);
    }

    #[test]
    fn test_capped_primal_solve_falls_back_to_average() {
        // max x0 + x1  s.t.  x0 <= 2.5, x1 <= 2.5
        let data = ProblemData {
            A: sparse::from_triplets(2, 2, vec![(0, 0, -1.0), (1, 1, -1.0)]),
            b: vec![-2.5, -2.5],
            c: vec![1.0, 1.0],
            sense: ObjSense::Maximize,
            var_bounds: None,
            integrality: Some(vec![VarType::Integer; 2]),
        };
        let ctx = SolveContext::new(MipProblem::new(data).unwrap(), MipSettings::default());
        let master =
            SimplexMaster::new(&ctx.problem, ctx.settings.master_settings.clone()).unwrap();

        // No pivots allowed: the up side stops inside the primal simplex,
        // whose objective says nothing about the child's bound.
        let mut brancher = PseudoCostBrancher::new(0);
        brancher.observe(1, Direction::Up, 0.25);
        brancher.strong_branch(&master, 0, 1.5, Direction::Up, -10.0);
        assert_eq!(brancher.probes(), 1);
        assert!((brancher.cost(0, Direction::Up).unwrap().cost - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_score_prefers_balanced_gain() {
        let ctx = identity_ctx();
        let master =
            SimplexMaster::new(&ctx.problem, ctx.settings.master_settings.clone()).unwrap();
        let mut brancher = PseudoCostBrancher::new(10);
        brancher.observe(0, Direction::Down, 1.0);
        brancher.observe(0, Direction::Up, 1.0);
        brancher.observe(1, Direction::Down, 4.0);
        brancher.observe(1, Direction::Up, 3.0);

        let var = brancher.select(&master, &[1.5, 1.5], 3.0, &ctx);
        assert_eq!(var, Some(1));
        assert_eq!(brancher.probes(), 0);
    }

    #[test]
    fn test_post_branch_update() {
        let ctx = identity_ctx();
        let master =
            SimplexMaster::new(&ctx.problem, ctx.settings.master_settings.clone()).unwrap();
        let mut node = Node::root(master);
        node.branch = Some(BranchInfo {
            var: 1,
            direction: Direction::Up,
            value: 1.5,
            gap: 0.5,
        });
        node.dual_bound = 3.0;
        node.objective_value = 3.25;
        node.evaluated = true;

        let mut brancher = PseudoCostBrancher::new(10);
        brancher.update(&node);
        assert!((brancher.cost(1, Direction::Up).unwrap().cost - 0.5).abs() < 1e-12);
    }
}
