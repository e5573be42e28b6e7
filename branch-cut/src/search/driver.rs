//! Branch-and-bound driver.

use std::time::Instant;

use super::branching::PseudoCostBrancher;
use super::node::{Node, NodeId};
use super::queue::NodeQueue;
use super::tree::SearchTree;
use super::{SolveContext, SolveStats};
use crate::cuts::{Cglp, DisjunctiveTerm};
use crate::error::{MipError, MipResult};
use crate::master::{LinearCut, MasterBackend, SimplexMaster};
use crate::model::{Incumbent, MipProblem, MipSolution, MipStatus};
use crate::settings::MipSettings;

/// What the driver does with a node after bounding it.
enum Verdict {
    Unbounded,
    Failed,
    Infeasible,
    Dominated,
    Integral(Vec<f64>, f64),
    Branch,
}

impl Verdict {
    /// Classify a bounded node against the incumbent's `primal_bound`.
    ///
    /// A failed LP leaves only the node's inherited dual bound; when that
    /// bound is already dominated the node is pruned rather than failed.
    fn of<M: MasterBackend>(node: &Node<M>, primal_bound: f64) -> Self {
        if node.unbounded {
            Verdict::Unbounded
        } else if node.numerical_failure {
            if dominated(node.dual_bound, primal_bound) {
                Verdict::Dominated
            } else {
                Verdict::Failed
            }
        } else if !node.lp_feasible {
            Verdict::Infeasible
        } else if dominated(node.objective_value, primal_bound) {
            Verdict::Dominated
        } else if node.mip_feasible {
            Verdict::Integral(
                node.solution.clone().unwrap_or_default(),
                node.objective_value,
            )
        } else {
            Verdict::Branch
        }
    }
}

/// Branch-and-cut search over one problem.
///
/// Owns the tree, the open-node queue, the incumbent and the pseudo-costs.
/// Limits are checked between node evaluations only.
pub struct BranchAndBound<M: MasterBackend = SimplexMaster> {
    ctx: SolveContext,
    root_master: Option<M>,
    tree: SearchTree<M>,
    queue: NodeQueue,
    brancher: PseudoCostBrancher,
    incumbent: Incumbent,
    stats: SolveStats,
    /// Lowest dual bound among nodes whose LP failed.
    failed_bound: f64,
    cglp_built: bool,
    start_time: Option<Instant>,
}

impl BranchAndBound<SimplexMaster> {
    /// Create a driver using the built-in simplex for node LPs.
    pub fn new(problem: MipProblem, settings: MipSettings) -> MipResult<Self> {
        let master = SimplexMaster::new(&problem, settings.master_settings.clone())?;
        Self::with_backend(problem, master, settings)
    }
}

impl<M: MasterBackend> BranchAndBound<M> {
    /// Create a driver whose root LP is `master`.
    ///
    /// `master` must hold the root relaxation of `problem`.
    pub fn with_backend(problem: MipProblem, master: M, settings: MipSettings) -> MipResult<Self> {
        if master.num_vars() != problem.num_vars() {
            return Err(MipError::InvalidProblem(format!(
                "master has {} columns, problem has {} variables",
                master.num_vars(),
                problem.num_vars()
            )));
        }
        let incumbent = match settings.initial_primal_bound {
            Some(bound) => Incumbent::with_cutoff(problem.internal_objective(bound)),
            None => Incumbent::default(),
        };
        Ok(Self {
            queue: NodeQueue::new(settings.node_selection),
            brancher: PseudoCostBrancher::new(settings.strong_branch_iters),
            ctx: SolveContext::new(problem, settings),
            root_master: Some(master),
            tree: SearchTree::new(),
            incumbent,
            stats: SolveStats::default(),
            failed_bound: f64::INFINITY,
            cglp_built: false,
            start_time: None,
        })
    }

    /// Search tree built so far.
    pub fn tree(&self) -> &SearchTree<M> {
        &self.tree
    }

    /// Counters collected so far.
    pub fn stats(&self) -> &SolveStats {
        &self.stats
    }

    /// Best known solution (minimization direction).
    pub fn incumbent(&self) -> &Incumbent {
        &self.incumbent
    }

    /// Pseudo-cost table.
    pub fn brancher(&self) -> &PseudoCostBrancher {
        &self.brancher
    }

    /// Run the search.
    ///
    /// Fails only on misuse (calling it twice) or when the LP oracle rejects
    /// an edit; solver outcomes are reported through the solution status.
    pub fn solve(&mut self) -> MipResult<MipSolution> {
        let master = self
            .root_master
            .take()
            .ok_or_else(|| MipError::InternalError("solve() already ran".into()))?;
        self.start_time = Some(Instant::now());

        let root = self.tree.insert_root(Node::root(master));
        self.push(root);

        if self.ctx.settings.verbose {
            log::info!(
                "branch-and-cut: {} variables ({} integer), {} rows",
                self.ctx.problem.num_vars(),
                self.ctx.problem.num_integers(),
                self.ctx.problem.num_constraints()
            );
        }

        let status = loop {
            if self.queue.is_empty() {
                break self.exhausted_status();
            }
            if let Some(status) = self.check_limits() {
                break status;
            }
            let Some(entry) = self.queue.pop() else {
                continue;
            };
            if let Some(status) = self.process(entry.id)? {
                break status;
            }
            self.maybe_build_cglp();
            self.log_progress();
        };

        let solution = self.finalize(status);
        if self.ctx.settings.verbose {
            log::info!(
                "branch-and-cut: {} after {} nodes | obj {:.6e} | bound {:.6e} | gap {:.2}% | {} cuts | {:.1}s",
                solution.status,
                solution.nodes_explored,
                solution.obj_val,
                solution.bound,
                solution.gap * 100.0,
                solution.cuts_added,
                solution.solve_time_ms as f64 / 1000.0
            );
            log::info!(
                "branch-and-cut: {} nodes queued, {} popped, {} left open",
                solution.stats.nodes_queued,
                self.queue.total_popped(),
                self.queue.len()
            );
        }
        Ok(solution)
    }

    /// Bound one node and act on the result. Returns a status to stop with.
    fn process(&mut self, id: NodeId) -> MipResult<Option<MipStatus>> {
        let ctx = &self.ctx;
        let node = self
            .tree
            .get_mut(id)
            .ok_or_else(|| MipError::InternalError(format!("node {} is not in the tree", id)))?;

        let outcome = node.bound(ctx);
        self.brancher.update(node);

        let stats = &mut self.stats;
        stats.nodes_evaluated += 1;
        stats.max_depth = stats.max_depth.max(node.depth);
        stats.cut_rounds += outcome.rounds as u64;
        stats.gomory_cuts += outcome.gomory_cuts as u64;
        stats.cglp_cuts += outcome.cglp_cuts as u64;
        stats.cglp_failures += outcome.cglp_failures as u64;
        stats.cuts_added += outcome.cuts_added as u64;
        stats.cuts_dropped += outcome.cuts_dropped as u64;
        stats.lp_iterations += outcome.lp_iterations as u64;

        let disjunction = node.cglp.as_ref().map(Cglp::root);
        let verdict = Verdict::of(node, self.incumbent.primal_bound());
        let dual_bound = node.dual_bound;

        if let Some(root) = disjunction {
            self.broadcast(root, &outcome.broadcast);
        }

        match verdict {
            Verdict::Unbounded => {
                log::warn!("node {}: LP relaxation is unbounded, stopping", id);
                return Ok(Some(MipStatus::Unbounded));
            }
            Verdict::Failed => {
                log::warn!("node {}: LP failed numerically, node abandoned", id);
                self.stats.nodes_failed += 1;
                self.failed_bound = self.failed_bound.min(dual_bound);
            }
            Verdict::Infeasible => self.stats.nodes_infeasible += 1,
            Verdict::Dominated => self.stats.nodes_pruned += 1,
            Verdict::Integral(x, obj) => self.new_incumbent(x, obj),
            Verdict::Branch => self.branch(id)?,
        }
        Ok(None)
    }

    fn branch(&mut self, id: NodeId) -> MipResult<()> {
        let node = self
            .tree
            .get_mut(id)
            .ok_or_else(|| MipError::InternalError(format!("node {} is not in the tree", id)))?;
        let children = node.branch(&self.ctx, &mut self.brancher)?;
        let dual_bound = node.dual_bound;
        self.stats.strong_branch_probes = self.brancher.probes();

        match children {
            Some((left, right)) => {
                let (l, r) = self.tree.insert_children(id, left, right);
                self.push(l);
                self.push(r);
                self.stats.nodes_branched += 1;
            }
            None => {
                log::warn!("node {}: fractional LP point but no branching candidate", id);
                self.stats.nodes_failed += 1;
                self.failed_bound = self.failed_bound.min(dual_bound);
            }
        }
        Ok(())
    }

    fn push(&mut self, id: NodeId) {
        if let Some(node) = self.tree.get(id) {
            self.queue.push(node.queue_entry());
        }
    }

    fn new_incumbent(&mut self, mut x: Vec<f64>, obj: f64) {
        for &i in &self.ctx.problem.integer_vars {
            x[i] = x[i].round();
        }
        if !self.incumbent.offer(&x, obj) {
            return;
        }
        let pruned = self.queue.prune_by_bound(obj);
        self.stats.nodes_pruned += pruned.len() as u64;
        if self.ctx.settings.verbose {
            log::info!(
                "New incumbent: obj={:.6e}, pruned {} nodes",
                self.ctx.problem.caller_objective(obj),
                pruned.len()
            );
        }
    }

    /// Copy disjunction-wide cuts into the pools of open nodes below `root`.
    fn broadcast(&mut self, root: NodeId, cuts: &[LinearCut]) {
        if cuts.is_empty() {
            return;
        }
        for id in self.queue.ids() {
            let Some(node) = self.tree.get_mut(id) else {
                continue;
            };
            if !node.lineage.contains(&root) {
                continue;
            }
            for cut in cuts {
                if node.cut_pool.add(cut.clone()).is_some() {
                    self.stats.broadcast_cuts += 1;
                }
            }
        }
    }

    /// Snapshot the tree into a CGLP once enough nodes have been evaluated.
    fn maybe_build_cglp(&mut self) {
        let settings = &self.ctx.settings.cglp;
        if !settings.enabled
            || self.cglp_built
            || self.stats.nodes_evaluated < settings.build_after_nodes
            || self.queue.is_empty()
        {
            return;
        }
        self.cglp_built = true;
        let Some(root) = self.tree.root() else {
            return;
        };

        // Leaves proven infeasible describe empty terms.
        let terms: Vec<DisjunctiveTerm> = self
            .tree
            .subtree_leaves(root)
            .into_iter()
            .filter_map(|id| self.tree.get(id))
            .filter(|n| !n.evaluated || n.lp_feasible || n.numerical_failure)
            .map(|n| DisjunctiveTerm::from_master(&n.master))
            .collect();
        let num_terms = terms.len();

        let Some(cglp) = Cglp::build(root, terms, None, settings) else {
            log::warn!("cglp: no usable terms in the disjunction, disjunctive cuts disabled");
            return;
        };
        let cglp = match self.tree.get(root).and_then(|n| n.solution.clone()) {
            Some(x) => cglp.with_point(x),
            None => cglp,
        };
        for id in self.queue.ids() {
            if let Some(node) = self.tree.get_mut(id) {
                node.cglp = Some(cglp.clone());
            }
        }
        if self.ctx.settings.verbose {
            log::info!(
                "cglp: built over {} terms, attached to {} open nodes",
                num_terms,
                self.queue.len()
            );
        }
    }

    /// Global lower bound in the minimization direction.
    fn dual_bound(&self) -> f64 {
        self.queue
            .best_bound()
            .min(self.failed_bound)
            .min(self.incumbent.primal_bound())
    }

    fn check_limits(&self) -> Option<MipStatus> {
        let settings = &self.ctx.settings;
        if self.incumbent.closes_gap(self.dual_bound(), settings.gap_tol) {
            return Some(MipStatus::Optimal);
        }
        if let Some(limit) = settings.time_limit_ms {
            if self.elapsed_ms() >= limit {
                return Some(MipStatus::TimeLimit);
            }
        }
        if self.stats.nodes_evaluated >= settings.max_nodes {
            return Some(MipStatus::NodeLimit);
        }
        None
    }

    /// Status once the queue is empty. Failed nodes only matter if the
    /// incumbent does not dominate their bound.
    fn exhausted_status(&self) -> MipStatus {
        let failed_open = self.stats.nodes_failed > 0
            && !dominated(self.failed_bound, self.incumbent.primal_bound());
        if failed_open {
            MipStatus::NumericalError
        } else if self.incumbent.is_set() {
            MipStatus::Optimal
        } else {
            MipStatus::Infeasible
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.start_time
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    fn finalize(&self, status: MipStatus) -> MipSolution {
        let prob = &self.ctx.problem;
        let primal = self.incumbent.primal_bound();
        let dual = match status {
            MipStatus::Unbounded => f64::NEG_INFINITY,
            MipStatus::Optimal | MipStatus::Infeasible if self.queue.is_empty() => primal,
            _ => self.dual_bound(),
        };

        let primal_bound = prob.caller_objective(primal);
        let bound = prob.caller_objective(dual);
        let obj_val = if self.incumbent.is_set() {
            primal_bound
        } else {
            prob.caller_objective(f64::INFINITY)
        };

        MipSolution {
            status,
            x: self.incumbent.x().map(<[f64]>::to_vec),
            obj_val,
            primal_bound,
            bound,
            gap: MipSolution::compute_gap(primal_bound, bound),
            nodes_explored: self.stats.nodes_evaluated,
            cuts_added: self.stats.cuts_added,
            solve_time_ms: self.elapsed_ms(),
            incumbent_updates: self.incumbent.updates(),
            stats: SolveStats {
                nodes_queued: self.queue.total_added(),
                ..self.stats.clone()
            },
        }
    }

    fn log_progress(&self) {
        let settings = &self.ctx.settings;
        if !settings.verbose || self.stats.nodes_evaluated % settings.log_freq.max(1) != 0 {
            return;
        }
        let prob = &self.ctx.problem;
        log::info!(
            "Nodes: {} ({} open) | Bound: {:.6e} | Incumbent: {:.6e} | Gap: {:.2}% | Cuts: {} | Time: {:.1}s",
            self.stats.nodes_evaluated,
            self.queue.len(),
            prob.caller_objective(self.dual_bound()),
            prob.caller_objective(self.incumbent.primal_bound()),
            self.incumbent.gap(self.dual_bound()) * 100.0,
            self.stats.cuts_added,
            self.elapsed_ms() as f64 / 1000.0,
        );
    }
}

/// Whether an LP objective cannot improve on `primal_bound`.
fn dominated(objective: f64, primal_bound: f64) -> bool {
    primal_bound.is_finite() && objective >= primal_bound - 1e-9 * primal_bound.abs().max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{BranchingRule, NodeSelection};
    use lp_core::linalg::sparse;
    use lp_core::{ObjSense, ProblemData, SimplexSettings, VarType};

    /// min x0 + x1  s.t.  x0 >= 1.5, x1 >= 1.5, integer.
    fn identity_problem() -> MipProblem {
        let data = ProblemData {
            A: sparse::from_triplets(2, 2, vec![(0, 0, 1.0), (1, 1, 1.0)]),
            b: vec![1.5, 1.5],
            c: vec![1.0, 1.0],
            sense: ObjSense::Minimize,
            var_bounds: None,
            integrality: Some(vec![VarType::Integer; 2]),
        };
        MipProblem::new(data).unwrap()
    }

    #[test]
    fn test_pure_branch_and_bound() {
        let settings = MipSettings::default()
            .without_cuts()
            .with_branching(BranchingRule::MostFractional);
        let mut bb = BranchAndBound::new(identity_problem(), settings).unwrap();
        let sol = bb.solve().unwrap();

        assert_eq!(sol.status, MipStatus::Optimal);
        assert!((sol.obj_val - 4.0).abs() < 1e-9);
        assert_eq!(sol.x, Some(vec![2.0, 2.0]));
        assert_eq!(sol.bound, sol.primal_bound);
        assert!(sol.stats.nodes_branched >= 2);
        assert_eq!(sol.stats.nodes_queued as usize, bb.tree().len());
        assert_eq!(bb.queue.total_popped(), sol.stats.nodes_evaluated);

        // Root split on x0 at 1.5.
        let tree = bb.tree();
        let (l, r) = tree.children(0).unwrap();
        let left = tree.get(l).unwrap().branch.unwrap();
        assert_eq!(left.var, 0);
        assert_eq!(tree.get(l).unwrap().master.var_bounds(0).1, 1.0);
        assert_eq!(tree.get(r).unwrap().master.var_bounds(0).0, 2.0);
    }

    /// Driver with incumbent 4 and one root whose LP cannot pivot, so its
    /// solve ends on the iteration cap.
    fn driver_with_failing_node(dual_bound: f64) -> (BranchAndBound, NodeId) {
        let settings = MipSettings::default().without_cuts();
        let mut bb = BranchAndBound::new(identity_problem(), settings).unwrap();
        assert!(bb.incumbent.offer(&[2.0, 2.0], 4.0));

        let lp_settings = SimplexSettings {
            max_iter: 0,
            ..SimplexSettings::default()
        };
        let master = SimplexMaster::new(&bb.ctx.problem, lp_settings).unwrap();
        let mut node = Node::root(master);
        node.dual_bound = dual_bound;
        let id = bb.tree.insert_root(node);
        (bb, id)
    }

    #[test]
    fn test_failed_node_dominated_by_incumbent_is_pruned() {
        let (mut bb, id) = driver_with_failing_node(4.0);
        assert_eq!(bb.process(id).unwrap(), None);
        assert!(bb.tree.get(id).unwrap().numerical_failure);
        assert_eq!(bb.stats.nodes_pruned, 1);
        assert_eq!(bb.stats.nodes_failed, 0);
        assert_eq!(bb.exhausted_status(), MipStatus::Optimal);
    }

    #[test]
    fn test_failed_node_below_incumbent_is_reported() {
        let (mut bb, id) = driver_with_failing_node(3.0);
        assert_eq!(bb.process(id).unwrap(), None);
        assert_eq!(bb.stats.nodes_failed, 1);
        assert_eq!(bb.failed_bound, 3.0);
        assert_eq!(bb.exhausted_status(), MipStatus::NumericalError);
        assert_eq!(bb.dual_bound(), 3.0);
    }

    #[test]
    fn test_solve_twice_is_an_error() {
        let mut bb = BranchAndBound::new(identity_problem(), MipSettings::default()).unwrap();
        bb.solve().unwrap();
        assert!(matches!(bb.solve(), Err(MipError::InternalError(_))));
    }

    #[test]
    fn test_node_limit() {
        let settings = MipSettings::default()
            .without_cuts()
            .with_max_nodes(1)
            .with_node_selection(NodeSelection::DepthFirst);
        let mut bb = BranchAndBound::new(identity_problem(), settings).unwrap();
        let sol = bb.solve().unwrap();

        assert_eq!(sol.status, MipStatus::NodeLimit);
        assert_eq!(sol.nodes_explored, 1);
        assert!(sol.x.is_none());
        assert!((sol.bound - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_initial_primal_bound_prunes_everything() {
        let mut settings = MipSettings::default().without_cuts();
        settings.initial_primal_bound = Some(2.0);
        let mut bb = BranchAndBound::new(identity_problem(), settings).unwrap();
        let sol = bb.solve().unwrap();

        // Nothing beats 2, and the root LP (3) says so at once.
        assert_eq!(sol.status, MipStatus::Infeasible);
        assert_eq!(sol.nodes_explored, 1);
        assert_eq!(sol.primal_bound, 2.0);
        assert_eq!(sol.obj_val, f64::INFINITY);
    }

    #[test]
    fn test_dominated() {
        assert!(dominated(5.0, 5.0));
        assert!(dominated(6.0, 5.0));
        assert!(!dominated(4.0, 5.0));
        assert!(!dominated(1e300, f64::INFINITY));
    }
}
