//! Search node: one LP relaxation plus its place in the tree.

use super::branching::{most_fractional, PseudoCostBrancher};
use super::queue::QueueEntry;
use super::SolveContext;
use crate::cuts::{Cglp, CutPool, DisjunctiveTerm};
use crate::error::MipResult;
use crate::master::{LinearCut, MasterBackend, MasterResult, MasterStatus, SimplexMaster};
use crate::settings::{BranchingRule, CglpReuse, CglpSeparation};

/// Node identifier, assigned by the tree on insertion.
pub type NodeId = u64;

/// Side of a branching split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// `x <= floor(value)`.
    Down,
    /// `x >= ceil(value)`.
    Up,
}

/// How a node was created from its parent.
#[derive(Debug, Clone, Copy)]
pub struct BranchInfo {
    /// Branching variable.
    pub var: usize,

    /// Side of the split.
    pub direction: Direction,

    /// Parent LP value of the variable.
    pub value: f64,

    /// Distance from `value` to the new bound.
    pub gap: f64,
}

/// What happened during one call to [`Node::bound`].
#[derive(Debug, Clone, Default)]
pub struct BoundOutcome {
    /// Cutting-plane rounds run.
    pub rounds: usize,

    /// Gomory cuts generated.
    pub gomory_cuts: usize,

    /// CGLP cuts generated.
    pub cglp_cuts: usize,

    /// CGLP separations that failed numerically.
    pub cglp_failures: usize,

    /// Cuts added as LP rows.
    pub cuts_added: usize,

    /// Cut rows dropped for having a zero dual.
    pub cuts_dropped: usize,

    /// Simplex iterations spent.
    pub lp_iterations: usize,

    /// Cuts valid for the whole disjunction, to share with its open nodes.
    pub broadcast: Vec<LinearCut>,
}

/// A node of the branch-and-bound tree.
///
/// Owns its LP relaxation. Children get independent copies of it.
#[derive(Debug, Clone)]
pub struct Node<M: MasterBackend = SimplexMaster> {
    /// Identifier; `None` until the node is put in a tree.
    pub id: Option<NodeId>,

    /// Ids from the root down to this node.
    pub lineage: Vec<NodeId>,

    /// Depth in the tree (0 for root).
    pub depth: usize,

    /// Lower bound on every solution in this subtree, fixed at creation.
    pub dual_bound: f64,

    /// LP optimum after bounding; `+inf` when infeasible.
    pub objective_value: f64,

    /// LP solution after bounding.
    pub solution: Option<Vec<f64>>,

    /// LP relaxation is feasible.
    pub lp_feasible: bool,

    /// LP solution satisfies integrality.
    pub mip_feasible: bool,

    /// LP relaxation is unbounded.
    pub unbounded: bool,

    /// LP relaxation could not be solved reliably.
    pub numerical_failure: bool,

    /// `bound` has run.
    pub evaluated: bool,

    /// No children yet.
    pub is_leaf: bool,

    /// Branching that created this node (`None` at the root).
    pub branch: Option<BranchInfo>,

    /// Candidate cuts not yet in the LP.
    pub cut_pool: CutPool,

    /// LP relaxation.
    pub master: M,

    /// Disjunctive cut generator, if one was attached.
    pub cglp: Option<Cglp>,

    /// Rows below this index are model rows; the rest are cuts.
    base_rows: usize,
}

impl<M: MasterBackend> Node<M> {
    /// Root node over `master`. Every row already in `master` is a model row.
    pub fn root(master: M) -> Self {
        let base_rows = master.num_rows();
        Self {
            id: None,
            lineage: Vec::new(),
            depth: 0,
            dual_bound: f64::NEG_INFINITY,
            objective_value: f64::NEG_INFINITY,
            solution: None,
            lp_feasible: false,
            mip_feasible: false,
            unbounded: false,
            numerical_failure: false,
            evaluated: false,
            is_leaf: true,
            branch: None,
            cut_pool: CutPool::new(),
            master,
            cglp: None,
            base_rows,
        }
    }

    /// Number of model rows (cut rows come after).
    pub fn base_rows(&self) -> usize {
        self.base_rows
    }

    /// Queue record for this node.
    pub fn queue_entry(&self) -> QueueEntry {
        QueueEntry {
            id: self.id.unwrap_or_default(),
            dual_bound: self.dual_bound,
            depth: self.depth,
        }
    }

    /// Solve the relaxation and tighten it with cutting planes.
    ///
    /// Rounds stop when the LP becomes integral, infeasible or unsolvable,
    /// when no cut is accepted, when the objective improves by less than
    /// `cutting_plane_progress_tolerance` (relative), or after
    /// `max_cut_rounds`.
    pub fn bound(&mut self, ctx: &SolveContext) -> BoundOutcome {
        let mut outcome = BoundOutcome::default();
        self.evaluated = true;

        let mut result = self.master.solve();
        outcome.lp_iterations += result.iterations;
        self.apply(&result, ctx);

        let cuts = &ctx.settings.cuts;
        let cuts_on = cuts.gomory_cuts || self.cglp.is_some();
        if !cuts_on {
            return outcome;
        }

        for round in 0..cuts.max_cut_rounds {
            if !self.lp_feasible || self.mip_feasible {
                break;
            }
            let Some(x) = self.solution.clone() else {
                break;
            };
            outcome.rounds += 1;

            // Candidates come from the current tableau, before any row edit.
            self.generate_cuts(ctx, &x, round, &mut outcome);

            if cuts.drop_inactive_cuts {
                match self.drop_inactive_cuts(&result.duals) {
                    Ok(n) => outcome.cuts_dropped += n,
                    Err(e) => log::warn!("node {:?}: failed to drop cut rows: {}", self.id, e),
                }
            }

            let accepted = ctx.selector.select(&mut self.cut_pool, &x);
            if accepted.is_empty() {
                break;
            }
            let first_new = self.master.num_rows();
            if let Err(e) = self.master.add_cuts(&accepted) {
                log::warn!("node {:?}: failed to add cuts: {}", self.id, e);
                break;
            }
            outcome.cuts_added += accepted.len();

            let previous = self.objective_value;
            result = self.master.solve();
            outcome.lp_iterations += result.iterations;

            if matches!(
                result.status,
                MasterStatus::IterationLimit | MasterStatus::NumericalError
            ) {
                // Undo the round rather than lose the node.
                log::warn!(
                    "node {:?}: LP {:?} after adding cuts, rolling back round {}",
                    self.id,
                    result.status,
                    round
                );
                let added: Vec<usize> = (first_new..self.master.num_rows()).collect();
                if self.master.remove_rows(&added).is_ok() {
                    outcome.cuts_added -= accepted.len();
                    result = self.master.solve();
                    outcome.lp_iterations += result.iterations;
                }
                self.apply(&result, ctx);
                break;
            }

            self.apply(&result, ctx);
            if !self.lp_feasible {
                break;
            }
            let progress = (self.objective_value - previous) / previous.abs().max(1.0);
            if progress < cuts.cutting_plane_progress_tolerance {
                break;
            }
        }

        log::debug!(
            "node {:?}: obj {:.6}, {} rounds, {} cuts added, mip feasible {}",
            self.id,
            self.objective_value,
            outcome.rounds,
            outcome.cuts_added,
            self.mip_feasible
        );
        outcome
    }

    /// Record a master result on the node.
    fn apply(&mut self, result: &MasterResult, ctx: &SolveContext) {
        self.lp_feasible = false;
        self.mip_feasible = false;
        self.unbounded = false;
        self.numerical_failure = false;

        match result.status {
            MasterStatus::Optimal => {
                self.lp_feasible = true;
                self.objective_value = result.obj_val;
                self.mip_feasible = ctx
                    .problem
                    .is_integer_feasible(&result.x, ctx.settings.int_feas_tol);
                self.solution = Some(result.x.clone());
            }
            MasterStatus::Infeasible => {
                self.objective_value = f64::INFINITY;
                self.solution = None;
            }
            MasterStatus::Unbounded => {
                self.unbounded = true;
                self.objective_value = f64::NEG_INFINITY;
                self.solution = None;
            }
            MasterStatus::IterationLimit | MasterStatus::NumericalError => {
                self.numerical_failure = true;
                self.solution = None;
            }
        }
    }

    fn generate_cuts(
        &mut self,
        ctx: &SolveContext,
        x: &[f64],
        round: usize,
        outcome: &mut BoundOutcome,
    ) {
        let tag = format!("n{}_r{}", self.id.unwrap_or_default(), round);

        if ctx.settings.cuts.gomory_cuts {
            let cuts = ctx.gomory.generate(&self.master, &ctx.problem.is_integer, &tag);
            outcome.gomory_cuts += cuts.len();
            for cut in cuts {
                self.cut_pool.add(cut);
            }
        }

        if let Some(cglp) = self.cglp.as_mut() {
            let point = match ctx.settings.cglp.separation {
                CglpSeparation::DisjunctionRoot => match cglp.point() {
                    // The root point does not move between rounds.
                    Some(_) if round > 0 => return,
                    Some(root_x) => root_x.to_vec(),
                    None => x.to_vec(),
                },
                CglpSeparation::Node => x.to_vec(),
            };
            match cglp.separate(&point) {
                Some(cut) => {
                    let cut = cut.with_name(format!("{}_cglp", tag));
                    outcome.cglp_cuts += 1;
                    if cut.is_broadcastable() {
                        outcome.broadcast.push(cut.clone());
                    }
                    self.cut_pool.add(cut);
                }
                None if cglp.failed() => outcome.cglp_failures += 1,
                None => {}
            }
        }
    }

    /// Remove cut rows whose dual value is zero. Returns how many went.
    fn drop_inactive_cuts(&mut self, duals: &[f64]) -> MipResult<usize> {
        let inactive: Vec<usize> = (self.base_rows..self.master.num_rows())
            .filter(|&i| duals.get(i).map_or(false, |d| d.abs() <= 1e-9))
            .collect();
        if !inactive.is_empty() {
            self.master.remove_rows(&inactive)?;
        }
        Ok(inactive.len())
    }

    /// Split on a fractional integer variable.
    ///
    /// Returns `None` when the node has no LP solution or no fractional
    /// variable. The children partition the parent's integer points: the
    /// left one gets `x <= floor(v)`, the right one `x >= ceil(v)`.
    pub fn branch(
        &mut self,
        ctx: &SolveContext,
        brancher: &mut PseudoCostBrancher,
    ) -> MipResult<Option<(Self, Self)>> {
        let Some(x) = self.solution.as_deref() else {
            return Ok(None);
        };
        let var = match ctx.settings.branching_rule {
            BranchingRule::MostFractional => {
                most_fractional(&ctx.problem, x, ctx.settings.int_feas_tol)
            }
            BranchingRule::Pseudocost => {
                brancher.select(&self.master, x, self.objective_value, ctx)
            }
        };
        let Some(var) = var else {
            return Ok(None);
        };
        let value = x[var];
        let (lb, ub) = self.master.var_bounds(var);

        let mut left = self.child(BranchInfo {
            var,
            direction: Direction::Down,
            value,
            gap: value - value.floor(),
        });
        left.master.set_var_bounds(var, lb, value.floor())?;

        let mut right = self.child(BranchInfo {
            var,
            direction: Direction::Up,
            value,
            gap: value.ceil() - value,
        });
        right.master.set_var_bounds(var, value.ceil(), ub)?;

        if ctx.settings.cglp.reuse == CglpReuse::Rebuild {
            for child in [&mut left, &mut right] {
                child.cglp = match child.cglp.take() {
                    Some(cglp) => cglp.rebuild(&DisjunctiveTerm::from_master(&child.master)),
                    None => None,
                };
            }
        }

        self.is_leaf = false;
        log::debug!(
            "node {:?}: branch on x{} = {:.6} (depth {})",
            self.id,
            var,
            value,
            self.depth
        );
        Ok(Some((left, right)))
    }

    fn child(&self, info: BranchInfo) -> Self {
        Self {
            id: None,
            lineage: self.lineage.clone(),
            depth: self.depth + 1,
            dual_bound: self.objective_value,
            objective_value: self.objective_value,
            solution: None,
            lp_feasible: false,
            mip_feasible: false,
            unbounded: false,
            numerical_failure: false,
            evaluated: false,
            is_leaf: true,
            branch: Some(info),
            cut_pool: self.cut_pool.clone(),
            master: self.master.clone(),
            cglp: self.cglp.clone(),
            base_rows: self.base_rows,
        }
    }
}
