//! Shared, read-only solve state and the driver's counters.

use crate::cuts::{CutSelector, GomoryGenerator};
use crate::model::MipProblem;
use crate::settings::MipSettings;

/// Everything a node needs to bound and branch that does not change during
/// the search.
#[derive(Debug, Clone)]
pub struct SolveContext {
    /// Problem in minimization form.
    pub problem: MipProblem,

    /// Solver settings.
    pub settings: MipSettings,

    /// Largest absolute root objective coefficient.
    pub obj_scale: f64,

    /// Gomory generator configured from the settings.
    pub gomory: GomoryGenerator,

    /// Cut selector configured from the settings.
    pub selector: CutSelector,
}

impl SolveContext {
    /// Build the context for `problem`.
    pub fn new(problem: MipProblem, settings: MipSettings) -> Self {
        let obj_scale = problem.obj.iter().fold(0.0_f64, |m, c| m.max(c.abs()));
        let gomory = GomoryGenerator::new(settings.int_feas_tol, settings.cuts.max_denominator);
        let selector = CutSelector::new(settings.cuts.clone(), obj_scale);
        Self {
            problem,
            settings,
            obj_scale,
            gomory,
            selector,
        }
    }
}

/// Counters collected by the driver.
#[derive(Debug, Clone, Default)]
pub struct SolveStats {
    /// Nodes whose LP was solved.
    pub nodes_evaluated: u64,

    /// Nodes pushed onto the open queue.
    pub nodes_queued: u64,

    /// Nodes split into two children.
    pub nodes_branched: u64,

    /// Nodes with an infeasible LP.
    pub nodes_infeasible: u64,

    /// Nodes discarded because they could not beat the incumbent.
    pub nodes_pruned: u64,

    /// Nodes whose LP failed numerically.
    pub nodes_failed: u64,

    /// Gomory cuts generated.
    pub gomory_cuts: u64,

    /// CGLP cuts generated.
    pub cglp_cuts: u64,

    /// Cuts added as LP rows.
    pub cuts_added: u64,

    /// Cut rows dropped for having a zero dual.
    pub cuts_dropped: u64,

    /// CGLP cuts copied into other open nodes' pools.
    pub broadcast_cuts: u64,

    /// CGLP separations that failed numerically.
    pub cglp_failures: u64,

    /// Cutting-plane rounds performed.
    pub cut_rounds: u64,

    /// Strong-branching LP probes.
    pub strong_branch_probes: u64,

    /// Simplex iterations over all node LPs.
    pub lp_iterations: u64,

    /// Deepest node evaluated.
    pub max_depth: usize,
}
