//! Configuration settings for the MIP solver.

use lp_core::SimplexSettings;

/// Branching variable selection rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BranchingRule {
    /// Select the variable whose value is furthest from both floor and ceiling.
    MostFractional,

    /// Use pseudocost estimates, bootstrapped by strong branching on unseen variables.
    #[default]
    Pseudocost,
}

/// Node selection strategy for the B&B tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeSelection {
    /// Always select node with best (lowest) dual bound.
    #[default]
    BestBound,

    /// Depth-first search (helps find feasible solutions quickly).
    DepthFirst,

    /// Breadth-first search (shallowest node first).
    BreadthFirst,
}

/// Cutting-plane loop and cut selection settings.
#[derive(Debug, Clone)]
pub struct CutSettings {
    /// Generate Gomory mixed-integer cuts from the node tableau.
    pub gomory_cuts: bool,

    /// Maximum cutting-plane rounds per node.
    pub max_cut_rounds: usize,

    /// Stop the cut loop once the relative objective improvement of a round
    /// falls below this.
    pub cutting_plane_progress_tolerance: f64,

    /// Discard candidates with more nonzero coefficients than this.
    pub max_nonzero_coefs: usize,

    /// Discard candidates whose largest |coefficient| exceeds this multiple of
    /// the largest root objective coefficient.
    pub max_relative_cut_term_ratio: f64,

    /// Minimum normalized violation for a cut to be accepted.
    pub min_cut_depth: f64,

    /// Minimum angle in degrees between two cuts accepted in the same round.
    pub parallel_cut_tolerance: f64,

    /// Largest denominator used when rounding cut coefficients to rationals.
    pub max_denominator: u64,

    /// Drop cut rows with zero dual value before each new round.
    pub drop_inactive_cuts: bool,
}

impl Default for CutSettings {
    fn default() -> Self {
        Self {
            gomory_cuts: true,
            max_cut_rounds: 10,
            cutting_plane_progress_tolerance: 1e-3,
            max_nonzero_coefs: 1000,
            max_relative_cut_term_ratio: 1e4,
            min_cut_depth: 1e-4,
            parallel_cut_tolerance: 5.0,
            max_denominator: 1000,
            drop_inactive_cuts: true,
        }
    }
}

/// How a node hands its CGLP to its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CglpReuse {
    /// Children share the parent's CGLP unchanged; its cuts stay broadcastable.
    #[default]
    PassThrough,

    /// Each child rebuilds the CGLP with its own bounds and cut rows. Tighter,
    /// but the resulting cuts are only valid for that child's subtree.
    Rebuild,
}

/// Point handed to the CGLP for separation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CglpSeparation {
    /// The LP point of the disjunction root, once per node. It lies outside
    /// every term, so a violated cut always exists.
    #[default]
    DisjunctionRoot,

    /// The node's own LP point, every cut round. That point usually lies
    /// inside the node's own term and is then not separable.
    Node,
}

/// Disjunctive cut (CGLP) settings.
#[derive(Debug, Clone)]
pub struct CglpSettings {
    /// Enable CGLP cuts.
    pub enabled: bool,

    /// Build the CGLP once this many nodes have been evaluated.
    pub build_after_nodes: u64,

    /// Reuse policy when branching.
    pub reuse: CglpReuse,

    /// Which point the CGLP separates.
    pub separation: CglpSeparation,

    /// Minimum violation `pi0 - pi·x*` for a CGLP cut to be returned.
    pub violation_tol: f64,

    /// Settings for the CGLP simplex.
    pub simplex: SimplexSettings,
}

impl Default for CglpSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            build_after_nodes: 8,
            reuse: CglpReuse::default(),
            separation: CglpSeparation::default(),
            violation_tol: 1e-6,
            simplex: SimplexSettings::default(),
        }
    }
}

/// MIP solver settings.
#[derive(Debug, Clone)]
pub struct MipSettings {
    // === Termination criteria ===
    /// Maximum number of nodes to explore.
    pub max_nodes: u64,

    /// Time limit in milliseconds (None = unlimited).
    pub time_limit_ms: Option<u64>,

    /// Relative optimality gap tolerance.
    /// Stop when |incumbent - bound| / |incumbent| <= gap_tol.
    pub gap_tol: f64,

    /// Integer feasibility tolerance.
    /// A variable is considered integer if |x - round(x)| <= int_feas_tol.
    pub int_feas_tol: f64,

    /// Objective value of a known feasible solution (in the caller's sense).
    /// Nodes that cannot beat it are pruned.
    pub initial_primal_bound: Option<f64>,

    // === Search strategy ===
    /// Branching variable selection rule.
    pub branching_rule: BranchingRule,

    /// Node selection strategy.
    pub node_selection: NodeSelection,

    /// Iteration cap for each strong-branching probe.
    pub strong_branch_iters: usize,

    // === Cut settings ===
    /// Cutting-plane loop settings.
    pub cuts: CutSettings,

    /// Disjunctive cut settings.
    pub cglp: CglpSettings,

    // === Solver settings ===
    /// Settings for the node LP simplex.
    pub master_settings: SimplexSettings,

    // === Output ===
    /// Print progress information.
    pub verbose: bool,

    /// Log frequency (print every N nodes).
    pub log_freq: u64,
}

impl Default for MipSettings {
    fn default() -> Self {
        Self {
            // Termination
            max_nodes: 1_000_000,
            time_limit_ms: None,
            gap_tol: 1e-4,
            int_feas_tol: 1e-6,
            initial_primal_bound: None,

            // Search
            branching_rule: BranchingRule::default(),
            node_selection: NodeSelection::default(),
            strong_branch_iters: 20,

            // Cuts
            cuts: CutSettings::default(),
            cglp: CglpSettings::default(),

            // Solver
            master_settings: SimplexSettings::default(),

            // Output
            verbose: false,
            log_freq: 100,
        }
    }
}

impl MipSettings {
    /// Create settings with verbose output enabled.
    pub fn verbose() -> Self {
        Self {
            verbose: true,
            log_freq: 1,
            ..Self::default()
        }
    }

    /// Set time limit in seconds.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit_ms = Some((seconds * 1000.0) as u64);
        self
    }

    /// Set maximum nodes.
    pub fn with_max_nodes(mut self, nodes: u64) -> Self {
        self.max_nodes = nodes;
        self
    }

    /// Set optimality gap tolerance.
    pub fn with_gap_tol(mut self, tol: f64) -> Self {
        self.gap_tol = tol;
        self
    }

    /// Set the branching rule.
    pub fn with_branching(mut self, rule: BranchingRule) -> Self {
        self.branching_rule = rule;
        self
    }

    /// Set the node selection strategy.
    pub fn with_node_selection(mut self, selection: NodeSelection) -> Self {
        self.node_selection = selection;
        self
    }

    /// Disable all cutting planes (pure branch-and-bound).
    pub fn without_cuts(mut self) -> Self {
        self.cuts.gomory_cuts = false;
        self.cglp.enabled = false;
        self
    }

    /// Enable CGLP cuts, built after `nodes` evaluated nodes.
    pub fn with_cglp(mut self, nodes: u64) -> Self {
        self.cglp.enabled = true;
        self.cglp.build_after_nodes = nodes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = MipSettings::default();
        assert_eq!(s.branching_rule, BranchingRule::Pseudocost);
        assert_eq!(s.node_selection, NodeSelection::BestBound);
        assert!(s.cuts.gomory_cuts);
        assert!(!s.cglp.enabled);
        assert_eq!(s.cglp.reuse, CglpReuse::PassThrough);
        assert_eq!(s.cglp.separation, CglpSeparation::DisjunctionRoot);
        assert!(s.time_limit_ms.is_none());
        assert!(!s.verbose);
    }

    #[test]
    fn test_builders() {
        let s = MipSettings::verbose()
            .with_time_limit(1.5)
            .with_max_nodes(40)
            .with_gap_tol(0.0)
            .with_branching(BranchingRule::MostFractional)
            .with_node_selection(NodeSelection::DepthFirst)
            .with_cglp(3);
        assert!(s.verbose);
        assert_eq!(s.time_limit_ms, Some(1500));
        assert_eq!(s.max_nodes, 40);
        assert_eq!(s.gap_tol, 0.0);
        assert_eq!(s.branching_rule, BranchingRule::MostFractional);
        assert_eq!(s.node_selection, NodeSelection::DepthFirst);
        assert!(s.cglp.enabled);
        assert_eq!(s.cglp.build_after_nodes, 3);

        let bare = s.without_cuts();
        assert!(!bare.cuts.gomory_cuts);
        assert!(!bare.cglp.enabled);
    }
}
