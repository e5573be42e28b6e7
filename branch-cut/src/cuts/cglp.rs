//! Cut generating LP for a disjunction of polyhedra.
//!
//! Given terms `T_k = { x : A_k x >= b_k, lb_k <= x <= ub_k }`, an inequality
//! `pi·x >= pi0` is valid for every term exactly when multipliers
//! `u_k, w_k, v_k >= 0` exist with
//!
//! ```text
//! pi  = A_k^T u_k + w_k - v_k
//! pi0 <= b_k·u_k + lb_k·w_k - ub_k·v_k
//! ```
//!
//! The CGLP searches over these multipliers for the cut most violated by a
//! point `x*`, minimizing `x*·pi - pi0` under the normalization
//! `sum(u, w, v) = 1`. Variables are laid out as
//! `[pi (free) | pi0 (free) | u_1 w_1 v_1 | u_2 w_2 v_2 | ...]`.

use lp_core::{LpStatus, SimplexLp, SimplexMethod};

use crate::master::{CutSource, LinearCut, MasterBackend};
use crate::search::NodeId;
use crate::settings::CglpSettings;

/// One term of a disjunction: `{ x : rows·x >= rhs, lb <= x <= ub }`.
#[derive(Debug, Clone)]
pub struct DisjunctiveTerm {
    /// Constraint rows.
    pub rows: Vec<Vec<f64>>,
    /// Row right-hand sides.
    pub rhs: Vec<f64>,
    /// Variable lower bounds.
    pub lb: Vec<f64>,
    /// Variable upper bounds.
    pub ub: Vec<f64>,
}

impl DisjunctiveTerm {
    /// The region described by a node LP: every row plus the current bounds.
    pub fn from_master<M: MasterBackend>(master: &M) -> Self {
        let n = master.num_vars();
        let m = master.num_rows();
        let (lb, ub) = (0..n).map(|j| master.var_bounds(j)).unzip();
        Self {
            rows: (0..m).map(|i| master.row(i).to_vec()).collect(),
            rhs: (0..m).map(|i| master.row_bounds(i).0).collect(),
            lb,
            ub,
        }
    }

    /// Intersection with another region over the same variables.
    pub fn intersect(&self, other: &DisjunctiveTerm) -> DisjunctiveTerm {
        let mut rows = self.rows.clone();
        rows.extend(other.rows.iter().cloned());
        let mut rhs = self.rhs.clone();
        rhs.extend(other.rhs.iter().copied());
        DisjunctiveTerm {
            rows,
            rhs,
            lb: self.lb.iter().zip(&other.lb).map(|(a, b)| a.max(*b)).collect(),
            ub: self.ub.iter().zip(&other.ub).map(|(a, b)| a.min(*b)).collect(),
        }
    }

    /// Whether `x` lies in the term.
    pub fn contains(&self, x: &[f64], tol: f64) -> bool {
        let in_bounds = x
            .iter()
            .zip(self.lb.iter().zip(&self.ub))
            .all(|(v, (l, u))| *v >= l - tol && *v <= u + tol);
        in_bounds
            && self.rows.iter().zip(&self.rhs).all(|(row, &b)| {
                let ax: f64 = row.iter().zip(x).map(|(a, v)| a * v).sum();
                ax >= b - tol
            })
    }

    /// Whether the term has no points.
    fn is_empty(&self, settings: &CglpSettings) -> bool {
        if self.lb.iter().zip(&self.ub).any(|(l, u)| l > u) {
            return true;
        }
        let mut lp = SimplexLp::new(vec![0.0; self.lb.len()], settings.simplex.clone());
        let built = (0..self.lb.len())
            .try_for_each(|j| lp.set_col_bounds(j, self.lb[j], self.ub[j]))
            .and_then(|_| {
                self.rows
                    .iter()
                    .zip(&self.rhs)
                    .try_for_each(|(row, &b)| lp.add_row(row.clone(), b, f64::INFINITY, "t").map(|_| ()))
            });
        built.is_err() || lp.solve() == LpStatus::Infeasible
    }
}

/// A built cut generating LP.
#[derive(Debug, Clone)]
pub struct Cglp {
    n: usize,
    root: NodeId,
    terms: Vec<DisjunctiveTerm>,
    lp: SimplexLp,
    broadcastable: bool,
    failed: bool,
    point: Option<Vec<f64>>,
    settings: CglpSettings,
}

impl Cglp {
    /// Build the CGLP for the disjunction rooted at `root`.
    ///
    /// When `restrict` is given, every term is intersected with it first and
    /// terms left empty are dropped; the result then only speaks for the
    /// restricted region and is not broadcastable. Returns `None` when no
    /// term remains.
    pub fn build(
        root: NodeId,
        terms: Vec<DisjunctiveTerm>,
        restrict: Option<&DisjunctiveTerm>,
        settings: &CglpSettings,
    ) -> Option<Self> {
        let n = terms.first()?.lb.len();
        let terms: Vec<DisjunctiveTerm> = match restrict {
            Some(r) => terms
                .iter()
                .map(|t| t.intersect(r))
                .filter(|t| !t.is_empty(settings))
                .collect(),
            None => terms,
        };
        if terms.is_empty() {
            return None;
        }

        let lp = match build_lp(n, &terms, settings) {
            Ok(lp) => lp,
            Err(e) => {
                log::warn!("cglp: failed to build meta-LP: {}", e);
                return None;
            }
        };
        log::debug!(
            "cglp: {} terms, {} columns, {} rows",
            terms.len(),
            lp.num_cols(),
            lp.num_rows()
        );

        Some(Self {
            n,
            root,
            terms,
            lp,
            broadcastable: restrict.is_none(),
            failed: false,
            point: None,
            settings: settings.clone(),
        })
    }

    /// Attach the LP point of the disjunction root.
    ///
    /// Once the root has branched on a fractional variable its point lies in
    /// no term, so it is outside their hull and always separable.
    pub fn with_point(mut self, x: Vec<f64>) -> Self {
        self.point = Some(x);
        self
    }

    /// LP point of the disjunction root, if attached.
    pub fn point(&self) -> Option<&[f64]> {
        self.point.as_deref()
    }

    /// Rebuild restricted to `region` (a child's bounds and cut rows).
    pub fn rebuild(&self, region: &DisjunctiveTerm) -> Option<Self> {
        let cglp = Self::build(self.root, self.terms.clone(), Some(region), &self.settings)?;
        Some(Self {
            point: self.point.clone(),
            ..cglp
        })
    }

    /// Deepest cut valid for every term that `x_star` violates, if any.
    ///
    /// A numerical failure of the meta-LP sets [`Cglp::failed`] and yields no
    /// cut for this call only.
    pub fn separate(&mut self, x_star: &[f64]) -> Option<LinearCut> {
        self.failed = false;
        let mut obj = vec![0.0; self.lp.num_cols()];
        obj[..self.n].copy_from_slice(x_star);
        obj[self.n] = -1.0;
        if self.lp.set_objective(obj).is_err() {
            self.failed = true;
            return None;
        }

        match self.lp.solve() {
            LpStatus::Optimal => {}
            status => {
                log::warn!("cglp: meta-LP ended with {}, no cut this round", status);
                self.failed = true;
                return None;
            }
        }
        if self.lp.objective_value() >= -self.settings.violation_tol {
            return None;
        }

        let sol = self.lp.primal()?;
        let mut cut = LinearCut::new(
            sol[..self.n].to_vec(),
            sol[self.n],
            CutSource::Cglp {
                broadcastable: self.broadcastable,
            },
        );
        cut.normalize();
        cut.is_valid().then_some(cut)
    }

    /// Node whose subtree leaves form the disjunction.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Whether cuts from this CGLP hold for the whole disjunction.
    pub fn is_broadcastable(&self) -> bool {
        self.broadcastable
    }

    /// Whether the last separation failed numerically.
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Terms of the disjunction.
    pub fn terms(&self) -> &[DisjunctiveTerm] {
        &self.terms
    }
}

fn build_lp(
    n: usize,
    terms: &[DisjunctiveTerm],
    settings: &CglpSettings,
) -> lp_core::LpResult<SimplexLp> {
    // Column offsets of each term's (u, w, v) block
    let mut blocks = Vec::with_capacity(terms.len());
    let mut ncols = n + 1;
    for term in terms {
        let w: Vec<usize> = (0..n).filter(|&j| term.lb[j].is_finite()).collect();
        let v: Vec<usize> = (0..n).filter(|&j| term.ub[j].is_finite()).collect();
        let width = term.rows.len() + w.len() + v.len();
        blocks.push((ncols, w, v));
        ncols += width;
    }

    let mut lp = SimplexLp::new(vec![0.0; ncols], settings.simplex.clone());
    lp.set_method(SimplexMethod::Primal);
    for j in 0..=n {
        lp.set_col_bounds(j, f64::NEG_INFINITY, f64::INFINITY)?;
    }

    let mut normalization = vec![0.0; ncols];
    for (k, (term, (start, w, v))) in terms.iter().zip(&blocks).enumerate() {
        let m = term.rows.len();
        let w_start = start + m;
        let v_start = w_start + w.len();

        // pi_j - sum_i A_ij u_i - w_j + v_j = 0
        for j in 0..n {
            let mut row = vec![0.0; ncols];
            row[j] = 1.0;
            for (i, a) in term.rows.iter().enumerate() {
                row[start + i] = -a[j];
            }
            if let Some(p) = w.iter().position(|&c| c == j) {
                row[w_start + p] = -1.0;
            }
            if let Some(p) = v.iter().position(|&c| c == j) {
                row[v_start + p] = 1.0;
            }
            lp.add_row(row, 0.0, 0.0, format!("pi_{}_{}", k, j))?;
        }

        // pi0 - b·u - lb·w + ub·v <= 0
        let mut row = vec![0.0; ncols];
        row[n] = 1.0;
        for (i, &b) in term.rhs.iter().enumerate() {
            row[start + i] = -b;
        }
        for (p, &j) in w.iter().enumerate() {
            row[w_start + p] = -term.lb[j];
        }
        for (p, &j) in v.iter().enumerate() {
            row[v_start + p] = term.ub[j];
        }
        lp.add_row(row, f64::NEG_INFINITY, 0.0, format!("pi0_{}", k))?;

        for c in normalization.iter_mut().take(v_start + v.len()).skip(*start) {
            *c = 1.0;
        }
    }
    lp.add_row(normalization, 1.0, 1.0, "normalization")?;
    Ok(lp)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Region x0 + x1 <= 1.5, 0 <= x <= 1, split on x0 <= 0 / x0 >= 1.
    fn split_terms() -> Vec<DisjunctiveTerm> {
        let rows = vec![vec![-1.0, -1.0]];
        let rhs = vec![-1.5];
        vec![
            DisjunctiveTerm {
                rows: rows.clone(),
                rhs: rhs.clone(),
                lb: vec![0.0, 0.0],
                ub: vec![0.0, 1.0],
            },
            DisjunctiveTerm {
                rows,
                rhs,
                lb: vec![1.0, 0.0],
                ub: vec![1.0, 1.0],
            },
        ]
    }

    fn term_vertices() -> Vec<[f64; 2]> {
        vec![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 0.5]]
    }

    #[test]
    fn test_separates_point_outside_hull() {
        let mut cglp = Cglp::build(0, split_terms(), None, &CglpSettings::default()).unwrap();
        assert!(cglp.is_broadcastable());

        let x_star = [0.5, 1.0];
        let cut = cglp.separate(&x_star).unwrap();
        assert!(cut.is_violated(&x_star, 1e-6));
        assert!(cut.is_broadcastable());
        for v in term_vertices() {
            assert!(!cut.is_violated(&v, 1e-7), "cut removes {:?}", v);
        }
    }

    #[test]
    fn test_no_cut_inside_hull() {
        let mut cglp = Cglp::build(0, split_terms(), None, &CglpSettings::default()).unwrap();
        assert!(cglp.separate(&[0.5, 0.25]).is_none());
        assert!(!cglp.failed());
    }

    #[test]
    fn test_restricted_rebuild_drops_empty_terms() {
        let cglp = Cglp::build(3, split_terms(), None, &CglpSettings::default()).unwrap();
        let region = DisjunctiveTerm {
            rows: Vec::new(),
            rhs: Vec::new(),
            lb: vec![1.0, 0.0],
            ub: vec![f64::INFINITY, f64::INFINITY],
        };
        let mut local = cglp.rebuild(&region).unwrap();
        assert_eq!(local.terms().len(), 1);
        assert_eq!(local.root(), 3);
        assert!(!local.is_broadcastable());

        // Only x0 = 1, x1 <= 0.5 remains; (0.5, 0.25) is now separable.
        let cut = local.separate(&[0.5, 0.25]).unwrap();
        assert!(!cut.is_broadcastable());
        assert!(!cut.is_violated(&[1.0, 0.0], 1e-7));
        assert!(!cut.is_violated(&[1.0, 0.5], 1e-7));
    }

    #[test]
    fn test_root_point_survives_rebuild() {
        // LP optimum of min -x0 - 2 x1 over the unsplit region.
        let root_x = vec![0.5, 1.0];
        let cglp = Cglp::build(0, split_terms(), None, &CglpSettings::default())
            .unwrap()
            .with_point(root_x.clone());
        assert_eq!(cglp.point(), Some(&root_x[..]));

        let region = DisjunctiveTerm {
            rows: Vec::new(),
            rhs: Vec::new(),
            lb: vec![1.0, 0.0],
            ub: vec![f64::INFINITY, f64::INFINITY],
        };
        let mut local = cglp.rebuild(&region).unwrap();
        assert_eq!(local.point(), Some(&root_x[..]));

        let point = local.point().unwrap().to_vec();
        let cut = local.separate(&point).unwrap();
        assert!(cut.is_violated(&point, 1e-6));
        assert!(!cut.is_violated(&[1.0, 0.0], 1e-7));
        assert!(!cut.is_violated(&[1.0, 0.5], 1e-7));
    }

    #[test]
    fn test_all_terms_empty() {
        let region = DisjunctiveTerm {
            rows: vec![vec![1.0, 1.0]],
            rhs: vec![5.0],
            lb: vec![0.0, 0.0],
            ub: vec![f64::INFINITY, f64::INFINITY],
        };
        assert!(Cglp::build(0, split_terms(), Some(&region), &CglpSettings::default()).is_none());
    }

    #[test]
    fn test_term_contains() {
        let terms = split_terms();
        assert!(terms[0].contains(&[0.0, 1.0], 1e-9));
        assert!(!terms[0].contains(&[0.5, 0.0], 1e-9));
        assert!(!terms[1].contains(&[1.0, 0.75], 1e-9));
    }
}
