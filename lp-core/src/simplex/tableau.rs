//! Dense simplex tableau.
//!
//! The LP `lo <= A x <= hi, lb <= x <= ub` is written with one activity
//! column per row, `A x - r = 0`, so every column (structural or row) is a
//! bounded variable and the right-hand side is identically zero. The tableau
//! stores `B^{-1} [A | -I]`; for basic row `i`,
//!
//! ```text
//! x_head[i] + sum_{j nonbasic} t[i][j] x_j = 0
//! ```

use super::basis::{Basis, VarStatus};

/// Full dense tableau plus the current primal point.
#[derive(Debug, Clone)]
pub(crate) struct Tableau {
    /// Number of structural columns.
    pub n: usize,
    /// Number of rows.
    pub m: usize,
    /// `B^{-1} [A | -I]`, m rows of length n + m.
    pub t: Vec<Vec<f64>>,
    /// Basic column of each row.
    pub head: Vec<usize>,
    /// Status of every column.
    pub status: Vec<VarStatus>,
    /// Current value of every column.
    pub x: Vec<f64>,
    /// Lower bounds of every column.
    pub lb: Vec<f64>,
    /// Upper bounds of every column.
    pub ub: Vec<f64>,
    /// Phase-two cost of every column (rows cost nothing).
    pub cost: Vec<f64>,
}

impl Tableau {
    /// Build the tableau on the slack basis (every row activity basic).
    pub fn slack_basis(
        rows: &[Vec<f64>],
        row_lo: &[f64],
        row_hi: &[f64],
        col_lb: &[f64],
        col_ub: &[f64],
        obj: &[f64],
    ) -> Self {
        let n = col_lb.len();
        let m = rows.len();
        let ncols = n + m;

        // B = -I, so B^{-1}[A | -I] = [-A | I]
        let mut t = vec![vec![0.0; ncols]; m];
        for (i, row) in rows.iter().enumerate() {
            for (j, &a) in row.iter().enumerate() {
                t[i][j] = -a;
            }
            t[i][n + i] = 1.0;
        }

        let mut lb = Vec::with_capacity(ncols);
        let mut ub = Vec::with_capacity(ncols);
        lb.extend_from_slice(col_lb);
        ub.extend_from_slice(col_ub);
        lb.extend_from_slice(row_lo);
        ub.extend_from_slice(row_hi);

        let mut cost = vec![0.0; ncols];
        cost[..n].copy_from_slice(obj);

        let mut status = vec![VarStatus::Basic; ncols];
        for j in 0..n {
            status[j] = dual_friendly_status(obj[j], lb[j], ub[j]);
        }

        let mut tab = Self {
            n,
            m,
            t,
            head: (n..ncols).collect(),
            status,
            x: vec![0.0; ncols],
            lb,
            ub,
            cost,
        };
        tab.recompute_values();
        tab
    }

    /// Number of columns (structural + row activities).
    pub fn ncols(&self) -> usize {
        self.n + self.m
    }

    /// Pivot the columns marked basic in `basis` into the tableau.
    ///
    /// Returns false when the requested basis is singular; the tableau is then
    /// in an unspecified (but consistent) basis and should be rebuilt.
    pub fn apply_basis(&mut self, basis: &Basis, tol_pivot: f64) -> bool {
        let ncols = self.ncols();
        let wanted: Vec<bool> = (0..ncols)
            .map(|k| basis.status(k) == VarStatus::Basic)
            .collect();

        for q in 0..ncols {
            if !wanted[q] || self.status[q] == VarStatus::Basic {
                continue;
            }
            let mut best: Option<(usize, f64)> = None;
            for r in 0..self.m {
                if wanted[self.head[r]] {
                    continue;
                }
                let a = self.t[r][q].abs();
                if a > tol_pivot && best.map_or(true, |(_, b)| a > b) {
                    best = Some((r, a));
                }
            }
            match best {
                Some((r, _)) => {
                    let leaving = self.head[r];
                    self.pivot(r, q);
                    self.status[leaving] = VarStatus::AtLower;
                }
                None => return false,
            }
        }

        for k in 0..ncols {
            if self.status[k].is_nonbasic() {
                let requested = match basis.status(k) {
                    VarStatus::Basic => VarStatus::AtLower,
                    s => s,
                };
                self.status[k] = requested.normalized(self.lb[k], self.ub[k]);
            }
        }
        self.recompute_values();
        true
    }

    /// Gauss-Jordan pivot on `(r, q)`; `q` becomes basic in row `r`.
    ///
    /// The caller sets the status of the leaving column.
    pub fn pivot(&mut self, r: usize, q: usize) {
        let piv = self.t[r][q];
        debug_assert!(piv != 0.0, "zero pivot");
        for v in self.t[r].iter_mut() {
            *v /= piv;
        }
        self.t[r][q] = 1.0;

        let prow = self.t[r].clone();
        for (i, row) in self.t.iter_mut().enumerate() {
            if i == r {
                continue;
            }
            let f = row[q];
            if f == 0.0 {
                continue;
            }
            for (a, p) in row.iter_mut().zip(&prow) {
                *a -= f * p;
            }
            row[q] = 0.0;
        }

        self.head[r] = q;
        self.status[q] = VarStatus::Basic;
    }

    /// Set nonbasic columns to their bound and derive the basic values.
    pub fn recompute_values(&mut self) {
        let ncols = self.ncols();
        for k in 0..ncols {
            if self.status[k].is_nonbasic() {
                self.x[k] = self.status[k].nonbasic_value(self.lb[k], self.ub[k]);
            }
        }
        for r in 0..self.m {
            let mut v = 0.0;
            for (k, &a) in self.t[r].iter().enumerate() {
                if a != 0.0 && self.status[k].is_nonbasic() {
                    v -= a * self.x[k];
                }
            }
            self.x[self.head[r]] = v;
        }
    }

    /// Reduced costs for an arbitrary cost vector over all columns.
    pub fn reduced_costs(&self, cost: &[f64]) -> Vec<f64> {
        let mut d = cost.to_vec();
        for r in 0..self.m {
            let cb = cost[self.head[r]];
            if cb == 0.0 {
                continue;
            }
            for (dk, &a) in d.iter_mut().zip(&self.t[r]) {
                *dk -= cb * a;
            }
        }
        for r in 0..self.m {
            d[self.head[r]] = 0.0;
        }
        d
    }

    /// Phase-two objective of the current point.
    pub fn objective(&self) -> f64 {
        self.cost[..self.n]
            .iter()
            .zip(&self.x[..self.n])
            .map(|(c, x)| c * x)
            .sum()
    }

    /// Signed bound violation of column `k`: negative below, positive above.
    pub fn violation(&self, k: usize, tol: f64) -> f64 {
        let x = self.x[k];
        if x < self.lb[k] - tol * (1.0 + self.lb[k].abs()) {
            x - self.lb[k]
        } else if x > self.ub[k] + tol * (1.0 + self.ub[k].abs()) {
            x - self.ub[k]
        } else {
            0.0
        }
    }

    /// Whether every basic value sits within its bounds.
    pub fn is_primal_feasible(&self, tol: f64) -> bool {
        self.head.iter().all(|&k| self.violation(k, tol) == 0.0)
    }

    /// Whether reduced costs `d` have the right sign for every nonbasic column.
    pub fn is_dual_feasible(&self, d: &[f64], tol: f64) -> bool {
        (0..self.ncols()).all(|k| match self.status[k] {
            VarStatus::Basic => true,
            _ if self.lb[k] == self.ub[k] => true,
            VarStatus::AtLower => d[k] >= -tol,
            VarStatus::AtUpper => d[k] <= tol,
            VarStatus::Free => d[k].abs() <= tol,
        })
    }

    /// Whether column `k` is fixed by its bounds.
    pub fn is_fixed(&self, k: usize) -> bool {
        self.lb[k] == self.ub[k]
    }

    /// Snapshot the basis in structural/row form.
    pub fn basis(&self) -> Basis {
        Basis {
            cols: self.status[..self.n].to_vec(),
            rows: self.status[self.n..].to_vec(),
        }
    }
}

/// Nonbasic status that makes the reduced cost `c` dual feasible where the bounds allow.
fn dual_friendly_status(c: f64, lb: f64, ub: f64) -> VarStatus {
    let preferred = if c < 0.0 {
        VarStatus::AtUpper
    } else {
        VarStatus::AtLower
    };
    preferred.normalized(lb, ub)
}
