//! Basis bookkeeping shared by the primal and dual simplex.

/// Position of a column (structural variable or row activity) relative to the basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarStatus {
    /// Column is in the basis.
    Basic,
    /// Nonbasic at its lower bound.
    AtLower,
    /// Nonbasic at its upper bound.
    AtUpper,
    /// Nonbasic free column held at zero.
    Free,
}

impl VarStatus {
    /// Whether the column is nonbasic.
    pub fn is_nonbasic(&self) -> bool {
        !matches!(self, VarStatus::Basic)
    }

    /// Pick a legal nonbasic status for the given bounds, honouring `self` if possible.
    pub(crate) fn normalized(self, lb: f64, ub: f64) -> VarStatus {
        let lb_finite = lb.is_finite();
        let ub_finite = ub.is_finite();
        if lb_finite && ub_finite && lb == ub {
            return VarStatus::AtLower;
        }
        match self {
            VarStatus::AtUpper if ub_finite => VarStatus::AtUpper,
            VarStatus::AtLower | VarStatus::AtUpper | VarStatus::Free | VarStatus::Basic
                if lb_finite =>
            {
                VarStatus::AtLower
            }
            _ if ub_finite => VarStatus::AtUpper,
            _ => VarStatus::Free,
        }
    }

    /// Value a nonbasic column takes under this status.
    pub(crate) fn nonbasic_value(&self, lb: f64, ub: f64) -> f64 {
        match self {
            VarStatus::AtLower => lb,
            VarStatus::AtUpper => ub,
            VarStatus::Free | VarStatus::Basic => 0.0,
        }
    }
}

/// A simplex basis: one status per structural column and per row.
///
/// Rows are represented by their activity variable `r_i = a_i x`, so a row
/// status of `AtLower` means the row is tight at its lower bound.
#[derive(Debug, Clone, PartialEq)]
pub struct Basis {
    /// Status of each structural column.
    pub cols: Vec<VarStatus>,
    /// Status of each row activity.
    pub rows: Vec<VarStatus>,
}

impl Basis {
    /// Slack basis: every row basic, every column at its lower bound.
    pub fn slack(num_cols: usize, num_rows: usize) -> Self {
        Self {
            cols: vec![VarStatus::AtLower; num_cols],
            rows: vec![VarStatus::Basic; num_rows],
        }
    }

    /// Number of basic entries.
    pub fn num_basic(&self) -> usize {
        self.cols
            .iter()
            .chain(self.rows.iter())
            .filter(|s| !s.is_nonbasic())
            .count()
    }

    /// Check the basis fits an LP with the given dimensions.
    pub fn fits(&self, num_cols: usize, num_rows: usize) -> bool {
        self.cols.len() == num_cols && self.rows.len() == num_rows
    }

    /// Register a freshly appended row; its activity starts basic.
    pub fn push_row(&mut self) {
        self.rows.push(VarStatus::Basic);
    }

    /// Drop the given rows. Indices refer to the current row numbering.
    pub fn remove_rows(&mut self, rows: &[usize]) {
        let mut sorted = rows.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        for &r in sorted.iter().rev() {
            if r < self.rows.len() {
                self.rows.remove(r);
            }
        }
    }

    /// Status of column or row `k` in the combined `[cols | rows]` numbering.
    pub fn status(&self, k: usize) -> VarStatus {
        if k < self.cols.len() {
            self.cols[k]
        } else {
            self.rows[k - self.cols.len()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slack_basis() {
        let basis = Basis::slack(3, 2);
        assert_eq!(basis.num_basic(), 2);
        assert!(basis.fits(3, 2));
        assert_eq!(basis.status(4), VarStatus::Basic);
        assert_eq!(basis.status(0), VarStatus::AtLower);
    }

    #[test]
    fn test_row_edits() {
        let mut basis = Basis::slack(2, 2);
        basis.rows[0] = VarStatus::AtLower;
        basis.push_row();
        assert_eq!(basis.rows.len(), 3);

        basis.remove_rows(&[2, 0, 2]);
        assert_eq!(basis.rows, vec![VarStatus::Basic]);
    }

    #[test]
    fn test_normalized_status() {
        let inf = f64::INFINITY;
        assert_eq!(VarStatus::AtUpper.normalized(0.0, inf), VarStatus::AtLower);
        assert_eq!(VarStatus::AtLower.normalized(-inf, 4.0), VarStatus::AtUpper);
        assert_eq!(VarStatus::AtLower.normalized(-inf, inf), VarStatus::Free);
        assert_eq!(VarStatus::AtUpper.normalized(2.0, 2.0), VarStatus::AtLower);
        assert_eq!(VarStatus::AtUpper.normalized(0.0, 1.0), VarStatus::AtUpper);
    }
}
