//! Sparse matrix types and operations.
//!
//! Problem matrices arrive in CSC (Compressed Sparse Column) format; the
//! simplex works on dense rows, so this module also provides the conversion.

use sprs::{CsMat, TriMat};

/// Sparse matrix in CSC format.
pub type SparseCsc = CsMat<f64>;

/// Triplet format sparse matrix builder.
pub type SparseTriMat = TriMat<f64>;

/// Build a sparse CSC matrix from triplets (row, col, value).
///
/// Duplicate entries are summed.
pub fn from_triplets<I>(nrows: usize, ncols: usize, triplets: I) -> SparseCsc
where
    I: IntoIterator<Item = (usize, usize, f64)>,
{
    let mut tri = TriMat::new((nrows, ncols));
    for (i, j, v) in triplets {
        tri.add_triplet(i, j, v);
    }
    tri.to_csc()
}

/// Build a sparse CSC matrix from dense rows.
pub fn from_dense_rows(rows: &[Vec<f64>], ncols: usize) -> SparseCsc {
    let triplets = rows.iter().enumerate().flat_map(|(i, row)| {
        row.iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(move |(j, &v)| (i, j, v))
    });
    from_triplets(rows.len(), ncols, triplets)
}

/// Expand a sparse matrix into dense rows.
pub fn to_dense_rows(a: &SparseCsc) -> Vec<Vec<f64>> {
    let mut rows = vec![vec![0.0; a.cols()]; a.rows()];
    for (val, (row, col)) in a.iter() {
        rows[row][col] += *val;
    }
    rows
}

/// Sparse matrix-vector product: y = A * x
pub fn spmv(a: &SparseCsc, x: &[f64], y: &mut [f64]) {
    assert_eq!(a.cols(), x.len());
    assert_eq!(a.rows(), y.len());

    y.fill(0.0);
    for (val, (row, col)) in a.iter() {
        y[row] += (*val) * x[col];
    }
}

/// Dense dot product.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_triplets() {
        let triplets = vec![(0, 0, 1.0), (1, 1, 2.0), (0, 1, 3.0)];
        let mat = from_triplets(2, 2, triplets);

        assert_eq!(mat.rows(), 2);
        assert_eq!(mat.cols(), 2);
        assert_eq!(mat.nnz(), 3);
    }

    #[test]
    fn test_dense_round_trip() {
        let rows = vec![vec![1.0, 0.0, 2.0], vec![0.0, -3.0, 0.0]];
        let mat = from_dense_rows(&rows, 3);
        assert_eq!(mat.nnz(), 3);
        assert_eq!(to_dense_rows(&mat), rows);
    }

    #[test]
    fn test_spmv() {
        // [[1, 2], [3, 4]] * [1, 2] = [5, 11]
        let triplets = vec![(0, 0, 1.0), (0, 1, 2.0), (1, 0, 3.0), (1, 1, 4.0)];
        let mat = from_triplets(2, 2, triplets);

        let x = vec![1.0, 2.0];
        let mut y = vec![0.0; 2];
        spmv(&mat, &x, &mut y);

        assert!((y[0] - 5.0).abs() < 1e-10);
        assert!((y[1] - 11.0).abs() < 1e-10);
    }

    #[test]
    fn test_dot() {
        assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
    }
}
