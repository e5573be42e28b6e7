//! Per-node pool of candidate cuts.
//!
//! Candidates are keyed by name. A cut leaves the pool when it is accepted
//! into the node LP; the rest stay available to later rounds and are
//! inherited by the node's children.

use std::collections::BTreeMap;

use crate::master::LinearCut;

/// Statistics for the cut pool.
#[derive(Debug, Default, Clone)]
pub struct CutPoolStats {
    /// Total cuts added.
    pub total_added: usize,

    /// Candidates rejected as duplicates.
    pub duplicates: usize,

    /// Total cuts removed (accepted or discarded).
    pub total_removed: usize,
}

/// Cut pool for managing generated cuts.
#[derive(Debug, Clone, Default)]
pub struct CutPool {
    cuts: BTreeMap<String, LinearCut>,
    next_id: usize,
    stats: CutPoolStats,
}

impl CutPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cut to the pool.
    ///
    /// Unnamed cuts get a generated name. Returns the cut's name, or `None`
    /// when an equivalent cut is already pooled.
    pub fn add(&mut self, mut cut: LinearCut) -> Option<String> {
        if self.cuts.values().any(|pooled| is_duplicate(&cut, pooled)) {
            self.stats.duplicates += 1;
            return None;
        }

        let name = match cut.name.clone() {
            Some(name) if !self.cuts.contains_key(&name) => name,
            _ => {
                let name = format!("pool_{}", self.next_id);
                self.next_id += 1;
                cut.name = Some(name.clone());
                name
            }
        };

        self.cuts.insert(name.clone(), cut);
        self.stats.total_added += 1;
        Some(name)
    }

    /// Remove a cut by name.
    pub fn remove(&mut self, name: &str) -> Option<LinearCut> {
        let cut = self.cuts.remove(name);
        if cut.is_some() {
            self.stats.total_removed += 1;
        }
        cut
    }

    /// Get a cut by name.
    pub fn get(&self, name: &str) -> Option<&LinearCut> {
        self.cuts.get(name)
    }

    /// Iterate over `(name, cut)` in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &LinearCut)> {
        self.cuts.iter()
    }

    /// Get pool statistics.
    pub fn stats(&self) -> &CutPoolStats {
        &self.stats
    }

    /// Number of cuts in pool.
    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    /// Check if pool is empty.
    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }
}

/// Two cuts are duplicates when they are parallel with the same scaled rhs.
fn is_duplicate(a: &LinearCut, b: &LinearCut) -> bool {
    if a.coefs.len() != b.coefs.len() {
        return false;
    }

    let a_norm = a.norm();
    let b_norm = b.norm();

    if a_norm < 1e-10 || b_norm < 1e-10 {
        return a_norm < 1e-10 && b_norm < 1e-10;
    }

    let dot: f64 = a.coefs.iter().zip(&b.coefs).map(|(ai, bi)| ai * bi).sum();
    let cos_angle = dot / (a_norm * b_norm);

    // Same direction (not opposite) and same normalized rhs
    if cos_angle > 0.9999 {
        let rhs_diff = (a.rhs / a_norm - b.rhs / b_norm).abs();
        return rhs_diff < 1e-8;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::master::CutSource;

    fn make_cut(coeffs: Vec<f64>, rhs: f64) -> LinearCut {
        LinearCut::new(coeffs, rhs, CutSource::Gomory { row: 0 })
    }

    #[test]
    fn test_pool_add_and_get() {
        let mut pool = CutPool::new();

        let n1 = pool.add(make_cut(vec![1.0, 2.0], 3.0).with_name("a")).unwrap();
        let n2 = pool.add(make_cut(vec![4.0, 5.0], 6.0)).unwrap();

        assert_eq!(n1, "a");
        assert_ne!(n1, n2);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(&n2).unwrap().rhs, 6.0);
    }

    #[test]
    fn test_duplicate_detection() {
        let mut pool = CutPool::new();

        assert!(pool.add(make_cut(vec![1.0, 2.0], 3.0)).is_some());
        // Same cut
        assert!(pool.add(make_cut(vec![1.0, 2.0], 3.0)).is_none());
        // Parallel cut (same after normalization)
        assert!(pool.add(make_cut(vec![2.0, 4.0], 6.0)).is_none());
        // Parallel but different rhs
        assert!(pool.add(make_cut(vec![2.0, 4.0], 7.0)).is_some());

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.stats().duplicates, 2);
    }

    #[test]
    fn test_name_clash_renamed() {
        let mut pool = CutPool::new();
        pool.add(make_cut(vec![1.0, 0.0], 1.0).with_name("x")).unwrap();
        let second = pool.add(make_cut(vec![0.0, 1.0], 1.0).with_name("x")).unwrap();
        assert_ne!(second, "x");
        assert_eq!(pool.get(&second).unwrap().name.as_deref(), Some(second.as_str()));
    }

    #[test]
    fn test_remove() {
        let mut pool = CutPool::new();
        let name = pool.add(make_cut(vec![1.0], 1.0)).unwrap();
        assert!(pool.remove(&name).is_some());
        assert!(pool.remove(&name).is_none());
        assert!(pool.is_empty());
        assert_eq!(pool.stats().total_removed, 1);
    }
}
