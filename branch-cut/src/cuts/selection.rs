//! Cut selection: filter, rank and accept candidates from a node's pool.

use super::CutPool;
use crate::master::LinearCut;
use crate::settings::CutSettings;

/// Chooses which pooled cuts enter the node LP in one round.
#[derive(Debug, Clone)]
pub struct CutSelector {
    settings: CutSettings,
    /// Largest |coefficient| a cut may carry.
    max_coef: f64,
}

impl CutSelector {
    /// Create a selector. `obj_scale` is the largest |root objective coefficient|.
    ///
    /// A zero objective gives no scale to measure against, so the
    /// coefficient ratio check is skipped.
    pub fn new(settings: CutSettings, obj_scale: f64) -> Self {
        let max_coef = if obj_scale > 0.0 {
            settings.max_relative_cut_term_ratio * obj_scale
        } else {
            f64::INFINITY
        };
        Self { settings, max_coef }
    }

    /// Select cuts against the LP point `x`.
    ///
    /// Ill-conditioned, dense or empty candidates are discarded from the pool.
    /// Survivors are ranked by depth (most violated first) and accepted while
    /// they are violated by more than `min_cut_depth` and not too parallel to
    /// a cut already accepted this round. Accepted cuts leave the pool.
    pub fn select(&self, pool: &mut CutPool, x: &[f64]) -> Vec<LinearCut> {
        let mut ranked: Vec<(String, f64)> = Vec::new();
        let mut discard: Vec<String> = Vec::new();

        for (name, cut) in pool.iter() {
            let nnz = cut.nnz();
            let biggest = cut.coefs.iter().fold(0.0_f64, |m, c| m.max(c.abs()));
            if nnz == 0 || nnz > self.settings.max_nonzero_coefs || biggest > self.max_coef {
                discard.push(name.clone());
                continue;
            }
            ranked.push((name.clone(), cut.depth(x)));
        }
        for name in &discard {
            pool.remove(name);
        }

        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut accepted: Vec<LinearCut> = Vec::new();
        for (name, depth) in ranked {
            if depth >= -self.settings.min_cut_depth {
                break;
            }
            let Some(cut) = pool.get(&name) else {
                continue;
            };
            let separated = accepted
                .iter()
                .all(|other| angle_degrees(cut, other) > self.settings.parallel_cut_tolerance);
            if separated {
                if let Some(cut) = pool.remove(&name) {
                    accepted.push(cut);
                }
            }
        }

        log::debug!(
            "selection: {} discarded, {} accepted, {} left in pool",
            discard.len(),
            accepted.len(),
            pool.len()
        );
        accepted
    }
}

/// Angle between two cut normals, in degrees.
pub fn angle_degrees(a: &LinearCut, b: &LinearCut) -> f64 {
    let denom = a.norm() * b.norm();
    if denom < 1e-12 {
        return 0.0;
    }
    let dot: f64 = a.coefs.iter().zip(&b.coefs).map(|(x, y)| x * y).sum();
    (dot / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::master::CutSource;

    fn cut(coefs: Vec<f64>, rhs: f64, name: &str) -> LinearCut {
        LinearCut::new(coefs, rhs, CutSource::Gomory { row: 0 }).with_name(name)
    }

    #[test]
    fn test_angle() {
        let a = cut(vec![1.0, 0.0], 1.0, "a");
        let b = cut(vec![0.0, 2.0], 1.0, "b");
        let c = cut(vec![1.0, 1.0], 1.0, "c");
        assert!((angle_degrees(&a, &b) - 90.0).abs() < 1e-9);
        assert!((angle_degrees(&a, &c) - 45.0).abs() < 1e-9);
        assert!(angle_degrees(&a, &a).abs() < 1e-6);
    }

    #[test]
    fn test_select_orders_and_filters() {
        let mut pool = CutPool::new();
        // At x = (0, 0): depths -1, -2, +1 (satisfied) and just above -2
        pool.add(cut(vec![1.0, 0.0], 1.0, "shallow"));
        pool.add(cut(vec![0.0, 1.0], 2.0, "deep"));
        pool.add(cut(vec![1.0, 0.0], -1.0, "slack"));
        pool.add(cut(vec![1.0, 1e-3], 2.0, "parallel"));

        let selector = CutSelector::new(CutSettings::default(), 1.0);
        let accepted = selector.select(&mut pool, &[0.0, 0.0]);
        let names: Vec<_> = accepted.iter().filter_map(|c| c.name.clone()).collect();

        // "parallel" (depth ~ -2) beats "shallow" (depth -1), which is then
        // rejected as nearly parallel to it.
        assert_eq!(names, vec!["deep", "parallel"]);
        assert!(pool.get("shallow").is_some());
        assert!(pool.get("slack").is_some());
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_discard_ill_conditioned() {
        let mut pool = CutPool::new();
        pool.add(cut(vec![1e9, 1.0], 1e9, "huge"));
        pool.add(cut(vec![1.0, 1.0, 1.0], 1.0, "dense"));
        pool.add(cut(vec![0.0, 0.0], 1.0, "empty"));

        let settings = CutSettings {
            max_nonzero_coefs: 2,
            ..CutSettings::default()
        };
        let selector = CutSelector::new(settings, 5.0);
        let accepted = selector.select(&mut pool, &[0.0, 0.0, 0.0]);
        assert!(accepted.is_empty());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_coefficient_limit_scales_with_objective() {
        let settings = CutSettings {
            max_relative_cut_term_ratio: 10.0,
            ..CutSettings::default()
        };

        // Small objective: 10 * 0.5 = 5 caps the coefficients.
        let mut pool = CutPool::new();
        pool.add(cut(vec![6.0, 0.0], 6.0, "over"));
        pool.add(cut(vec![0.0, 4.0], 4.0, "under"));
        let accepted = CutSelector::new(settings.clone(), 0.5).select(&mut pool, &[0.0, 0.0]);
        let names: Vec<_> = accepted.iter().filter_map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["under"]);
        assert!(pool.is_empty());

        // Zero objective: nothing to scale by, nothing discarded.
        let mut pool = CutPool::new();
        pool.add(cut(vec![1e9, 0.0], 1e9, "huge"));
        let accepted = CutSelector::new(settings, 0.0).select(&mut pool, &[0.0, 0.0]);
        assert_eq!(accepted.len(), 1);
    }
}
