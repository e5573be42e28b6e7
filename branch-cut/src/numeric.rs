//! Numeric tolerances and safe rational rounding for cuts.

/// Coefficients smaller than this are treated as zero.
pub const COEF_EPS: f64 = 1e-9;

/// Relative tolerance within which a rational replaces a float.
pub const RATIONAL_TOL: f64 = 1e-9;

/// Magnitude above which rational rounding is skipped.
const MAX_ROUNDABLE: f64 = 1e12;

/// Fractional part in `[0, 1)`.
pub fn frac(v: f64) -> f64 {
    v - v.floor()
}

/// Whether `v` is within `eps` of an integer.
pub fn is_integral(v: f64, eps: f64) -> bool {
    let f = frac(v);
    f <= eps || f >= 1.0 - eps
}

/// Continued-fraction convergents `p / q` of `v` with `q <= max_den`.
pub fn convergents(v: f64, max_den: u64) -> Vec<(i64, u64)> {
    let mut out = Vec::new();
    if !v.is_finite() || v.abs() > MAX_ROUNDABLE || max_den == 0 {
        return out;
    }

    let (mut h1, mut h2) = (1i64, 0i64);
    let (mut k1, mut k2) = (0u64, 1u64);
    let mut x = v;
    for _ in 0..64 {
        let a = x.floor();
        let ai = a as i64;
        let Some(h) = ai.checked_mul(h1).and_then(|p| p.checked_add(h2)) else {
            break;
        };
        let Some(k) = (ai.unsigned_abs())
            .checked_mul(k1)
            .and_then(|p| p.checked_add(k2))
        else {
            break;
        };
        if k > max_den {
            break;
        }
        out.push((h, k));
        let rest = x - a;
        if rest < 1e-15 {
            break;
        }
        h2 = h1;
        h1 = h;
        k2 = k1;
        k1 = k;
        x = 1.0 / rest;
    }
    out
}

/// Smallest-denominator convergent `>= v` within tolerance, else `v`.
pub fn round_up_rational(v: f64, max_den: u64) -> f64 {
    let tol = RATIONAL_TOL * v.abs().max(1.0);
    convergents(v, max_den)
        .into_iter()
        .map(|(p, q)| p as f64 / q as f64)
        .find(|&c| c >= v && c - v <= tol)
        .unwrap_or(v)
}

/// Smallest-denominator convergent `<= v` within tolerance, else `v`.
pub fn round_down_rational(v: f64, max_den: u64) -> f64 {
    let tol = RATIONAL_TOL * v.abs().max(1.0);
    convergents(v, max_den)
        .into_iter()
        .map(|(p, q)| p as f64 / q as f64)
        .find(|&c| c <= v && v - c <= tol)
        .unwrap_or(v)
}

/// Nudge a cut `coefs·x >= rhs` to nearby rationals without losing validity.
///
/// Coefficients only move up and the right-hand side only moves down, which
/// weakens the cut on `x >= 0`. Tiny coefficients are zeroed only when that
/// also weakens the cut, i.e. when they are negative.
pub fn safe_round_cut(coefs: &mut [f64], rhs: &mut f64, max_den: u64) {
    for c in coefs.iter_mut() {
        if c.abs() < COEF_EPS {
            if *c < 0.0 {
                *c = 0.0;
            }
            continue;
        }
        *c = round_up_rational(*c, max_den);
    }
    *rhs = round_down_rational(*rhs, max_den);
}
