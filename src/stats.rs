use num_complex::Complex64;

/// Smallest pairwise distance between roots; 0 for fewer than two roots.
pub fn min_dist(roots: &[Complex64]) -> f64 {
    let m = pairwise(roots).fold(f64::INFINITY, f64::min);
    if m.is_finite() { m } else { 0.0 }
}

/// Largest pairwise distance between roots; 0 for fewer than two roots.
pub fn max_dist(roots: &[Complex64]) -> f64 {
    pairwise(roots).fold(0.0, f64::max)
}

/// Mean pairwise distance; 0 for fewer than two roots.
pub fn mean_dist(roots: &[Complex64]) -> f64 {
    let n = roots.len();
    if n < 2 {
        return 0.0;
    }
    let pairs = (n * (n - 1) / 2) as f64;
    pairwise(roots).sum::<f64>() / pairs
}

fn pairwise(roots: &[Complex64]) -> impl Iterator<Item = f64> + '_ {
    roots.iter().enumerate().flat_map(move |(i, a)| {
        roots[i + 1..].iter().map(move |b| (a - b).norm())
    })
}

/// Percentile of an ascending-sorted slice with linear interpolation
/// between neighbors; `q` in [0,1].
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
    }
}
