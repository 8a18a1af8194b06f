use num_complex::Complex64;

/// Passes of the simultaneous iteration before giving up.
pub const MAX_ITER: usize = 64;

/// Squared-magnitude convergence threshold for a full pass.
pub const TOL2: f64 = 1e-16;

/// Leading coefficients below this squared magnitude are treated as zero.
const LEAD_EPS2: f64 = 1e-30;

/// Division guard: skip any update whose denominator is smaller than this.
const DIV_EPS2: f64 = 1e-60;

/// Fallback seed for root `i` of an `n`-root solve: evenly spaced points on
/// the unit circle. The 0.37 rad phase offset keeps the seeds off the axes
/// so even conjugate-symmetric polynomials never start from collinear
/// estimates.
pub fn unit_circle_seed(i: usize, n: usize) -> Complex64 {
    let angle = (2.0 * std::f64::consts::PI * i as f64) / n as f64 + 0.37;
    Complex64::new(angle.cos(), angle.sin())
}

/// Evaluate p(z) and p'(z) in one Horner pass. Coefficients are highest
/// degree first.
fn horner(coeffs: &[Complex64], z: Complex64) -> (Complex64, Complex64) {
    let mut p = coeffs[0];
    let mut dp = Complex64::new(0.0, 0.0);
    for &c in &coeffs[1..] {
        dp = dp * z + p;
        p = p * z + c;
    }
    (p, dp)
}

/// Simultaneous root finder (Ehrlich-Aberth).
///
/// `coeffs` is highest degree first; `warm` optionally seeds the iteration
/// with the previous frame's roots. Returns exactly `degree` finite roots
/// where `degree` is the polynomial degree after stripping degenerate
/// leading terms. Pure and deterministic: identical input and warm start
/// always produce bit-identical output.
pub fn solve(coeffs: &[Complex64], warm: Option<&[Complex64]>) -> Vec<Complex64> {
    solve_inner(coeffs, warm, None)
}

/// Like [`solve`], but also reports the pass index at which each root
/// converged (MAX_ITER if it never did). Used by iteration-count coloring.
pub fn solve_tracked(
    coeffs: &[Complex64],
    warm: Option<&[Complex64]>,
) -> (Vec<Complex64>, Vec<u8>) {
    let mut iters = Vec::new();
    let roots = solve_inner(coeffs, warm, Some(&mut iters));
    (roots, iters)
}

fn solve_inner(
    coeffs: &[Complex64],
    warm: Option<&[Complex64]>,
    mut track: Option<&mut Vec<u8>>,
) -> Vec<Complex64> {
    // Strip degenerate leading terms.
    let mut start = 0;
    while start < coeffs.len().saturating_sub(1) && coeffs[start].norm_sqr() < LEAD_EPS2 {
        start += 1;
    }
    let stripped = &coeffs[start..];
    if stripped.len() < 2 {
        if let Some(t) = track.as_deref_mut() {
            t.clear();
        }
        return Vec::new();
    }
    let degree = stripped.len() - 1;

    if let Some(t) = track.as_deref_mut() {
        t.clear();
        t.resize(degree, 0);
    }

    // Linear case: a*z + b = 0.
    if degree == 1 {
        let a = stripped[0];
        let b = stripped[1];
        let root = if a.norm_sqr() < LEAD_EPS2 {
            unit_circle_seed(0, 1)
        } else {
            -b / a
        };
        if let Some(t) = track.as_deref_mut() {
            t[0] = 1;
        }
        return vec![rescue(root, 0, 1)];
    }

    let mut roots: Vec<Complex64> = match warm {
        Some(w) if w.len() == degree => w.to_vec(),
        _ => (0..degree).map(|i| unit_circle_seed(i, degree)).collect(),
    };

    let mut converged = vec![false; degree];

    for iter in 0..MAX_ITER {
        let mut max_corr2 = 0.0f64;

        for i in 0..degree {
            if track.is_some() && converged[i] {
                continue;
            }
            let z = roots[i];
            let (p, dp) = horner(stripped, z);

            let dp_m = dp.norm_sqr();
            if dp_m < DIV_EPS2 {
                continue;
            }
            let w = p / dp;

            // Mutual repulsion between current estimates.
            let mut s = Complex64::new(0.0, 0.0);
            for j in 0..degree {
                if j == i {
                    continue;
                }
                let d = z - roots[j];
                if d.norm_sqr() < DIV_EPS2 {
                    continue;
                }
                s += d.conj() / d.norm_sqr();
            }

            let denom = Complex64::new(1.0, 0.0) - w * s;
            if denom.norm_sqr() < DIV_EPS2 {
                continue;
            }
            let corr = w / denom;
            roots[i] -= corr;

            let h2 = corr.norm_sqr();
            if h2 > max_corr2 {
                max_corr2 = h2;
            }
            if h2 < TOL2 {
                if let Some(t) = track.as_deref_mut() {
                    if !converged[i] {
                        converged[i] = true;
                        t[i] = (iter + 1) as u8;
                    }
                }
            }
        }

        if max_corr2 < TOL2 {
            if let Some(t) = track.as_deref_mut() {
                for i in 0..degree {
                    if !converged[i] {
                        converged[i] = true;
                        t[i] = (iter + 1) as u8;
                    }
                }
            }
            break;
        }
    }

    if let Some(t) = track.as_deref_mut() {
        for i in 0..degree {
            if !converged[i] {
                t[i] = MAX_ITER as u8;
            }
        }
    }

    for i in 0..degree {
        roots[i] = rescue(roots[i], i, degree);
    }
    roots
}

/// In-place solve over split re/im slices, matching the wire layout the
/// scheduler hands to workers. `warm` doubles as the output buffer; entries
/// past `degree` are left untouched, and non-finite results fall back to the
/// warm value (the caller reseeds).
pub fn solve_in_place(
    c_re: &[f64],
    c_im: &[f64],
    warm_re: &mut [f64],
    warm_im: &mut [f64],
) -> usize {
    let nc = c_re.len().min(c_im.len());
    let coeffs: Vec<Complex64> = (0..nc)
        .map(|k| Complex64::new(c_re[k], c_im[k]))
        .collect();

    let mut start = 0;
    while start < nc.saturating_sub(1) && coeffs[start].norm_sqr() < LEAD_EPS2 {
        start += 1;
    }
    let degree = nc - 1 - start;
    if degree == 0 || degree > warm_re.len() {
        return 0;
    }

    let warm: Vec<Complex64> = (0..degree)
        .map(|i| Complex64::new(warm_re[i], warm_im[i]))
        .collect();
    let roots = solve(&coeffs, Some(&warm));
    for (i, r) in roots.iter().enumerate() {
        if r.re.is_finite() && r.im.is_finite() {
            warm_re[i] = r.re;
            warm_im[i] = r.im;
        }
    }
    roots.len()
}

fn rescue(z: Complex64, i: usize, n: usize) -> Complex64 {
    if z.re.is_finite() && z.im.is_finite() {
        z
    } else {
        unit_circle_seed(i, n)
    }
}
