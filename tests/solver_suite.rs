use num_complex::Complex64;
use rootfield::solver::{self, MAX_ITER};

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

fn real_coeffs(vals: &[f64]) -> Vec<Complex64> {
    vals.iter().map(|&v| c(v, 0.0)).collect()
}

/// Max |p(r)| over all returned roots.
fn worst_residual(coeffs: &[Complex64], roots: &[Complex64]) -> f64 {
    roots
        .iter()
        .map(|&z| {
            let mut p = coeffs[0];
            for &k in &coeffs[1..] {
                p = p * z + k;
            }
            p.norm()
        })
        .fold(0.0, f64::max)
}

// ── Basic root finding ──────────────────────────────────────────────────────

#[test]
fn fifth_roots_of_unity() {
    let coeffs = real_coeffs(&[1.0, 0.0, 0.0, 0.0, 0.0, -1.0]);
    let roots = solver::solve(&coeffs, None);
    assert_eq!(roots.len(), 5);
    for &r in &roots {
        assert!((r.norm() - 1.0).abs() < 1e-8, "|root| = {}", r.norm());
        assert!((r.powu(5) - c(1.0, 0.0)).norm() < 1e-8);
    }
    // All five roots distinct.
    for i in 0..5 {
        for j in i + 1..5 {
            assert!((roots[i] - roots[j]).norm() > 0.5);
        }
    }
}

#[test]
fn conjugate_pair() {
    let roots = solver::solve(&real_coeffs(&[1.0, 0.0, 1.0]), None);
    assert_eq!(roots.len(), 2);
    let mut ims: Vec<f64> = roots.iter().map(|r| r.im).collect();
    ims.sort_by(f64::total_cmp);
    assert!((ims[0] + 1.0).abs() < 1e-8);
    assert!((ims[1] - 1.0).abs() < 1e-8);
    for r in &roots {
        assert!(r.re.abs() < 1e-8);
    }
}

#[test]
fn linear_polynomial_solved_directly() {
    let roots = solver::solve(&real_coeffs(&[2.0, 4.0]), None);
    assert_eq!(roots.len(), 1);
    assert!((roots[0] - c(-2.0, 0.0)).norm() < 1e-12);
}

#[test]
fn constant_and_empty_inputs_yield_no_roots() {
    assert!(solver::solve(&real_coeffs(&[3.0]), None).is_empty());
    assert!(solver::solve(&[], None).is_empty());
}

#[test]
fn degenerate_leading_terms_are_stripped() {
    // 0*z^4 + 0*z^3 + z^2 - 1: effectively degree 2.
    let roots = solver::solve(&real_coeffs(&[0.0, 0.0, 1.0, 0.0, -1.0]), None);
    assert_eq!(roots.len(), 2);
    let mut res: Vec<f64> = roots.iter().map(|r| r.re).collect();
    res.sort_by(f64::total_cmp);
    assert!((res[0] + 1.0).abs() < 1e-8);
    assert!((res[1] - 1.0).abs() < 1e-8);
}

#[test]
fn clustered_roots_still_resolve() {
    // (z - 1)^2 (z + 1): a double root at 1.
    let coeffs = real_coeffs(&[1.0, -1.0, -1.0, 1.0]);
    let roots = solver::solve(&coeffs, None);
    assert_eq!(roots.len(), 3);
    assert!(worst_residual(&coeffs, &roots) < 1e-5);
}

// ── Determinism and warm starts ─────────────────────────────────────────────

#[test]
fn repeated_solves_are_bit_identical() {
    let coeffs = vec![
        c(1.0, 0.2),
        c(-0.3, 0.7),
        c(0.0, -1.1),
        c(2.0, 0.0),
        c(-0.5, 0.4),
    ];
    let first = solver::solve(&coeffs, None);
    for _ in 0..10 {
        let again = solver::solve(&coeffs, None);
        assert_eq!(first, again);
    }
}

#[test]
fn warm_start_converges_to_the_same_roots() {
    let coeffs = real_coeffs(&[1.0, 0.0, 0.0, 0.0, 0.0, -1.0]);
    let cold = solver::solve(&coeffs, None);
    // Perturb and re-solve from near the answer.
    let warm: Vec<Complex64> = cold.iter().map(|&r| r + c(1e-3, -1e-3)).collect();
    let hot = solver::solve(&coeffs, Some(&warm));
    for (a, b) in hot.iter().zip(&cold) {
        assert!((a - b).norm() < 1e-6);
    }
}

#[test]
fn mismatched_warm_start_length_falls_back_to_seeds() {
    let coeffs = real_coeffs(&[1.0, 0.0, 0.0, 0.0, 0.0, -1.0]);
    let short = vec![c(1.0, 0.0); 2];
    let roots = solver::solve(&coeffs, Some(&short));
    assert_eq!(roots.len(), 5);
    assert!(worst_residual(&coeffs, &roots) < 1e-6);
}

// ── Robustness ──────────────────────────────────────────────────────────────

#[test]
fn non_finite_coefficients_never_produce_non_finite_roots() {
    let coeffs = vec![c(1.0, 0.0), c(f64::NAN, 0.0), c(-1.0, f64::INFINITY)];
    let roots = solver::solve(&coeffs, None);
    assert_eq!(roots.len(), 2);
    for r in &roots {
        assert!(r.re.is_finite() && r.im.is_finite());
    }
}

#[test]
fn all_zero_polynomial_is_handled() {
    let roots = solver::solve(&real_coeffs(&[0.0, 0.0, 0.0]), None);
    for r in &roots {
        assert!(r.re.is_finite() && r.im.is_finite());
    }
}

#[test]
fn unit_circle_seeds_are_off_axis_and_distinct() {
    for n in [2usize, 5, 16] {
        for i in 0..n {
            let s = solver::unit_circle_seed(i, n);
            assert!((s.norm() - 1.0).abs() < 1e-12);
            assert!(s.re.abs() > 1e-6 || s.im.abs() > 1e-6);
        }
    }
    let a = solver::unit_circle_seed(0, 5);
    let b = solver::unit_circle_seed(1, 5);
    assert!((a - b).norm() > 0.1);
}

// ── Tracked and in-place variants ───────────────────────────────────────────

#[test]
fn tracked_solve_reports_pass_counts() {
    let coeffs = real_coeffs(&[1.0, 0.0, 0.0, 0.0, 0.0, -1.0]);
    let (roots, iters) = solver::solve_tracked(&coeffs, None);
    assert_eq!(roots.len(), 5);
    assert_eq!(iters.len(), 5);
    for &it in &iters {
        assert!(it >= 1 && it as usize <= MAX_ITER);
    }
}

#[test]
fn in_place_solve_matches_the_owned_variant() {
    let coeffs = real_coeffs(&[1.0, 0.0, 0.0, 0.0, 0.0, -1.0]);
    let reference = solver::solve(&coeffs, None);

    let c_re: Vec<f64> = coeffs.iter().map(|k| k.re).collect();
    let c_im: Vec<f64> = coeffs.iter().map(|k| k.im).collect();
    let mut warm_re: Vec<f64> = reference.iter().map(|r| r.re).collect();
    let mut warm_im: Vec<f64> = reference.iter().map(|r| r.im).collect();

    let n = solver::solve_in_place(&c_re, &c_im, &mut warm_re, &mut warm_im);
    assert_eq!(n, 5);
    for i in 0..5 {
        assert!((c(warm_re[i], warm_im[i]) - reference[i]).norm() < 1e-9);
    }
}
