use num_complex::Complex64;
use rootfield::render::{
    AccumBuffers, DISPLAY_CAP, PALETTE_LEN, PaintDelta, ProximityScale, Viewport,
    derivative_palette, index_rainbow, nearest_peer_dists, palette_index, proximity_palette,
    rank_norm, sensitivity,
};
use rootfield::stats;

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

fn pixel(buf: &[u8], res: usize, x: usize, y: usize) -> [u8; 4] {
    let p = (y * res + x) * 4;
    [buf[p], buf[p + 1], buf[p + 2], buf[p + 3]]
}

// ── Viewport mapping ────────────────────────────────────────────────────────

#[test]
fn center_maps_to_the_middle_of_the_raster() {
    let vp = Viewport::square(100, 2.0);
    assert_eq!(vp.map(c(0.0, 0.0)), Some((50, 50)));
}

#[test]
fn edges_follow_half_open_convention() {
    let vp = Viewport::square(100, 2.0);
    // Left/top edges are inside; right/bottom land exactly on the open edge.
    assert_eq!(vp.map(c(-2.0, 2.0)), Some((0, 0)));
    assert_eq!(vp.map(c(2.0, 2.0)), None);
    assert_eq!(vp.map(c(-2.0, -2.0)), None);
    assert_eq!(vp.map(c(1.99, -1.99)), Some((99, 99)));
}

#[test]
fn out_of_canvas_roots_are_dropped_not_clamped() {
    let vp = Viewport::square(100, 2.0);
    assert_eq!(vp.map(c(3.0, 0.0)), None);
    assert_eq!(vp.map(c(0.0, -2.5)), None);
    assert_eq!(vp.map(c(f64::NAN, 0.0)), None);
}

#[test]
fn viewport_respects_a_shifted_center() {
    let vp = Viewport {
        center: c(1.0, 1.0),
        range: 1.0,
        width: 10,
        height: 10,
    };
    assert_eq!(vp.map(c(1.0, 1.0)), Some((5, 5)));
    assert_eq!(vp.map(c(0.0, 0.0)), None);
}

// ── Accumulation buffers ────────────────────────────────────────────────────

#[test]
fn small_resolutions_use_a_single_buffer() {
    let buf = AccumBuffers::new(500);
    assert!(!buf.has_split());
    assert_eq!(buf.display_res(), 500);
    assert_eq!(buf.display().len(), 500 * 500 * 4);
}

#[test]
fn resolution_at_the_cap_does_not_split() {
    let buf = AccumBuffers::new(DISPLAY_CAP);
    assert!(!buf.has_split());
    assert_eq!(buf.display_res(), DISPLAY_CAP);
}

#[test]
fn oversized_resolution_gets_a_display_mirror() {
    let buf = AccumBuffers::new(5000);
    assert!(buf.has_split());
    assert_eq!(buf.compute_res(), 5000);
    assert_eq!(buf.display_res(), DISPLAY_CAP);
    assert_eq!(buf.persistent().len(), 5000 * 5000 * 4);
    assert_eq!(buf.display().len(), DISPLAY_CAP * DISPLAY_CAP * 4);
}

#[test]
fn composite_mirrors_into_display_space() {
    let mut buf = AccumBuffers::new(5000);
    let mut delta = PaintDelta::default();
    // Compute pixel (2500, 10) -> display (1000, 4) at the 0.4 ratio.
    delta.push((10 * 5000 + 2500) as u32, [10, 20, 30]);
    buf.composite(&delta);
    assert_eq!(pixel(buf.persistent(), 5000, 2500, 10), [10, 20, 30, 255]);
    assert_eq!(pixel(buf.display(), DISPLAY_CAP, 1000, 4), [10, 20, 30, 255]);
}

#[test]
fn later_writes_win_per_pixel() {
    let mut buf = AccumBuffers::new(100);
    let mut delta = PaintDelta::default();
    delta.push(42, [1, 1, 1]);
    delta.push(42, [9, 8, 7]);
    buf.composite(&delta);
    assert_eq!(pixel(buf.persistent(), 100, 42, 0), [9, 8, 7, 255]);
}

#[test]
fn clear_wipes_pixels_but_keeps_structure() {
    let mut buf = AccumBuffers::new(5000);
    let mut delta = PaintDelta::default();
    delta.push(7, [255, 255, 255]);
    buf.composite(&delta);
    buf.clear();
    assert_eq!(pixel(buf.persistent(), 5000, 7, 0), [0, 0, 0, 0]);
    assert!(buf.has_split());
    assert_eq!(buf.compute_res(), 5000);
}

#[test]
fn out_of_range_indices_are_ignored() {
    let mut buf = AccumBuffers::new(10);
    let mut delta = PaintDelta::default();
    delta.push(10 * 10, [5, 5, 5]);
    buf.composite(&delta);
    assert!(buf.persistent().iter().all(|&b| b == 0));
}

// ── Rank normalization ──────────────────────────────────────────────────────

#[test]
fn distinct_values_get_evenly_spaced_ranks() {
    let r = rank_norm(&[3.0, 1.0, 2.0]).unwrap();
    assert_eq!(r, vec![1.0, 0.0, 0.5]);
}

#[test]
fn ties_share_a_rank() {
    let r = rank_norm(&[1.0, 1.0, 2.0]).unwrap();
    assert_eq!(r[0], r[1]);
    assert_eq!(r[2], 1.0);
}

#[test]
fn single_value_ranks_to_the_middle() {
    assert_eq!(rank_norm(&[7.0]).unwrap(), vec![0.5]);
}

#[test]
fn non_finite_values_borrow_the_largest_finite_rank() {
    let r = rank_norm(&[1.0, f64::INFINITY, 2.0]).unwrap();
    assert_eq!(r[1], r[2]);
    assert_eq!(r[0], 0.0);
}

#[test]
fn all_non_finite_yields_none() {
    assert!(rank_norm(&[f64::NAN, f64::INFINITY]).is_none());
    assert!(rank_norm(&[]).is_none());
}

// ── Sensitivity and proximity ───────────────────────────────────────────────

#[test]
fn sensitivity_is_finite_for_simple_roots() {
    let coeffs = vec![c(1.0, 0.0), c(0.0, 0.0), c(-1.0, 0.0)];
    let roots = vec![c(1.0, 0.0), c(-1.0, 0.0)];
    let s = sensitivity(&coeffs, &roots, &[2]);
    assert_eq!(s.len(), 2);
    for v in &s {
        assert!(v.is_finite() && *v > 0.0);
    }
}

#[test]
fn degenerate_derivative_maps_to_infinity() {
    // p = z^2, p' = 2z: the double root at 0 kills the derivative.
    let coeffs = vec![c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0)];
    let s = sensitivity(&coeffs, &[c(0.0, 0.0)], &[0]);
    assert!(s[0].is_infinite());
}

#[test]
fn nearest_peer_distance_is_symmetric() {
    let roots = vec![c(0.0, 0.0), c(1.0, 0.0), c(5.0, 0.0)];
    let d = nearest_peer_dists(&roots);
    assert!((d[0] - 1.0).abs() < 1e-12);
    assert!((d[1] - 1.0).abs() < 1e-12);
    assert!((d[2] - 4.0).abs() < 1e-12);
}

#[test]
fn proximity_scale_tracks_and_decays_the_running_max() {
    let mut scale = ProximityScale::new();
    let t = scale.rank(&[10.0, 0.0]);
    // Smallest distance maps to the hot end.
    assert!(t[1] > t[0]);
    assert!((t[1] - 1.0).abs() < 1e-12);
    // A later, smaller batch still ranks against the decayed maximum.
    let t2 = scale.rank(&[5.0]);
    assert!(t2[0] > 0.0 && t2[0] < 1.0);
}

// ── Palettes ────────────────────────────────────────────────────────────────

#[test]
fn palette_index_clamps_both_ends() {
    assert_eq!(palette_index(-0.5), 0);
    assert_eq!(palette_index(0.0), 0);
    assert_eq!(palette_index(1.0), PALETTE_LEN - 1);
    assert_eq!(palette_index(2.0), PALETTE_LEN - 1);
}

#[test]
fn ranked_palettes_have_distinct_ends() {
    for pal in [proximity_palette(), derivative_palette()] {
        assert_ne!(pal[0], pal[PALETTE_LEN - 1]);
    }
}

#[test]
fn index_rainbow_gives_each_slot_its_own_color() {
    let colors = index_rainbow(6);
    assert_eq!(colors.len(), 6);
    for i in 0..6 {
        for j in i + 1..6 {
            assert_ne!(colors[i], colors[j]);
        }
    }
}

// ── Root statistics ─────────────────────────────────────────────────────────

#[test]
fn pairwise_distance_stats() {
    let roots = vec![c(0.0, 0.0), c(3.0, 0.0), c(0.0, 4.0)];
    assert!((stats::min_dist(&roots) - 3.0).abs() < 1e-12);
    assert!((stats::max_dist(&roots) - 5.0).abs() < 1e-12);
    assert!((stats::mean_dist(&roots) - 4.0).abs() < 1e-12);
}

#[test]
fn stats_degenerate_inputs_are_zero() {
    assert_eq!(stats::min_dist(&[]), 0.0);
    assert_eq!(stats::max_dist(&[c(1.0, 1.0)]), 0.0);
    assert_eq!(stats::mean_dist(&[c(1.0, 1.0)]), 0.0);
}

#[test]
fn percentiles_interpolate() {
    let sorted = [1.0, 2.0, 3.0, 4.0];
    assert_eq!(stats::percentile_sorted(&sorted, 0.0), 1.0);
    assert_eq!(stats::percentile_sorted(&sorted, 1.0), 4.0);
    assert!((stats::percentile_sorted(&sorted, 0.5) - 2.5).abs() < 1e-12);
}
