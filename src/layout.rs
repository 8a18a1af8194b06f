//! Byte layout of the flat linear-memory contract used to drive the step
//! loop from a native or WASM build of the solver. Offsets are computed,
//! never hardcoded: everything is anchored at the module's reported heap
//! base so the layout can never collide with its static data.

/// WASM page granularity.
pub const PAGE_SIZE: usize = 65536;

/// Config word counts. Keep in sync with [`Layout`]'s field list.
pub const CFG_INT_LEN: usize = 69;
pub const CFG_DBL_LEN: usize = 9;

/// Sizing inputs for one run's layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutParams {
    pub n_coeffs: usize,
    pub n_roots: usize,
    /// Capacity of the paint output arrays.
    pub max_pixels: usize,
    pub n_entries: usize,
    pub n_dentries: usize,
    pub n_follow_c: usize,
    pub n_sel_indices: usize,
    /// Total flattened curve samples across all C entries.
    pub total_curve_pts: usize,
    pub total_dcurve_pts: usize,
}

/// Byte offsets for every wire array, 8-byte aligned, plus the number of
/// 64 KiB pages the whole layout needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub cfg_int: usize,
    pub cfg_dbl: usize,
    pub coeffs_re: usize,
    pub coeffs_im: usize,
    pub colors_r: usize,
    pub colors_g: usize,
    pub colors_b: usize,
    pub jiggle_re: usize,
    pub jiggle_im: usize,
    pub morph_tgt_re: usize,
    pub morph_tgt_im: usize,
    pub prox_pal_r: usize,
    pub prox_pal_g: usize,
    pub prox_pal_b: usize,
    pub deriv_pal_r: usize,
    pub deriv_pal_g: usize,
    pub deriv_pal_b: usize,
    pub sel_indices: usize,
    pub follow_c_idx: usize,
    pub entry_idx: usize,
    pub entry_speed: usize,
    pub entry_ccw: usize,
    pub entry_dither: usize,
    pub entry_dither_dist: usize,
    pub curve_offsets: usize,
    pub curve_lengths: usize,
    pub curve_is_cloud: usize,
    pub dentry_idx: usize,
    pub dentry_speed: usize,
    pub dentry_ccw: usize,
    pub dentry_dither: usize,
    pub dentry_dither_dist: usize,
    pub dcurve_offsets: usize,
    pub dcurve_lengths: usize,
    pub dcurve_is_cloud: usize,
    pub curves_flat: usize,
    pub dcurves_flat: usize,
    pub work_coeffs_re: usize,
    pub work_coeffs_im: usize,
    pub tmp_re: usize,
    pub tmp_im: usize,
    pub morph_work_re: usize,
    pub morph_work_im: usize,
    pub pass_roots_re: usize,
    pub pass_roots_im: usize,
    pub paint_idx: usize,
    pub paint_r: usize,
    pub paint_g: usize,
    pub paint_b: usize,
    /// First byte past the layout.
    pub end: usize,
    /// Pages of linear memory the layout requires in total.
    pub pages: usize,
}

const fn align8(x: usize) -> usize {
    (x + 7) & !7
}

/// Assign offsets for every array, in wire order, starting at `heap_base`.
/// Pure: the same inputs always produce the same offsets, and a caller
/// short on memory grows to `pages` rather than faulting.
pub fn compute_layout(p: LayoutParams, heap_base: usize) -> Layout {
    let nc = p.n_coeffs;
    let nr = p.n_roots;
    let ne = p.n_entries.max(1);
    let nde = p.n_dentries.max(1);
    let nfc = p.n_follow_c.max(1);
    let nsi = p.n_sel_indices.max(1);
    let tcp = p.total_curve_pts.max(1);
    let tdp = p.total_dcurve_pts.max(1);

    let mut o = heap_base;
    let mut take = |bytes: usize| {
        let at = o;
        o = align8(o + bytes);
        at
    };

    let cfg_int = take(CFG_INT_LEN * 4);
    let cfg_dbl = take(CFG_DBL_LEN * 8);
    let coeffs_re = take(nc * 8);
    let coeffs_im = take(nc * 8);
    let colors_r = take(nr);
    let colors_g = take(nr);
    let colors_b = take(nr);
    let jiggle_re = take(nc * 8);
    let jiggle_im = take(nc * 8);
    let morph_tgt_re = take(nc * 8);
    let morph_tgt_im = take(nc * 8);
    let prox_pal_r = take(16);
    let prox_pal_g = take(16);
    let prox_pal_b = take(16);
    let deriv_pal_r = take(16);
    let deriv_pal_g = take(16);
    let deriv_pal_b = take(16);
    let sel_indices = take(nsi * 4);
    let follow_c_idx = take(nfc * 4);
    let entry_idx = take(ne * 4);
    let entry_speed = take(ne * 8);
    let entry_ccw = take(ne * 4);
    let entry_dither = take(ne * 8);
    let entry_dither_dist = take(ne * 4);
    let curve_offsets = take(ne * 4);
    let curve_lengths = take(ne * 4);
    let curve_is_cloud = take(ne * 4);
    let dentry_idx = take(nde * 4);
    let dentry_speed = take(nde * 8);
    let dentry_ccw = take(nde * 4);
    let dentry_dither = take(nde * 8);
    let dentry_dither_dist = take(nde * 4);
    let dcurve_offsets = take(nde * 4);
    let dcurve_lengths = take(nde * 4);
    let dcurve_is_cloud = take(nde * 4);
    let curves_flat = take(tcp * 2 * 8);
    let dcurves_flat = take(tdp * 2 * 8);
    let work_coeffs_re = take(nc * 8);
    let work_coeffs_im = take(nc * 8);
    let tmp_re = take(nr * 8);
    let tmp_im = take(nr * 8);
    let morph_work_re = take(nc * 8);
    let morph_work_im = take(nc * 8);
    let pass_roots_re = take(nr * 8);
    let pass_roots_im = take(nr * 8);
    let paint_idx = take(p.max_pixels * 4);
    let paint_r = take(p.max_pixels);
    let paint_g = take(p.max_pixels);
    let paint_b = take(p.max_pixels);

    let end = o;
    Layout {
        cfg_int,
        cfg_dbl,
        coeffs_re,
        coeffs_im,
        colors_r,
        colors_g,
        colors_b,
        jiggle_re,
        jiggle_im,
        morph_tgt_re,
        morph_tgt_im,
        prox_pal_r,
        prox_pal_g,
        prox_pal_b,
        deriv_pal_r,
        deriv_pal_g,
        deriv_pal_b,
        sel_indices,
        follow_c_idx,
        entry_idx,
        entry_speed,
        entry_ccw,
        entry_dither,
        entry_dither_dist,
        curve_offsets,
        curve_lengths,
        curve_is_cloud,
        dentry_idx,
        dentry_speed,
        dentry_ccw,
        dentry_dither,
        dentry_dither_dist,
        dcurve_offsets,
        dcurve_lengths,
        dcurve_is_cloud,
        curves_flat,
        dcurves_flat,
        work_coeffs_re,
        work_coeffs_im,
        tmp_re,
        tmp_im,
        morph_work_re,
        morph_work_im,
        pass_roots_re,
        pass_roots_im,
        paint_idx,
        paint_r,
        paint_g,
        paint_b,
        end,
        pages: end.div_ceil(PAGE_SIZE),
    }
}

impl Layout {
    /// Pages a caller must grow by, given how many it already has.
    pub fn grow_needed(&self, current_pages: usize) -> usize {
        self.pages.saturating_sub(current_pages)
    }

    /// Every array offset in wire order plus the end marker, for overlap
    /// checks and marshalling.
    pub fn offsets(&self) -> [usize; 50] {
        [
            self.cfg_int,
            self.cfg_dbl,
            self.coeffs_re,
            self.coeffs_im,
            self.colors_r,
            self.colors_g,
            self.colors_b,
            self.jiggle_re,
            self.jiggle_im,
            self.morph_tgt_re,
            self.morph_tgt_im,
            self.prox_pal_r,
            self.prox_pal_g,
            self.prox_pal_b,
            self.deriv_pal_r,
            self.deriv_pal_g,
            self.deriv_pal_b,
            self.sel_indices,
            self.follow_c_idx,
            self.entry_idx,
            self.entry_speed,
            self.entry_ccw,
            self.entry_dither,
            self.entry_dither_dist,
            self.curve_offsets,
            self.curve_lengths,
            self.curve_is_cloud,
            self.dentry_idx,
            self.dentry_speed,
            self.dentry_ccw,
            self.dentry_dither,
            self.dentry_dither_dist,
            self.dcurve_offsets,
            self.dcurve_lengths,
            self.dcurve_is_cloud,
            self.curves_flat,
            self.dcurves_flat,
            self.work_coeffs_re,
            self.work_coeffs_im,
            self.tmp_re,
            self.tmp_im,
            self.morph_work_re,
            self.morph_work_im,
            self.pass_roots_re,
            self.pass_roots_im,
            self.paint_idx,
            self.paint_r,
            self.paint_g,
            self.paint_b,
            self.end,
        ]
    }
}
