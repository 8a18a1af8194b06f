use num_complex::Complex64;

/// Largest raster the display path will ever hold; compute buffers above
/// this get a downsampled display mirror.
pub const DISPLAY_CAP: usize = 2000;

/// Palette depth for the ranked color modes.
pub const PALETTE_LEN: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    /// Single fixed color for every root.
    Uniform,
    /// Per-root-identity rainbow; needs the matcher to keep identity stable.
    Index,
    /// Nearest-peer-distance ranking: crowded roots get the hot end.
    Proximity,
    /// Parameter-sensitivity ranking over the selected coefficients.
    Derivative,
}

impl ColorMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::Index => "index",
            Self::Proximity => "proximity",
            Self::Derivative => "derivative",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "uniform" => Some(Self::Uniform),
            "index" => Some(Self::Index),
            "proximity" => Some(Self::Proximity),
            "derivative" => Some(Self::Derivative),
            _ => None,
        }
    }

    /// Whether this mode needs root identity preserved between steps.
    pub fn needs_matching(self) -> bool {
        matches!(self, Self::Index | Self::Derivative)
    }
}

/// Root-plane viewport: complex `center` ± `range` maps onto the raster.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    pub center: Complex64,
    pub range: f64,
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    pub fn square(res: usize, range: f64) -> Self {
        Self {
            center: Complex64::new(0.0, 0.0),
            range,
            width: res,
            height: res,
        }
    }

    /// Map a root to raster coordinates. Out-of-canvas roots are dropped,
    /// never clamped: a root just off the edge paints nothing.
    pub fn map(&self, z: Complex64) -> Option<(usize, usize)> {
        let fx = ((z.re - self.center.re) / self.range + 1.0) * 0.5 * self.width as f64;
        let fy = (1.0 - (z.im - self.center.im) / self.range) * 0.5 * self.height as f64;
        let ix = fx.floor();
        let iy = fy.floor();
        // Written positively so NaN coordinates drop too.
        let inside =
            ix >= 0.0 && iy >= 0.0 && ix < self.width as f64 && iy < self.height as f64;
        if !inside {
            return None;
        }
        Some((ix as usize, iy as usize))
    }
}

/// Sparse pixel writes produced by one worker range, composited later in
/// arrival order (last writer wins per pixel).
#[derive(Clone, Debug, Default)]
pub struct PaintDelta {
    pub idx: Vec<u32>,
    pub r: Vec<u8>,
    pub g: Vec<u8>,
    pub b: Vec<u8>,
}

impl PaintDelta {
    pub fn push(&mut self, idx: u32, rgb: [u8; 3]) {
        self.idx.push(idx);
        self.r.push(rgb[0]);
        self.g.push(rgb[1]);
        self.b.push(rgb[2]);
    }

    pub fn len(&self) -> usize {
        self.idx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idx.is_empty()
    }
}

/// The accumulation raster(s): a persistent RGBA buffer at the compute
/// resolution and, only when that exceeds [`DISPLAY_CAP`], a downsampled
/// RGBA mirror at the display resolution.
pub struct AccumBuffers {
    compute_res: usize,
    display_res: usize,
    persistent: Vec<u8>,
    display: Option<Vec<u8>>,
}

impl AccumBuffers {
    pub fn new(compute_res: usize) -> Self {
        let split = compute_res > DISPLAY_CAP;
        let display_res = if split { DISPLAY_CAP } else { compute_res };
        Self {
            compute_res,
            display_res,
            persistent: vec![0u8; compute_res * compute_res * 4],
            display: split.then(|| vec![0u8; DISPLAY_CAP * DISPLAY_CAP * 4]),
        }
    }

    pub fn compute_res(&self) -> usize {
        self.compute_res
    }

    pub fn display_res(&self) -> usize {
        self.display_res
    }

    pub fn has_split(&self) -> bool {
        self.display.is_some()
    }

    pub fn persistent(&self) -> &[u8] {
        &self.persistent
    }

    /// The pixels to show: the downsampled mirror when split, otherwise the
    /// persistent buffer itself.
    pub fn display(&self) -> &[u8] {
        self.display.as_deref().unwrap_or(&self.persistent)
    }

    /// Apply one worker's sparse writes. Indices address compute space row
    /// major; each write also lands in the display mirror when split.
    pub fn composite(&mut self, delta: &PaintDelta) {
        let w = self.compute_res;
        let dw = self.display_res;
        for k in 0..delta.idx.len() {
            let idx = delta.idx[k] as usize;
            if idx >= w * w {
                continue;
            }
            let p = idx * 4;
            self.persistent[p] = delta.r[k];
            self.persistent[p + 1] = delta.g[k];
            self.persistent[p + 2] = delta.b[k];
            self.persistent[p + 3] = 255;

            if let Some(disp) = &mut self.display {
                let x = idx % w;
                let y = idx / w;
                let dx = x * dw / w;
                let dy = y * dw / w;
                let dp = (dy * dw + dx) * 4;
                disp[dp] = delta.r[k];
                disp[dp + 1] = delta.g[k];
                disp[dp + 2] = delta.b[k];
                disp[dp + 3] = 255;
            }
        }
    }

    /// Reset pixels only; resolution and split structure are untouched.
    pub fn clear(&mut self) {
        self.persistent.fill(0);
        if let Some(d) = &mut self.display {
            d.fill(0);
        }
    }
}

/// Rank-normalize `raw` into [0,1]: the smallest value maps to 0, the
/// largest to 1, distinct values to evenly spaced ranks, ties to identical
/// ranks. Non-finite entries are replaced by the largest finite value
/// before ranking. Returns `None` when nothing is finite.
pub fn rank_norm(raw: &[f64]) -> Option<Vec<f64>> {
    let n = raw.len();
    if n == 0 {
        return None;
    }
    let max_finite = raw
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if !max_finite.is_finite() {
        return None;
    }

    let mut order: Vec<(f64, usize)> = raw
        .iter()
        .enumerate()
        .map(|(i, &v)| (if v.is_finite() { v } else { max_finite }, i))
        .collect();
    order.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut result = vec![0.0; n];
    if n == 1 {
        result[0] = 0.5;
        return Some(result);
    }
    let mut rank = 0usize;
    for p in 0..n {
        if p > 0 && order[p].0 != order[p - 1].0 {
            rank = p;
        }
        result[order[p].1] = rank as f64;
    }
    let max_rank = (n - 1) as f64;
    for v in &mut result {
        *v /= max_rank;
    }
    Some(result)
}

/// Sensitivity of each root to a perturbation of the selected coefficient
/// indices: sum of |r|^(deg - sel) over selections, divided by |p'(r)|.
/// A degenerate derivative yields +inf; rank_norm later replaces it with
/// the largest finite sensitivity.
pub fn sensitivity(
    coeffs: &[Complex64],
    roots: &[Complex64],
    selected: &[usize],
) -> Vec<f64> {
    let deg = coeffs.len().saturating_sub(1);
    roots
        .iter()
        .map(|&z| {
            let mut p = coeffs[0];
            let mut dp = Complex64::new(0.0, 0.0);
            for &c in &coeffs[1..] {
                dp = dp * z + p;
                p = p * z + c;
            }
            let dp_m2 = dp.norm_sqr();
            if dp_m2 < 1e-60 {
                return f64::INFINITY;
            }
            let r_mag = z.norm();
            let mut pows = vec![1.0f64; deg + 1];
            for k in 1..=deg {
                pows[k] = pows[k - 1] * r_mag;
            }
            let sum: f64 = selected
                .iter()
                .filter(|&&s| s <= deg)
                .map(|&s| pows[deg - s])
                .sum();
            sum / dp_m2.sqrt()
        })
        .collect()
}

/// Squared distance from each root to its nearest peer (symmetric sweep).
pub fn nearest_peer_dists(roots: &[Complex64]) -> Vec<f64> {
    let n = roots.len();
    let mut min_d2 = vec![f64::INFINITY; n];
    for i in 0..n {
        for j in i + 1..n {
            let d2 = (roots[i] - roots[j]).norm_sqr();
            if d2 < min_d2[i] {
                min_d2[i] = d2;
            }
            if d2 < min_d2[j] {
                min_d2[j] = d2;
            }
        }
    }
    min_d2.iter().map(|d| d.sqrt()).collect()
}

/// Running maximum for proximity ranking. Decays slightly every step so a
/// single early outlier doesn't pin the palette forever.
#[derive(Clone, Copy, Debug)]
pub struct ProximityScale {
    run_max: f64,
}

impl ProximityScale {
    pub fn new() -> Self {
        Self { run_max: 1.0 }
    }

    /// Fold in this step's distances, then map each to a palette position
    /// in [0,1] with the hot end at the smallest distance.
    pub fn rank(&mut self, dists: &[f64]) -> Vec<f64> {
        for &d in dists {
            if d.is_finite() && d > self.run_max {
                self.run_max = d;
            }
        }
        self.run_max *= 0.999;
        dists
            .iter()
            .map(|&d| {
                if self.run_max > 0.0 && d.is_finite() {
                    1.0 - (d / self.run_max).min(1.0)
                } else {
                    1.0
                }
            })
            .collect()
    }
}

impl Default for ProximityScale {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamp a [0,1] palette position to a 16-entry index.
pub fn palette_index(t: f64) -> usize {
    let idx = (t * (PALETTE_LEN - 1) as f64 + 0.5) as isize;
    idx.clamp(0, PALETTE_LEN as isize - 1) as usize
}

/// Blue-to-white heat ramp for proximity coloring.
pub fn proximity_palette() -> [[u8; 3]; PALETTE_LEN] {
    ramp([10, 20, 90], [80, 160, 255], [255, 250, 240])
}

/// Violet-to-amber ramp for derivative-sensitivity coloring.
pub fn derivative_palette() -> [[u8; 3]; PALETTE_LEN] {
    ramp([40, 0, 70], [200, 60, 120], [255, 210, 90])
}

fn ramp(lo: [u8; 3], mid: [u8; 3], hi: [u8; 3]) -> [[u8; 3]; PALETTE_LEN] {
    let mut pal = [[0u8; 3]; PALETTE_LEN];
    for (i, entry) in pal.iter_mut().enumerate() {
        let t = i as f64 / (PALETTE_LEN - 1) as f64;
        for c in 0..3 {
            let v = if t < 0.5 {
                lerp(lo[c] as f64, mid[c] as f64, t * 2.0)
            } else {
                lerp(mid[c] as f64, hi[c] as f64, (t - 0.5) * 2.0)
            };
            entry[c] = v.round() as u8;
        }
    }
    pal
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Evenly spaced hue wheel, one color per root identity slot.
pub fn index_rainbow(n: usize) -> Vec<[u8; 3]> {
    (0..n)
        .map(|i| {
            let h = i as f64 / n.max(1) as f64 * 360.0;
            hsv_to_rgb(h, 0.85, 1.0)
        })
        .collect()
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [u8; 3] {
    let c = v * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as usize {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    [
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    ]
}
