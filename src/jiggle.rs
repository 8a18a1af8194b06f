use num_complex::Complex64;
use std::f64::consts::PI;

/// Periodic perturbation applied to non-animated coefficients while the
/// animation clock runs. All modes are pure in `(config, step)`: asking for
/// the same step twice yields bit-identical offsets, so workers replaying
/// disjoint step ranges agree with the single-threaded path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JiggleMode {
    None,
    Random,
    Rotate,
    Walk,
    Scale,
    Circle,
    Spiral,
    Breathe,
    Wobble,
    Lissajous,
    Orbit,
}

impl JiggleMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Random => "random",
            Self::Rotate => "rotate",
            Self::Walk => "walk",
            Self::Scale => "scale",
            Self::Circle => "circle",
            Self::Spiral => "spiral",
            Self::Breathe => "breathe",
            Self::Wobble => "wobble",
            Self::Lissajous => "lissajous",
            Self::Orbit => "orbit",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "none" => Some(Self::None),
            "random" => Some(Self::Random),
            "rotate" => Some(Self::Rotate),
            "walk" => Some(Self::Walk),
            "scale" => Some(Self::Scale),
            "circle" => Some(Self::Circle),
            "spiral" => Some(Self::Spiral),
            "breathe" => Some(Self::Breathe),
            "wobble" => Some(Self::Wobble),
            "lissajous" => Some(Self::Lissajous),
            "orbit" => Some(Self::Orbit),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JiggleConfig {
    pub mode: JiggleMode,
    /// Gaussian spread for random/walk, in coefficient-plane units.
    pub sigma: f64,
    /// Rotation per step as a fraction of a full turn (rotate/wobble).
    pub theta: f64,
    /// Percent scale change per step (scale).
    pub scale_step: f64,
    /// Steps per full cycle for the periodic modes.
    pub period: f64,
    /// Displacement amplitude for the periodic modes.
    pub amplitude: f64,
    pub liss_freq_x: f64,
    pub liss_freq_y: f64,
    /// Seconds of animation clock per jiggle step.
    pub interval: f64,
    pub seed: u64,
}

impl Default for JiggleConfig {
    fn default() -> Self {
        Self {
            mode: JiggleMode::None,
            sigma: 10.0,
            theta: 0.1,
            scale_step: 0.05,
            period: 4.0,
            amplitude: 10.0,
            liss_freq_x: 3.0,
            liss_freq_y: 2.0,
            interval: 4.0,
            seed: 0x7001_5EED,
        }
    }
}

impl JiggleConfig {
    pub fn step_from_elapsed(&self, elapsed: f64) -> u64 {
        if self.interval <= 0.0 {
            return 0;
        }
        let s = (elapsed / self.interval).floor();
        if s <= 0.0 { 0 } else { s as u64 }
    }
}

/// Center of mass of the jiggle targets' home positions.
pub fn centroid(homes: &[Complex64]) -> Complex64 {
    if homes.is_empty() {
        return Complex64::new(0.0, 0.0);
    }
    homes.iter().sum::<Complex64>() / homes.len() as f64
}

/// Offset generator with a last-step cache.
///
/// The cache is an optimization only: `offsets_at` for any step, in any
/// order, returns what a from-scratch replay would. Monotonic access (the
/// worker loop) advances incrementally; anything else rebuilds.
pub struct JiggleState {
    cfg: JiggleConfig,
    homes: Vec<Complex64>,
    center: Complex64,
    cached_step: Option<u64>,
    offsets: Vec<Complex64>,
    // Walk is the one genuinely cumulative-random mode; its RNG position
    // always corresponds to `cached_step`.
    walk_rng: fastrand::Rng,
    walk_sum: Vec<Complex64>,
}

impl JiggleState {
    pub fn new(cfg: JiggleConfig, homes: Vec<Complex64>) -> Self {
        let center = centroid(&homes);
        let n = homes.len();
        Self {
            cfg,
            homes,
            center,
            cached_step: None,
            offsets: vec![Complex64::new(0.0, 0.0); n],
            walk_rng: fastrand::Rng::with_seed(cfg.seed),
            walk_sum: vec![Complex64::new(0.0, 0.0); n],
        }
    }

    pub fn config(&self) -> &JiggleConfig {
        &self.cfg
    }

    /// Offsets for the given jiggle step, one per target home.
    pub fn offsets_at(&mut self, step: u64) -> &[Complex64] {
        if self.cfg.mode == JiggleMode::None || self.homes.is_empty() {
            return &self.offsets;
        }
        match self.cached_step {
            Some(s) if s == step => {}
            Some(s) if step > s && self.cfg.mode == JiggleMode::Walk => {
                for k in s + 1..=step {
                    self.advance_walk(k);
                }
                self.fill(step);
            }
            _ => {
                self.rebuild(step);
            }
        }
        self.cached_step = Some(step);
        &self.offsets
    }

    fn rebuild(&mut self, step: u64) {
        if self.cfg.mode == JiggleMode::Walk {
            self.walk_rng = fastrand::Rng::with_seed(self.cfg.seed);
            for c in &mut self.walk_sum {
                *c = Complex64::new(0.0, 0.0);
            }
            for k in 0..=step {
                self.advance_walk(k);
            }
        }
        self.fill(step);
    }

    fn advance_walk(&mut self, _step: u64) {
        let sigma = self.cfg.sigma;
        for c in &mut self.walk_sum {
            let (g0, g1) = gauss_pair(&mut self.walk_rng);
            *c += Complex64::new(g0 * sigma, g1 * sigma);
        }
    }

    fn fill(&mut self, step: u64) {
        let cfg = self.cfg;
        // Step s is the (s+1)-th trigger; cumulative modes count triggers.
        let triggers = (step + 1) as f64;
        let n = self.homes.len();
        let period = if cfg.period > 0.0 { cfg.period } else { 1.0 };
        let phase = 2.0 * PI * (step as f64) / period;

        for (i, off) in self.offsets.iter_mut().enumerate() {
            let home = self.homes[i];
            let rel = home - self.center;
            *off = match cfg.mode {
                JiggleMode::None => Complex64::new(0.0, 0.0),
                JiggleMode::Random => {
                    let mut rng = fastrand::Rng::with_seed(mix(cfg.seed, step, i as u64));
                    let (g0, g1) = gauss_pair(&mut rng);
                    Complex64::new(g0 * cfg.sigma, g1 * cfg.sigma)
                }
                JiggleMode::Walk => self.walk_sum[i],
                JiggleMode::Rotate => {
                    let angle = cfg.theta * 2.0 * PI * triggers;
                    rotate(rel, angle) - rel
                }
                JiggleMode::Scale => {
                    let scale = (1.0 + cfg.scale_step / 100.0).powf(triggers);
                    rel * (scale - 1.0)
                }
                JiggleMode::Circle => {
                    Complex64::new(phase.cos(), phase.sin()) * cfg.amplitude
                }
                JiggleMode::Spiral => {
                    let r = cfg.amplitude * (step as f64 / period);
                    Complex64::new(phase.cos(), phase.sin()) * r
                }
                JiggleMode::Breathe => rel * (cfg.amplitude / 100.0) * phase.sin(),
                JiggleMode::Wobble => {
                    let angle = cfg.theta * 2.0 * PI * phase.sin();
                    rotate(rel, angle) - rel
                }
                JiggleMode::Lissajous => Complex64::new(
                    (cfg.liss_freq_x * phase).sin(),
                    (cfg.liss_freq_y * phase).sin(),
                ) * cfg.amplitude,
                JiggleMode::Orbit => {
                    let p = phase + 2.0 * PI * i as f64 / n.max(1) as f64;
                    Complex64::new(p.cos(), p.sin()) * cfg.amplitude
                }
            };
        }
    }

    /// Cumulative rotation angle after `step`, exposed for the interactive
    /// readout (rotate mode only).
    pub fn cumulative_angle(&self, step: u64) -> f64 {
        self.cfg.theta * 2.0 * PI * (step + 1) as f64
    }

    /// Cumulative scale factor after `step` (scale mode only).
    pub fn cumulative_scale(&self, step: u64) -> f64 {
        (1.0 + self.cfg.scale_step / 100.0).powf((step + 1) as f64)
    }
}

fn rotate(z: Complex64, angle: f64) -> Complex64 {
    z * Complex64::new(angle.cos(), angle.sin())
}

/// Box-Muller pair from a seeded uniform stream.
fn gauss_pair(rng: &mut fastrand::Rng) -> (f64, f64) {
    let mut u = rng.f64();
    while u == 0.0 {
        u = rng.f64();
    }
    let v = rng.f64();
    let r = (-2.0 * u.ln()).sqrt();
    let theta = 2.0 * PI * v;
    (r * theta.cos(), r * theta.sin())
}

/// SplitMix-style seed derivation so per-step streams are uncorrelated.
fn mix(seed: u64, step: u64, lane: u64) -> u64 {
    let mut z = seed
        .wrapping_add(step.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add(lane.wrapping_mul(0xBF58_476D_1CE4_E5B9));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
