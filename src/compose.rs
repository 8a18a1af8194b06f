use crate::jiggle::{JiggleConfig, JiggleMode, JiggleState};
use crate::morph::{self, MorphAngle, MorphState};
use crate::paths::{self, PathExtra, PathType};
use num_complex::Complex64;
use std::f64::consts::PI;

/// One coefficient of the polynomial, with its animation setup.
///
/// `curve` is precomputed from the path parameters; `curve[0]` is always the
/// home position, and a `None` path keeps the curve at a single sample.
#[derive(Clone, Debug)]
pub struct Coefficient {
    pub home: Complex64,
    pub pos: Complex64,
    pub path: PathType,
    pub radius: f64,
    pub speed: f64,
    pub angle_offset: f64,
    pub ccw: bool,
    pub extra: PathExtra,
    /// Per-step noise sigma; 0 disables.
    pub dither: f64,
    /// Uniform [-1,1) noise instead of Gaussian.
    pub dither_uniform: bool,
    pub curve: Vec<Complex64>,
    pub curve_index: usize,
}

impl Coefficient {
    pub fn new(home: Complex64) -> Self {
        Self {
            home,
            pos: home,
            path: PathType::None,
            radius: 0.5,
            speed: 0.1,
            angle_offset: 0.0,
            ccw: false,
            extra: PathExtra::default(),
            dither: 0.0,
            dither_uniform: false,
            curve: vec![home],
            curve_index: 0,
        }
    }

    pub fn set_path(&mut self, path: PathType) {
        self.path = path;
        self.rebuild_curve();
    }

    pub fn rebuild_curve(&mut self) {
        self.curve = paths::build_curve(
            self.path,
            self.home,
            self.radius,
            self.angle_offset,
            &self.extra,
        );
        self.curve_index = 0;
    }

    pub fn is_animated(&self) -> bool {
        self.path != PathType::None
    }
}

/// A coefficient's animation, flattened for the worker snapshot: the curve
/// samples live in one shared array addressed by `(offset, len)`.
#[derive(Clone, Copy, Debug)]
pub struct CurveEntry {
    pub idx: usize,
    pub speed: f64,
    pub ccw: bool,
    pub dither: f64,
    pub dither_uniform: bool,
    pub offset: usize,
    pub len: usize,
    pub closed: bool,
    pub cloud: bool,
}

/// Everything a worker needs to reproduce coefficient positions for any
/// step, with no reference back to shared engine state.
#[derive(Clone, Debug)]
pub struct AnimationPlan {
    /// Base (current) coefficient values, highest degree first.
    pub base: Vec<Complex64>,
    pub entries: Vec<CurveEntry>,
    pub curves: Vec<Complex64>,
    /// Static morph-target positions, 1:1 with `base`.
    pub morph_targets: Vec<Complex64>,
    pub d_entries: Vec<CurveEntry>,
    pub d_curves: Vec<Complex64>,
    /// D-node indices that mirror the C position each step.
    pub follow_c: Vec<usize>,
    pub morph: MorphState,
    pub jiggle: JiggleConfig,
    /// Non-animated coefficient indices that receive jiggle offsets.
    pub jiggle_targets: Vec<usize>,
    /// Seconds of animation clock covered by one full pass of
    /// `total_steps` steps.
    pub pass_seconds: f64,
    pub total_steps: usize,
}

impl AnimationPlan {
    /// Snapshot the interactive coefficient set into a worker plan.
    ///
    /// Animated coefficients become curve entries; the rest become jiggle
    /// targets (a real animation path takes precedence over jiggle, and
    /// D-nodes are never jiggled).
    pub fn build(
        coeffs: &[Coefficient],
        morph_targets: &[Coefficient],
        morph: MorphState,
        jiggle: JiggleConfig,
        pass_seconds: f64,
        total_steps: usize,
    ) -> Self {
        let mut entries = Vec::new();
        let mut curves = Vec::new();
        let mut jiggle_targets = Vec::new();
        for (i, c) in coeffs.iter().enumerate() {
            if c.is_animated() {
                entries.push(flatten_entry(i, c, &mut curves));
            } else if jiggle.mode != JiggleMode::None {
                jiggle_targets.push(i);
            }
        }

        let mut d_entries = Vec::new();
        let mut d_curves = Vec::new();
        let mut follow_c = Vec::new();
        let mut targets = Vec::with_capacity(coeffs.len());
        if morph.params().is_some() {
            for (i, d) in morph_targets.iter().enumerate() {
                targets.push(d.pos);
                if d.is_animated() {
                    d_entries.push(flatten_entry(i, d, &mut d_curves));
                }
            }
            // Morph arrays are 1:1 with the primary set; missing targets
            // follow their C coefficient.
            for i in morph_targets.len()..coeffs.len() {
                targets.push(coeffs[i].pos);
                follow_c.push(i);
            }
        } else {
            targets.extend(coeffs.iter().map(|c| c.pos));
        }

        Self {
            base: coeffs.iter().map(|c| c.pos).collect(),
            entries,
            curves,
            morph_targets: targets,
            d_entries,
            d_curves,
            follow_c,
            morph,
            jiggle,
            jiggle_targets,
            pass_seconds,
            total_steps: total_steps.max(1),
        }
    }

    pub fn n_coeffs(&self) -> usize {
        self.base.len()
    }

    pub fn elapsed_at(&self, step: usize, elapsed_offset: f64) -> f64 {
        elapsed_offset + (step as f64 / self.total_steps as f64) * self.pass_seconds
    }
}

fn flatten_entry(idx: usize, c: &Coefficient, curves: &mut Vec<Complex64>) -> CurveEntry {
    let offset = curves.len();
    curves.extend_from_slice(&c.curve);
    CurveEntry {
        idx,
        speed: c.speed,
        ccw: c.ccw,
        dither: c.dither,
        dither_uniform: c.dither_uniform,
        offset,
        len: c.curve.len(),
        closed: c.path.is_closed(),
        cloud: false,
    }
}

/// Per-step coefficient composer for one worker's contiguous step range.
///
/// Steps must be fed in ascending order starting at the range's first step;
/// the morph angle advances by recurrence and the jiggle cache advances
/// incrementally, both of which replay bit-identically from any range start.
pub struct StepComposer<'a> {
    plan: &'a AnimationPlan,
    elapsed_offset: f64,
    work: Vec<Complex64>,
    morph_work: Vec<Complex64>,
    jiggle: JiggleState,
    morph_angle: Option<MorphAngle>,
    rng: fastrand::Rng,
}

impl<'a> StepComposer<'a> {
    pub fn new(plan: &'a AnimationPlan, step_start: usize, elapsed_offset: f64, seed: u64) -> Self {
        let n = plan.n_coeffs();
        let homes: Vec<Complex64> = plan
            .jiggle_targets
            .iter()
            .map(|&i| plan.base[i])
            .collect();

        let morph_angle = plan.morph.params().map(|p| {
            let d_theta = 2.0 * PI * p.rate * plan.pass_seconds / plan.total_steps as f64;
            let theta0 = 2.0 * PI * p.rate * plan.elapsed_at(step_start, elapsed_offset);
            MorphAngle::new(theta0, d_theta)
        });

        Self {
            plan,
            elapsed_offset,
            work: vec![Complex64::new(0.0, 0.0); n],
            morph_work: plan.morph_targets.clone(),
            jiggle: JiggleState::new(plan.jiggle, homes),
            morph_angle,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Effective coefficients for `step`. The returned slice is valid until
    /// the next call.
    pub fn compose(&mut self, step: usize) -> &[Complex64] {
        let plan = self.plan;
        let elapsed = plan.elapsed_at(step, self.elapsed_offset);

        self.work.copy_from_slice(&plan.base);

        for e in &plan.entries {
            let pos = sample_entry(e, &plan.curves, elapsed);
            self.work[e.idx] = pos + self.dither_offset(e);
        }

        if let Some(params) = plan.morph.params() {
            for e in &plan.d_entries {
                let pos = sample_entry(e, &plan.d_curves, elapsed);
                self.morph_work[e.idx] = pos + self.dither_offset(e);
            }
            for &i in &plan.follow_c {
                self.morph_work[i] = self.work[i];
            }
            let angle = self.morph_angle.get_or_insert_with(|| MorphAngle::new(0.0, 0.0));
            if !angle.at_home() {
                morph::blend(params, angle, &mut self.work, &self.morph_work);
                if !params.dither.is_zero() {
                    let sigma = params.dither.sigma_at(angle.cos_t, angle.sin_t);
                    if sigma > 0.0 {
                        for c in &mut self.work {
                            let dx = (self.rng.f64() - 0.5) * 2.0 * sigma;
                            let dy = (self.rng.f64() - 0.5) * 2.0 * sigma;
                            *c += Complex64::new(dx, dy);
                        }
                    }
                }
            }
            angle.advance();
        }

        if !plan.jiggle_targets.is_empty() {
            let jstep = plan.jiggle.step_from_elapsed(elapsed);
            let offsets = self.jiggle.offsets_at(jstep);
            for (k, &i) in plan.jiggle_targets.iter().enumerate() {
                self.work[i] += offsets[k];
            }
        }

        &self.work
    }

    fn dither_offset(&mut self, e: &CurveEntry) -> Complex64 {
        if e.dither <= 0.0 {
            return Complex64::new(0.0, 0.0);
        }
        let (a, b) = if e.dither_uniform {
            (
                (self.rng.f64() - 0.5) * 2.0,
                (self.rng.f64() - 0.5) * 2.0,
            )
        } else {
            gauss_pair(&mut self.rng)
        };
        Complex64::new(a * e.dither, b * e.dither)
    }
}

fn sample_entry(e: &CurveEntry, curves: &[Complex64], elapsed: f64) -> Complex64 {
    let dir = if e.ccw { -1.0 } else { 1.0 };
    let u = paths::frac01(elapsed * e.speed * dir);
    let curve = &curves[e.offset..e.offset + e.len];
    paths::sample_curve(curve, u, e.closed, e.cloud)
}

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

/// Interactive (continuous-time) effective positions: the same sampling as
/// the worker path, minus dither, for a single moment of the clock.
pub fn interactive_positions(
    coeffs: &[Coefficient],
    morph_targets: &[Coefficient],
    morph: MorphState,
    elapsed: f64,
) -> Vec<Complex64> {
    let plan = AnimationPlan::build(
        coeffs,
        morph_targets,
        morph,
        JiggleConfig::default(),
        1.0,
        1,
    );
    let mut out = plan.base.clone();
    for e in &plan.entries {
        out[e.idx] = sample_entry(e, &plan.curves, elapsed);
    }
    if let Some(params) = plan.morph.params() {
        let mut d = plan.morph_targets.clone();
        for e in &plan.d_entries {
            d[e.idx] = sample_entry(e, &plan.d_curves, elapsed);
        }
        for &i in &plan.follow_c {
            d[i] = out[i];
        }
        let theta = 2.0 * PI * params.rate * elapsed;
        let angle = MorphAngle::new(theta, 0.0);
        if !angle.at_home() {
            morph::blend(params, &angle, &mut out, &d);
        }
    }
    out
}
