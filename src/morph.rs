use num_complex::Complex64;
use std::f64::consts::PI;

/// Shape of the C→D travel path during a morph cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MorphPath {
    /// Straight blend, mu = (1 - cos θ)/2.
    Line,
    /// Orbit around the C-D midpoint.
    Circle,
    /// Orbit squashed along the minor axis by `ellipse_minor`.
    Ellipse,
    /// Lemniscate through the midpoint.
    Figure8,
}

impl MorphPath {
    pub fn label(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Circle => "circle",
            Self::Ellipse => "ellipse",
            Self::Figure8 => "figure8",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "line" => Some(Self::Line),
            "circle" => Some(Self::Circle),
            "ellipse" => Some(Self::Ellipse),
            "figure8" => Some(Self::Figure8),
            _ => None,
        }
    }
}

/// Noise sigmas applied along the morph path, shaped so each term peaks at
/// its own phase: start at θ=0, mid at θ=π/2, end at θ=π.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MorphDither {
    pub start: f64,
    pub mid: f64,
    pub end: f64,
}

impl MorphDither {
    pub fn sigma_at(&self, cos_t: f64, sin_t: f64) -> f64 {
        let start_env = if cos_t > 0.0 { cos_t * cos_t } else { 0.0 };
        let end_env = if cos_t < 0.0 { cos_t * cos_t } else { 0.0 };
        self.start * start_env + self.mid * sin_t * sin_t + self.end * end_env
    }

    pub fn is_zero(&self) -> bool {
        self.start <= 0.0 && self.mid <= 0.0 && self.end <= 0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MorphParams {
    /// Morph cycles per second of animation clock.
    pub rate: f64,
    pub path: MorphPath,
    pub ccw: bool,
    /// Minor-axis fraction for the ellipse path, in (0, 1].
    pub ellipse_minor: f64,
    pub dither: MorphDither,
}

impl Default for MorphParams {
    fn default() -> Self {
        Self {
            rate: 0.1,
            path: MorphPath::Line,
            ccw: false,
            ellipse_minor: 0.5,
            dither: MorphDither::default(),
        }
    }
}

/// Morph on/off as a tagged state machine: `Disabled` statically cannot
/// carry a blend weight, so no call site needs to remember to zero `mu`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MorphState {
    Disabled,
    Enabled(MorphParams),
}

impl MorphState {
    pub fn params(&self) -> Option<&MorphParams> {
        match self {
            Self::Disabled => None,
            Self::Enabled(p) => Some(p),
        }
    }

    /// Blend weight at elapsed animation time; zero whenever disabled.
    pub fn mu_at(&self, elapsed: f64) -> f64 {
        match self {
            Self::Disabled => 0.0,
            Self::Enabled(p) => {
                let theta = 2.0 * PI * p.rate * elapsed;
                0.5 - 0.5 * theta.cos()
            }
        }
    }
}

/// Morph phase tracked by rotation recurrence so the hot loop never calls
/// trig. Drift is bounded by renormalizing every 1024 advances.
#[derive(Clone, Copy, Debug)]
pub struct MorphAngle {
    pub cos_t: f64,
    pub sin_t: f64,
    cos_d: f64,
    sin_d: f64,
    advances: u32,
}

impl MorphAngle {
    pub fn new(theta0: f64, d_theta: f64) -> Self {
        Self {
            cos_t: theta0.cos(),
            sin_t: theta0.sin(),
            cos_d: d_theta.cos(),
            sin_d: d_theta.sin(),
            advances: 0,
        }
    }

    pub fn advance(&mut self) {
        let c = self.cos_t * self.cos_d - self.sin_t * self.sin_d;
        let s = self.sin_t * self.cos_d + self.cos_t * self.sin_d;
        self.cos_t = c;
        self.sin_t = s;
        self.advances = self.advances.wrapping_add(1);
        if self.advances & 1023 == 0 {
            let inv = 1.0 / (self.cos_t * self.cos_t + self.sin_t * self.sin_t).sqrt();
            self.cos_t *= inv;
            self.sin_t *= inv;
        }
    }

    /// At θ ≈ 0 the blend is skipped entirely: coefficients sit exactly at
    /// their C position without floating-point noise.
    pub fn at_home(&self) -> bool {
        self.cos_t >= 1.0 - 1e-14 && self.sin_t > -1e-14 && self.sin_t < 1e-14
    }
}

/// Blend each work coefficient toward its morph target for the current
/// phase. `work` holds the C positions on entry and the blended positions
/// on exit; `targets` holds the D positions for this step.
pub fn blend(params: &MorphParams, angle: &MorphAngle, work: &mut [Complex64], targets: &[Complex64]) {
    let cos_t = angle.cos_t;
    let sin_t = angle.sin_t;
    match params.path {
        MorphPath::Line => {
            let mu = 0.5 - 0.5 * cos_t;
            let omu = 1.0 - mu;
            for (c, d) in work.iter_mut().zip(targets) {
                *c = *c * omu + *d * mu;
            }
        }
        MorphPath::Circle | MorphPath::Ellipse | MorphPath::Figure8 => {
            let sign = if params.ccw { 1.0 } else { -1.0 };
            let sin_2t = 2.0 * sin_t * cos_t;
            for (c, d) in work.iter_mut().zip(targets) {
                let delta = *d - *c;
                let len2 = delta.norm_sqr();
                if len2 < 1e-30 {
                    continue; // C ≈ D, keep C
                }
                let len = len2.sqrt();
                let u = delta / len;
                let v = Complex64::new(-u.im, u.re);
                let mid = (*c + *d) * 0.5;
                let semi = len * 0.5;
                let lx = -semi * cos_t;
                let ly = match params.path {
                    MorphPath::Circle => sign * semi * sin_t,
                    MorphPath::Ellipse => sign * (params.ellipse_minor * semi) * sin_t,
                    MorphPath::Figure8 => sign * (semi * 0.5) * sin_2t,
                    MorphPath::Line => unreachable!(),
                };
                *c = mid + u * lx + v * ly;
            }
        }
    }
}
