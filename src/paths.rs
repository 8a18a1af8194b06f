use num_complex::Complex64;
use std::f64::consts::PI;

/// Samples per precomputed animation curve. Workers interpolate between
/// neighbors, so this only bounds curvature error, not positional accuracy.
pub const CURVE_SAMPLES: usize = 256;

/// Extra per-path parameters that only some path types read.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathExtra {
    pub freq_a: f64,
    pub freq_b: f64,
    pub turns: f64,
}

impl Default for PathExtra {
    fn default() -> Self {
        Self {
            freq_a: 3.0,
            freq_b: 2.0,
            turns: 3.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathType {
    None,
    Circle,
    Horizontal,
    Vertical,
    Spiral,
    Lissajous,
    Cardioid,
    Figure8,
    Astroid,
    Rose,
    Star,
    Square,
}

impl PathType {
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Circle => "circle",
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
            Self::Spiral => "spiral",
            Self::Lissajous => "lissajous",
            Self::Cardioid => "cardioid",
            Self::Figure8 => "figure8",
            Self::Astroid => "astroid",
            Self::Rose => "rose",
            Self::Star => "star",
            Self::Square => "square",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "none" => Some(Self::None),
            "circle" => Some(Self::Circle),
            "horizontal" => Some(Self::Horizontal),
            "vertical" => Some(Self::Vertical),
            "spiral" => Some(Self::Spiral),
            "lissajous" => Some(Self::Lissajous),
            "cardioid" => Some(Self::Cardioid),
            "figure8" => Some(Self::Figure8),
            "astroid" => Some(Self::Astroid),
            "rose" => Some(Self::Rose),
            "star" => Some(Self::Star),
            "square" => Some(Self::Square),
            _ => None,
        }
    }

    /// Open curves do not wrap back to their start; interpolation clamps at
    /// the last sample instead of wrapping to the first.
    pub fn is_closed(self) -> bool {
        !matches!(self, Self::Spiral)
    }
}

/// Point on the path at phase `t` in [0,1), relative to the path center,
/// scaled by `radius`. The center is resolved by [`build_curve`] so the
/// curve starts exactly at the coefficient's home.
pub fn path_point(path: PathType, t: f64, radius: f64, extra: &PathExtra) -> Complex64 {
    let th = 2.0 * PI * t;
    let (x, y) = match path {
        PathType::None => (0.0, 0.0),
        PathType::Circle => (th.cos(), th.sin()),
        PathType::Horizontal => (th.cos(), 0.0),
        PathType::Vertical => (0.0, th.cos()),
        PathType::Spiral => {
            let a = 2.0 * PI * extra.turns * t;
            (t * a.cos(), t * a.sin())
        }
        PathType::Lissajous => ((extra.freq_a * th).sin(), (extra.freq_b * th).sin()),
        PathType::Cardioid => {
            let s = 0.5 * (1.0 + th.cos());
            (s * th.cos(), s * th.sin())
        }
        PathType::Figure8 => (th.sin(), th.sin() * th.cos()),
        PathType::Astroid => (th.cos().powi(3), th.sin().powi(3)),
        PathType::Rose => {
            let m = (3.0 * th).cos();
            (m * th.cos(), m * th.sin())
        }
        PathType::Star => {
            let m = 0.6 + 0.4 * (5.0 * th).cos();
            (m * th.cos(), m * th.sin())
        }
        PathType::Square => square_point(t),
    };
    Complex64::new(x * radius, y * radius)
}

/// Perimeter of the axis-aligned unit square, traversed counterclockwise
/// starting at the right edge midpoint.
fn square_point(t: f64) -> (f64, f64) {
    let s = (t.fract() + 1.0).fract() * 4.0;
    let seg = s.floor() as usize % 4;
    let f = s - s.floor();
    match seg {
        0 => (1.0, -1.0 + 2.0 * f),
        1 => (1.0 - 2.0 * f, 1.0),
        2 => (-1.0, 1.0 - 2.0 * f),
        _ => (-1.0 + 2.0 * f, -1.0),
    }
}

/// Precompute a coefficient's animation curve.
///
/// The raw path is rotated by `angle_offset` and translated so sample 0
/// lands exactly on `home` (invariant: `curve[0] == home`). `PathType::None`
/// yields the single-sample curve `[home]`.
pub fn build_curve(
    path: PathType,
    home: Complex64,
    radius: f64,
    angle_offset: f64,
    extra: &PathExtra,
) -> Vec<Complex64> {
    if path == PathType::None {
        return vec![home];
    }
    let rot = Complex64::new(angle_offset.cos(), angle_offset.sin());
    let origin = path_point(path, 0.0, radius, extra) * rot;
    (0..CURVE_SAMPLES)
        .map(|k| {
            let t = k as f64 / CURVE_SAMPLES as f64;
            home + path_point(path, t, radius, extra) * rot - origin
        })
        .collect()
}

/// Sample a precomputed curve at fractional position `u` in [0,1).
///
/// Closed curves wrap the final segment back to sample 0; open curves clamp
/// at the last sample. Cloud curves (scatter patterns) snap to the nearest
/// stored sample instead of interpolating.
pub fn sample_curve(curve: &[Complex64], u: f64, closed: bool, cloud: bool) -> Complex64 {
    let n = curve.len();
    if n == 1 {
        return curve[0];
    }
    let raw = u * n as f64;
    if cloud {
        let k = (raw as usize).min(n - 1);
        return curve[k];
    }
    let lo = (raw as usize).min(n - 1);
    let hi = if lo + 1 == n {
        if closed { 0 } else { return curve[n - 1] }
    } else {
        lo + 1
    };
    let frac = raw - lo as f64;
    curve[lo] * (1.0 - frac) + curve[hi] * frac
}

/// Fractional part in [0,1), mirroring `((t % 1) + 1) % 1`.
pub fn frac01(t: f64) -> f64 {
    let f = t - t.trunc();
    if f < 0.0 { f + 1.0 } else { f }
}
