//! Saved scenes: the polynomial, its animation setup and the accumulation
//! options, serialized as JSON. Loading is forgiving: unknown fields are
//! ignored and anything missing takes its default, so scenes written by
//! older or newer builds still open.

use crate::compose::Coefficient;
use crate::jiggle::{JiggleConfig, JiggleMode};
use crate::matching::MatchStrategy;
use crate::morph::{MorphDither, MorphParams, MorphPath, MorphState};
use crate::paths::{PathExtra, PathType};
use crate::render::ColorMode;
use anyhow::{Context, Result};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedScene {
    pub degree: usize,
    pub coefficients: Vec<SavedCoefficient>,
    pub morph: SavedMorph,
    pub jiggle: SavedJiggle,
    pub bitmap_match_strategy: String,
    pub bitmap_color_mode: String,
    pub bitmap_uniform_color: [u8; 3],
    pub num_workers: usize,
    pub pass_seconds: f64,
    pub total_steps: usize,
    pub view_center: [f64; 2],
    pub view_range: f64,
}

impl Default for SavedScene {
    fn default() -> Self {
        Self {
            degree: 5,
            coefficients: Vec::new(),
            morph: SavedMorph::default(),
            jiggle: SavedJiggle::default(),
            bitmap_match_strategy: "assign4".to_string(),
            bitmap_color_mode: "index".to_string(),
            bitmap_uniform_color: [255, 255, 255],
            num_workers: 4,
            pass_seconds: 10.0,
            total_steps: 20_000,
            view_center: [0.0, 0.0],
            view_range: 2.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedCoefficient {
    pub home: [f64; 2],
    pub pos: [f64; 2],
    pub path_type: String,
    pub radius: f64,
    pub speed: f64,
    pub angle_offset: f64,
    pub ccw: bool,
    pub freq_a: f64,
    pub freq_b: f64,
    pub turns: f64,
    pub dither: f64,
    pub dither_uniform: bool,
}

impl Default for SavedCoefficient {
    fn default() -> Self {
        Self {
            home: [0.0, 0.0],
            pos: [0.0, 0.0],
            path_type: "none".to_string(),
            radius: 0.5,
            speed: 0.1,
            angle_offset: 0.0,
            ccw: false,
            freq_a: 3.0,
            freq_b: 2.0,
            turns: 3.0,
            dither: 0.0,
            dither_uniform: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedMorph {
    pub enabled: bool,
    pub rate: f64,
    /// Blend weight at save time; informational only, the clock rederives it.
    pub mu: f64,
    pub path: String,
    pub ccw: bool,
    pub ellipse_minor: f64,
    pub dither_start: f64,
    pub dither_mid: f64,
    pub dither_end: f64,
    pub targets: Vec<SavedCoefficient>,
}

impl Default for SavedMorph {
    fn default() -> Self {
        Self {
            enabled: false,
            rate: 0.05,
            mu: 0.0,
            path: "line".to_string(),
            ccw: false,
            ellipse_minor: 0.5,
            dither_start: 0.0,
            dither_mid: 0.0,
            dither_end: 0.0,
            targets: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedJiggle {
    pub mode: String,
    pub sigma: f64,
    pub theta: f64,
    pub scale_step: f64,
    pub period: f64,
    pub amplitude: f64,
    pub liss_a: f64,
    pub liss_b: f64,
    pub interval: f64,
    pub seed: u64,
}

impl Default for SavedJiggle {
    fn default() -> Self {
        let cfg = JiggleConfig::default();
        Self {
            mode: "none".to_string(),
            sigma: cfg.sigma,
            theta: cfg.theta,
            scale_step: cfg.scale_step,
            period: cfg.period,
            amplitude: cfg.amplitude,
            liss_a: cfg.liss_freq_x,
            liss_b: cfg.liss_freq_y,
            interval: cfg.interval,
            seed: cfg.seed,
        }
    }
}

impl SavedScene {
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(v) => v,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err).context(format!("reading scene {}", path.display())),
        };
        serde_json::from_str(&text).context(format!("parsing scene {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("creating {}", parent.display()))?;
        }
        let body = serde_json::to_string_pretty(self).context("serializing scene")?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, &body).context(format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, path).context(format!("renaming into {}", path.display()))
    }

    /// Capture the live editing state.
    pub fn capture(
        coeffs: &[Coefficient],
        morph_targets: &[Coefficient],
        morph: &MorphState,
        jiggle: &JiggleConfig,
        strategy: MatchStrategy,
        color_mode: ColorMode,
        uniform_color: [u8; 3],
        num_workers: usize,
    ) -> Self {
        let mut scene = Self {
            degree: coeffs.len().saturating_sub(1),
            coefficients: coeffs.iter().map(save_coefficient).collect(),
            bitmap_match_strategy: strategy.label().to_string(),
            bitmap_color_mode: color_mode.label().to_string(),
            bitmap_uniform_color: uniform_color,
            num_workers,
            ..Self::default()
        };
        scene.jiggle = SavedJiggle {
            mode: jiggle.mode.label().to_string(),
            sigma: jiggle.sigma,
            theta: jiggle.theta,
            scale_step: jiggle.scale_step,
            period: jiggle.period,
            amplitude: jiggle.amplitude,
            liss_a: jiggle.liss_freq_x,
            liss_b: jiggle.liss_freq_y,
            interval: jiggle.interval,
            seed: jiggle.seed,
        };
        if let Some(p) = morph.params() {
            scene.morph = SavedMorph {
                enabled: true,
                rate: p.rate,
                mu: 0.0,
                path: p.path.label().to_string(),
                ccw: p.ccw,
                ellipse_minor: p.ellipse_minor,
                dither_start: p.dither.start,
                dither_mid: p.dither.mid,
                dither_end: p.dither.end,
                targets: morph_targets.iter().map(save_coefficient).collect(),
            };
        } else {
            scene.morph.targets = morph_targets.iter().map(save_coefficient).collect();
        }
        scene
    }

    /// Rebuild the live editing state. Unrecognized enum labels fall back
    /// to their defaults rather than failing the whole load.
    pub fn restore(&self) -> RestoredScene {
        RestoredScene {
            coefficients: self.coefficients.iter().map(restore_coefficient).collect(),
            morph_targets: self.morph.targets.iter().map(restore_coefficient).collect(),
            morph: self.restore_morph(),
            jiggle: self.restore_jiggle(),
            match_strategy: MatchStrategy::parse(&self.bitmap_match_strategy)
                .unwrap_or(MatchStrategy::Assign4),
            color_mode: ColorMode::parse(&self.bitmap_color_mode).unwrap_or(ColorMode::Index),
            uniform_color: self.bitmap_uniform_color,
            num_workers: self.num_workers.max(1),
            pass_seconds: self.pass_seconds,
            total_steps: self.total_steps.max(1),
            view_center: Complex64::new(self.view_center[0], self.view_center[1]),
            view_range: if self.view_range > 0.0 { self.view_range } else { 2.0 },
        }
    }

    fn restore_morph(&self) -> MorphState {
        if !self.morph.enabled {
            return MorphState::Disabled;
        }
        MorphState::Enabled(MorphParams {
            rate: self.morph.rate,
            path: MorphPath::parse(&self.morph.path).unwrap_or(MorphPath::Line),
            ccw: self.morph.ccw,
            ellipse_minor: self.morph.ellipse_minor,
            dither: MorphDither {
                start: self.morph.dither_start,
                mid: self.morph.dither_mid,
                end: self.morph.dither_end,
            },
        })
    }

    fn restore_jiggle(&self) -> JiggleConfig {
        JiggleConfig {
            mode: JiggleMode::parse(&self.jiggle.mode).unwrap_or(JiggleMode::None),
            sigma: self.jiggle.sigma,
            theta: self.jiggle.theta,
            scale_step: self.jiggle.scale_step,
            period: self.jiggle.period,
            amplitude: self.jiggle.amplitude,
            liss_freq_x: self.jiggle.liss_a,
            liss_freq_y: self.jiggle.liss_b,
            interval: self.jiggle.interval,
            seed: self.jiggle.seed,
        }
    }
}

/// Fully decoded scene, ready to hand to the engine.
#[derive(Clone, Debug)]
pub struct RestoredScene {
    pub coefficients: Vec<Coefficient>,
    pub morph_targets: Vec<Coefficient>,
    pub morph: MorphState,
    pub jiggle: JiggleConfig,
    pub match_strategy: MatchStrategy,
    pub color_mode: ColorMode,
    pub uniform_color: [u8; 3],
    pub num_workers: usize,
    pub pass_seconds: f64,
    pub total_steps: usize,
    pub view_center: Complex64,
    pub view_range: f64,
}

fn save_coefficient(c: &Coefficient) -> SavedCoefficient {
    SavedCoefficient {
        home: [c.home.re, c.home.im],
        pos: [c.pos.re, c.pos.im],
        path_type: c.path.label().to_string(),
        radius: c.radius,
        speed: c.speed,
        angle_offset: c.angle_offset,
        ccw: c.ccw,
        freq_a: c.extra.freq_a,
        freq_b: c.extra.freq_b,
        turns: c.extra.turns,
        dither: c.dither,
        dither_uniform: c.dither_uniform,
    }
}

fn restore_coefficient(s: &SavedCoefficient) -> Coefficient {
    let mut c = Coefficient::new(Complex64::new(s.home[0], s.home[1]));
    c.pos = Complex64::new(s.pos[0], s.pos[1]);
    c.radius = s.radius;
    c.speed = s.speed;
    c.angle_offset = s.angle_offset;
    c.ccw = s.ccw;
    c.extra = PathExtra {
        freq_a: s.freq_a,
        freq_b: s.freq_b,
        turns: s.turns,
    };
    c.dither = s.dither;
    c.dither_uniform = s.dither_uniform;
    c.set_path(PathType::parse(&s.path_type).unwrap_or(PathType::None));
    c
}
