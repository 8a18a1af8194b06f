use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::matching::MatchStrategy;
use crate::render::ColorMode;

#[derive(Parser, Debug, Clone)]
#[command(name = "rootfield", version, about = "Accumulation renderer for animated complex polynomial root fields")]
pub struct Config {
    /// Scene file (JSON); missing file starts from the default polynomial.
    #[arg(long)]
    pub scene: Option<PathBuf>,

    /// Polynomial degree when no scene is loaded.
    #[arg(long, default_value_t = 5)]
    pub degree: usize,

    /// Compute raster resolution (square).
    #[arg(long, default_value_t = 1000)]
    pub resolution: usize,

    /// Full accumulation passes to run.
    #[arg(long, default_value_t = 1)]
    pub passes: usize,

    /// Steps per pass; 0 takes the scene's value.
    #[arg(long, default_value_t = 0)]
    pub steps: usize,

    /// Animation-clock seconds per pass; 0 takes the scene's value.
    #[arg(long, default_value_t = 0.0)]
    pub pass_seconds: f64,

    /// Worker threads; 0 takes the scene's value.
    #[arg(long, default_value_t = 0)]
    pub workers: usize,

    #[arg(long, value_enum, default_value_t = ColorArg::Index)]
    pub color: ColorArg,

    #[arg(long, value_enum, default_value_t = StrategyArg::Assign4)]
    pub strategy: StrategyArg,

    /// Root-plane half-extent; 0 takes the scene's value.
    #[arg(long, default_value_t = 0.0)]
    pub range: f64,

    /// Dither seed shared by all workers.
    #[arg(long, default_value_t = 0x5EED)]
    pub seed: u64,

    /// Output image (binary PPM).
    #[arg(long, default_value = "render.ppm")]
    pub output: PathBuf,

    /// Write the effective scene back out after rendering.
    #[arg(long)]
    pub save_scene: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorArg {
    Uniform,
    Index,
    #[value(alias = "prox")]
    Proximity,
    #[value(alias = "deriv", alias = "sensitivity")]
    Derivative,
}

impl From<ColorArg> for ColorMode {
    fn from(v: ColorArg) -> Self {
        match v {
            ColorArg::Uniform => Self::Uniform,
            ColorArg::Index => Self::Index,
            ColorArg::Proximity => Self::Proximity,
            ColorArg::Derivative => Self::Derivative,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Greedy nearest-neighbor match every fourth step.
    Assign4,
    /// Greedy nearest-neighbor match every step.
    Assign1,
    /// Optimal assignment every step (small degrees only).
    Hungarian1,
}

impl From<StrategyArg> for MatchStrategy {
    fn from(v: StrategyArg) -> Self {
        match v {
            StrategyArg::Assign4 => Self::Assign4,
            StrategyArg::Assign1 => Self::Assign1,
            StrategyArg::Hungarian1 => Self::Hungarian1,
        }
    }
}
