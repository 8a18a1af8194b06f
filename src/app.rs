use crate::compose::{AnimationPlan, Coefficient};
use crate::config::Config;
use crate::paths::PathType;
use crate::render::{self, AccumBuffers, Viewport};
use crate::scheduler::{FrameConfig, Scheduler};
use crate::state::SavedScene;
use anyhow::{Context, Result, bail};
use num_complex::Complex64;
use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::Path;

pub fn run(cfg: Config) -> Result<()> {
    if cfg.resolution == 0 {
        bail!("resolution must be at least 1");
    }

    let scene = match &cfg.scene {
        Some(path) => SavedScene::load(path)?,
        None => SavedScene::default(),
    };
    let mut restored = scene.restore();
    if restored.coefficients.is_empty() {
        restored.coefficients = default_coefficients(cfg.degree.max(1));
    }
    if restored.coefficients.len() < 2 {
        bail!("polynomial needs degree >= 1");
    }

    // CLI overrides win over the scene where given.
    let total_steps = if cfg.steps > 0 { cfg.steps } else { restored.total_steps };
    let pass_seconds = if cfg.pass_seconds > 0.0 {
        cfg.pass_seconds
    } else {
        restored.pass_seconds
    };
    let workers = if cfg.workers > 0 { cfg.workers } else { restored.num_workers };
    let range = if cfg.range > 0.0 { cfg.range } else { restored.view_range };
    let color_mode = cfg.color.into();
    let strategy = cfg.strategy.into();

    let plan = AnimationPlan::build(
        &restored.coefficients,
        &restored.morph_targets,
        restored.morph,
        restored.jiggle,
        pass_seconds,
        total_steps,
    );
    let n_roots = plan.n_coeffs() - 1;

    // Derivative coloring differentiates against the animated coefficients,
    // or failing that the constant term.
    let mut selected: Vec<usize> = plan.entries.iter().map(|e| e.idx).collect();
    if selected.is_empty() {
        selected.push(plan.n_coeffs() - 1);
    }

    let frame = FrameConfig {
        plan,
        viewport: Viewport {
            center: restored.view_center,
            range,
            width: cfg.resolution,
            height: cfg.resolution,
        },
        color_mode,
        uniform_rgb: restored.uniform_color,
        match_strategy: strategy,
        selected,
        index_colors: render::index_rainbow(n_roots),
        prox_palette: render::proximity_palette(),
        deriv_palette: render::derivative_palette(),
        seed: cfg.seed,
    };

    let mut sched = Scheduler::new();
    let run = sched.enter(cfg.resolution);
    for pass in 1..=cfg.passes.max(1) {
        let stats = run.run_pass(&frame, workers)?;
        eprintln!(
            "pass {pass}/{}: {} steps, {} pixels, {} workers, {:.0} ms",
            cfg.passes.max(1),
            stats.steps,
            stats.pixels,
            stats.workers,
            stats.wall_ms
        );
    }

    write_ppm(&cfg.output, run.buffers())?;
    eprintln!(
        "wrote {} ({}x{} display{})",
        cfg.output.display(),
        run.buffers().display_res(),
        run.buffers().display_res(),
        if run.buffers().has_split() {
            ", downsampled"
        } else {
            ""
        }
    );

    if let Some(path) = &cfg.save_scene {
        let captured = SavedScene::capture(
            &restored.coefficients,
            &restored.morph_targets,
            &restored.morph,
            &restored.jiggle,
            strategy,
            color_mode,
            restored.uniform_color,
            workers,
        );
        captured.save(path)?;
    }

    Ok(())
}

/// `z^n - 1` with the constant term circling, so a fresh run accumulates
/// a visible root trail instead of n fixed dots.
fn default_coefficients(degree: usize) -> Vec<Coefficient> {
    let mut coeffs = vec![Coefficient::new(Complex64::new(0.0, 0.0)); degree + 1];
    coeffs[0] = Coefficient::new(Complex64::new(1.0, 0.0));
    let mut constant = Coefficient::new(Complex64::new(-1.0, 0.0));
    constant.set_path(PathType::Circle);
    coeffs[degree] = constant;
    coeffs
}

fn write_ppm(path: &Path, buffers: &AccumBuffers) -> Result<()> {
    let res = buffers.display_res();
    let rgba = buffers.display();
    let file = File::create(path).context(format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write!(out, "P6\n{res} {res}\n255\n")?;
    for px in rgba.chunks_exact(4) {
        out.write_all(&px[..3])?;
    }
    out.flush()?;
    Ok(())
}
