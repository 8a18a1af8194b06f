use crate::compose::{AnimationPlan, StepComposer};
use crate::matching::MatchStrategy;
use crate::render::{
    AccumBuffers, ColorMode, PaintDelta, ProximityScale, Viewport, nearest_peer_dists,
    palette_index, rank_norm, sensitivity, PALETTE_LEN,
};
use crate::solver;
use anyhow::{Result, anyhow};
use num_complex::Complex64;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

/// Read-only snapshot a worker needs to replay its step range: animation
/// plan, viewport at the *compute* resolution (never the display canvas
/// size), coloring setup, and match strategy.
#[derive(Clone, Debug)]
pub struct FrameConfig {
    pub plan: AnimationPlan,
    pub viewport: Viewport,
    pub color_mode: ColorMode,
    pub uniform_rgb: [u8; 3],
    pub match_strategy: MatchStrategy,
    /// Coefficient indices the derivative color mode differentiates against.
    pub selected: Vec<usize>,
    /// Per-identity-slot colors for the index mode.
    pub index_colors: Vec<[u8; 3]>,
    pub prox_palette: [[u8; 3]; PALETTE_LEN],
    pub deriv_palette: [[u8; 3]; PALETTE_LEN],
    pub seed: u64,
}

/// What a worker hands back: sparse pixel writes for its whole range and
/// the final root state, which seeds the next batch's warm start.
#[derive(Clone, Debug)]
pub struct WorkerResult {
    pub range: Range<usize>,
    pub delta: PaintDelta,
    pub final_roots: Vec<Complex64>,
}

/// Split `[0, total)` into at most `workers` contiguous ranges, front-loaded
/// so sizes differ by at most one step.
pub fn partition(total: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let mut out = Vec::new();
    let base = total / workers;
    let extra = total % workers;
    let mut start = 0;
    for w in 0..workers {
        let len = base + usize::from(w < extra);
        if len == 0 {
            break;
        }
        out.push(start..start + len);
        start += len;
    }
    out
}

/// The sequential step loop over one contiguous range: compose, solve with
/// warm start, keep identity where the color mode needs it, paint. This is
/// both the worker body and the single-threaded reference path.
pub fn run_range(
    cfg: &FrameConfig,
    range: Range<usize>,
    warm: &[Complex64],
    elapsed_offset: f64,
    cancel: &AtomicBool,
) -> WorkerResult {
    let n = warm.len();
    let mut roots = warm.to_vec();
    let mut composer = StepComposer::new(
        &cfg.plan,
        range.start,
        elapsed_offset,
        cfg.seed ^ (range.start as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15),
    );
    let mut delta = PaintDelta::default();
    let mut prox = ProximityScale::new();
    let w = cfg.viewport.width as u32;

    for step in range.clone() {
        if cancel.load(Ordering::Relaxed) {
            break;
        }

        let coeffs = composer.compose(step).to_vec();
        let solved = solver::solve(&coeffs, Some(&roots));
        let mut new: Vec<Complex64> = if solved.len() == n {
            solved
        } else {
            // Degenerate leading terms collapsed the degree this step; keep
            // the invariant that exactly n roots exist by reseeding.
            (0..n).map(|i| solver::unit_circle_seed(i, n)).collect()
        };

        match cfg.color_mode {
            ColorMode::Uniform => {
                roots = new;
                for &r in &roots {
                    if let Some((x, y)) = cfg.viewport.map(r) {
                        delta.push(y as u32 * w + x as u32, cfg.uniform_rgb);
                    }
                }
            }
            ColorMode::Index => {
                if cfg.match_strategy.matches_at(step - range.start) {
                    cfg.match_strategy.apply(&mut new, &roots);
                }
                roots = new;
                for (i, &r) in roots.iter().enumerate() {
                    if let Some((x, y)) = cfg.viewport.map(r) {
                        let rgb = cfg
                            .index_colors
                            .get(i)
                            .copied()
                            .unwrap_or(cfg.uniform_rgb);
                        delta.push(y as u32 * w + x as u32, rgb);
                    }
                }
            }
            ColorMode::Proximity => {
                let dists = nearest_peer_dists(&new);
                let ts = prox.rank(&dists);
                roots = new;
                for (i, &r) in roots.iter().enumerate() {
                    if let Some((x, y)) = cfg.viewport.map(r) {
                        let rgb = cfg.prox_palette[palette_index(ts[i])];
                        delta.push(y as u32 * w + x as u32, rgb);
                    }
                }
            }
            ColorMode::Derivative => {
                // Identity only matters enough here to keep the ranking
                // stable; a cheap every-4th-step greedy pass suffices.
                if (step - range.start) % 4 == 0 {
                    crate::matching::match_root_order(&mut new, &roots);
                }
                let raw = sensitivity(&coeffs, &new, &cfg.selected);
                let norm = rank_norm(&raw).unwrap_or_else(|| vec![0.5; n]);
                roots = new;
                for (i, &r) in roots.iter().enumerate() {
                    if let Some((x, y)) = cfg.viewport.map(r) {
                        let rgb = cfg.deriv_palette[palette_index(norm[i])];
                        delta.push(y as u32 * w + x as u32, rgb);
                    }
                }
            }
        }
    }

    WorkerResult {
        range,
        delta,
        final_roots: roots,
    }
}

/// Outcome of one composited pass.
#[derive(Clone, Copy, Debug)]
pub struct PassStats {
    pub steps: usize,
    pub pixels: usize,
    pub workers: usize,
    pub wall_ms: f64,
}

/// One fast-mode session: owns the accumulation buffers, the animation
/// clock offset, the pass counter and the warm-start carry. Pixel state and
/// counters deliberately have different lifetimes: `clear` wipes pixels
/// only, while exit/resolution change tears everything down.
pub struct FastModeRun {
    buffers: AccumBuffers,
    elapsed_offset: f64,
    pass_count: u64,
    worker_roots: Option<Vec<Complex64>>,
    cancel: Arc<AtomicBool>,
}

impl FastModeRun {
    fn new(compute_res: usize) -> Self {
        Self {
            buffers: AccumBuffers::new(compute_res),
            elapsed_offset: 0.0,
            pass_count: 0,
            worker_roots: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn buffers(&self) -> &AccumBuffers {
        &self.buffers
    }

    pub fn elapsed_offset(&self) -> f64 {
        self.elapsed_offset
    }

    pub fn pass_count(&self) -> u64 {
        self.pass_count
    }

    pub fn set_elapsed_offset(&mut self, elapsed: f64) {
        self.elapsed_offset = elapsed;
    }

    /// Handle used to stop a pass from another thread; workers stop
    /// dispatching new steps and their results are discarded.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Wipe pixels. Elapsed offset, pass counter and warm-start roots all
    /// survive so accumulation resumes exactly where it left off.
    pub fn clear(&mut self) {
        self.buffers.clear();
    }

    /// Run one pass of `cfg.plan.total_steps` steps across `workers`
    /// threads and composite the results.
    pub fn run_pass(&mut self, cfg: &FrameConfig, workers: usize) -> Result<PassStats> {
        let started = Instant::now();
        let total = cfg.plan.total_steps;
        let n_roots = cfg.plan.n_coeffs().saturating_sub(1);
        if n_roots == 0 {
            return Err(anyhow!("nothing to render: polynomial has no roots"));
        }

        let warm: Vec<Complex64> = match &self.worker_roots {
            Some(r) if r.len() == n_roots => r.clone(),
            _ => (0..n_roots)
                .map(|i| solver::unit_circle_seed(i, n_roots))
                .collect(),
        };

        let ranges = partition(total, workers);
        let elapsed_offset = self.elapsed_offset;
        let cancel = Arc::clone(&self.cancel);

        let results = if ranges.len() == 1 {
            // No point paying thread spawn for a single range.
            vec![Ok(run_range(
                cfg,
                ranges[0].clone(),
                &warm,
                elapsed_offset,
                &cancel,
            ))]
        } else {
            thread::scope(|scope| {
                let handles: Vec<_> = ranges
                    .iter()
                    .map(|range| {
                        let range = range.clone();
                        let warm = &warm;
                        let cancel = &cancel;
                        scope.spawn(move || run_range(cfg, range, warm, elapsed_offset, cancel))
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|h| {
                        h.join()
                            .map_err(|_| anyhow!("render worker panicked; its range was discarded"))
                    })
                    .collect::<Vec<_>>()
            })
        };

        if self.cancel.load(Ordering::Relaxed) {
            // Mid-batch cancellation: nothing composited, prior state kept.
            self.cancel.store(false, Ordering::Relaxed);
            return Err(anyhow!("fast mode pass cancelled"));
        }

        // Composite in range order so "later step overwrites earlier" holds
        // across worker boundaries, not just within one range.
        let mut pixels = 0usize;
        let mut final_roots: Option<Vec<Complex64>> = None;
        let mut failure: Option<anyhow::Error> = None;
        for res in results {
            match res {
                Ok(r) => {
                    pixels += r.delta.len();
                    self.buffers.composite(&r.delta);
                    final_roots = Some(r.final_roots);
                }
                Err(e) => failure = Some(e),
            }
        }

        if let Some(r) = final_roots {
            self.worker_roots = Some(r);
        }
        if let Some(e) = failure {
            // Completed workers are already composited; surface the failure
            // once at this boundary.
            return Err(e);
        }

        self.elapsed_offset += cfg.plan.pass_seconds;
        self.pass_count += 1;

        Ok(PassStats {
            steps: total,
            pixels,
            workers: ranges.len(),
            wall_ms: started.elapsed().as_secs_f64() * 1000.0,
        })
    }
}

/// Fast-mode state machine: `Idle -> Running -> {Idle, Running}`. Entering
/// at the active compute resolution keeps accumulating; entering at a new
/// one reallocates; exiting tears down.
#[derive(Default)]
pub struct Scheduler {
    run: Option<FastModeRun>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self { run: None }
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    pub fn current(&self) -> Option<&FastModeRun> {
        self.run.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut FastModeRun> {
        self.run.as_mut()
    }

    /// Enter fast mode at the requested compute resolution. Reuses the
    /// existing run (pixels, elapsed, pass count and warm start intact)
    /// unless the resolution changed or no run exists.
    pub fn enter(&mut self, compute_res: usize) -> &mut FastModeRun {
        let needs_init = self
            .run
            .as_ref()
            .is_none_or(|r| r.buffers.compute_res() != compute_res);
        if needs_init {
            self.run = Some(FastModeRun::new(compute_res));
        }
        self.run.as_mut().expect("run just ensured")
    }

    /// Leave fast mode, dropping buffers, counters and warm start.
    pub fn exit(&mut self) {
        if let Some(r) = &self.run {
            r.cancel.store(true, Ordering::Relaxed);
        }
        self.run = None;
    }
}
