//! Stroke placement.
//!
//! Two passes over one `CoverageGrid`:
//! 1. `scatter` proposes random anchors and rejects any whose exclusion window
//!    already holds a mark, until the budget runs out or the canvas looks
//!    saturated.
//! 2. `fill_gaps` walks every pixel in row-major order and places a stroke
//!    wherever the window is still empty.
//!
//! The first pass only shapes the density; the second guarantees that every
//! pixel's window ends up holding an anchor.

use log::debug;
use rand::Rng;

use crate::canvas::Layer;
use crate::coverage::CoverageGrid;
use crate::strokes::StrokeSynthesizer;
use crate::style::LayerStyle;

/// Fraction of the canvas pixel count spent on random proposals
const SAMPLE_FRACTION: f64 = 0.25;
/// Fraction of the sample budget tolerated as consecutive rejections
const STOP_FRACTION: f64 = 0.001;

/// Limits for the random pass on a `width x height` canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleBudget {
    pub samples: usize,
    pub stop_after: usize,
}

impl SampleBudget {
    pub fn for_canvas(width: u32, height: u32) -> Self {
        let samples = (SAMPLE_FRACTION * width as f64 * height as f64) as usize;
        let stop_after = (STOP_FRACTION * samples as f64) as usize;
        Self {
            samples,
            stop_after,
        }
    }
}

/// Counts from one placement run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlacementStats {
    pub scattered: usize,
    pub filled: usize,
    /// The random pass stopped on consecutive rejections
    pub saturated: bool,
}

impl PlacementStats {
    pub fn total(&self) -> usize {
        self.scattered + self.filled
    }
}

/// Random rejection-sampling pass. Returns how many strokes were placed and
/// whether it stopped early.
pub fn scatter<R: Rng + ?Sized>(
    grid: &mut CoverageGrid,
    layer: &mut Layer,
    half: f64,
    synth: &StrokeSynthesizer,
    budget: SampleBudget,
    rng: &mut R,
) -> (usize, bool) {
    if grid.is_empty() {
        return (0, false);
    }

    let mut placed = 0;
    let mut rejections = 0;

    for _ in 0..budget.samples {
        if rejections > budget.stop_after {
            debug!("stopping random placement after {rejections} consecutive rejections");
            return (placed, true);
        }

        let row = rng.random_range(0..grid.height());
        let col = rng.random_range(0..grid.width());

        let window = grid.window(row, col, half);
        if grid.window_has_mark(&window) {
            rejections += 1;
            continue;
        }

        rejections = 0;
        grid.mark(row, col);
        layer
            .strokes
            .push(synth.synthesize(col as f64, row as f64, rng));
        placed += 1;
    }

    (placed, false)
}

/// Deterministic row-major pass placing a stroke on every pixel whose
/// window is still empty.
pub fn fill_gaps<R: Rng + ?Sized>(
    grid: &mut CoverageGrid,
    layer: &mut Layer,
    half: f64,
    synth: &StrokeSynthesizer,
    rng: &mut R,
) -> usize {
    let mut placed = 0;

    for row in 0..grid.height() {
        for col in 0..grid.width() {
            let window = grid.window(row, col, half);
            if grid.window_has_mark(&window) {
                continue;
            }

            grid.mark(row, col);
            layer
                .strokes
                .push(synth.synthesize(col as f64, row as f64, rng));
            placed += 1;
        }
    }

    placed
}

/// Places all strokes of one layer onto `grid` (already seeded with the
/// layer's importance mask).
pub fn place_strokes<R: Rng + ?Sized>(
    grid: &mut CoverageGrid,
    layer: &mut Layer,
    style: &LayerStyle,
    rng: &mut R,
) -> PlacementStats {
    if grid.is_empty() {
        return PlacementStats::default();
    }

    let half = style.regen_width / 2.0;
    let synth = StrokeSynthesizer::new(style);
    let budget = SampleBudget::for_canvas(grid.width(), grid.height());
    debug!(
        "building strokes: k = {}, stop threshold = {}",
        budget.samples, budget.stop_after
    );

    let (scattered, saturated) = scatter(grid, layer, half, &synth, budget, rng);
    let filled = fill_gaps(grid, layer, half, &synth, rng);

    debug!("placed {scattered} random strokes, {filled} gap-fill strokes");

    PlacementStats {
        scattered,
        filled,
        saturated,
    }
}
