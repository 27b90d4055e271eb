//! Stroke parameters and the per-layer refinement stages.
//!
//! Width jitter and opacity come from the layer style. Orientation, clipping
//! and strength filtering are pluggable stages; the defaults keep the
//! constant-angle, unclipped, unfiltered strokes produced by placement.

use rand::Rng;

use crate::canvas::{Brushstroke, Layer, UNSET_COLOR};
use crate::style::LayerStyle;

pub const DEFAULT_ANGLE: f64 = 0.78;
pub const DEFAULT_STRENGTH: f64 = 0.0;
pub const DEFAULT_LENGTH: f64 = 2.0;

// ============================================================================
// PARAMETER SYNTHESIS
// ============================================================================

/// Builds new strokes for one layer.
#[derive(Clone, Copy, Debug)]
pub struct StrokeSynthesizer {
    avg_width: f64,
    var_width: f64,
    opacity: f64,
}

impl StrokeSynthesizer {
    pub fn new(style: &LayerStyle) -> Self {
        Self {
            avg_width: style.avg_brush_width,
            var_width: style.var_brush_width,
            opacity: style.opacity,
        }
    }

    /// A stroke anchored at canvas `(x, y)` with a jittered width. Color
    /// stays at the neutral placeholder until the layer is colorized.
    pub fn synthesize<R: Rng + ?Sized>(&self, x: f64, y: f64, rng: &mut R) -> Brushstroke {
        let jitter = if self.var_width > 0.0 {
            rng.random_range(-self.var_width..=self.var_width)
        } else {
            0.0
        };

        Brushstroke {
            anchor: [x, y],
            width: self.avg_width + jitter,
            angle: DEFAULT_ANGLE,
            opacity: self.opacity,
            strength: DEFAULT_STRENGTH,
            length1: DEFAULT_LENGTH,
            length2: DEFAULT_LENGTH,
            color: UNSET_COLOR,
        }
    }
}

// ============================================================================
// REFINEMENT STAGES
// ============================================================================

/// Assigns stroke orientation once all strokes of a layer are placed.
pub trait AngleStrategy {
    fn assign(&self, layer: &mut Layer, style: &LayerStyle);
}

/// Trims strokes against mask boundaries.
pub trait StrokeClipper {
    fn clip(&self, layer: &mut Layer, style: &LayerStyle);
}

/// Drops or weights strokes by local strength, driven by
/// `strengthThreshold` / `strengthNeighborhood`.
pub trait StrengthFilter {
    fn filter(&self, layer: &mut Layer, style: &LayerStyle);
}

/// Every stroke gets the same angle.
#[derive(Clone, Copy, Debug)]
pub struct ConstantAngle(pub f64);

impl Default for ConstantAngle {
    fn default() -> Self {
        Self(DEFAULT_ANGLE)
    }
}

impl AngleStrategy for ConstantAngle {
    fn assign(&self, layer: &mut Layer, _style: &LayerStyle) {
        for stroke in &mut layer.strokes {
            stroke.angle = self.0;
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoClip;

impl StrokeClipper for NoClip {
    fn clip(&self, _layer: &mut Layer, _style: &LayerStyle) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct KeepAll;

impl StrengthFilter for KeepAll {
    fn filter(&self, _layer: &mut Layer, _style: &LayerStyle) {}
}

/// The refinement stages run between placement and coloring, in order:
/// angles, clipping, strength.
pub struct RefineStages {
    pub angle: Box<dyn AngleStrategy>,
    pub clipper: Box<dyn StrokeClipper>,
    pub strength: Box<dyn StrengthFilter>,
}

impl Default for RefineStages {
    fn default() -> Self {
        Self {
            angle: Box::new(ConstantAngle::default()),
            clipper: Box::new(NoClip),
            strength: Box::new(KeepAll),
        }
    }
}

impl RefineStages {
    pub fn run(&self, layer: &mut Layer, style: &LayerStyle) {
        self.angle.assign(layer, style);
        self.clipper.clip(layer, style);
        self.strength.filter(layer, style);
    }
}
