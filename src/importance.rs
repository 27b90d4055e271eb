//! Importance mask: which canvas pixels are already "satisfied" before
//! detail-driven placement runs.
//!
//! Flat, low-gradient regions are pre-marked; edges and texture are left
//! open, so random placement concentrates strokes there. The exhaustive fill
//! pass still guarantees coverage elsewhere.

use image::{GrayImage, RgbImage};
use log::debug;

use crate::raster;
use crate::style::LayerStyle;

/// Gradient magnitudes at or below this count as flat.
pub const GRADIENT_THRESHOLD: f32 = 10.0;

/// Builds the canvas-sized importance mask for one layer from that layer's
/// (possibly blurred) source image.
///
/// Background layers (`regenMaskWidth ≈ 0`) get an all-zero mask.
pub fn build_mask(
    image: &RgbImage,
    style: &LayerStyle,
    canvas_width: u32,
    canvas_height: u32,
) -> GrayImage {
    if !style.uses_importance_mask() || image.width() == 0 || image.height() == 0 {
        return GrayImage::new(canvas_width, canvas_height);
    }

    debug!(
        "creating importance mask (regenMaskWidth {}, threshold {})",
        style.regen_mask_width, GRADIENT_THRESHOLD
    );

    let gray = raster::intensity(image);
    let magnitude = raster::sobel_magnitude(&gray);
    let flat = raster::threshold_inverted(&magnitude, GRADIENT_THRESHOLD);
    let cleaned = raster::open(&flat);

    raster::resize_linear(&cleaned, canvas_width, canvas_height)
}
