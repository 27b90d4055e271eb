//! Layer pipeline: turns a source image and a style into a finished canvas.
//!
//! For each layer, bottom to top:
//! blur source -> importance mask -> placement -> refine stages -> color.
//!
//! Layers only share the unmodified source image and the canvas scale. Every
//! layer blurs from the original, never from a previous layer's blur.

use std::collections::HashMap;
use std::path::Path;

use image::{ImageReader, RgbImage};
use log::{debug, info};
use rand::Rng;

use crate::canvas::{Canvas, Layer};
use crate::colorize::color_strokes;
use crate::coverage::CoverageGrid;
use crate::error::{PaintError, Result};
use crate::importance::build_mask;
use crate::placement::{PlacementStats, place_strokes};
use crate::raster::gaussian_blur;
use crate::strokes::RefineStages;
use crate::style::{CanvasStyle, LayerStyle};

// ============================================================================
// BLURRED SOURCES
// ============================================================================

/// Per-layer blurred copies of the source, built on demand and dropped once
/// the layer is colored. The top layer always reads the source itself.
pub struct BlurCache<'a> {
    source: &'a RgbImage,
    layer_count: usize,
    blurred: HashMap<usize, RgbImage>,
}

impl<'a> BlurCache<'a> {
    pub fn new(source: &'a RgbImage, layer_count: usize) -> Self {
        Self {
            source,
            layer_count,
            blurred: HashMap::new(),
        }
    }

    pub fn is_top(&self, index: usize) -> bool {
        index + 1 == self.layer_count
    }

    /// The image layer `index` paints from.
    pub fn image_for(&mut self, index: usize, kernel_size: u32) -> &RgbImage {
        if self.is_top(index) {
            return self.source;
        }
        let source = self.source;
        self.blurred
            .entry(index)
            .or_insert_with(|| gaussian_blur(source, kernel_size))
    }

    pub fn release(&mut self, index: usize) {
        self.blurred.remove(&index);
    }

    /// Number of blurred buffers currently held
    pub fn held(&self) -> usize {
        self.blurred.len()
    }
}

// ============================================================================
// SINGLE LAYER
// ============================================================================

/// Fills one layer from its source image. The layer is expected to be empty.
pub fn paint_layer<R: Rng + ?Sized>(
    layer: &mut Layer,
    style: &LayerStyle,
    image: &RgbImage,
    canvas: (u32, u32),
    canvas_scale: f64,
    stages: &RefineStages,
    rng: &mut R,
) -> PlacementStats {
    let (width, height) = canvas;

    let mask = build_mask(image, style, width, height);
    let mut grid = CoverageGrid::from_mask(&mask);
    debug!("importance mask pre-marks {} pixels", grid.marked_count());

    let stats = place_strokes(&mut grid, layer, style, rng);
    stages.run(layer, style);
    color_strokes(layer, image, canvas_scale);

    stats
}

fn log_layer_style(index: usize, style: &LayerStyle) {
    debug!("layer {index}");
    debug!("  regenWidth: {}", style.regen_width);
    debug!("  regenMaskWidth: {}", style.regen_mask_width);
    debug!("  avgBrushWidth: {}", style.avg_brush_width);
    debug!("  varBrushWidth: {}", style.var_brush_width);
    debug!("  opacity: {}", style.opacity);
    debug!("  strengthThreshold: {}", style.strength_threshold);
    debug!("  strengthNeighborhood: {}", style.strength_neighborhood);
}

// ============================================================================
// WHOLE PAINTING
// ============================================================================

/// A source image, its style, and the canvas being generated from them.
pub struct Painting {
    source: RgbImage,
    style: CanvasStyle,
    stages: RefineStages,
    canvas: Canvas,
}

impl Painting {
    /// Validates the style and prepares an empty canvas with one layer per
    /// style layer.
    pub fn new(source: RgbImage, style: CanvasStyle) -> Result<Self> {
        style.validate()?;

        let (width, height) = style.canvas_size(source.width(), source.height());
        let canvas = Canvas::new(width, height, style.layers.len());

        info!(
            "image {}x{}, canvas {}x{} (scale {}), {} layers",
            source.width(),
            source.height(),
            width,
            height,
            style.canvas_scale,
            canvas.layers.len()
        );

        Ok(Self {
            source,
            style,
            stages: RefineStages::default(),
            canvas,
        })
    }

    /// Decodes the image and reads the style file. Nothing is processed if
    /// either fails.
    pub fn load(image_path: &Path, style_path: &Path) -> Result<Self> {
        info!("reading image {}", image_path.display());
        let source = ImageReader::open(image_path)
            .map_err(|e| PaintError::ImageLoad {
                path: image_path.to_path_buf(),
                source: e.into(),
            })?
            .decode()
            .map_err(|source| PaintError::ImageLoad {
                path: image_path.to_path_buf(),
                source,
            })?
            .into_rgb8();

        info!("reading style {}", style_path.display());
        let style = CanvasStyle::load(style_path)?;

        Self::new(source, style)
    }

    /// Replaces the angle / clip / strength stages.
    pub fn with_stages(mut self, stages: RefineStages) -> Self {
        self.stages = stages;
        self
    }

    /// Generates every layer, bottom to top. Running it again starts over
    /// from empty layers.
    pub fn process<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let dims = (self.canvas.width, self.canvas.height);
        let mut cache = BlurCache::new(&self.source, self.canvas.layers.len());

        for (index, (layer, style)) in self
            .canvas
            .layers
            .iter_mut()
            .zip(&self.style.layers)
            .enumerate()
        {
            log_layer_style(index, style);
            layer.strokes.clear();

            let kernel_size = style.blur_kernel_size();
            if cache.is_top(index) {
                debug!("  top layer, painting from the unblurred source");
            } else {
                debug!("  kernelSize: {kernel_size}");
            }

            let image = cache.image_for(index, kernel_size);
            let stats = paint_layer(
                layer,
                style,
                image,
                dims,
                self.style.canvas_scale,
                &self.stages,
                rng,
            );
            cache.release(index);

            info!(
                "layer {index}: {} strokes ({} random, {} gap fill{})",
                layer.len(),
                stats.scattered,
                stats.filled,
                if stats.saturated { ", saturated" } else { "" }
            );
        }
    }

    pub fn style(&self) -> &CanvasStyle {
        &self.style
    }

    pub fn source(&self) -> &RgbImage {
        &self.source
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn into_canvas(self) -> Canvas {
        self.canvas
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        info!("writing canvas to {}", path.display());
        self.canvas.save(path)
    }
}

/// One-shot helper: validate, process, return the canvas.
pub fn paint<R: Rng + ?Sized>(source: RgbImage, style: CanvasStyle, rng: &mut R) -> Result<Canvas> {
    let mut painting = Painting::new(source, style)?;
    painting.process(rng);
    Ok(painting.into_canvas())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn layer_style(avg: f64) -> LayerStyle {
        LayerStyle {
            regen_width: 4.0,
            regen_mask_width: 0.0,
            avg_brush_width: avg,
            var_brush_width: 0.0,
            opacity: 1.0,
            strength_threshold: 0.0,
            strength_neighborhood: 0.0,
        }
    }

    fn checker() -> RgbImage {
        RgbImage::from_fn(16, 16, |x, y| {
            if (x / 2 + y / 2) % 2 == 0 { Rgb([250, 10, 10]) } else { Rgb([10, 10, 250]) }
        })
    }

    #[test]
    fn test_cache_blurs_lower_layers_only() {
        let source = checker();
        let mut cache = BlurCache::new(&source, 2);

        let bottom = cache.image_for(0, 5).clone();
        assert_ne!(bottom, source);
        assert_eq!(cache.held(), 1);
        cache.release(0);
        assert_eq!(cache.held(), 0);

        let top = cache.image_for(1, 5);
        assert_eq!(top, &source);
        assert_eq!(cache.held(), 0);
    }

    #[test]
    fn test_new_builds_empty_layers() {
        let style = CanvasStyle {
            canvas_scale: 1.5,
            layers: vec![layer_style(8.0); 3],
        };
        let painting = Painting::new(checker(), style).unwrap();
        let canvas = painting.canvas();
        assert_eq!((canvas.width, canvas.height), (24, 24));
        assert_eq!(canvas.layers.len(), 3);
        assert_eq!(canvas.stroke_count(), 0);
    }

    #[test]
    fn test_new_rejects_invalid_style() {
        let style = CanvasStyle {
            canvas_scale: -1.0,
            layers: vec![layer_style(8.0)],
        };
        assert!(Painting::new(checker(), style).is_err());
    }

    #[test]
    fn test_process_twice_starts_over() {
        let style = CanvasStyle {
            canvas_scale: 1.0,
            layers: vec![layer_style(8.0), layer_style(4.0)],
        };
        let mut painting = Painting::new(checker(), style).unwrap();
        painting.process(&mut StdRng::seed_from_u64(1));
        let first = painting.canvas().clone();
        painting.process(&mut StdRng::seed_from_u64(1));
        assert_eq!(painting.canvas(), &first);
    }

    #[test]
    fn test_load_missing_image() {
        let err = Painting::load(Path::new("/nonexistent.png"), Path::new("/nonexistent.json"))
            .err()
            .unwrap();
        assert_eq!(err.error_code(), "IMAGE_LOAD");
    }
}
