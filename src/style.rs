//! Per-run style configuration: canvas scale plus one record per layer.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PaintError, Result};

/// Below this a layer counts as the background layer (no importance mask).
pub const REGEN_MASK_EPSILON: f64 = 1e-8;

/// Brush parameters for a single layer. All widths are in canvas units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStyle {
    /// Full width of the square exclusion window used during placement
    pub regen_width: f64,
    /// ~0 for the bottom layer, which gets full unbiased coverage
    pub regen_mask_width: f64,
    pub avg_brush_width: f64,
    pub var_brush_width: f64,
    pub opacity: f64,
    // Reserved for strength-based filtering
    #[serde(default)]
    pub strength_threshold: f64,
    #[serde(default)]
    pub strength_neighborhood: f64,
}

impl LayerStyle {
    /// Whether this layer builds an importance mask before placement.
    pub fn uses_importance_mask(&self) -> bool {
        self.regen_mask_width > REGEN_MASK_EPSILON
    }

    /// Odd, positive Gaussian kernel size derived from the average brush width.
    pub fn blur_kernel_size(&self) -> u32 {
        let kernel = (self.avg_brush_width / 2.0) as u32;
        if kernel % 2 == 0 { kernel + 1 } else { kernel }
    }

    fn validate(&self, index: usize) -> Result<()> {
        let fields = [
            ("regenWidth", self.regen_width),
            ("regenMaskWidth", self.regen_mask_width),
            ("avgBrushWidth", self.avg_brush_width),
            ("varBrushWidth", self.var_brush_width),
            ("opacity", self.opacity),
            ("strengthThreshold", self.strength_threshold),
            ("strengthNeighborhood", self.strength_neighborhood),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(PaintError::invalid_style(format!(
                    "layer {index}: {name} must be finite, got {value}"
                )));
            }
        }

        for (name, value) in &fields[..4] {
            if *value < 0.0 {
                return Err(PaintError::invalid_style(format!(
                    "layer {index}: {name} must not be negative, got {value}"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(PaintError::invalid_style(format!(
                "layer {index}: opacity must be within 0..=1, got {}",
                self.opacity
            )));
        }

        Ok(())
    }
}

/// Global style: canvas dimensions are source dimensions times `canvas_scale`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasStyle {
    pub canvas_scale: f64,
    /// Bottom to top
    pub layers: Vec<LayerStyle>,
}

impl CanvasStyle {
    /// Reads and validates a JSON style file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| PaintError::StyleRead {
            path: path.to_path_buf(),
            source,
        })?;

        let style: CanvasStyle =
            serde_json::from_str(&text).map_err(|source| PaintError::StyleParse {
                path: path.to_path_buf(),
                source,
            })?;

        style.validate()?;
        Ok(style)
    }

    /// Rejects malformed configuration before any layer is processed.
    pub fn validate(&self) -> Result<()> {
        if !self.canvas_scale.is_finite() || self.canvas_scale <= 0.0 {
            return Err(PaintError::invalid_style(format!(
                "canvasScale must be a positive number, got {}",
                self.canvas_scale
            )));
        }

        if self.layers.is_empty() {
            return Err(PaintError::invalid_style("at least one layer is required"));
        }

        for (index, layer) in self.layers.iter().enumerate() {
            layer.validate(index)?;
        }

        Ok(())
    }

    /// Canvas size for a source image of the given size.
    pub fn canvas_size(&self, source_width: u32, source_height: u32) -> (u32, u32) {
        (
            (source_width as f64 * self.canvas_scale) as u32,
            (source_height as f64 * self.canvas_scale) as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> LayerStyle {
        LayerStyle {
            regen_width: 4.0,
            regen_mask_width: 0.0,
            avg_brush_width: 8.0,
            var_brush_width: 1.0,
            opacity: 0.8,
            strength_threshold: 0.0,
            strength_neighborhood: 0.0,
        }
    }

    #[test]
    fn test_kernel_size_is_odd() {
        let mut style = layer();
        for (avg, expected) in [(0.0, 1), (2.0, 1), (4.0, 3), (6.0, 3), (9.0, 5), (13.0, 7)] {
            style.avg_brush_width = avg;
            assert_eq!(style.blur_kernel_size(), expected, "avg {avg}");
        }
    }

    #[test]
    fn test_background_layer_detection() {
        let mut style = layer();
        assert!(!style.uses_importance_mask());
        style.regen_mask_width = 1e-9;
        assert!(!style.uses_importance_mask());
        style.regen_mask_width = 5.0;
        assert!(style.uses_importance_mask());
    }

    #[test]
    fn test_parse_camel_case_with_defaults() {
        let json = r#"{
            "canvasScale": 2.0,
            "layers": [
                {"regenWidth": 8, "regenMaskWidth": 0, "avgBrushWidth": 10,
                 "varBrushWidth": 2, "opacity": 1.0},
                {"regenWidth": 4, "regenMaskWidth": 5, "avgBrushWidth": 4,
                 "varBrushWidth": 1, "opacity": 0.6,
                 "strengthThreshold": 0.3, "strengthNeighborhood": 3}
            ]
        }"#;
        let style: CanvasStyle = serde_json::from_str(json).unwrap();
        style.validate().unwrap();
        assert_eq!(style.layers.len(), 2);
        assert_eq!(style.layers[0].strength_threshold, 0.0);
        assert_eq!(style.layers[1].strength_neighborhood, 3.0);
        assert_eq!(style.canvas_size(10, 7), (20, 14));
    }

    #[test]
    fn test_rejects_bad_scale_and_empty_layers() {
        let mut style = CanvasStyle {
            canvas_scale: 0.0,
            layers: vec![layer()],
        };
        assert!(matches!(style.validate(), Err(PaintError::InvalidStyle { .. })));

        style.canvas_scale = 1.0;
        style.layers.clear();
        assert!(matches!(style.validate(), Err(PaintError::InvalidStyle { .. })));
    }

    #[test]
    fn test_rejects_bad_layer_values() {
        let mut bad = layer();
        bad.opacity = 1.5;
        let style = CanvasStyle {
            canvas_scale: 1.0,
            layers: vec![layer(), bad],
        };
        let err = style.validate().unwrap_err();
        assert!(err.to_string().contains("layer 1"));

        let mut negative = layer();
        negative.var_brush_width = -1.0;
        let style = CanvasStyle {
            canvas_scale: 1.0,
            layers: vec![negative],
        };
        assert!(style.validate().is_err());
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = CanvasStyle::load(Path::new("/nonexistent/style.json")).unwrap_err();
        assert_eq!(err.error_code(), "STYLE_READ");
    }
}
