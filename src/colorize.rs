//! Stroke coloring: one sample of the layer's source at each anchor.

use image::RgbImage;

use crate::canvas::Layer;

/// Source pixel under a canvas point, rounded and clamped to the image.
fn source_pixel(image: &RgbImage, x: f64, y: f64, scale: f64) -> (u32, u32) {
    let to_index = |v: f64, len: u32| ((v / scale).round().max(0.0) as u32).min(len - 1);
    (to_index(x, image.width()), to_index(y, image.height()))
}

/// Colors every stroke of `layer` from `image`, mapping canvas anchors back to
/// image coordinates through `scale`. Colors are normalized RGB.
pub fn color_strokes(layer: &mut Layer, image: &RgbImage, scale: f64) {
    if image.width() == 0 || image.height() == 0 {
        return;
    }

    for stroke in &mut layer.strokes {
        let (px, py) = source_pixel(image, stroke.x(), stroke.y(), scale);
        let [r, g, b] = image.get_pixel(px, py).0;
        stroke.color = [r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0];
    }
}
