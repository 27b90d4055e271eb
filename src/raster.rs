//! Pixel-buffer filters used by the layer pipeline.
//!
//! Color and mask buffers are plain `image` buffers. Gradient magnitudes live
//! in a single-channel `f32` buffer so negative derivatives never clamp.

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};

pub type GradientImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Mask value for "marked" pixels
pub const MARKED: u8 = 255;

// ============================================================================
// BORDER HANDLING
// ============================================================================

/// Mirror an out-of-range index back into `0..len` without repeating the edge
/// sample (`gfedcb|abcdefgh|gfedcba`).
fn reflect_101(index: i64, len: u32) -> u32 {
    if len <= 1 {
        return 0;
    }
    let last = len as i64 - 1;
    let mut i = index;
    loop {
        if i < 0 {
            i = -i;
        } else if i > last {
            i = 2 * last - i;
        } else {
            return i as u32;
        }
    }
}

// ============================================================================
// BLUR
// ============================================================================

/// Gaussian weights for an odd kernel size, sigma derived from the size.
fn gaussian_kernel(size: u32) -> Vec<f32> {
    let size = size.max(1) | 1;
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = (size / 2) as i32;

    let mut weights: Vec<f32> = (-half..=half)
        .map(|offset| (-((offset * offset) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= total;
    }
    weights
}

/// Separable Gaussian blur with a `kernel_size x kernel_size` window.
///
/// Borders reflect without duplicating the edge pixel. A kernel size of 1 is
/// the identity.
pub fn gaussian_blur(image: &RgbImage, kernel_size: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || kernel_size <= 1 {
        return image.clone();
    }

    let kernel = gaussian_kernel(kernel_size);
    let half = (kernel.len() / 2) as i64;

    // Horizontal pass into a float buffer to avoid rounding twice
    let mut horizontal = vec![[0f32; 3]; (width * height) as usize];
    for y in 0..height {
        for x in 0..width {
            let mut acc = [0f32; 3];
            for (k, weight) in kernel.iter().enumerate() {
                let sx = reflect_101(x as i64 + k as i64 - half, width);
                let Rgb(px) = *image.get_pixel(sx, y);
                for c in 0..3 {
                    acc[c] += weight * px[c] as f32;
                }
            }
            horizontal[(y * width + x) as usize] = acc;
        }
    }

    RgbImage::from_fn(width, height, |x, y| {
        let mut acc = [0f32; 3];
        for (k, weight) in kernel.iter().enumerate() {
            let sy = reflect_101(y as i64 + k as i64 - half, height);
            let px = horizontal[(sy * width + x) as usize];
            for c in 0..3 {
                acc[c] += weight * px[c];
            }
        }
        Rgb(acc.map(|v| v.round().clamp(0.0, 255.0) as u8))
    })
}

// ============================================================================
// GRADIENTS AND MASKS
// ============================================================================

// Luma weights applied to (R, G, B). The detail threshold was tuned against
// these: blue carries the 0.299 weight and red the 0.114 one.
const INTENSITY_WEIGHTS: [f32; 3] = [0.114, 0.587, 0.299];

/// Single-channel intensity of a color image.
pub fn intensity(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgb(px) = *image.get_pixel(x, y);
        let value: f32 = px
            .iter()
            .zip(INTENSITY_WEIGHTS)
            .map(|(&c, w)| c as f32 * w)
            .sum();
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

/// Euclidean norm of the 3x3 Sobel derivatives in x and y.
pub fn sobel_magnitude(gray: &GrayImage) -> GradientImage {
    let (width, height) = gray.dimensions();

    GradientImage::from_fn(width, height, |x, y| {
        let at = |dx: i64, dy: i64| {
            let sx = reflect_101(x as i64 + dx, width);
            let sy = reflect_101(y as i64 + dy, height);
            gray.get_pixel(sx, sy)[0] as f32
        };

        let gx = (at(1, -1) + 2.0 * at(1, 0) + at(1, 1))
            - (at(-1, -1) + 2.0 * at(-1, 0) + at(-1, 1));
        let gy = (at(-1, 1) + 2.0 * at(0, 1) + at(1, 1))
            - (at(-1, -1) + 2.0 * at(0, -1) + at(1, -1));

        Luma([(gx * gx + gy * gy).sqrt()])
    })
}

/// Marks every pixel whose value is at or below `threshold`; pixels above it
/// stay clear.
pub fn threshold_inverted(magnitude: &GradientImage, threshold: f32) -> GrayImage {
    GrayImage::from_fn(magnitude.width(), magnitude.height(), |x, y| {
        if magnitude.get_pixel(x, y)[0] > threshold {
            Luma([0])
        } else {
            Luma([MARKED])
        }
    })
}

// 3x3 ellipse: the centre plus its four direct neighbours
const CROSS: [(i64, i64); 5] = [(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1)];

fn morph(mask: &GrayImage, pick: fn(u8, u8) -> u8, start: u8) -> GrayImage {
    let (width, height) = mask.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let value = CROSS
            .iter()
            .filter_map(|&(dx, dy)| {
                let sx = x as i64 + dx;
                let sy = y as i64 + dy;
                // Neighbours outside the image don't take part
                (sx >= 0 && sy >= 0 && sx < width as i64 && sy < height as i64)
                    .then(|| mask.get_pixel(sx as u32, sy as u32)[0])
            })
            .fold(start, pick);
        Luma([value])
    })
}

/// Morphological opening (erode then dilate) with the 3x3 elliptical element.
/// Removes isolated specks from a binary mask.
pub fn open(mask: &GrayImage) -> GrayImage {
    let eroded = morph(mask, u8::min, u8::MAX);
    morph(&eroded, u8::max, u8::MIN)
}

/// Source sample positions and blend weights for one axis of a linear
/// resize: each output pixel mixes the two source pixels nearest its centre.
fn linear_taps(src_len: u32, dst_len: u32) -> Vec<(u32, u32, f32)> {
    let ratio = src_len as f64 / dst_len as f64;
    let last = src_len - 1;

    (0..dst_len)
        .map(|d| {
            let pos = (d as f64 + 0.5) * ratio - 0.5;
            let lo = pos.floor();
            if lo < 0.0 {
                (0, 0, 0.0)
            } else if lo as u32 >= last {
                (last, last, 0.0)
            } else {
                (lo as u32, lo as u32 + 1, (pos - lo) as f32)
            }
        })
        .collect()
}

/// Two-tap bilinear resize; a no-op copy when the size already matches.
pub fn resize_linear(mask: &GrayImage, width: u32, height: u32) -> GrayImage {
    if mask.dimensions() == (width, height) {
        return mask.clone();
    }
    if width == 0 || height == 0 || mask.width() == 0 || mask.height() == 0 {
        return GrayImage::new(width, height);
    }

    let cols = linear_taps(mask.width(), width);
    let rows = linear_taps(mask.height(), height);
    let at = |x: u32, y: u32| mask.get_pixel(x, y)[0] as f32;

    GrayImage::from_fn(width, height, |x, y| {
        let (x0, x1, fx) = cols[x as usize];
        let (y0, y1, fy) = rows[y as usize];
        let top = at(x0, y0) * (1.0 - fx) + at(x1, y0) * fx;
        let bottom = at(x0, y1) * (1.0 - fx) + at(x1, y1) * fx;
        let value = top * (1.0 - fy) + bottom * fy;
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(width: u32, height: u32, value: u8) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([value, value, value]))
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(2, 5), 2);
        assert_eq!(reflect_101(-1, 1), 0);
    }

    #[test]
    fn test_gaussian_kernel_normalized() {
        for size in [1, 3, 5, 9] {
            let kernel = gaussian_kernel(size);
            assert_eq!(kernel.len(), size as usize);
            let sum: f32 = kernel.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
            // symmetric, peaked in the middle
            assert_eq!(kernel[0], kernel[kernel.len() - 1]);
            assert!(kernel[kernel.len() / 2] >= kernel[0]);
        }
    }

    #[test]
    fn test_blur_keeps_flat_image() {
        let image = flat(6, 4, 120);
        assert_eq!(gaussian_blur(&image, 5), image);
    }

    #[test]
    fn test_blur_kernel_one_is_identity() {
        let image = RgbImage::from_fn(5, 5, |x, y| Rgb([(x * 40) as u8, (y * 40) as u8, 7]));
        assert_eq!(gaussian_blur(&image, 1), image);
    }

    #[test]
    fn test_blur_spreads_a_spike() {
        let mut image = flat(7, 7, 0);
        image.put_pixel(3, 3, Rgb([255, 255, 255]));
        let blurred = gaussian_blur(&image, 3);
        assert!(blurred.get_pixel(3, 3)[0] < 255);
        assert!(blurred.get_pixel(2, 3)[0] > 0);
        assert_eq!(blurred.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_sobel_flat_is_zero() {
        let gray = intensity(&flat(5, 5, 200));
        let magnitude = sobel_magnitude(&gray);
        assert!(magnitude.pixels().all(|p| p[0] == 0.0));
    }

    #[test]
    fn test_sobel_vertical_edge() {
        let gray = GrayImage::from_fn(6, 3, |x, _| Luma([if x < 3 { 0 } else { 100 }]));
        let magnitude = sobel_magnitude(&gray);
        // 4 * 100 across the edge, nothing far from it
        assert_eq!(magnitude.get_pixel(2, 1)[0], 400.0);
        assert_eq!(magnitude.get_pixel(3, 1)[0], 400.0);
        assert_eq!(magnitude.get_pixel(0, 1)[0], 0.0);
    }

    #[test]
    fn test_threshold_is_inverted() {
        let magnitude = GradientImage::from_fn(3, 1, |x, _| Luma([[0.0, 10.0, 10.5][x as usize]]));
        let mask = threshold_inverted(&magnitude, 10.0);
        assert_eq!(mask.as_raw(), &vec![MARKED, MARKED, 0]);
    }

    #[test]
    fn test_open_removes_speck_keeps_block() {
        let mut mask = GrayImage::new(9, 9);
        mask.put_pixel(1, 1, Luma([MARKED]));
        for y in 4..8 {
            for x in 4..8 {
                mask.put_pixel(x, y, Luma([MARKED]));
            }
        }
        let opened = open(&mask);
        assert_eq!(opened.get_pixel(1, 1)[0], 0);
        assert_eq!(opened.get_pixel(5, 5)[0], MARKED);
    }

    #[test]
    fn test_open_keeps_full_mask() {
        let mask = GrayImage::from_pixel(4, 4, Luma([MARKED]));
        assert_eq!(open(&mask), mask);
    }

    #[test]
    fn test_intensity_weights() {
        let image = RgbImage::from_fn(3, 1, |x, _| match x {
            0 => Rgb([255, 0, 0]),
            1 => Rgb([0, 255, 0]),
            _ => Rgb([0, 0, 255]),
        });
        let gray = intensity(&image);
        assert_eq!(gray.as_raw(), &vec![29, 150, 76]);
        assert_eq!(intensity(&flat(2, 2, 90)).get_pixel(1, 1)[0], 90);
    }

    #[test]
    fn test_resize_upscale_blends_neighbours() {
        let mask = GrayImage::from_raw(2, 1, vec![0, 255]).unwrap();
        let resized = resize_linear(&mask, 4, 1);
        assert_eq!(resized.as_raw(), &vec![0, 64, 191, 255]);
    }

    #[test]
    fn test_resize_downscale_keeps_thin_gap() {
        // two clear columns at 20 and 21 survive halving as column 10
        let mask = GrayImage::from_fn(40, 4, |x, _| {
            Luma([if x == 20 || x == 21 { 0 } else { MARKED }])
        });
        let resized = resize_linear(&mask, 20, 2);
        for y in 0..2 {
            assert_eq!(resized.get_pixel(10, y)[0], 0);
            assert_eq!(resized.get_pixel(9, y)[0], MARKED);
            assert_eq!(resized.get_pixel(11, y)[0], MARKED);
        }
    }

    #[test]
    fn test_resize_full_mask_stays_marked() {
        let mask = GrayImage::from_pixel(4, 3, Luma([MARKED]));
        let resized = resize_linear(&mask, 8, 6);
        assert_eq!(resized.dimensions(), (8, 6));
        assert!(resized.pixels().all(|p| p[0] > 0));
    }
}
