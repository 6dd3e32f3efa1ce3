//! Test utilities for imageops-cutout
//!
//! This module provides common fixtures for testing cutout operations.
//! It is only compiled when running tests.

use image::{Luma, Rgb, Rgba};

use crate::Image;

/// Creates a test RGB image with predefined pixel values for testing.
///
/// This function creates a 2x2 test image with known pixel values:
/// - (0,0): [200, 150, 100]
/// - (1,0): [100, 200, 150]
/// - (0,1): [150, 100, 200]
/// - (1,1): [50, 75, 25]
pub fn create_test_rgb_image() -> Image<Rgb<u8>> {
    let mut image: Image<Rgb<u8>> = Image::new(2, 2);
    image.put_pixel(0, 0, Rgb([200, 150, 100]));
    image.put_pixel(1, 0, Rgb([100, 200, 150]));
    image.put_pixel(0, 1, Rgb([150, 100, 200]));
    image.put_pixel(1, 1, Rgb([50, 75, 25]));
    image
}

/// Creates a test RGBA image with predefined pixel values for testing.
///
/// This function creates a 2x2 test image with known pixel values including alpha:
/// - (0,0): [200, 150, 100, 255] (opaque)
/// - (1,0): [100, 200, 150, 128] (semi-transparent)
/// - (0,1): [150, 100, 200, 64]  (more transparent)
/// - (1,1): [50, 75, 25, 0]      (fully transparent)
pub fn create_test_rgba_image() -> Image<Rgba<u8>> {
    let mut image: Image<Rgba<u8>> = Image::new(2, 2);
    image.put_pixel(0, 0, Rgba([200, 150, 100, 255]));
    image.put_pixel(1, 0, Rgba([100, 200, 150, 128]));
    image.put_pixel(0, 1, Rgba([150, 100, 200, 64]));
    image.put_pixel(1, 1, Rgba([50, 75, 25, 0]));
    image
}

/// Creates a test alpha mask image with predefined alpha values for testing.
///
/// This function creates a 2x2 test mask with varying transparency levels:
/// - (0,0): [255] (fully opaque)
/// - (1,0): [192] (mostly opaque)
/// - (0,1): [128] (semi-transparent)
/// - (1,1): [64]  (mostly transparent)
pub fn create_test_alpha_mask() -> Image<Luma<u8>> {
    let mut mask: Image<Luma<u8>> = Image::new(2, 2);
    mask.put_pixel(0, 0, Luma([255]));
    mask.put_pixel(1, 0, Luma([192]));
    mask.put_pixel(0, 1, Luma([128]));
    mask.put_pixel(1, 1, Luma([64]));
    mask
}

/// Creates a normalized RGB gradient, red along x and green along y.
pub fn create_gradient_image_f32(width: u32, height: u32) -> Image<Rgb<f32>> {
    let w = width.saturating_sub(1).max(1) as f32;
    let h = height.saturating_sub(1).max(1) as f32;
    Image::from_fn(width, height, |x, y| {
        Rgb([x as f32 / w, y as f32 / h, 0.5])
    })
}

/// Creates an image whose left half is reddish and right half bluish.
///
/// The halves carry a little texture so the matting windows are not
/// perfectly flat.
pub fn create_split_image(width: u32, height: u32) -> Image<Rgb<u8>> {
    Image::from_fn(width, height, |x, y| {
        let texture = ((x * 7 + y * 13) % 16) as u8;
        if x < width / 2 {
            Rgb([220 - texture, 40 + texture, 30])
        } else {
            Rgb([30, 60 + texture, 210 - texture])
        }
    })
}

/// Creates a hard mask that is 255 left of `edge` and 0 from `edge` on.
pub fn create_step_mask(width: u32, height: u32, edge: u32) -> Image<Luma<u8>> {
    Image::from_fn(width, height, |x, _| Luma([if x < edge { 255 } else { 0 }]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_test_rgb_image_with_valid_input_creates_image() {
        let image = create_test_rgb_image();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(0, 0), &Rgb([200, 150, 100]));
        assert_eq!(image.get_pixel(1, 1), &Rgb([50, 75, 25]));
    }

    #[test]
    fn create_gradient_image_f32_is_normalized() {
        let image = create_gradient_image_f32(5, 3);
        assert_eq!(image.get_pixel(0, 0), &Rgb([0.0, 0.0, 0.5]));
        assert_eq!(image.get_pixel(4, 2), &Rgb([1.0, 1.0, 0.5]));
    }

    #[test]
    fn create_step_mask_splits_at_edge() {
        let mask = create_step_mask(4, 2, 3);
        assert_eq!(mask.get_pixel(2, 1), &Luma([255]));
        assert_eq!(mask.get_pixel(3, 1), &Luma([0]));
    }
}
