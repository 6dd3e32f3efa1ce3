//! Internal utility functions for imageops-cutout.
//!
//! This module contains common functionality used across different image operations.

use imageproc::definitions::Clamp;

use crate::error::CutoutError;

/// Converts a value normalized to `[0, 1]` into an 8-bit channel.
///
/// The value is scaled by 255, rounded, and saturated, so slightly
/// out-of-range solver output still maps onto 0 and 255.
#[inline]
pub fn unit_to_u8(value: f32) -> u8 {
    <u8 as Clamp<f32>>::clamp((value * 255.0).round())
}

/// Blends a foreground channel over a background channel with 8-bit alpha.
///
/// Computes `round((fg * alpha + bg * (255 - alpha)) / 255)` in integers.
#[inline]
pub const fn blend_channel(foreground: u8, background: u8, alpha: u8) -> u8 {
    let alpha = alpha as u32;
    let sum = foreground as u32 * alpha + background as u32 * (255 - alpha);
    // sum <= 255 * 255, so the rounded quotient fits in u8
    ((sum + 127) / 255) as u8
}

/// Fails with `DimensionMismatch` unless `actual` equals `expected`.
pub fn ensure_same_dimensions(expected: (u32, u32), actual: (u32, u32)) -> Result<(), CutoutError> {
    if expected == actual {
        Ok(())
    } else {
        Err(CutoutError::DimensionMismatch { expected, actual })
    }
}
