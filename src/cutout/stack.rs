use crate::error::CutoutError;
use crate::Image;
use image::{ColorType, DynamicImage, Pixel};
use tracing::trace;

/// Stacks images of equal width top to bottom, first image on top
///
/// Rows are stored contiguously, so the stacked buffer is the
/// concatenation of the parts' buffers.
///
/// # Errors
///
/// * `CutoutError::EmptyInput` - When `parts` is empty
/// * `CutoutError::DimensionMismatch` - When a part's width differs from the first one
pub fn stack_images<P>(parts: &[Image<P>]) -> Result<Image<P>, CutoutError>
where
    P: Pixel,
{
    let first = parts.first().ok_or(CutoutError::EmptyInput)?;
    let width = first.width();

    if let Some(part) = parts.iter().find(|part| part.width() != width) {
        return Err(CutoutError::DimensionMismatch {
            expected: (width, part.height()),
            actual: part.dimensions(),
        });
    }

    let height = parts.iter().map(Image::height).sum();
    let data = parts
        .iter()
        .flat_map(|part| part.as_raw().iter().copied())
        .collect();

    Image::from_raw(width, height, data).ok_or_else(|| {
        CutoutError::InvalidParameter("stacked buffer size mismatch".to_string())
    })
}

/// Stacks cutouts vertically in order
///
/// A single cutout is returned unchanged. If every cutout has the same 8-bit
/// color type the stack keeps it; mixed inputs are converted to RGBA.
///
/// # Errors
///
/// * `CutoutError::EmptyInput` - When `cutouts` is empty
/// * `CutoutError::DimensionMismatch` - When widths differ
pub fn stack_vertical(mut cutouts: Vec<DynamicImage>) -> Result<DynamicImage, CutoutError> {
    match cutouts.len() {
        0 => return Err(CutoutError::EmptyInput),
        1 => return Ok(cutouts.remove(0)),
        _ => {}
    }

    let color = cutouts[0].color();
    let uniform = cutouts.iter().all(|cutout| cutout.color() == color);
    trace!(count = cutouts.len(), ?color, uniform, "stacking cutouts");

    let stacked = match color {
        ColorType::L8 if uniform => DynamicImage::ImageLuma8(stack_images(
            &cutouts.into_iter().map(DynamicImage::into_luma8).collect::<Vec<_>>(),
        )?),
        ColorType::La8 if uniform => DynamicImage::ImageLumaA8(stack_images(
            &cutouts.into_iter().map(DynamicImage::into_luma_alpha8).collect::<Vec<_>>(),
        )?),
        ColorType::Rgb8 if uniform => DynamicImage::ImageRgb8(stack_images(
            &cutouts.into_iter().map(DynamicImage::into_rgb8).collect::<Vec<_>>(),
        )?),
        _ => DynamicImage::ImageRgba8(stack_images(
            &cutouts.into_iter().map(DynamicImage::into_rgba8).collect::<Vec<_>>(),
        )?),
    };

    Ok(stacked)
}
