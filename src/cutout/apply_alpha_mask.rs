use image::{DynamicImage, GenericImageView, Luma, Pixel, Primitive, Rgb, Rgba};
use imageproc::{definitions::Image, map::map_colors2};
use tracing::trace;

use crate::{error::CutoutError, utils::ensure_same_dimensions};

/// Trait providing functionality to apply alpha masks to images
///
/// This trait provides functionality to apply grayscale masks to RGB images
/// to generate RGBA images. This consumes the original image.
///
/// Note: This trait performs type conversion (e.g., Rgb -> Rgba). For modifying
/// existing RGBA images' alpha channel, use the `ModifyAlpha` trait.
pub trait ApplyAlphaMask {
    type Mask: GenericImageView<Pixel = Luma<Self::Subpixel>>;
    type Subpixel: Primitive;
    /// Applies the specified mask to the image and generates an image with alpha channel
    ///
    /// The mask value becomes the alpha value unchanged; color channels are
    /// copied as they are.
    ///
    /// # Errors
    ///
    /// * `CutoutError::DimensionMismatch` - When image and mask dimensions don't match
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use imageops_cutout::{Image, ApplyAlphaMask};
    /// use image::{Rgb, Luma};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let rgb_image: Image<Rgb<u8>> = Image::new(10, 10);
    /// let mask: Image<Luma<u8>> = Image::new(10, 10);
    ///
    /// let rgba_image = rgb_image.apply_alpha_mask(&mask)?;
    /// # Ok(())
    /// # }
    /// ```
    fn apply_alpha_mask(
        self,
        mask: &Self::Mask,
    ) -> Result<Image<Rgba<Self::Subpixel>>, CutoutError>
    where
        Rgba<Self::Subpixel>: Pixel<Subpixel = Self::Subpixel>;
}

/// Trait for modifying alpha channel of existing RGBA images
pub trait ModifyAlpha {
    type Mask: GenericImageView<Pixel = Luma<Self::Subpixel>>;
    type Subpixel: Primitive;

    /// Replaces the alpha channel with the provided mask
    ///
    /// # Errors
    ///
    /// * `CutoutError::DimensionMismatch` - When image and mask dimensions don't match
    fn replace_alpha(self, mask: &Self::Mask) -> Result<Self, CutoutError>
    where
        Self: Sized;
}

impl<S> ApplyAlphaMask for Image<Rgb<S>>
where
    Rgb<S>: Pixel<Subpixel = S>,
    S: Primitive,
{
    type Mask = Image<Luma<S>>;
    type Subpixel = S;

    fn apply_alpha_mask(
        self,
        mask: &Self::Mask,
    ) -> Result<Image<Rgba<Self::Subpixel>>, CutoutError>
    where
        Rgba<Self::Subpixel>: Pixel<Subpixel = Self::Subpixel>,
    {
        validate_dimensions(&self, mask)?;

        let result = map_colors2(&self, mask, |Rgb([red, green, blue]), Luma([alpha])| {
            Rgba([red, green, blue, alpha])
        });

        Ok(result)
    }
}

impl<S> ModifyAlpha for Image<Rgba<S>>
where
    Rgba<S>: Pixel<Subpixel = S>,
    S: Primitive,
{
    type Mask = Image<Luma<S>>;
    type Subpixel = S;

    fn replace_alpha(self, mask: &Self::Mask) -> Result<Self, CutoutError> {
        validate_dimensions(&self, mask)?;

        let result = map_colors2(&self, mask, |Rgba([red, green, blue, _]), Luma([alpha])| {
            Rgba([red, green, blue, alpha])
        });

        Ok(result)
    }
}

/// Hard-edged cutout of `image` through `mask`
///
/// The result keeps the image's color and takes the mask value as alpha, so
/// applying it again to its own output with the same mask changes nothing.
///
/// # Errors
///
/// * `CutoutError::DimensionMismatch` - When image and mask dimensions don't match
pub fn naive_cutout(
    image: &DynamicImage,
    mask: &Image<Luma<u8>>,
) -> Result<Image<Rgba<u8>>, CutoutError> {
    trace!(width = image.width(), height = image.height(), "naive cutout");

    match image {
        DynamicImage::ImageRgba8(rgba) => rgba.clone().replace_alpha(mask),
        other => other.to_rgb8().apply_alpha_mask(mask),
    }
}

/// Function to validate dimensions
#[inline]
fn validate_dimensions<I1, I2, P1, P2, S>(image: &I1, mask: &I2) -> Result<(), CutoutError>
where
    I1: GenericImageView<Pixel = P1>,
    I2: GenericImageView<Pixel = P2>,
    P1: Pixel<Subpixel = S>,
    P2: Pixel<Subpixel = S>,
    S: Primitive,
{
    ensure_same_dimensions(image.dimensions(), mask.dimensions())
}
