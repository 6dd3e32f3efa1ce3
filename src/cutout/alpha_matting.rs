use crate::cutout::apply_alpha_mask::naive_cutout;
use crate::cutout::blur_fusion::{BlurFusion, ForegroundEstimator};
use crate::cutout::closed_form::{AlphaEstimator, ClosedFormAlpha};
use crate::cutout::trimap::TrimapBuilder;
use crate::error::CutoutError;
use crate::utils::{ensure_same_dimensions, unit_to_u8};
use crate::Image;
use image::{DynamicImage, Luma, Rgb, Rgba};
use imageproc::map::map_colors;
use itertools::izip;
use tracing::debug;

/// Soft-edged cutout through trimap, alpha estimation and foreground estimation
///
/// The two estimators are the replaceable seams; the defaults are
/// [`ClosedFormAlpha`] and [`BlurFusion`].
#[derive(Debug, Clone, Default)]
pub struct AlphaMatting<A = ClosedFormAlpha, F = BlurFusion> {
    pub alpha_estimator: A,
    pub foreground_estimator: F,
}

impl<A, F> AlphaMatting<A, F> {
    pub const fn new(alpha_estimator: A, foreground_estimator: F) -> Self {
        Self {
            alpha_estimator,
            foreground_estimator,
        }
    }
}

impl<A, F> AlphaMatting<A, F>
where
    A: AlphaEstimator,
    F: ForegroundEstimator,
{
    /// Cuts `image` out through `mask`, refining the edge with alpha matting
    ///
    /// When the alpha estimator rejects the trimap (for example because the
    /// mask has no definite background) the hard-edged [`naive_cutout`] is
    /// returned instead.
    ///
    /// # Errors
    ///
    /// * `CutoutError::DimensionMismatch` - When image and mask dimensions don't match
    /// * `CutoutError::InvalidParameter` - When the foreground estimator is misconfigured
    pub fn cutout(
        &self,
        image: &DynamicImage,
        mask: &Image<Luma<u8>>,
        trimap: &TrimapBuilder,
    ) -> Result<Image<Rgba<u8>>, CutoutError> {
        match self.try_cutout(image, mask, trimap) {
            Err(CutoutError::Solver(err)) => {
                debug!(error = %err, "alpha matting failed, using naive cutout");
                naive_cutout(image, mask)
            }
            result => result,
        }
    }

    /// Like [`cutout`](Self::cutout) but reports solver failures as
    /// `CutoutError::Solver` instead of falling back
    ///
    /// # Errors
    ///
    /// * `CutoutError::Solver` - When alpha estimation fails
    /// * `CutoutError::DimensionMismatch` - When image and mask dimensions don't match
    pub fn try_cutout(
        &self,
        image: &DynamicImage,
        mask: &Image<Luma<u8>>,
        trimap: &TrimapBuilder,
    ) -> Result<Image<Rgba<u8>>, CutoutError> {
        let (width, height) = (image.width(), image.height());
        ensure_same_dimensions((width, height), mask.dimensions())?;

        let trimap = trimap.build(mask);
        let normalized_image: Image<Rgb<f32>> = image.to_rgb32f();
        let normalized_trimap = map_colors(&trimap, |Luma([v])| Luma([f32::from(v) / 255.0]));

        let alpha = self
            .alpha_estimator
            .estimate_alpha(&normalized_image, &normalized_trimap)?;
        let foreground = self
            .foreground_estimator
            .estimate_foreground(&normalized_image, &alpha)?;

        let data = izip!(foreground.pixels(), alpha.pixels())
            .flat_map(|(&Rgb([r, g, b]), &Luma([a]))| [r, g, b, a].map(unit_to_u8))
            .collect();

        Image::from_raw(width, height, data).ok_or_else(|| {
            CutoutError::InvalidParameter("cutout buffer size mismatch".to_string())
        })
    }
}
