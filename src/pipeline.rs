use image::{DynamicImage, GrayImage};
use ndarray::Array3;
use tracing::{debug, debug_span};

use crate::cutout::alpha_matting::AlphaMatting;
use crate::cutout::apply_alpha_mask::naive_cutout;
use crate::cutout::background::apply_background;
use crate::cutout::blur_fusion::{BlurFusion, ForegroundEstimator};
use crate::cutout::closed_form::{AlphaEstimator, ClosedFormAlpha};
use crate::cutout::color::BackgroundColor;
use crate::cutout::stack::stack_vertical;
use crate::cutout::trimap::TrimapBuilder;
use crate::error::CutoutError;
use crate::io::{
    array_to_image, decode, encode, image_to_array, CutoutInput, CutoutOutput, OutputFormat,
    ReturnType,
};
use crate::session::Session;

/// Options of a [`remove`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveOptions {
    /// Refine mask edges with alpha matting
    pub alpha_matting: bool,
    /// Mask values above this are definite foreground
    pub foreground_threshold: u8,
    /// Mask values below this are definite background
    pub background_threshold: u8,
    /// Side of the square eroding both definite regions; 0 disables erosion
    pub erode_size: u32,
    /// Return the masks themselves instead of cutouts
    pub only_mask: bool,
    /// Color painted behind each cutout; empty for none
    pub background_color: String,
    /// Output format for byte output, `png` or `jpg`/`jpeg`
    pub extension: String,
}

impl Default for RemoveOptions {
    fn default() -> Self {
        Self {
            alpha_matting: false,
            foreground_threshold: 240,
            background_threshold: 10,
            erode_size: 10,
            only_mask: false,
            background_color: String::new(),
            extension: "png".to_string(),
        }
    }
}

impl RemoveOptions {
    #[must_use]
    pub const fn with_alpha_matting(mut self, alpha_matting: bool) -> Self {
        self.alpha_matting = alpha_matting;
        self
    }

    #[must_use]
    pub const fn with_foreground_threshold(mut self, threshold: u8) -> Self {
        self.foreground_threshold = threshold;
        self
    }

    #[must_use]
    pub const fn with_background_threshold(mut self, threshold: u8) -> Self {
        self.background_threshold = threshold;
        self
    }

    #[must_use]
    pub const fn with_erode_size(mut self, erode_size: u32) -> Self {
        self.erode_size = erode_size;
        self
    }

    #[must_use]
    pub const fn with_only_mask(mut self, only_mask: bool) -> Self {
        self.only_mask = only_mask;
        self
    }

    #[must_use]
    pub fn with_background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = color.into();
        self
    }

    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub const fn strategy(&self) -> CompositeStrategy {
        CompositeStrategy::select(self.only_mask, self.alpha_matting)
    }

    pub const fn trimap(&self) -> TrimapBuilder {
        TrimapBuilder::new(
            self.foreground_threshold,
            self.background_threshold,
            self.erode_size,
        )
    }

    /// Parses the background color, `None` when it is empty
    ///
    /// # Errors
    ///
    /// * `CutoutError::ColorParse` - When the color is not empty and cannot be parsed
    pub fn background(&self) -> Result<Option<BackgroundColor>, CutoutError> {
        if self.background_color.is_empty() {
            return Ok(None);
        }
        self.background_color.parse().map(Some)
    }

    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from_extension(&self.extension)
    }
}

/// How a single mask turns into a cutout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositeStrategy {
    /// The mask itself is the result
    MaskOnly,
    /// The mask is used as alpha directly
    Naive,
    /// Mask edges are refined with alpha matting
    AlphaMatting,
}

impl CompositeStrategy {
    /// `only_mask` takes precedence over `alpha_matting`
    pub const fn select(only_mask: bool, alpha_matting: bool) -> Self {
        match (only_mask, alpha_matting) {
            (true, _) => Self::MaskOnly,
            (false, true) => Self::AlphaMatting,
            (false, false) => Self::Naive,
        }
    }
}

/// Background removal driven by the masks of a [`Session`]
///
/// The pipeline owns the matting estimators and is otherwise stateless, so
/// a single instance can serve any number of calls.
#[derive(Debug, Clone, Default)]
pub struct CutoutPipeline<A = ClosedFormAlpha, F = BlurFusion> {
    matting: AlphaMatting<A, F>,
}

impl CutoutPipeline {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<A, F> CutoutPipeline<A, F> {
    pub const fn with_estimators(alpha_estimator: A, foreground_estimator: F) -> Self {
        Self {
            matting: AlphaMatting::new(alpha_estimator, foreground_estimator),
        }
    }
}

impl<A, F> CutoutPipeline<A, F>
where
    A: AlphaEstimator,
    F: ForegroundEstimator,
{
    /// Removes the background of `data`, returning the same kind of value
    ///
    /// Bytes are decoded and the result re-encoded in the format named by
    /// `options.extension`; images and pixel arrays come back as images and
    /// pixel arrays.
    ///
    /// # Errors
    ///
    /// * `CutoutError::UnsupportedInput` - When the input cannot be normalized
    /// * `CutoutError::ColorParse` - When the background color is malformed
    /// * `CutoutError::DimensionMismatch` - When a mask does not fit the image
    /// * `CutoutError::Image` - When decoding or encoding fails
    pub fn remove<I, S>(
        &self,
        data: I,
        options: &RemoveOptions,
        session: &S,
    ) -> Result<CutoutOutput, CutoutError>
    where
        I: Into<CutoutInput>,
        S: Session + ?Sized,
    {
        let input = data.into();
        let return_type = input.return_type();
        let image = input.into_image()?;

        let result = self.remove_image(image, options, session)?;

        let format = match return_type {
            ReturnType::Bytes => options.output_format(),
            ReturnType::Image | ReturnType::Array => OutputFormat::default(),
        };
        CutoutOutput::from_image(result, return_type, format)
    }

    /// Removes the background of a decoded image
    ///
    /// # Errors
    ///
    /// See [`remove`](Self::remove).
    pub fn remove_image<S>(
        &self,
        image: DynamicImage,
        options: &RemoveOptions,
        session: &S,
    ) -> Result<DynamicImage, CutoutError>
    where
        S: Session + ?Sized,
    {
        let strategy = options.strategy();
        let _span = debug_span!(
            "remove",
            width = image.width(),
            height = image.height(),
            ?strategy
        )
        .entered();

        debug!(background_color = %options.background_color, "background color");
        let background = options.background()?;

        let masks = session.predict(&image);
        debug!(masks = masks.len(), "segmentation done");

        self.composite(image, &masks, options, background)
    }

    /// Cuts `image` out through every mask and stacks the results
    ///
    /// Without masks the image is returned unchanged.
    ///
    /// # Errors
    ///
    /// * `CutoutError::DimensionMismatch` - When a mask does not fit the image
    pub fn composite(
        &self,
        image: DynamicImage,
        masks: &[GrayImage],
        options: &RemoveOptions,
        background: Option<BackgroundColor>,
    ) -> Result<DynamicImage, CutoutError> {
        if masks.is_empty() {
            return Ok(image);
        }

        let strategy = options.strategy();
        let trimap = options.trimap();

        let cutouts = masks
            .iter()
            .map(|mask| {
                let cutout = self.cutout(&image, mask, strategy, &trimap)?;
                Ok(match background {
                    Some(color) => DynamicImage::ImageRgb8(apply_background(&cutout, color)),
                    None => cutout,
                })
            })
            .collect::<Result<Vec<_>, CutoutError>>()?;

        stack_vertical(cutouts)
    }

    /// Produces the cutout of a single mask
    ///
    /// # Errors
    ///
    /// * `CutoutError::DimensionMismatch` - When the mask does not fit the image
    pub fn cutout(
        &self,
        image: &DynamicImage,
        mask: &GrayImage,
        strategy: CompositeStrategy,
        trimap: &TrimapBuilder,
    ) -> Result<DynamicImage, CutoutError> {
        let cutout = match strategy {
            CompositeStrategy::MaskOnly => DynamicImage::ImageLuma8(mask.clone()),
            CompositeStrategy::Naive => DynamicImage::ImageRgba8(naive_cutout(image, mask)?),
            CompositeStrategy::AlphaMatting => {
                DynamicImage::ImageRgba8(self.matting.cutout(image, mask, trimap)?)
            }
        };
        Ok(cutout)
    }
}

/// Removes the background of `data` with the default pipeline
///
/// # Errors
///
/// See [`CutoutPipeline::remove`].
///
/// # Examples
///
/// ```no_run
/// use image::{DynamicImage, GrayImage, Luma};
/// use imageops_cutout::{remove, RemoveOptions};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let image = DynamicImage::new_rgb8(64, 48);
/// let session = |image: &DynamicImage| {
///     vec![GrayImage::from_pixel(image.width(), image.height(), Luma([255]))]
/// };
///
/// let options = RemoveOptions::default().with_background_color("white");
/// let output = remove(image, &options, &session)?;
/// # Ok(())
/// # }
/// ```
pub fn remove<I, S>(
    data: I,
    options: &RemoveOptions,
    session: &S,
) -> Result<CutoutOutput, CutoutError>
where
    I: Into<CutoutInput>,
    S: Session + ?Sized,
{
    CutoutPipeline::new().remove(data, options, session)
}

/// Removes the background of an encoded image and encodes the result
///
/// # Errors
///
/// See [`CutoutPipeline::remove`].
pub fn remove_bytes<S>(
    bytes: &[u8],
    options: &RemoveOptions,
    session: &S,
) -> Result<Vec<u8>, CutoutError>
where
    S: Session + ?Sized,
{
    let image = decode(bytes)?;
    let result = CutoutPipeline::new().remove_image(image, options, session)?;
    encode(&result, options.output_format())
}

/// Removes the background of a decoded image
///
/// # Errors
///
/// See [`CutoutPipeline::remove`].
pub fn remove_image<S>(
    image: DynamicImage,
    options: &RemoveOptions,
    session: &S,
) -> Result<DynamicImage, CutoutError>
where
    S: Session + ?Sized,
{
    CutoutPipeline::new().remove_image(image, options, session)
}

/// Removes the background of a `height x width x channels` pixel array
///
/// # Errors
///
/// See [`CutoutPipeline::remove`].
pub fn remove_array<S>(
    array: &Array3<u8>,
    options: &RemoveOptions,
    session: &S,
) -> Result<Array3<u8>, CutoutError>
where
    S: Session + ?Sized,
{
    let image = array_to_image(array)?;
    let result = CutoutPipeline::new().remove_image(image, options, session)?;
    image_to_array(&result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolverError;
    use crate::session::StaticSession;
    use crate::test_utils::{create_split_image, create_step_mask};
    use crate::Image;
    use image::{Luma, Rgb};

    struct Failing;

    impl AlphaEstimator for Failing {
        fn estimate_alpha(
            &self,
            _image: &Image<Rgb<f32>>,
            _trimap: &Image<Luma<f32>>,
        ) -> Result<Image<Luma<f32>>, SolverError> {
            Err(SolverError::NoUnknownRegion)
        }
    }

    #[test]
    fn default_options() {
        let options = RemoveOptions::default();
        assert!(!options.alpha_matting);
        assert_eq!(options.trimap(), TrimapBuilder::default());
        assert_eq!(options.strategy(), CompositeStrategy::Naive);
        assert_eq!(options.background().unwrap(), None);
        assert_eq!(options.output_format(), OutputFormat::Png);
    }

    #[test]
    fn only_mask_takes_precedence() {
        assert_eq!(CompositeStrategy::select(true, true), CompositeStrategy::MaskOnly);
        assert_eq!(CompositeStrategy::select(true, false), CompositeStrategy::MaskOnly);
        assert_eq!(CompositeStrategy::select(false, true), CompositeStrategy::AlphaMatting);
        assert_eq!(CompositeStrategy::select(false, false), CompositeStrategy::Naive);
    }

    #[test]
    fn no_masks_returns_the_image() {
        let image = DynamicImage::ImageRgb8(create_split_image(6, 4));
        let options = RemoveOptions::default().with_background_color("red");

        let result = CutoutPipeline::new()
            .remove_image(image.clone(), &options, &StaticSession::default())
            .unwrap();
        assert_eq!(result, image);
    }

    #[test]
    fn malformed_color_fails_before_segmentation() {
        let image = DynamicImage::new_rgb8(4, 4);
        let options = RemoveOptions::default().with_background_color("not-a-color");
        let session = |_: &DynamicImage| -> Vec<GrayImage> { panic!("session must not run") };

        assert!(matches!(
            CutoutPipeline::new().remove_image(image, &options, &session),
            Err(CutoutError::ColorParse { .. })
        ));
    }

    #[test]
    fn solver_failure_matches_naive_strategy() {
        let image = DynamicImage::ImageRgb8(create_split_image(12, 12));
        let session = StaticSession::new(vec![create_step_mask(12, 12, 6)]);
        let pipeline = CutoutPipeline::with_estimators(Failing, BlurFusion::default());

        let matted = pipeline
            .remove_image(
                image.clone(),
                &RemoveOptions::default().with_alpha_matting(true),
                &session,
            )
            .unwrap();
        let naive = pipeline
            .remove_image(image, &RemoveOptions::default(), &session)
            .unwrap();

        assert_eq!(matted, naive);
    }

    #[test]
    fn mismatched_mask_is_an_error() {
        let image = DynamicImage::new_rgb8(8, 8);
        let session = StaticSession::new(vec![GrayImage::new(4, 8)]);

        assert!(matches!(
            remove_image(image, &RemoveOptions::default(), &session),
            Err(CutoutError::DimensionMismatch { .. })
        ));
    }
}
