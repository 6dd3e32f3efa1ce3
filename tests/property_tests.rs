//! Property-based tests for imageops-cutout
//!
//! These tests use proptest to verify the invariants that should hold for
//! all inputs to the cutout operations.

use image::{DynamicImage, Luma, Rgb, Rgba};
use image::buffer::ConvertBuffer;
use imageops_cutout::{
    apply_background, decode, encode, naive_cutout, stack_vertical, AlphaEstimator, AlphaMatting,
    BackgroundColor, BlurFusion, Image, OutputFormat, SolverError, Trimap, TrimapBuilder,
    TRIMAP_BACKGROUND, TRIMAP_FOREGROUND, TRIMAP_UNKNOWN,
};
use proptest::prelude::*;

/// Strategy for generating small but valid image dimensions
fn image_dimensions() -> impl Strategy<Value = (u32, u32)> {
    (1u32..=16, 1u32..=16)
}

/// Strategy for generating RGB pixel values
fn rgb_pixel() -> impl Strategy<Value = Rgb<u8>> {
    (any::<u8>(), any::<u8>(), any::<u8>()).prop_map(|(r, g, b)| Rgb([r, g, b]))
}

/// Strategy for generating an image together with a mask of the same size
fn image_and_mask() -> impl Strategy<Value = (Image<Rgb<u8>>, Image<Luma<u8>>)> {
    image_dimensions().prop_flat_map(|(width, height)| {
        let len = (width * height) as usize;
        (
            prop::collection::vec(any::<u8>(), len * 3),
            prop::collection::vec(any::<u8>(), len),
        )
            .prop_map(move |(rgb, alpha)| {
                (
                    Image::from_raw(width, height, rgb).unwrap(),
                    Image::from_raw(width, height, alpha).unwrap(),
                )
            })
    })
}

/// Strategy for generating a mask
fn mask() -> impl Strategy<Value = Image<Luma<u8>>> {
    image_and_mask().prop_map(|(_, mask)| mask)
}

/// Alpha estimator that always rejects its trimap
struct Rejecting;

impl AlphaEstimator for Rejecting {
    fn estimate_alpha(
        &self,
        _image: &Image<Rgb<f32>>,
        _trimap: &Image<Luma<f32>>,
    ) -> Result<Image<Luma<f32>>, SolverError> {
        Err(SolverError::NoForeground)
    }
}

proptest! {
    /// Property: Without erosion each pixel is classified by the thresholds alone
    #[test]
    fn trimap_classifies_by_threshold(
        mask in mask(),
        (background_threshold, gap) in (0u8..=254, 1u8..=255)
    ) {
        let foreground_threshold = background_threshold.saturating_add(gap);
        let trimap = mask.trimap(foreground_threshold, background_threshold, 0);

        for (m, t) in mask.pixels().zip(trimap.pixels()) {
            let expected = if m[0] > foreground_threshold {
                TRIMAP_FOREGROUND
            } else if m[0] < background_threshold {
                TRIMAP_BACKGROUND
            } else {
                TRIMAP_UNKNOWN
            };
            prop_assert_eq!(t[0], expected);
        }
    }

    /// Property: Larger erosion never grows the definite regions
    #[test]
    fn erosion_never_grows_definite_regions(mask in mask(), size in 0u32..6) {
        let count = |erode_size: u32| {
            let trimap = TrimapBuilder::new(240, 10, erode_size).build(&mask);
            let foreground = trimap.pixels().filter(|p| p[0] == TRIMAP_FOREGROUND).count();
            let background = trimap.pixels().filter(|p| p[0] == TRIMAP_BACKGROUND).count();
            (foreground, background)
        };

        let (foreground, background) = count(size);
        let (eroded_foreground, eroded_background) = count(size + 1);
        prop_assert!(eroded_foreground <= foreground);
        prop_assert!(eroded_background <= background);
    }

    /// Property: Trimaps only ever hold the three canonical values
    #[test]
    fn trimap_values_are_canonical(mask in mask(), size in 0u32..8) {
        let trimap = mask.trimap(240, 10, size);
        prop_assert!(trimap
            .pixels()
            .all(|p| [TRIMAP_BACKGROUND, TRIMAP_UNKNOWN, TRIMAP_FOREGROUND].contains(&p[0])));
    }

    /// Property: The naive cutout is idempotent
    #[test]
    fn naive_cutout_is_idempotent((image, mask) in image_and_mask()) {
        let once = naive_cutout(&DynamicImage::ImageRgb8(image), &mask).unwrap();
        let twice = naive_cutout(&DynamicImage::ImageRgba8(once.clone()), &mask).unwrap();
        prop_assert_eq!(once, twice);
    }

    /// Property: A rejected trimap yields exactly the naive cutout
    #[test]
    fn solver_failure_matches_naive_cutout((image, mask) in image_and_mask()) {
        let image = DynamicImage::ImageRgb8(image);
        let matting = AlphaMatting::new(Rejecting, BlurFusion::default());

        let matted = matting.cutout(&image, &mask, &TrimapBuilder::default()).unwrap();
        prop_assert_eq!(matted, naive_cutout(&image, &mask).unwrap());
    }

    /// Property: Opaque cutouts keep their colors on any background
    #[test]
    fn opaque_cutout_ignores_background(
        (image, _) in image_and_mask(),
        color in rgb_pixel()
    ) {
        let cutout = DynamicImage::ImageRgba8(image.convert());
        let flattened = apply_background(&cutout, BackgroundColor(color));
        prop_assert_eq!(flattened, image);
    }

    /// Property: Transparent cutouts become the background color
    #[test]
    fn transparent_cutout_becomes_background(
        (image, _) in image_and_mask(),
        color in rgb_pixel()
    ) {
        let transparent = Image::from_fn(image.width(), image.height(), |x, y| {
            let Rgb([r, g, b]) = *image.get_pixel(x, y);
            Rgba([r, g, b, 0])
        });

        let flattened =
            apply_background(&DynamicImage::ImageRgba8(transparent), BackgroundColor(color));
        prop_assert!(flattened.pixels().all(|p| *p == color));
    }

    /// Property: Stacking adds heights and keeps the shared width
    #[test]
    fn stack_height_is_sum_of_heights(
        width in 1u32..=12,
        heights in prop::collection::vec(1u32..=8, 1..5)
    ) {
        let parts: Vec<DynamicImage> = heights
            .iter()
            .enumerate()
            .map(|(i, &h)| {
                DynamicImage::ImageRgba8(Image::from_pixel(width, h, Rgba([i as u8, 0, 0, 255])))
            })
            .collect();

        let stacked = stack_vertical(parts.clone()).unwrap();
        prop_assert_eq!((stacked.width(), stacked.height()), (width, heights.iter().sum::<u32>()));

        if parts.len() == 1 {
            prop_assert_eq!(&stacked, &parts[0]);
        }
    }

    /// Property: PNG encoding reproduces the pixels exactly
    #[test]
    fn png_round_trip_is_lossless((image, mask) in image_and_mask()) {
        let cutout = naive_cutout(&DynamicImage::ImageRgb8(image), &mask).unwrap();
        let cutout = DynamicImage::ImageRgba8(cutout);

        let decoded = decode(&encode(&cutout, OutputFormat::Png).unwrap()).unwrap();
        prop_assert_eq!(decoded, cutout);
    }
}
