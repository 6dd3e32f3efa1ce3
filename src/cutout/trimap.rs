use crate::cutout::morphology::{erode_square, threshold_plane, SET};
use crate::Image;
use image::Luma;
use imageproc::map::map_colors2;

/// Trimap value of definite background pixels
pub const TRIMAP_BACKGROUND: u8 = 0;
/// Trimap value of pixels left for the matting solver
pub const TRIMAP_UNKNOWN: u8 = 128;
/// Trimap value of definite foreground pixels
pub const TRIMAP_FOREGROUND: u8 = 255;

/// Parameters turning a probability mask into a trimap
///
/// `foreground_threshold` is expected to be greater than
/// `background_threshold`. Other orderings still produce a trimap, just a
/// degenerate one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimapBuilder {
    pub foreground_threshold: u8,
    pub background_threshold: u8,
    pub erode_size: u32,
}

impl Default for TrimapBuilder {
    fn default() -> Self {
        Self {
            foreground_threshold: 240,
            background_threshold: 10,
            erode_size: 10,
        }
    }
}

impl TrimapBuilder {
    pub const fn new(foreground_threshold: u8, background_threshold: u8, erode_size: u32) -> Self {
        Self {
            foreground_threshold,
            background_threshold,
            erode_size,
        }
    }

    /// Builds the trimap for `mask`
    ///
    /// Pixels brighter than the foreground threshold become 255, pixels
    /// darker than the background threshold become 0, everything else 128.
    /// With a non-zero erode size both definite regions are first eroded by a
    /// square of that side, widening the unknown band. The background region
    /// treats the outside of the image as background while eroding, the
    /// foreground region does not, so foreground never survives right at the
    /// image edge through erosion alone. Foreground is written last and wins
    /// wherever both regions claim a pixel.
    pub fn build(&self, mask: &Image<Luma<u8>>) -> Image<Luma<u8>> {
        let foreground_threshold = self.foreground_threshold;
        let background_threshold = self.background_threshold;

        let foreground = erode_square(
            &threshold_plane(mask, |v| v > foreground_threshold),
            self.erode_size,
            false,
        );
        let background = erode_square(
            &threshold_plane(mask, |v| v < background_threshold),
            self.erode_size,
            true,
        );

        map_colors2(&foreground, &background, |Luma([fg]), Luma([bg])| {
            Luma([match (fg == SET, bg == SET) {
                (true, _) => TRIMAP_FOREGROUND,
                (false, true) => TRIMAP_BACKGROUND,
                (false, false) => TRIMAP_UNKNOWN,
            }])
        })
    }
}

/// Extension trait building a trimap directly from a mask
pub trait Trimap {
    /// See [`TrimapBuilder::build`]
    fn trimap(
        &self,
        foreground_threshold: u8,
        background_threshold: u8,
        erode_size: u32,
    ) -> Image<Luma<u8>>;
}

impl Trimap for Image<Luma<u8>> {
    fn trimap(
        &self,
        foreground_threshold: u8,
        background_threshold: u8,
        erode_size: u32,
    ) -> Image<Luma<u8>> {
        TrimapBuilder::new(foreground_threshold, background_threshold, erode_size).build(self)
    }
}
