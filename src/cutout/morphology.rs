//! Binary erosion of 0/255 planes with a square structuring element.

use image::{GrayImage, Luma};
use imageproc::map::map_colors;
use imageproc::morphology::{grayscale_erode, Mask};

/// Value of a set pixel in a binary plane
pub const SET: u8 = 255;

/// Furthest a single segment mask reaches on either side of its origin
const MAX_REACH: u32 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Marks every pixel of `image` for which `predicate` holds
///
/// Marked pixels become [`SET`], the others 0.
pub fn threshold_plane<F>(image: &GrayImage, predicate: F) -> GrayImage
where
    F: Fn(u8) -> bool,
{
    map_colors(image, |Luma([value])| {
        Luma([if predicate(value) { SET } else { 0 }])
    })
}

/// Erodes a binary plane with a `size` x `size` square
///
/// The square's origin sits at `size / 2`, so an even size reaches one
/// pixel further up and left than down and right. Samples outside the
/// image read as `border`: `true` lets a region touching the edge keep its
/// edge pixels, `false` peels them off. A size of zero returns the plane
/// unchanged.
#[must_use]
pub fn erode_square(plane: &GrayImage, size: u32, border: bool) -> GrayImage {
    let (width, height) = plane.dimensions();
    if size == 0 || width == 0 || height == 0 {
        return plane.clone();
    }

    let before = size / 2;
    let after = size - 1 - before;

    // A reach past the last pixel of a line adds nothing once outside
    // samples count as set, so each axis is clamped to its length.
    let rows = erode_segment(
        plane,
        before.min(width - 1),
        after.min(width - 1),
        Axis::Horizontal,
    );
    let mut eroded = erode_segment(
        &rows,
        before.min(height - 1),
        after.min(height - 1),
        Axis::Vertical,
    );

    if !border {
        // 画像外へはみ出す窓は必ず未設定の画素を含む
        let inside = |p: u32, len: u32| {
            p >= before && u64::from(p) + u64::from(after) < u64::from(len)
        };
        for (x, y, pixel) in eroded.enumerate_pixels_mut() {
            if !(inside(x, width) && inside(y, height)) {
                *pixel = Luma([0]);
            }
        }
    }

    eroded
}

/// Erodes along one axis over the window `[-before, after]`
///
/// `grayscale_erode` skips samples outside the image. Reaches longer than
/// one mask can hold are split into consecutive passes whose windows add up
/// to the full segment.
fn erode_segment(plane: &GrayImage, mut before: u32, mut after: u32, axis: Axis) -> GrayImage {
    let mut eroded = plane.clone();

    while before > 0 || after > 0 {
        let (reach_before, reach_after) = (before.min(MAX_REACH), after.min(MAX_REACH));
        eroded = grayscale_erode(&eroded, &segment_mask(reach_before, reach_after, axis));
        before -= reach_before;
        after -= reach_after;
    }

    eroded
}

fn segment_mask(before: u32, after: u32, axis: Axis) -> Mask {
    let length = before + after + 1;
    // before <= MAX_REACH
    let origin = before as u8;

    match axis {
        Axis::Horizontal => {
            Mask::from_image(&GrayImage::from_pixel(length, 1, Luma([SET])), origin, 0)
        }
        Axis::Vertical => {
            Mask::from_image(&GrayImage::from_pixel(1, length, Luma([SET])), 0, origin)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane(width: u32, height: u32, set: impl Fn(u32, u32) -> bool) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| Luma([if set(x, y) { SET } else { 0 }]))
    }

    fn count(plane: &GrayImage) -> usize {
        plane.pixels().filter(|p| p[0] == SET).count()
    }

    fn is_set(plane: &GrayImage, x: u32, y: u32) -> bool {
        plane.get_pixel(x, y)[0] == SET
    }

    /// Window-by-window erosion used to cross-check the separable passes
    fn erode_by_windows(plane: &GrayImage, size: u32, border: bool) -> GrayImage {
        let (width, height) = plane.dimensions();
        let (w, h) = (i64::from(width), i64::from(height));
        let before = i64::from(size / 2);
        let after = i64::from(size) - 1 - before;

        GrayImage::from_fn(width, height, |x, y| {
            let (x0, x1) = (i64::from(x) - before, i64::from(x) + after);
            let (y0, y1) = (i64::from(y) - before, i64::from(y) + after);
            let leaves = x0 < 0 || y0 < 0 || x1 >= w || y1 >= h;

            let set = if leaves && !border {
                false
            } else {
                (y0.max(0)..=y1.min(h - 1)).all(|sy| {
                    (x0.max(0)..=x1.min(w - 1))
                        .all(|sx| plane.get_pixel(sx as u32, sy as u32)[0] == SET)
                })
            };
            Luma([if set { SET } else { 0 }])
        })
    }

    #[test]
    fn threshold_plane_marks_matching_pixels() {
        let image = GrayImage::from_fn(4, 1, |x, _| Luma([(x * 80) as u8]));
        let marked = threshold_plane(&image, |v| v > 100);
        let values: Vec<u8> = marked.pixels().map(|p| p[0]).collect();
        assert_eq!(values, vec![0, 0, SET, SET]);
    }

    #[test]
    fn zero_size_is_identity() {
        let region = plane(5, 5, |x, y| (x + y) % 2 == 0);
        assert_eq!(erode_square(&region, 0, false), region);
        assert_eq!(erode_square(&region, 0, true), region);
    }

    #[test]
    fn size_one_is_identity() {
        let region = plane(5, 5, |x, y| (x + y) % 3 == 0);
        assert_eq!(erode_square(&region, 1, false), region);
    }

    #[test]
    fn border_false_peels_full_plane_edges() {
        let region = plane(5, 5, |_, _| true);
        let eroded = erode_square(&region, 3, false);

        assert_eq!(count(&eroded), 9);
        assert!(!is_set(&eroded, 0, 0));
        assert!(is_set(&eroded, 1, 1));
        assert!(is_set(&eroded, 3, 3));
        assert!(!is_set(&eroded, 4, 2));
    }

    #[test]
    fn border_true_keeps_full_plane() {
        let region = plane(5, 5, |_, _| true);
        assert_eq!(count(&erode_square(&region, 3, true)), 25);
    }

    #[test]
    fn even_size_extends_towards_origin() {
        // 左端の1列だけが未設定
        let region = plane(6, 1, |x, _| x > 0);
        let eroded = erode_square(&region, 2, true);

        // origin = 1: pixel x survives when x-1 and x are set
        assert!(!is_set(&eroded, 0, 0));
        assert!(!is_set(&eroded, 1, 0));
        assert!(is_set(&eroded, 2, 0));
        assert!(is_set(&eroded, 5, 0));
    }

    #[test]
    fn erosion_shrinks_a_square_block() {
        let region = plane(9, 9, |x, y| (2..=6).contains(&x) && (2..=6).contains(&y));
        let eroded = erode_square(&region, 3, false);

        assert_eq!(count(&eroded), 9);
        assert!(is_set(&eroded, 3, 3));
        assert!(!is_set(&eroded, 2, 2));
    }

    #[test]
    fn small_sizes_match_window_erosion() {
        let region = plane(11, 7, |x, y| (x * 5 + y * 3) % 11 != 0);

        for size in 1..=8 {
            for border in [false, true] {
                assert_eq!(
                    erode_square(&region, size, border),
                    erode_by_windows(&region, size, border),
                    "size {size}, border {border}"
                );
            }
        }
    }

    #[test]
    fn long_reach_is_split_into_passes() {
        // Two unset pixels on the middle row; size 601 needs chained masks
        let region = plane(700, 3, |x, y| !(y == 1 && (x == 20 || x == 680)));

        let eroded = erode_square(&region, 601, true);
        assert_eq!(eroded, erode_by_windows(&region, 601, true));
        // Windows span x - 300 ..= x + 300, clear of both holes for 321..=379
        assert!(is_set(&eroded, 321, 0));
        assert!(is_set(&eroded, 379, 2));
        assert!(!is_set(&eroded, 320, 1));
        assert!(!is_set(&eroded, 380, 1));

        assert_eq!(count(&erode_square(&region, 601, false)), 0);
    }

    #[test]
    fn huge_size_is_clamped_to_the_plane() {
        let full = plane(8, 8, |_, _| true);
        assert_eq!(count(&erode_square(&full, u32::MAX, true)), 64);
        assert_eq!(count(&erode_square(&full, u32::MAX, false)), 0);

        let holed = plane(8, 8, |x, y| (x, y) != (7, 7));
        assert_eq!(count(&erode_square(&holed, u32::MAX, true)), 0);
    }
}
