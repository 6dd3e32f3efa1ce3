use crate::cutout::summed_area_table::{CreateSummedAreaTable, SummedAreaTable};
use crate::error::BoxFilterError;
use crate::Image;
use image::{Luma, Rgb};

/// Box (mean) filter backed by summed-area tables
///
/// Windows are clipped to the image, and each output pixel is the mean over
/// the pixels actually covered, so the cost does not depend on the radius and
/// radii larger than the image are accepted.
pub trait BoxFilter {
    /// Output type of the filter
    type Output;

    /// Applies the filter with separate horizontal and vertical radii
    ///
    /// # Errors
    ///
    /// * `BoxFilterError::EmptyImage` - When the image has no pixels
    fn box_filter(&self, x_radius: u32, y_radius: u32) -> Result<Self::Output, BoxFilterError>;

    /// Applies the filter with a square window of side `2 * radius + 1`
    fn box_filter_square(&self, radius: u32) -> Result<Self::Output, BoxFilterError> {
        self.box_filter(radius, radius)
    }
}

impl BoxFilter for Image<Luma<f32>> {
    type Output = Self;

    fn box_filter(&self, x_radius: u32, y_radius: u32) -> Result<Self::Output, BoxFilterError> {
        let (width, height) = self.dimensions();
        let sat = self.create_summed_area_table()?;
        let means = mean_values(&sat, x_radius, y_radius)
            .into_iter()
            .map(|v| v as f32)
            .collect();
        Image::from_raw(width, height, means).ok_or(BoxFilterError::EmptyImage)
    }
}

impl BoxFilter for Image<Rgb<f32>> {
    type Output = Self;

    fn box_filter(&self, x_radius: u32, y_radius: u32) -> Result<Self::Output, BoxFilterError> {
        let (width, height) = self.dimensions();

        // 各チャンネルを個別に処理
        let channels = (0..3usize)
            .map(|c| {
                let plane: Vec<f32> = self.pixels().map(|p| p[c]).collect();
                let sat = SummedAreaTable::from_data(&plane, width, height)?;
                Ok(mean_values(&sat, x_radius, y_radius))
            })
            .collect::<Result<Vec<_>, BoxFilterError>>()?;

        let data = channels[0]
            .iter()
            .zip(&channels[1])
            .zip(&channels[2])
            .flat_map(|((&r, &g), &b)| [r as f32, g as f32, b as f32])
            .collect();
        Image::from_raw(width, height, data).ok_or(BoxFilterError::EmptyImage)
    }
}

/// Number of pixels covered by the clipped square window around each pixel
///
/// This is also the number of windows that contain each pixel, which the
/// matting Laplacian needs when summing per-window coefficients.
pub fn window_area(width: u32, height: u32, radius: u32) -> Image<Luma<f32>> {
    Image::from_fn(width, height, |x, y| {
        let (x1, x2) = clipped_span(x, radius, width);
        let (y1, y2) = clipped_span(y, radius, height);
        Luma([((x2 - x1 + 1) * (y2 - y1 + 1)) as f32])
    })
}

#[inline]
const fn clipped_span(center: u32, radius: u32, len: u32) -> (u32, u32) {
    let start = center.saturating_sub(radius);
    let end = center.saturating_add(radius);
    let end = if end > len - 1 { len - 1 } else { end };
    (start, end)
}

/// Mean filter over a row-major `f64` plane with a square window
///
/// # Errors
///
/// * `BoxFilterError::EmptyImage` - When either dimension is zero
/// * `BoxFilterError::SizeMismatch` - When `data` is not `width * height` long
pub fn box_mean(
    data: &[f64],
    width: u32,
    height: u32,
    radius: u32,
) -> Result<Vec<f64>, BoxFilterError> {
    let sat = SummedAreaTable::from_data(data, width, height)?;
    Ok(mean_values(&sat, radius, radius))
}

fn mean_values(sat: &SummedAreaTable, x_radius: u32, y_radius: u32) -> Vec<f64> {
    let (width, height) = (sat.width(), sat.height());
    let mut means = Vec::with_capacity((width as usize) * (height as usize));

    for y in 0..height {
        let (y1, y2) = clipped_span(y, y_radius, height);
        for x in 0..width {
            let (x1, x2) = clipped_span(x, x_radius, width);

            // 境界では実際に覆われた面積で割る
            let area = f64::from((x2 - x1 + 1) * (y2 - y1 + 1));
            means.push(sat.rectangle_sum(x1, y1, x2, y2) / area);
        }
    }

    means
}
