use crate::error::BoxFilterError;
use crate::Image;
use image::Luma;

/// Summed-area table over a single `f32` plane
///
/// Entry `(x, y)` holds the sum of every source value in the rectangle from
/// the origin to `(x - 1, y - 1)`, so the table is one row and one column
/// larger than the source and needs no edge branches when queried.
/// Sums are accumulated in `f64`; the solvers call this once per iteration on
/// planes whose totals would lose precision in `f32`.
#[derive(Debug, Clone)]
pub struct SummedAreaTable {
    data: Vec<f64>,
    width: u32,
    height: u32,
}

/// Trait for building a summed-area table from an image
pub trait CreateSummedAreaTable {
    /// Builds the summed-area table of the image
    ///
    /// # Errors
    ///
    /// * `BoxFilterError::EmptyImage` - When the image has no pixels
    fn create_summed_area_table(&self) -> Result<SummedAreaTable, BoxFilterError>;
}

impl CreateSummedAreaTable for Image<Luma<f32>> {
    fn create_summed_area_table(&self) -> Result<SummedAreaTable, BoxFilterError> {
        let (width, height) = self.dimensions();
        SummedAreaTable::from_data(self.as_raw(), width, height)
    }
}

impl SummedAreaTable {
    /// Builds a table from row-major plane data
    ///
    /// # Errors
    ///
    /// * `BoxFilterError::EmptyImage` - When either dimension is zero
    /// * `BoxFilterError::SizeMismatch` - When `data` is not `width * height` long
    pub fn from_data<T>(data: &[T], width: u32, height: u32) -> Result<Self, BoxFilterError>
    where
        T: Copy + Into<f64>,
    {
        if width == 0 || height == 0 {
            return Err(BoxFilterError::EmptyImage);
        }
        if data.len() != (width as usize) * (height as usize) {
            return Err(BoxFilterError::SizeMismatch {
                expected: (width, height),
                actual: (data.len() as u32, 1),
            });
        }

        let stride = width as usize + 1;
        let mut table = vec![0.0f64; stride * (height as usize + 1)];

        for (y, row) in data.chunks_exact(width as usize).enumerate() {
            let mut row_sum = 0.0f64;
            for (x, &value) in row.iter().enumerate() {
                // sat(x, y) = row prefix + sat(x, y - 1)
                row_sum += value.into();
                table[(y + 1) * stride + x + 1] = row_sum + table[y * stride + x + 1];
            }
        }

        Ok(Self {
            data: table,
            width,
            height,
        })
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Sum of the inclusive rectangle `[x1, x2] x [y1, y2]`
    ///
    /// Coordinates must satisfy `x1 <= x2 < width` and `y1 <= y2 < height`.
    #[inline]
    pub fn rectangle_sum(&self, x1: u32, y1: u32, x2: u32, y2: u32) -> f64 {
        let stride = self.width as usize + 1;
        let (x1, y1) = (x1 as usize, y1 as usize);
        let (x2, y2) = (x2 as usize + 1, y2 as usize + 1);

        self.data[y2 * stride + x2] - self.data[y1 * stride + x2] - self.data[y2 * stride + x1]
            + self.data[y1 * stride + x1]
    }
}
