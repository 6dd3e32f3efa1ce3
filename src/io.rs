//! Conversions between the caller's representation and `DynamicImage`
//!
//! Input is normalized once on entry, and the result is converted back to
//! the same kind of value on exit: encoded bytes stay bytes, images stay
//! images, pixel arrays stay pixel arrays.

use std::io::Cursor;
use std::str::FromStr;

use image::{DynamicImage, ImageError, ImageFormat};
use ndarray::Array3;
use tracing::warn;

use crate::error::CutoutError;
use crate::Image;

/// Input accepted by [`remove`](crate::remove)
#[derive(Debug, Clone)]
pub enum CutoutInput {
    /// An encoded image (PNG, JPEG, ...)
    Bytes(Vec<u8>),
    /// A decoded image
    Image(DynamicImage),
    /// Pixels as a `height x width x channels` array with 1 to 4 channels
    Array(Array3<u8>),
}

/// Shape of the value handed back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnType {
    Bytes,
    Image,
    Array,
}

/// Result of [`remove`](crate::remove), of the same kind as its input
#[derive(Debug, Clone, PartialEq)]
pub enum CutoutOutput {
    Bytes(Vec<u8>),
    Image(DynamicImage),
    Array(Array3<u8>),
}

/// Container format used when the result is encoded to bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// Lossless, keeps alpha
    #[default]
    Png,
    /// Lossy, alpha is dropped before encoding
    Jpeg,
}

impl From<Vec<u8>> for CutoutInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for CutoutInput {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<DynamicImage> for CutoutInput {
    fn from(image: DynamicImage) -> Self {
        Self::Image(image)
    }
}

impl From<Array3<u8>> for CutoutInput {
    fn from(array: Array3<u8>) -> Self {
        Self::Array(array)
    }
}

impl CutoutInput {
    pub const fn return_type(&self) -> ReturnType {
        match self {
            Self::Bytes(_) => ReturnType::Bytes,
            Self::Image(_) => ReturnType::Image,
            Self::Array(_) => ReturnType::Array,
        }
    }

    /// Normalizes the input into an image
    ///
    /// # Errors
    ///
    /// * `CutoutError::UnsupportedInput` - When the bytes are in an unknown format or
    ///   the array has an unsupported channel count
    /// * `CutoutError::Image` - When decoding fails
    pub fn into_image(self) -> Result<DynamicImage, CutoutError> {
        match self {
            Self::Bytes(bytes) => decode(&bytes),
            Self::Image(image) => Ok(image),
            Self::Array(array) => array_to_image(&array),
        }
    }
}

impl CutoutOutput {
    /// Converts `image` into the representation named by `return_type`
    ///
    /// # Errors
    ///
    /// * `CutoutError::Image` - When encoding fails
    /// * `CutoutError::Shape` - When the pixel array cannot be built
    pub fn from_image(
        image: DynamicImage,
        return_type: ReturnType,
        format: OutputFormat,
    ) -> Result<Self, CutoutError> {
        Ok(match return_type {
            ReturnType::Bytes => Self::Bytes(encode(&image, format)?),
            ReturnType::Image => Self::Image(image),
            ReturnType::Array => Self::Array(image_to_array(&image)?),
        })
    }

    pub const fn return_type(&self) -> ReturnType {
        match self {
            Self::Bytes(_) => ReturnType::Bytes,
            Self::Image(_) => ReturnType::Image,
            Self::Array(_) => ReturnType::Array,
        }
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn into_image(self) -> Option<DynamicImage> {
        match self {
            Self::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn into_array(self) -> Option<Array3<u8>> {
        match self {
            Self::Array(array) => Some(array),
            _ => None,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = CutoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let extension = s.trim();
        let extension = extension.strip_prefix('.').unwrap_or(extension);
        match extension.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            _ => Err(CutoutError::InvalidParameter(format!(
                "unknown output extension {s:?}"
            ))),
        }
    }
}

impl OutputFormat {
    /// Picks the format for a file extension, falling back to PNG
    pub fn from_extension(extension: &str) -> Self {
        extension.parse().unwrap_or_else(|_| {
            warn!(extension, "unknown output extension, encoding as PNG");
            Self::Png
        })
    }

    pub const fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
        }
    }

    pub const fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

/// Decodes an encoded image, guessing its format from the content
///
/// # Errors
///
/// * `CutoutError::UnsupportedInput` - When the format is not recognized
/// * `CutoutError::Image` - When decoding fails
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, CutoutError> {
    image::load_from_memory(bytes).map_err(|err| match err {
        ImageError::Unsupported(unsupported) => {
            CutoutError::UnsupportedInput(unsupported.to_string())
        }
        other => CutoutError::Image(other),
    })
}

/// Encodes an image in `format`
///
/// JPEG output is flattened to RGB first. PNG keeps the color type when the
/// encoder supports it and falls back to RGBA otherwise.
///
/// # Errors
///
/// * `CutoutError::Image` - When encoding fails
pub fn encode(image: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>, CutoutError> {
    let mut buffer = Cursor::new(Vec::new());

    match (format, image) {
        (OutputFormat::Jpeg, _) => {
            DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut buffer, format.image_format())?;
        }
        (
            OutputFormat::Png,
            DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageRgb8(_)
            | DynamicImage::ImageRgba8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_)
            | DynamicImage::ImageRgb16(_)
            | DynamicImage::ImageRgba16(_),
        ) => image.write_to(&mut buffer, format.image_format())?,
        (OutputFormat::Png, _) => {
            DynamicImage::ImageRgba8(image.to_rgba8())
                .write_to(&mut buffer, format.image_format())?;
        }
    }

    Ok(buffer.into_inner())
}

/// Builds an image from a `height x width x channels` array
///
/// One channel is grayscale, two gray with alpha, three RGB and four RGBA.
///
/// # Errors
///
/// * `CutoutError::UnsupportedInput` - When the channel count is not 1 to 4 or a
///   side does not fit in `u32`
pub fn array_to_image(array: &Array3<u8>) -> Result<DynamicImage, CutoutError> {
    let (height, width, channels) = array.dim();
    let too_large = |_| {
        CutoutError::UnsupportedInput(format!("array of {height}x{width} pixels is too large"))
    };
    let width = u32::try_from(width).map_err(too_large)?;
    let height = u32::try_from(height).map_err(too_large)?;

    // Logical order is row-major HWC whatever the memory layout.
    let data: Vec<u8> = array.iter().copied().collect();
    let mismatch =
        || CutoutError::UnsupportedInput("array data does not match its shape".to_string());

    let image = match channels {
        1 => DynamicImage::ImageLuma8(Image::from_raw(width, height, data).ok_or_else(mismatch)?),
        2 => DynamicImage::ImageLumaA8(Image::from_raw(width, height, data).ok_or_else(mismatch)?),
        3 => DynamicImage::ImageRgb8(Image::from_raw(width, height, data).ok_or_else(mismatch)?),
        4 => DynamicImage::ImageRgba8(Image::from_raw(width, height, data).ok_or_else(mismatch)?),
        other => {
            return Err(CutoutError::UnsupportedInput(format!(
                "arrays with {other} channels are not supported"
            )))
        }
    };

    Ok(image)
}

/// Copies an image into a `height x width x channels` array
///
/// 8-bit grayscale, gray-alpha, RGB and RGBA keep their channel count. Other
/// color types become RGBA when they carry alpha and RGB otherwise.
///
/// # Errors
///
/// * `CutoutError::Shape` - When the array cannot be built from the pixels
pub fn image_to_array(image: &DynamicImage) -> Result<Array3<u8>, CutoutError> {
    let (width, height) = (image.width() as usize, image.height() as usize);

    let (channels, data) = match image {
        DynamicImage::ImageLuma8(buffer) => (1, buffer.as_raw().clone()),
        DynamicImage::ImageLumaA8(buffer) => (2, buffer.as_raw().clone()),
        DynamicImage::ImageRgb8(buffer) => (3, buffer.as_raw().clone()),
        DynamicImage::ImageRgba8(buffer) => (4, buffer.as_raw().clone()),
        other if other.color().has_alpha() => (4, other.to_rgba8().into_raw()),
        other => (3, other.to_rgb8().into_raw()),
    };

    Ok(Array3::from_shape_vec((height, width, channels), data)?)
}
