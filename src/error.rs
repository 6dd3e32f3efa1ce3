use thiserror::Error;

/// Error type for cutout operations
///
/// Every variant is fatal to the call that produced it. Failures of the
/// alpha-estimation solver are reported separately through [`SolverError`]
/// and are recovered inside the alpha-matting compositor.
#[derive(Debug, Error)]
pub enum CutoutError {
    /// The input could not be normalized into an image
    ///
    /// Returned for pixel arrays with an unsupported channel count and for
    /// byte streams whose container format cannot be recognized.
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// The background color specification could not be parsed
    #[error("Unable to parse color specification {input:?}")]
    ColorParse {
        /// The rejected specification
        input: String,
    },

    /// Two images that must share a size do not
    ///
    /// Occurs when a mask does not match its source image, or when cutouts
    /// of different widths are stacked.
    #[error("Image dimensions do not match: expected {expected:?}, actual {actual:?}")]
    DimensionMismatch {
        /// Expected dimensions (width, height)
        expected: (u32, u32),
        /// Actual dimensions (width, height)
        actual: (u32, u32),
    },

    /// An operation that needs at least one image received none
    #[error("At least one image is required")]
    EmptyInput,

    /// Invalid parameter provided to the operation
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Alpha estimation failed
    ///
    /// Only surfaced by [`AlphaMatting::try_cutout`](crate::AlphaMatting::try_cutout);
    /// the pipeline recovers from it with a naive cutout.
    #[error(transparent)]
    Solver(#[from] SolverError),

    /// A box filter rejected its input
    #[error(transparent)]
    Filter(#[from] BoxFilterError),

    /// Decoding or encoding failed
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// A pixel array could not be built from the image data
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

/// Value-domain failures of the alpha-estimation solver
///
/// These never reach the caller of the pipeline. The alpha-matting
/// compositor substitutes a naive cutout for the affected mask.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    /// Image and trimap sizes differ
    #[error("Image and trimap dimensions do not match: image {image:?}, trimap {trimap:?}")]
    DimensionMismatch {
        /// Image dimensions (width, height)
        image: (u32, u32),
        /// Trimap dimensions (width, height)
        trimap: (u32, u32),
    },

    /// The trimap has no definite foreground pixels
    #[error("Trimap does not contain foreground values")]
    NoForeground,

    /// The trimap has no definite background pixels
    #[error("Trimap does not contain background values")]
    NoBackground,

    /// The trimap has nothing left to solve
    #[error("Trimap does not contain unknown values")]
    NoUnknownRegion,

    /// Conjugate gradient stopped before reaching the tolerance
    #[error("Conjugate gradient stopped after {iterations} iterations (residual {residual})")]
    NotConverged {
        /// Iterations performed
        iterations: usize,
        /// Relative residual when stopped
        residual: f32,
    },

    /// The linear system produced NaN or infinite values
    #[error("Solver produced non-finite values")]
    NonFinite,

    /// A box filter inside the solver rejected its input
    #[error(transparent)]
    Filter(#[from] BoxFilterError),
}

/// Error type for box filter operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoxFilterError {
    /// The image has zero width or height
    #[error("Cannot filter an empty image")]
    EmptyImage,

    /// The source plane and the filter plane sizes differ
    #[error("Plane size {actual:?} does not match table size {expected:?}")]
    SizeMismatch {
        /// Table dimensions (width, height)
        expected: (u32, u32),
        /// Plane dimensions (width, height)
        actual: (u32, u32),
    },
}

pub type Result<T, E = CutoutError> = std::result::Result<T, E>;
