mod cutout;
mod error;
mod io;
mod pipeline;
mod session;
mod utils;

#[cfg(test)]
mod test_utils;

use image::{ImageBuffer, Pixel};

pub use cutout::alpha_matting::AlphaMatting;
pub use cutout::apply_alpha_mask::{naive_cutout, ApplyAlphaMask, ModifyAlpha};
pub use cutout::background::apply_background;
pub use cutout::blur_fusion::{BlurFusion, ForegroundEstimator};
pub use cutout::box_filter::BoxFilter;
pub use cutout::closed_form::{AlphaEstimator, ClosedFormAlpha};
pub use cutout::color::BackgroundColor;
pub use cutout::stack::{stack_images, stack_vertical};
pub use cutout::summed_area_table::{CreateSummedAreaTable, SummedAreaTable};
pub use cutout::trimap::{
    Trimap, TrimapBuilder, TRIMAP_BACKGROUND, TRIMAP_FOREGROUND, TRIMAP_UNKNOWN,
};
pub use error::{BoxFilterError, CutoutError, Result, SolverError};
pub use io::{
    array_to_image, decode, encode, image_to_array, CutoutInput, CutoutOutput, OutputFormat,
    ReturnType,
};
pub use pipeline::{
    remove, remove_array, remove_bytes, remove_image, CompositeStrategy, CutoutPipeline,
    RemoveOptions,
};
pub use session::{Session, StaticSession};

pub type Image<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;
