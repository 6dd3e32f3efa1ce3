use crate::cutout::color::BackgroundColor;
use crate::utils::blend_channel;
use crate::Image;
use image::{DynamicImage, Rgb, Rgba};
use imageproc::map::map_colors;

/// Flattens a cutout onto a solid background color
///
/// The cutout's own alpha channel is the paste mask: transparent pixels show
/// `color`, opaque pixels keep the cutout's color, and partial alpha blends
/// as `round((c * a + bg * (255 - a)) / 255)`.
///
/// A grayscale cutout without alpha (a raw mask) is its own paste mask, so
/// white areas stay white and black areas become `color`. Any other cutout
/// without alpha is treated as opaque.
pub fn apply_background(cutout: &DynamicImage, color: BackgroundColor) -> Image<Rgb<u8>> {
    let rgba = match cutout {
        DynamicImage::ImageLuma8(mask) => map_colors(mask, |image::Luma([v])| Rgba([v, v, v, v])),
        other => other.to_rgba8(),
    };

    let Rgb(background) = color.rgb();
    map_colors(&rgba, |Rgba([r, g, b, a])| {
        Rgb([
            blend_channel(r, background[0], a),
            blend_channel(g, background[1], a),
            blend_channel(b, background[2], a),
        ])
    })
}
