//! Background color specifications
//!
//! Accepted forms, matched case-insensitively after trimming whitespace:
//!
//! - `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa` (the alpha digits are ignored)
//! - `rgb(r, g, b)` and `rgba(r, g, b, a)` with integer or percentage channels
//! - `hsl(h, s%, l%)` and `hsv(h, s%, v%)` (`hsb` is an alias of `hsv`)
//! - CSS / X11 color names such as `red` or `cornflowerblue`

use std::fmt;
use std::str::FromStr;

use image::Rgb;
use palette::{named, Hsl, Hsv, IntoColor, Srgb};

use crate::error::CutoutError;

/// Solid color painted behind a cutout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackgroundColor(pub Rgb<u8>);

impl BackgroundColor {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self(Rgb([red, green, blue]))
    }

    pub const fn rgb(self) -> Rgb<u8> {
        self.0
    }
}

impl From<Rgb<u8>> for BackgroundColor {
    fn from(color: Rgb<u8>) -> Self {
        Self(color)
    }
}

impl From<Srgb<u8>> for BackgroundColor {
    fn from(color: Srgb<u8>) -> Self {
        Self::new(color.red, color.green, color.blue)
    }
}

impl fmt::Display for BackgroundColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Rgb([r, g, b]) = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl FromStr for BackgroundColor {
    type Err = CutoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spec = s.trim().to_ascii_lowercase();
        let parsed = if let Some(hex) = spec.strip_prefix('#') {
            parse_hex(hex)
        } else if let Some(args) = function_args(&spec, &["rgb", "rgba"]) {
            parse_rgb_function(args)
        } else if let Some(args) = function_args(&spec, &["hsl"]) {
            parse_hue_function(args).map(|(hue, saturation, lightness)| {
                let hsl: Hsl = Hsl::new(hue, saturation, lightness);
                to_srgb8(hsl.into_color())
            })
        } else if let Some(args) = function_args(&spec, &["hsv", "hsb"]) {
            parse_hue_function(args).map(|(hue, saturation, value)| {
                let hsv: Hsv = Hsv::new(hue, saturation, value);
                to_srgb8(hsv.into_color())
            })
        } else {
            named::from_str(&spec)
        };

        parsed.map(Self::from).ok_or_else(|| CutoutError::ColorParse {
            input: s.to_string(),
        })
    }
}

/// Parses the digits after `#`, dropping any alpha digits
fn parse_hex(hex: &str) -> Option<Srgb<u8>> {
    // from_str_radix would also take a sign
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let rgb = match hex.len() {
        3 | 4 => &hex[..3],
        6 | 8 => &hex[..6],
        _ => return None,
    };
    rgb.parse().ok()
}

/// Returns the comma-separated arguments of `name(...)` for any of `names`
fn function_args<'a>(spec: &'a str, names: &[&str]) -> Option<Vec<&'a str>> {
    let open = spec.find('(')?;
    let name = spec[..open].trim_end();
    if !names.contains(&name) {
        return None;
    }
    let inner = spec[open + 1..].strip_suffix(')')?;
    Some(inner.split(',').map(str::trim).collect())
}

fn parse_rgb_function(args: Vec<&str>) -> Option<Srgb<u8>> {
    if !(args.len() == 3 || args.len() == 4) {
        return None;
    }

    let channel = |arg: &str| -> Option<u8> {
        match arg.strip_suffix('%') {
            Some(percent) => {
                let value: f32 = percent.trim().parse().ok()?;
                (0.0..=100.0)
                    .contains(&value)
                    .then(|| (value * 255.0 / 100.0 + 0.5) as u8)
            }
            None => arg.parse().ok(),
        }
    };

    Some(Srgb::new(channel(args[0])?, channel(args[1])?, channel(args[2])?))
}

/// Splits `h, s%, x%` into a hue in degrees and two fractions
fn parse_hue_function(args: Vec<&str>) -> Option<(f32, f32, f32)> {
    if args.len() != 3 {
        return None;
    }

    let hue: f32 = args[0].strip_suffix("deg").unwrap_or(args[0]).parse().ok()?;
    let percent = |arg: &str| -> Option<f32> {
        let value: f32 = arg.strip_suffix('%')?.trim().parse().ok()?;
        (0.0..=100.0).contains(&value).then_some(value / 100.0)
    };
    let (second, third) = (percent(args[1])?, percent(args[2])?);

    hue.is_finite().then(|| (hue.rem_euclid(360.0), second, third))
}

fn to_srgb8(color: Srgb) -> Srgb<u8> {
    color.into_format()
}
