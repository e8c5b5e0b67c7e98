//! The image transforms behind every editing button.
//!
//! Each [`Operation`] is a pure `DynamicImage -> DynamicImage` function: the
//! input is never touched and a fresh image is returned. Geometry and blur
//! are delegated to the `image` crate; the fixed 3x3 kernels and the two
//! enhancers work directly on 8-bit buffers.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Pixel, RgbImage};

/// Valid range for the brightness and contrast factors.
pub const FACTOR_RANGE: RangeInclusive<f32> = 0.1..=3.0;
pub const DEFAULT_FACTOR: f32 = 1.5;

/// Gaussian blur standard deviation in pixels.
const BLUR_SIGMA: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    Blur,
    Sharpen,
    FindEdges,
    Emboss,
    Brightness(f32),
    Contrast(f32),
    Grayscale,
    /// Counter-clockwise, like every rotation here.
    Rotate90,
    Rotate180,
    Rotate270,
    FlipHorizontal,
    FlipVertical,
}

impl Operation {
    pub fn apply(&self, image: &DynamicImage) -> DynamicImage {
        match *self {
            Operation::Blur => image.blur(BLUR_SIGMA),
            Operation::Sharpen => filter3x3(image, &SHARPEN),
            Operation::FindEdges => filter3x3(image, &FIND_EDGES),
            Operation::Emboss => filter3x3(image, &EMBOSS),
            Operation::Brightness(factor) => brightness(image, factor),
            Operation::Contrast(factor) => contrast(image, factor),
            Operation::Grayscale => DynamicImage::ImageRgb8(grayscale_rgb(image)),
            // image's rotate90 turns clockwise
            Operation::Rotate90 => image.rotate270(),
            Operation::Rotate180 => image.rotate180(),
            Operation::Rotate270 => image.rotate90(),
            Operation::FlipHorizontal => image.fliph(),
            Operation::FlipVertical => image.flipv(),
        }
    }

    /// Short command-line name, the inverse of [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Blur => "blur",
            Operation::Sharpen => "sharpen",
            Operation::FindEdges => "edges",
            Operation::Emboss => "emboss",
            Operation::Brightness(_) => "brightness",
            Operation::Contrast(_) => "contrast",
            Operation::Grayscale => "grayscale",
            Operation::Rotate90 => "rotate90",
            Operation::Rotate180 => "rotate180",
            Operation::Rotate270 => "rotate270",
            Operation::FlipHorizontal => "fliph",
            Operation::FlipVertical => "flipv",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operation::Blur => write!(f, "Gaussian Blur"),
            Operation::Sharpen => write!(f, "Sharpen"),
            Operation::FindEdges => write!(f, "Edge Detection"),
            Operation::Emboss => write!(f, "Emboss"),
            Operation::Brightness(factor) => {
                write!(f, "Brightness Enhancement (factor={:.1})", factor)
            }
            Operation::Contrast(factor) => write!(f, "Contrast Enhancement (factor={:.1})", factor),
            Operation::Grayscale => write!(f, "Grayscale Conversion"),
            Operation::Rotate90 => write!(f, "Rotate 90°"),
            Operation::Rotate180 => write!(f, "Rotate 180°"),
            Operation::Rotate270 => write!(f, "Rotate 270°"),
            Operation::FlipHorizontal => write!(f, "Horizontal Flip"),
            Operation::FlipVertical => write!(f, "Vertical Flip"),
        }
    }
}

/// Parses `name` or `name=factor`. The factor is only accepted by
/// `brightness` and `contrast`, which default to [`DEFAULT_FACTOR`].
impl FromStr for Operation {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        let (name, factor) = match input.split_once('=') {
            Some((name, value)) => {
                let factor = value
                    .trim()
                    .parse::<f32>()
                    .map_err(|_| format!("Invalid factor in '{}'", input))?;
                if !FACTOR_RANGE.contains(&factor) {
                    return Err(format!(
                        "Factor {} is outside valid range [{}, {}]",
                        factor,
                        FACTOR_RANGE.start(),
                        FACTOR_RANGE.end()
                    ));
                }
                (name.trim(), Some(factor))
            }
            None => (input, None),
        };

        let op = match name.to_lowercase().as_str() {
            "brightness" => return Ok(Operation::Brightness(factor.unwrap_or(DEFAULT_FACTOR))),
            "contrast" => return Ok(Operation::Contrast(factor.unwrap_or(DEFAULT_FACTOR))),
            "blur" => Operation::Blur,
            "sharpen" => Operation::Sharpen,
            "edges" | "find-edges" => Operation::FindEdges,
            "emboss" => Operation::Emboss,
            "grayscale" | "greyscale" => Operation::Grayscale,
            "rotate90" => Operation::Rotate90,
            "rotate180" => Operation::Rotate180,
            "rotate270" => Operation::Rotate270,
            "fliph" => Operation::FlipHorizontal,
            "flipv" => Operation::FlipVertical,
            _ => return Err(format!("Unknown operation: {}", name)),
        };
        if factor.is_some() {
            return Err(format!("Operation '{}' does not take a factor", name));
        }
        Ok(op)
    }
}

/// Forces a factor into [`FACTOR_RANGE`]; NaN falls back to the default.
pub fn clamp_factor(factor: f32) -> f32 {
    if factor.is_nan() {
        DEFAULT_FACTOR
    } else {
        factor.clamp(*FACTOR_RANGE.start(), *FACTOR_RANGE.end())
    }
}

struct Kernel {
    weights: [i32; 9],
    scale: i32,
    offset: i32,
}

impl Kernel {
    fn finish(&self, sum: i32) -> u8 {
        to_u8(sum as f32 / self.scale as f32 + self.offset as f32)
    }
}

const SHARPEN: Kernel = Kernel {
    weights: [-2, -2, -2, -2, 32, -2, -2, -2, -2],
    scale: 16,
    offset: 0,
};

const FIND_EDGES: Kernel = Kernel {
    weights: [-1, -1, -1, -1, 8, -1, -1, -1, -1],
    scale: 1,
    offset: 0,
};

const EMBOSS: Kernel = Kernel {
    weights: [-1, 0, 0, 0, 1, 0, 0, 0, 0],
    scale: 1,
    offset: 128,
};

/// Rounds to the nearest level. Enhancement can differ from a truncating
/// blend by one level on exact halves.
fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

// Runs `$body` against the image as an 8-bit buffer bound to `$buf`,
// converting wider formats to Rgb8/Rgba8 first.
macro_rules! map_8bit {
    ($image:expr, $buf:ident => $body:expr) => {
        match $image {
            DynamicImage::ImageLuma8($buf) => DynamicImage::ImageLuma8($body),
            DynamicImage::ImageLumaA8($buf) => DynamicImage::ImageLumaA8($body),
            DynamicImage::ImageRgb8($buf) => DynamicImage::ImageRgb8($body),
            DynamicImage::ImageRgba8($buf) => DynamicImage::ImageRgba8($body),
            other if other.color().has_alpha() => {
                let $buf = &other.to_rgba8();
                DynamicImage::ImageRgba8($body)
            }
            other => {
                let $buf = &other.to_rgb8();
                DynamicImage::ImageRgb8($body)
            }
        }
    };
}

fn filter3x3(image: &DynamicImage, kernel: &Kernel) -> DynamicImage {
    map_8bit!(image, buffer => convolve(buffer, kernel))
}

/// Convolves every channel, alpha included. The outermost ring of pixels
/// is copied unchanged.
fn convolve<P>(src: &ImageBuffer<P, Vec<u8>>, kernel: &Kernel) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = src.dimensions();
    let mut out = src.clone();
    if width < 3 || height < 3 {
        return out;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut sums = [0i32; 4];
            for (i, &weight) in kernel.weights.iter().enumerate() {
                if weight == 0 {
                    continue;
                }
                let sx = x + (i % 3) as u32 - 1;
                let sy = y + (i / 3) as u32 - 1;
                for (sum, &value) in sums.iter_mut().zip(src.get_pixel(sx, sy).channels()) {
                    *sum += weight * value as i32;
                }
            }
            for (value, &sum) in out.get_pixel_mut(x, y).channels_mut().iter_mut().zip(&sums) {
                *value = kernel.finish(sum);
            }
        }
    }
    out
}

fn brightness(image: &DynamicImage, factor: f32) -> DynamicImage {
    let table = lookup_table(|value| value * factor);
    map_8bit!(image, buffer => map_color_channels(buffer, &table))
}

fn contrast(image: &DynamicImage, factor: f32) -> DynamicImage {
    let mean = mean_luma(image);
    let table = lookup_table(|value| mean + factor * (value - mean));
    map_8bit!(image, buffer => map_color_channels(buffer, &table))
}

/// ITU-R 601-2 luma in integer arithmetic.
fn luma_601(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114 + 500) / 1000) as u8
}

/// Luminance of every pixel. Alpha is ignored.
fn to_luma(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(buffer) => buffer.clone(),
        DynamicImage::ImageLumaA8(buffer) => {
            GrayImage::from_fn(buffer.width(), buffer.height(), |x, y| Luma([buffer.get_pixel(x, y)[0]]))
        }
        other => {
            let rgb = other.to_rgb8();
            GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                let [r, g, b] = rgb.get_pixel(x, y).0;
                Luma([luma_601(r, g, b)])
            })
        }
    }
}

/// Luminance expanded back to three equal channels.
fn grayscale_rgb(image: &DynamicImage) -> RgbImage {
    let luma = to_luma(image);
    RgbImage::from_fn(luma.width(), luma.height(), |x, y| {
        let [v] = luma.get_pixel(x, y).0;
        image::Rgb([v, v, v])
    })
}

/// Rounded average luminance, the gray level contrast pivots around.
fn mean_luma(image: &DynamicImage) -> f32 {
    let luma = to_luma(image);
    let count = luma.as_raw().len();
    if count == 0 {
        return 0.0;
    }
    let total: u64 = luma.as_raw().iter().map(|&v| v as u64).sum();
    (total as f64 / count as f64).round() as f32
}

fn lookup_table(f: impl Fn(f32) -> f32) -> [u8; 256] {
    let mut table = [0u8; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        *entry = to_u8(f(i as f32));
    }
    table
}

/// Remaps luma/RGB channels through `table`, leaving alpha untouched.
fn map_color_channels<P>(src: &ImageBuffer<P, Vec<u8>>, table: &[u8; 256]) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let channels = P::CHANNEL_COUNT as usize;
    // LumaA and Rgba carry alpha last
    let color_channels = if channels % 2 == 0 { channels - 1 } else { channels };

    let mut out = src.clone();
    for pixel in out.pixels_mut() {
        for value in pixel.channels_mut().iter_mut().take(color_channels) {
            *value = table[*value as usize];
        }
    }
    out
}
