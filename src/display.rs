//! Fitting the processed image into the preview pane.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbaImage};

/// Viewport used before the preview pane has a usable size.
pub const DEFAULT_VIEWPORT: (f32, f32) = (600.0, 400.0);

/// Space kept free around the preview inside its pane.
pub const PANE_PADDING: f32 = 20.0;

/// A resampled, render-ready copy of the processed image.
pub struct DisplayImage {
    pub pixels: RgbaImage,
    /// Display size divided by source size.
    pub scale: f32,
}

impl DisplayImage {
    pub fn size(&self) -> [usize; 2] {
        [self.pixels.width() as usize, self.pixels.height() as usize]
    }
}

/// Usable area of a pane, or `None` while the pane is not laid out yet.
pub fn usable_area(pane: (f32, f32)) -> Option<(f32, f32)> {
    let area = (pane.0 - PANE_PADDING, pane.1 - PANE_PADDING);
    if area.0 <= 1.0 || area.1 <= 1.0 {
        None
    } else {
        Some(area)
    }
}

/// Largest size with the image's aspect ratio that fits inside `area`.
/// Small images are scaled up. Never returns a zero side.
pub fn fit_dimensions(image_size: (u32, u32), area: Option<(f32, f32)>) -> (u32, u32) {
    let (area_width, area_height) = area.unwrap_or(DEFAULT_VIEWPORT);
    let (width, height) = image_size;
    if width == 0 || height == 0 {
        return (1, 1);
    }

    let ratio = (area_width / width as f32).min(area_height / height as f32);
    let fitted_width = (width as f32 * ratio) as u32;
    let fitted_height = (height as f32 * ratio) as u32;
    (fitted_width.max(1), fitted_height.max(1))
}

pub fn render(image: &DynamicImage, area: Option<(f32, f32)>) -> DisplayImage {
    let (width, height) = image.dimensions();
    let (fitted_width, fitted_height) = fit_dimensions((width, height), area);
    let pixels = image
        .resize_exact(fitted_width, fitted_height, FilterType::Lanczos3)
        .to_rgba8();
    DisplayImage {
        pixels,
        scale: fitted_width as f32 / width.max(1) as f32,
    }
}
