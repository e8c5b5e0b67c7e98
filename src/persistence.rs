use std::borrow::Cow;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView, ImageFormat};
use log::{debug, info};

use crate::error::{LoadError, SaveError};

/// Extensions offered by the open dialog.
pub const OPEN_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

/// Appended by the save dialog when the chosen name has no extension.
pub const DEFAULT_SAVE_EXTENSION: &str = "jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Bmp,
    Tiff,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Jpeg,
        OutputFormat::Png,
        OutputFormat::Bmp,
        OutputFormat::Tiff,
    ];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            "bmp" => Some(OutputFormat::Bmp),
            "tif" | "tiff" => Some(OutputFormat::Tiff),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, SaveError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext).ok_or_else(|| SaveError::UnsupportedFormat(ext.to_string()))
    }

    /// Extension used in the save dialog filters.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Tiff => "tif",
        }
    }

    pub fn filter_name(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "JPEG files",
            OutputFormat::Png => "PNG files",
            OutputFormat::Bmp => "BMP files",
            OutputFormat::Tiff => "TIFF files",
        }
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Bmp => ImageFormat::Bmp,
            OutputFormat::Tiff => ImageFormat::Tiff,
        }
    }
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| OPEN_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Settles the file to write and its encoding. Extensionless paths take the
/// requested format's extension, or [`DEFAULT_SAVE_EXTENSION`]; an explicit
/// format must agree with any extension already present.
pub fn resolve_output(
    path: &Path,
    format: Option<OutputFormat>,
) -> Result<(PathBuf, OutputFormat), SaveError> {
    let extension = path.extension().map(|ext| ext.to_string_lossy().into_owned());
    match (extension, format) {
        (None, None) => Ok((path.with_extension(DEFAULT_SAVE_EXTENSION), OutputFormat::Jpeg)),
        (None, Some(format)) => Ok((path.with_extension(format.extension()), format)),
        (Some(_), None) => Ok((path.to_path_buf(), OutputFormat::from_path(path)?)),
        (Some(extension), Some(format)) => {
            if OutputFormat::from_extension(&extension) == Some(format) {
                Ok((path.to_path_buf(), format))
            } else {
                Err(SaveError::FormatMismatch {
                    extension,
                    format: format.extension(),
                })
            }
        }
    }
}

pub fn load_image(path: &Path) -> Result<DynamicImage, LoadError> {
    let image = image::open(path).map_err(|source| LoadError {
        path: path.to_path_buf(),
        source,
    })?;
    let (width, height) = image.dimensions();
    info!("Decoded {} ({}x{}, {:?})", path.display(), width, height, image.color());
    Ok(image)
}

/// Encodes `image` to `path` as `format`, whatever the path's extension.
pub fn save_image(image: &DynamicImage, path: &Path, format: OutputFormat) -> Result<(), SaveError> {
    let encodable = encodable(image, format);
    debug!("Encoding {:?} as {:?}", encodable.color(), format);

    encodable
        .save_with_format(path, format.image_format())
        .map_err(|source| SaveError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    info!("Saved {}", path.display());
    Ok(())
}

/// Converts to a color type the target encoder accepts. JPEG has no alpha.
fn encodable(image: &DynamicImage, format: OutputFormat) -> Cow<'_, DynamicImage> {
    match (format, image) {
        (OutputFormat::Jpeg, DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_)) => {
            Cow::Borrowed(image)
        }
        (OutputFormat::Jpeg, other) => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
        (
            _,
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_),
        ) => Cow::Borrowed(image),
        (OutputFormat::Png | OutputFormat::Bmp, DynamicImage::ImageLumaA8(_)) => {
            Cow::Borrowed(image)
        }
        (_, other) if other.color().has_alpha() => {
            Cow::Owned(DynamicImage::ImageRgba8(other.to_rgba8()))
        }
        (_, other) => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
    }
}
