use std::path::PathBuf;

use thiserror::Error;

/// The file could not be read or decoded.
#[derive(Debug, Error)]
#[error("Could not load image {}: {source}", path.display())]
pub struct LoadError {
    pub path: PathBuf,
    #[source]
    pub source: image::ImageError,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("No image loaded")]
    NoImage,
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("Output extension .{extension} does not match format {format}")]
    FormatMismatch {
        extension: String,
        format: &'static str,
    },
    #[error("Could not save image to {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
