//! The editing session: the loaded original, the working copy, and the
//! listeners that want to hear about changes to it.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};

use image::{ColorType, DynamicImage, GenericImageView};
use log::{debug, info};

use crate::error::{LoadError, SaveError};
use crate::operations::Operation;
use crate::persistence::{self, OutputFormat};

/// What `load` hands back about the decoded file.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub color: ColorType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Loaded(ImageInfo),
    Applied(Operation),
    Reset,
    Saved(PathBuf),
}

impl SessionEvent {
    /// Whether the processed image changed, so the preview is stale.
    pub fn changes_image(&self) -> bool {
        !matches!(self, SessionEvent::Saved(_))
    }

    pub fn status_text(&self) -> String {
        match self {
            SessionEvent::Loaded(info) => format!("Loaded: {}", info.filename),
            SessionEvent::Applied(op) => format!("Applied: {}", op),
            SessionEvent::Reset => "Reset to original image".to_string(),
            SessionEvent::Saved(path) => format!("Saved to: {}", file_name(path)),
        }
    }
}

struct Loaded {
    original: DynamicImage,
    processed: DynamicImage,
    filename: String,
}

/// Holds at most one image. Every mutation replaces the working copy
/// wholesale; the original only changes on a successful load.
#[derive(Default)]
pub struct Session {
    image: Option<Loaded>,
    subscribers: Vec<Sender<SessionEvent>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener. Dropping the receiver unsubscribes it.
    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }

    pub fn original(&self) -> Option<&DynamicImage> {
        self.image.as_ref().map(|loaded| &loaded.original)
    }

    pub fn processed(&self) -> Option<&DynamicImage> {
        self.image.as_ref().map(|loaded| &loaded.processed)
    }

    pub fn filename(&self) -> Option<&str> {
        self.image.as_ref().map(|loaded| loaded.filename.as_str())
    }

    /// Decodes `path` and starts a fresh session on it. A failed decode
    /// leaves the current session untouched.
    pub fn load(&mut self, path: &Path) -> Result<ImageInfo, LoadError> {
        let original = persistence::load_image(path)?;
        let (width, height) = original.dimensions();
        let info = ImageInfo {
            filename: file_name(path),
            width,
            height,
            color: original.color(),
        };

        self.image = Some(Loaded {
            processed: original.clone(),
            original,
            filename: info.filename.clone(),
        });
        self.notify(SessionEvent::Loaded(info.clone()));
        Ok(info)
    }

    /// Replaces the working copy with `op` applied to it. Returns false
    /// when nothing is loaded.
    pub fn apply(&mut self, op: Operation) -> bool {
        let Some(loaded) = self.image.as_mut() else {
            debug!("Ignoring {} with no image loaded", op.name());
            return false;
        };
        loaded.processed = op.apply(&loaded.processed);
        debug!("Applied {}", op);
        self.notify(SessionEvent::Applied(op));
        true
    }

    /// Discards every applied operation. Returns false when nothing is
    /// loaded.
    pub fn reset(&mut self) -> bool {
        let Some(loaded) = self.image.as_mut() else {
            return false;
        };
        loaded.processed = loaded.original.clone();
        self.notify(SessionEvent::Reset);
        true
    }

    /// Encodes the working copy. Extensionless paths get the format's
    /// extension (`.jpg` by default); the written path is returned.
    pub fn save(&mut self, path: &Path, format: Option<OutputFormat>) -> Result<PathBuf, SaveError> {
        let processed = self.processed().ok_or(SaveError::NoImage)?;
        let (path, format) = persistence::resolve_output(path, format)?;
        persistence::save_image(processed, &path, format)?;
        self.notify(SessionEvent::Saved(path.clone()));
        Ok(path)
    }

    fn notify(&mut self, event: SessionEvent) {
        info!("{}", event.status_text());
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
