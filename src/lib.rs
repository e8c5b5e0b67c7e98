// Image editing core shared by the CLI and the GUI
pub mod config;
pub mod display;
pub mod error;
pub mod operations;
pub mod persistence;
pub mod session;

pub use config::{Settings, SettingsStore};
pub use display::{fit_dimensions, render, usable_area, DisplayImage, DEFAULT_VIEWPORT};
pub use error::{LoadError, SaveError};
pub use operations::{Operation, DEFAULT_FACTOR, FACTOR_RANGE};
pub use persistence::OutputFormat;
pub use session::{ImageInfo, Session, SessionEvent};
