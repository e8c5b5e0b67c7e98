use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::operations::{clamp_factor, DEFAULT_FACTOR};

const APP_DIR: &str = "imagelab";
const SETTINGS_FILE: &str = "settings.json";

/// User preferences kept between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub brightness_factor: f32,
    pub contrast_factor: f32,
    /// Directory the file dialogs open in.
    pub last_directory: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            brightness_factor: DEFAULT_FACTOR,
            contrast_factor: DEFAULT_FACTOR,
            last_directory: None,
        }
    }
}

impl Settings {
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push(SETTINGS_FILE);
        path
    }

    pub fn load() -> Self {
        Self::load_from(&Self::default_path())
    }

    /// Reads settings from `path`, falling back to defaults when the file
    /// is missing or malformed.
    pub fn load_from(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                debug!("No settings at {}: {}", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_str::<Settings>(&text) {
            Ok(settings) => settings.sanitized(),
            Err(e) => {
                warn!("Ignoring malformed settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("Could not create {}: {}", parent.display(), e);
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(path, json) {
                    warn!("Could not write settings to {}: {}", path.display(), e);
                }
            }
            Err(e) => warn!("Could not serialize settings: {}", e),
        }
    }

    /// Remembers the directory containing `file` for the next dialog.
    pub fn remember_directory(&mut self, file: &Path) {
        if let Some(parent) = file.parent() {
            self.last_directory = Some(parent.to_path_buf());
        }
    }

    fn sanitized(mut self) -> Self {
        self.brightness_factor = clamp_factor(self.brightness_factor);
        self.contrast_factor = clamp_factor(self.contrast_factor);
        self
    }
}

/// Settings bound to their file, written only when they differ from what
/// was last read or written.
pub struct SettingsStore {
    path: PathBuf,
    saved: Settings,
    pub current: Settings,
}

impl SettingsStore {
    pub fn open() -> Self {
        Self::open_at(Settings::default_path())
    }

    pub fn open_at(path: PathBuf) -> Self {
        let saved = Settings::load_from(&path);
        Self {
            current: saved.clone(),
            saved,
            path,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.current != self.saved
    }

    /// Writes pending changes. Returns whether anything was written.
    pub fn flush(&mut self) -> bool {
        if !self.is_dirty() {
            return false;
        }
        self.current.save_to(&self.path);
        self.saved = self.current.clone();
        debug!("Settings written to {}", self.path.display());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            brightness_factor: 0.7,
            contrast_factor: 2.2,
            last_directory: Some(PathBuf::from("/home/me/pictures")),
        };
        settings.save_to(&path);
        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn missing_or_broken_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(Settings::load_from(&path), Settings::default());
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn out_of_range_factors_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"brightness_factor": 9.0, "contrast_factor": -1.0}"#).unwrap();
        let settings = Settings::load_from(&path);
        assert_eq!(settings.brightness_factor, 3.0);
        assert_eq!(settings.contrast_factor, 0.1);
        assert_eq!(settings.last_directory, None);
    }

    #[test]
    fn remembers_parent_directory() {
        let mut settings = Settings::default();
        settings.remember_directory(Path::new("/photos/cat.png"));
        assert_eq!(settings.last_directory, Some(PathBuf::from("/photos")));
    }

    #[test]
    fn store_flushes_only_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut store = SettingsStore::open_at(path.clone());
        assert!(!store.is_dirty());
        assert!(!store.flush());
        assert!(!path.exists());

        store.current.contrast_factor = 0.4;
        assert!(store.is_dirty());
        assert!(store.flush());
        assert!(!store.flush());

        let reopened = SettingsStore::open_at(path);
        assert_eq!(reopened.current.contrast_factor, 0.4);
        assert_eq!(reopened.current.brightness_factor, DEFAULT_FACTOR);
    }
}
