// Preference persistence module
// Stores user preferences (the selected target language) in a JSON file

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};
use thiserror::Error;
use tracing::warn;

/// Key of the selected target language
pub const SELECTED_LANGUAGE_KEY: &str = "selected-language";

/// Language used when nothing was selected yet
pub const DEFAULT_LANGUAGE: &str = "German";

/// Target languages offered by the language selector
pub const SUPPORTED_LANGUAGES: [&str; 6] =
    ["French", "German", "English", "Arabic", "Spanish", "Chinese"];

const FORMAT_VERSION: u32 = 1;

/// Error types for persistence operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// File I/O error
    #[error("IO Error: {0}")]
    IoError(String),
    /// JSON serialization/deserialization error
    #[error("JSON Error: {0}")]
    JsonError(String),
    /// Invalid data format
    #[error("Invalid Data: {0}")]
    InvalidData(String),
}

/// On-disk layout of `preferences.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PreferencesData {
    /// Version of the file format (for future migration support)
    version: u32,
    /// Preference key to value
    values: BTreeMap<String, String>,
}

/// File-backed key/value preference store
///
/// Values are cached in memory; every write is flushed to disk before it
/// becomes visible. Writes do blocking file I/O; async callers should go
/// through `spawn_blocking`.
#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    default_language: String,
    values: RwLock<BTreeMap<String, String>>,
    write_lock: Mutex<()>,
}

impl PreferenceStore {
    /// Load the store from `path`
    ///
    /// A missing file yields an empty store.
    ///
    /// # Arguments
    /// * `path` - Path to the JSON file
    /// * `default_language` - Value returned while no language is selected
    pub fn load<P: AsRef<Path>>(
        path: P,
        default_language: impl Into<String>,
    ) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let json =
                fs::read_to_string(&path).map_err(|e| PersistenceError::IoError(e.to_string()))?;
            let data: PreferencesData = serde_json::from_str(&json)
                .map_err(|e| PersistenceError::JsonError(e.to_string()))?;

            // Validate version (for future migration support)
            if data.version != FORMAT_VERSION {
                return Err(PersistenceError::InvalidData(format!(
                    "Unsupported preferences version: {}",
                    data.version
                )));
            }
            data.values
        } else {
            BTreeMap::new()
        };

        Ok(Self::with_values(path, default_language, values))
    }

    /// Load the store from `path`, starting empty if the file is unreadable
    ///
    /// The broken file is left in place and replaced on the next write.
    pub fn load_or_default<P: AsRef<Path>>(path: P, default_language: impl Into<String>) -> Self {
        let path = path.as_ref();
        let default_language = default_language.into();
        match Self::load(path, default_language.clone()) {
            Ok(store) => store,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to load preferences, using defaults"
                );
                Self::with_values(path.to_path_buf(), default_language, BTreeMap::new())
            }
        }
    }

    fn with_values(
        path: PathBuf,
        default_language: impl Into<String>,
        values: BTreeMap<String, String>,
    ) -> Self {
        Self {
            path,
            default_language: default_language.into(),
            values: RwLock::new(values),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value stored under `key`
    pub fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Store `value` under `key` and write the file
    ///
    /// Readers are not blocked while the file is written; concurrent writers
    /// are serialized.
    pub fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let _writer = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut updated = self
            .values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        updated.insert(key.to_string(), value.to_string());
        self.save(&updated)?;
        *self.values.write().unwrap_or_else(PoisonError::into_inner) = updated;
        Ok(())
    }

    /// Currently selected target language
    pub fn selected_language(&self) -> String {
        self.get(SELECTED_LANGUAGE_KEY)
            .unwrap_or_else(|| self.default_language.clone())
    }

    /// Select a target language
    pub fn set_selected_language(&self, language: &str) -> Result<(), PersistenceError> {
        if language.trim().is_empty() {
            return Err(PersistenceError::InvalidData(
                "Language cannot be empty".to_string(),
            ));
        }
        self.set(SELECTED_LANGUAGE_KEY, language.trim())
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), PersistenceError> {
        let data = PreferencesData {
            version: FORMAT_VERSION,
            values: values.clone(),
        };
        let json = serde_json::to_string_pretty(&data)
            .map_err(|e| PersistenceError::JsonError(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| PersistenceError::IoError(e.to_string()))?;
        }
        fs::write(&self.path, json).map_err(|e| PersistenceError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Default path of the preferences file inside `data_dir`
    pub fn default_path(data_dir: &Path) -> PathBuf {
        data_dir.join("preferences.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_default_language() {
        let dir = TempDir::new().unwrap();
        let store =
            PreferenceStore::load(PreferenceStore::default_path(dir.path()), DEFAULT_LANGUAGE)
                .unwrap();
        assert_eq!(store.selected_language(), "German");
    }

    #[test]
    fn test_selected_language_survives_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let store = PreferenceStore::load(&path, DEFAULT_LANGUAGE).unwrap();
        store.set_selected_language("French").unwrap();
        assert_eq!(store.selected_language(), "French");

        let reloaded = PreferenceStore::load(&path, DEFAULT_LANGUAGE).unwrap();
        assert_eq!(reloaded.selected_language(), "French");
        assert_eq!(
            reloaded.get(SELECTED_LANGUAGE_KEY).as_deref(),
            Some("French")
        );
    }

    #[test]
    fn test_empty_language_rejected() {
        let dir = TempDir::new().unwrap();
        let store = PreferenceStore::load(dir.path().join("p.json"), DEFAULT_LANGUAGE).unwrap();
        assert!(matches!(
            store.set_selected_language("  "),
            Err(PersistenceError::InvalidData(_))
        ));
        assert_eq!(store.selected_language(), "German");
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, r#"{"version": 7, "values": {}}"#).unwrap();

        let err = PreferenceStore::load(&path, DEFAULT_LANGUAGE).unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidData(_)));
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{not json").unwrap();

        let store = PreferenceStore::load_or_default(&path, DEFAULT_LANGUAGE);
        assert_eq!(store.selected_language(), "German");
        assert_eq!(store.path(), path.as_path());

        store.set_selected_language("Spanish").unwrap();
        let reloaded = PreferenceStore::load(&path, DEFAULT_LANGUAGE).unwrap();
        assert_eq!(reloaded.selected_language(), "Spanish");
    }

    #[test]
    fn test_readers_see_value_while_writer_waits() {
        let dir = TempDir::new().unwrap();
        let store = PreferenceStore::load(dir.path().join("p.json"), DEFAULT_LANGUAGE).unwrap();
        store.set_selected_language("Arabic").unwrap();

        let _writer = store.write_lock.lock().unwrap();
        assert_eq!(store.selected_language(), "Arabic");
    }

    #[test]
    fn test_corrupt_file_is_json_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            PreferenceStore::load(&path, DEFAULT_LANGUAGE),
            Err(PersistenceError::JsonError(_))
        ));
    }
}
