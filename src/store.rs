//! Persisted user settings and the recent-files list.
//!
//! Storage sits behind [`SettingsStore`] so the application can run against a
//! JSON file in normal use and an in-memory store in tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum number of entries kept in [`RecentFiles`].
pub const RECENT_FILES_CAPACITY: usize = 10;

/// Everything persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Most recent first
    pub recent_files: Vec<PathBuf>,
}

pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<Settings>;
    fn save(&self, settings: &Settings) -> Result<()>;
}

/// Settings kept as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileStore {
    /// A missing file loads as default settings.
    fn load(&self) -> Result<Settings> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Settings::default());
            }
            Err(err) => return Err(Error::io(&self.path, err)),
        };
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json + "\n").map_err(|err| Error::io(&self.path, err))?;
        tracing::debug!(path = %self.path.display(), "saved settings");
        Ok(())
    }
}

/// Settings that live only as long as the store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: Mutex<Settings>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Settings> {
        Ok(self
            .settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        *self.settings.lock().unwrap_or_else(PoisonError::into_inner) = settings.clone();
        Ok(())
    }
}

/// Bounded, most-recent-first list of opened documents.
#[derive(Debug)]
pub struct RecentFiles<S> {
    store: S,
    entries: Vec<PathBuf>,
}

impl<S: SettingsStore> RecentFiles<S> {
    /// Load the list from `store`.
    ///
    /// # Errors
    /// Fails if the store cannot be read.
    pub fn load(store: S) -> Result<Self> {
        let mut entries = store.load()?.recent_files;
        dedup_in_order(&mut entries);
        entries.truncate(RECENT_FILES_CAPACITY);
        Ok(Self { store, entries })
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Move `path` to the front, dropping the oldest entry past capacity.
    ///
    /// # Errors
    /// Fails if the store cannot be written.
    pub fn record(&mut self, path: &Path) -> Result<()> {
        self.entries.retain(|p| p != path);
        self.entries.insert(0, path.to_path_buf());
        self.entries.truncate(RECENT_FILES_CAPACITY);
        self.persist()
    }

    /// # Errors
    /// Fails if the store cannot be written.
    pub fn remove(&mut self, path: &Path) -> Result<bool> {
        let before = self.entries.len();
        self.entries.retain(|p| p != path);
        if self.entries.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// # Errors
    /// Fails if the store cannot be written.
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let mut settings = self.store.load()?;
        settings.recent_files.clone_from(&self.entries);
        self.store.save(&settings)
    }
}

fn dedup_in_order(entries: &mut Vec<PathBuf>) {
    let mut seen = std::collections::HashSet::new();
    entries.retain(|p| seen.insert(p.clone()));
}
