//! Persistence of the last successfully resolved location.

use std::{
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use parking_lot::Mutex;

use crate::model::Coordinates;

/// Capability for remembering the last used location across restarts.
pub trait LocationStore: Send + Sync + Debug {
    /// Overwrite the stored location. Must not block the caller and never fails
    /// from the caller's point of view.
    fn save_last_location(&self, coordinates: Coordinates);

    /// The most recently saved location, if any.
    fn load_last_location(&self) -> Option<Coordinates>;
}

/// Stores the location as a small JSON file.
#[derive(Debug, Clone)]
pub struct FileLocationStore {
    path: PathBuf,
}

impl FileLocationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored location. A missing file is `Ok(None)`.
    pub fn read(&self) -> Result<Option<Coordinates>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read location file: {}", self.path.display()))?;

        let coordinates: Coordinates = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse location file: {}", self.path.display()))?;

        Ok(Some(coordinates))
    }

    /// Write the location, replacing the previous file atomically.
    pub fn write(&self, coordinates: Coordinates) -> Result<()> {
        write_atomic(&self.path, coordinates)
    }
}

fn write_atomic(path: &Path, coordinates: Coordinates) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
    }

    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(&coordinates).context("Failed to serialize location")?;

    fs::write(&tmp, data)
        .with_context(|| format!("Failed to write location file: {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace location file: {}", path.display()))?;

    Ok(())
}

impl LocationStore for FileLocationStore {
    fn save_last_location(&self, coordinates: Coordinates) {
        let path = self.path.clone();
        let persist = move || {
            if let Err(e) = write_atomic(&path, coordinates) {
                tracing::warn!("Failed to save last location: {e:#}");
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(persist);
            }
            Err(_) => persist(),
        }
    }

    fn load_last_location(&self) -> Option<Coordinates> {
        match self.read() {
            Ok(coordinates) => coordinates,
            Err(e) => {
                tracing::warn!("Ignoring stored location: {e:#}");
                None
            }
        }
    }
}

/// Keeps the location in memory only.
#[derive(Debug, Default)]
pub struct MemoryLocationStore {
    last: Mutex<Option<Coordinates>>,
}

impl MemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(coordinates: Coordinates) -> Self {
        Self {
            last: Mutex::new(Some(coordinates)),
        }
    }
}

impl LocationStore for MemoryLocationStore {
    fn save_last_location(&self, coordinates: Coordinates) {
        *self.last.lock() = Some(coordinates);
    }

    fn load_last_location(&self) -> Option<Coordinates> {
        *self.last.lock()
    }
}
