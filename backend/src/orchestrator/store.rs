//! Snapshot stores
//!
//! The persisted mirror of a game is one opaque JSON payload. A store only
//! loads, saves and clears that payload; validation lives in `checkpoint`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Load / save / clear contract for the persisted mirror
pub trait SnapshotStore: Send {
    /// The stored payload, `None` when nothing has been saved
    fn load(&self) -> Result<Option<String>, StoreError>;

    /// Replace the stored payload
    fn save(&mut self, payload: &str) -> Result<(), StoreError>;

    /// Remove the stored payload
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// In-memory store
///
/// Clones share the same payload, so a test can keep a handle while the
/// engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    payload: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a payload
    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            payload: Arc::new(Mutex::new(Some(payload.into()))),
        }
    }

    /// Current payload
    pub fn payload(&self) -> Option<String> {
        self.payload.lock().ok().and_then(|p| p.clone())
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        let payload = self.payload.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(payload.clone())
    }

    fn save(&mut self, payload: &str) -> Result<(), StoreError> {
        let mut slot = self.payload.lock().map_err(|_| StoreError::Poisoned)?;
        *slot = Some(payload.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        let mut slot = self.payload.lock().map_err(|_| StoreError::Poisoned)?;
        *slot = None;
        Ok(())
    }
}

/// Single JSON file on disk
///
/// Saves go through a temporary sibling file and a rename, so a crash never
/// leaves a half-written payload behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SnapshotStore for FileStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_error(err)),
        }
    }

    fn save(&mut self, payload: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, payload).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_error(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_clones_share_payload() {
        let handle = MemoryStore::new();
        let mut owned = handle.clone();

        owned.save("{}").unwrap();
        assert_eq!(handle.load().unwrap().as_deref(), Some("{}"));

        owned.clear().unwrap();
        assert_eq!(handle.payload(), None);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("kanban-store-{}", std::process::id()));
        let mut store = FileStore::new(dir.join("game.json"));

        assert_eq!(store.load().unwrap(), None);
        store.save("{\"version\":1}").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("{\"version\":1}"));

        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);

        let _ = fs::remove_dir_all(dir);
    }
}
