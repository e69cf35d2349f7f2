use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use shared::models::BookingId;
use shared::{AppError, AppResult, ErrorCode};

/// Durable key → acknowledged booking ids
///
/// A missing key reads as an empty list.
pub trait AlertStore: Send + Sync {
    fn load(&self, key: &str) -> AppResult<Vec<BookingId>>;

    /// Replace the list stored under `key`
    fn save(&self, key: &str, ids: &[BookingId]) -> AppResult<()>;
}

/// All keys in one pretty-printed JSON object on disk
pub struct JsonFileAlertStore {
    path: PathBuf,
    // serializes read-modify-write of the file
    lock: Mutex<()>,
}

impl JsonFileAlertStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> AppResult<BTreeMap<String, Vec<BookingId>>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let json = fs::read_to_string(&self.path).map_err(|e| {
            AppError::storage(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        if json.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&json).map_err(|e| {
            AppError::with_message(
                ErrorCode::StorageCorrupted,
                format!("Alert store {} is damaged: {}", self.path.display(), e),
            )
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, Vec<BookingId>>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::storage(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| AppError::storage(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| {
            AppError::storage(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }
}

impl AlertStore for JsonFileAlertStore {
    fn load(&self, key: &str) -> AppResult<Vec<BookingId>> {
        let _lock = self.lock.lock();
        Ok(self.read_all()?.remove(key).unwrap_or_default())
    }

    fn save(&self, key: &str, ids: &[BookingId]) -> AppResult<()> {
        let _lock = self.lock.lock();
        // A damaged file is rewritten from scratch rather than blocking dismissals
        let mut entries = self.read_all().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding unreadable alert store");
            BTreeMap::new()
        });
        entries.insert(key.to_string(), ids.to_vec());
        self.write_all(&entries)
    }
}

/// Process-local store
#[derive(Default)]
pub struct MemoryAlertStore {
    entries: Mutex<BTreeMap<String, Vec<BookingId>>>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AlertStore for MemoryAlertStore {
    fn load(&self, key: &str) -> AppResult<Vec<BookingId>> {
        Ok(self.entries.lock().get(key).cloned().unwrap_or_default())
    }

    fn save(&self, key: &str, ids: &[BookingId]) -> AppResult<()> {
        self.entries.lock().insert(key.to_string(), ids.to_vec());
        Ok(())
    }
}
