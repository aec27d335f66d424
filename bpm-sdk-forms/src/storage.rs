//! Key-value persistence for in-progress form state.
//!
//! The browser would offer local storage; a library gets a seam instead.
//! Entries live under `bpmForm:<id>` and hold a timestamp plus the plain
//! variable values (never binary payloads).

use crate::constants;
use crate::error::FormError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Persisted shape of one form's state.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StoredForm {
    /// Epoch milliseconds of the store operation.
    pub date: i64,
    pub vars: BTreeMap<String, Value>,
}

pub trait FormStorage: Send {
    fn get(&self, key: &str) -> Result<Option<String>, FormError>;
    fn put(&mut self, key: &str, value: &str) -> Result<(), FormError>;
    fn remove(&mut self, key: &str) -> Result<(), FormError>;
    fn keys(&self) -> Result<Vec<String>, FormError>;
}

pub fn storage_key(form_id: &str) -> String {
    format!("{}{form_id}", constants::STORAGE_PREFIX)
}

/// Drop every stored form older than `cutoff` (epoch ms). Returns how many
/// entries were removed; unreadable entries are removed too.
pub fn clean_storage(
    storage: &mut dyn FormStorage,
    cutoff: i64,
) -> Result<usize, FormError> {
    let mut removed = 0;
    for key in storage.keys()? {
        if !key.starts_with(constants::STORAGE_PREFIX) {
            continue;
        }
        let stale = match storage.get(&key)? {
            Some(raw) => serde_json::from_str::<StoredForm>(&raw)
                .map(|stored| stored.date < cutoff)
                .unwrap_or(true),
            None => continue,
        };
        if stale {
            storage.remove(&key)?;
            removed += 1;
        }
    }
    Ok(removed)
}

// ─── In-memory backend ────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FormStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, FormError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), FormError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), FormError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, FormError> {
        Ok(self.entries.keys().cloned().collect())
    }
}

// ─── File-backed backend ──────────────────────────────────────

/// One JSON file holding the whole key-value map. Good enough for a
/// desktop embedder; anything heavier should bring its own backend.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_owned(),
        }
    }

    fn load(&self) -> Result<BTreeMap<String, String>, FormError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                serde_json::from_str(&raw).map_err(|e| FormError::Storage(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(FormError::Storage(e.to_string())),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), FormError> {
        let raw =
            serde_json::to_string_pretty(entries).map_err(|e| FormError::Storage(e.to_string()))?;
        std::fs::write(&self.path, raw).map_err(|e| FormError::Storage(e.to_string()))
    }
}

impl FormStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, FormError> {
        Ok(self.load()?.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), FormError> {
        let mut entries = self.load()?;
        entries.insert(key.to_owned(), value.to_owned());
        self.save(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), FormError> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, FormError> {
        Ok(self.load()?.keys().cloned().collect())
    }
}
