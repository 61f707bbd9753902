//! Durable client-side token storage.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::LensKitError;

/// Fixed key the access token is persisted under.
pub const AUTH_TOKEN_KEY: &str = "lens-auth-token";

/// Key-value store for session tokens. The browser build backs this with
/// local storage; native builds use [`FileTokenStore`].
pub trait TokenStore: Send + Sync {
    /// Reads the value at `key`, if present.
    ///
    /// # Errors
    /// Returns an error if the read fails.
    fn get(&self, key: &str) -> Result<Option<String>, LensKitError>;

    /// Writes `value` at `key`.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    fn put(&self, key: &str, value: &str) -> Result<(), LensKitError>;

    /// Deletes the value at `key`.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    fn delete(&self, key: &str) -> Result<(), LensKitError>;
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, LensKitError> {
        Ok(self.entries.lock().map_err(poisoned)?.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), LensKitError> {
        self.entries
            .lock()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), LensKitError> {
        self.entries.lock().map_err(poisoned)?.remove(key);
        Ok(())
    }
}

/// File-backed store holding a JSON map. Writes go to a temporary file which
/// is renamed over the target, so a crash never leaves a torn file.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileTokenStore {
    /// Opens a store at `path`, loading existing entries. A missing file is
    /// an empty store.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LensKitError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let bytes = std::fs::read(&path)
                .map_err(|err| LensKitError::Storage(format!("read {}: {err}", path.display())))?;
            serde_json::from_slice(&bytes)
                .map_err(|err| LensKitError::Storage(format!("parse {}: {err}", path.display())))?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), LensKitError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| {
                LensKitError::Storage(format!("create {}: {err}", parent.display()))
            })?;
        }
        let bytes = serde_json::to_vec_pretty(entries)
            .map_err(|err| LensKitError::Storage(format!("encode token store: {err}")))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, bytes)
            .map_err(|err| LensKitError::Storage(format!("write {}: {err}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path).map_err(|err| {
            LensKitError::Storage(format!("rename {}: {err}", self.path.display()))
        })
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, LensKitError> {
        Ok(self.entries.lock().map_err(poisoned)?.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), LensKitError> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn delete(&self, key: &str) -> Result<(), LensKitError> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        entries.remove(key);
        self.persist(&entries)
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> LensKitError {
    LensKitError::Storage("token store lock poisoned".to_string())
}
