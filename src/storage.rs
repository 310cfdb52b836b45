//! Durable key-value storage and the persisted auth flag.
//!
//! DESIGN
//! ======
//! The shell persists exactly one fact: the user has been seen signed in
//! before. `KvStore` is the storage seam (a JSON file on disk in production,
//! a shared map in memory for tests and ephemeral runs). `AuthFlag` sits on
//! top and owns the policy for that one key.
//!
//! ERROR HANDLING
//! ==============
//! Storage failures never escape `AuthFlag`. A failed read is treated as
//! "flag absent"; a failed write is logged and the caller carries on. The
//! worst case is one extra sign-in round trip, never a stuck shell.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tracing::warn;

/// Value written for a set flag.
pub const FLAG_TRUE: &str = "true";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// String key-value store scoped to the application.
pub trait KvStore: Send + 'static {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

// =============================================================================
// FILE STORE
// =============================================================================

/// JSON object file, e.g. `{"kagiLoggedIn":"true"}`.
///
/// Every write rewrites the whole file through a temp file and a rename, so a
/// crash mid-write leaves either the old or the new contents.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, String>, StorageError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(source) => return Err(StorageError::Io { path: self.path.clone(), source }),
        };
        serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt { path: self.path.clone(), source })
    }

    fn io_err(&self, source: std::io::Error) -> StorageError {
        StorageError::Io { path: self.path.clone(), source }
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = match self.load() {
            Ok(entries) => entries,
            Err(e @ StorageError::Corrupt { .. }) => {
                warn!(error = %e, "replacing corrupt storage file");
                HashMap::new()
            }
            Err(e) => return Err(e),
        };
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let body = serde_json::to_vec_pretty(&entries)
            .map_err(|source| StorageError::Corrupt { path: self.path.clone(), source })?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(|e| self.io_err(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;
        Ok(())
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-memory store. Clones share the same map, so a clone handed to a
/// coordinator can be inspected or reused across a simulated restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|e| StorageError::Unavailable(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// =============================================================================
// AUTH FLAG
// =============================================================================

/// The persisted "previously authenticated" flag.
///
/// There is deliberately no way to clear it: once true it stays true.
///
/// The store sits behind a mutex so writes can run on the blocking pool while
/// the coordinator keeps its own handle for reads.
pub struct AuthFlag<S> {
    store: Arc<Mutex<S>>,
    key: Arc<str>,
}

impl<S: KvStore> AuthFlag<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self { store: Arc::new(Mutex::new(store)), key: Arc::from(key.into()) }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the flag is set. Read failures count as unset.
    #[must_use]
    pub fn is_set(&self) -> bool {
        read_flag(&self.store, &self.key)
    }

    /// `is_set` on tokio's blocking pool.
    pub async fn load(&self) -> bool {
        let store = Arc::clone(&self.store);
        let key = Arc::clone(&self.key);
        match tokio::task::spawn_blocking(move || read_flag(&store, &key)).await {
            Ok(set) => set,
            Err(e) => {
                warn!(error = %e, key = %self.key, "auth flag read task failed; treating as unset");
                false
            }
        }
    }

    /// Set the flag on the calling thread. Idempotent; write failures are
    /// logged and swallowed.
    pub fn mark(&self) {
        write_flag(&self.store, &self.key);
    }

    /// Set the flag on tokio's blocking pool, keeping file I/O off the
    /// caller's event loop. The returned handle may be dropped.
    pub fn mark_in_background(&self) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let key = Arc::clone(&self.key);
        tokio::task::spawn_blocking(move || write_flag(&store, &key))
    }
}

fn read_flag<S: KvStore>(store: &Mutex<S>, key: &str) -> bool {
    let value = store.lock().unwrap_or_else(PoisonError::into_inner).get(key);
    match value {
        Ok(value) => value.as_deref() == Some(FLAG_TRUE),
        Err(e) => {
            warn!(error = %e, key, "auth flag read failed; treating as unset");
            false
        }
    }
}

fn write_flag<S: KvStore>(store: &Mutex<S>, key: &str) {
    let result = store.lock().unwrap_or_else(PoisonError::into_inner).set(key, FLAG_TRUE);
    if let Err(e) = result {
        warn!(error = %e, key, "auth flag write failed");
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
