//! Durable key/value storage for the persisted auth and cart state.
//!
//! Every blob is written inside a versioned envelope:
//!
//! ```json
//! { "version": 1, "state": { ... } }
//! ```
//!
//! A blob whose version does not match the current schema, or that no longer
//! decodes, is discarded and the caller starts from the default state.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

/// Storage keys for the persisted blobs.
pub mod keys {
    /// Key for the persisted session (token, expiry, identity).
    pub const AUTH: &str = "auth";

    /// Key for the persisted cart lines and sync gate.
    pub const CART: &str = "cart";

    /// Key for the refresh-token cookie header.
    pub const COOKIES: &str = "cookies";
}

/// Errors from the storage port.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing store failed.
    #[error("storage I/O error for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },

    /// A value could not be encoded.
    #[error("failed to encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Key/value persistence port.
///
/// Implementations only move opaque strings; versioning and encoding live in
/// [`load_versioned`] and [`save_versioned`].
pub trait KeyValueStore: Send + Sync {
    /// Load the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value stored under `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    version: u32,
    state: T,
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    state: &'a T,
}

/// Load and decode a versioned blob.
///
/// Returns `Ok(None)` when nothing is stored, the version differs from
/// `version`, or the blob no longer decodes.
///
/// # Errors
///
/// Returns an error only if the backing store itself fails.
pub fn load_versioned<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
    version: u32,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = store.load(key)? else {
        return Ok(None);
    };

    match serde_json::from_str::<Envelope<T>>(&raw) {
        Ok(envelope) if envelope.version == version => Ok(Some(envelope.state)),
        Ok(envelope) => {
            warn!(
                key,
                stored = envelope.version,
                expected = version,
                "Discarding persisted state with unknown schema version"
            );
            Ok(None)
        }
        Err(e) => {
            warn!(key, error = %e, "Discarding undecodable persisted state");
            Ok(None)
        }
    }
}

/// Encode and store a versioned blob.
///
/// # Errors
///
/// Returns an error if encoding fails or the backing store cannot be written.
pub fn save_versioned<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    version: u32,
    state: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(&EnvelopeRef { version, state }).map_err(|source| {
        StorageError::Encode {
            key: key.to_string(),
            source,
        }
    })?;
    store.save(key, &raw)
}

// =============================================================================
// FileStore
// =============================================================================

/// Stores each key as `<dir>/<key>.json`.
///
/// Writes go through a temporary file and a rename so a crash never leaves a
/// half-written blob behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory holding the blobs.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn io_error(key: &str) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        key: key.to_string(),
        source,
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key)(e)),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(io_error(key))?;
        let path = self.path(key);
        // unique per write and owner-only (0600 on unix)
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_error(key))?;
        tmp.write_all(value.as_bytes()).map_err(io_error(key))?;
        tmp.persist(&path).map_err(|e| io_error(key)(e.error))?;
        debug!(key, path = %path.display(), "Persisted state");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key)(e)),
        }
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-memory store, used by tests and short-lived embeddings.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}
