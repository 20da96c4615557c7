//! Key-value string storage backends.

use crate::errors::VigilError;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use sha2::{Digest, Sha256};

/// Longest encoded name kept readable. Most filesystems cap a name at 255
/// bytes and a key byte can encode to three.
const MAX_ENCODED_NAME: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage quota exceeded writing '{key}' ({needed} bytes needed, {available} available)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    #[error("storage is unavailable")]
    Unavailable,

    #[error("storage IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl VigilError for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            StorageError::QuotaExceeded { .. } => "STORAGE_QUOTA_EXCEEDED",
            StorageError::Unavailable => "STORAGE_UNAVAILABLE",
            StorageError::Io { .. } => "STORAGE_IO_ERROR",
        }
    }
}

/// Synchronous string store keyed by string.
///
/// Each call is atomic with respect to the others; there is no
/// multi-key transaction.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process store with an optional byte quota.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
    disabled: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys plus values may not exceed `quota_bytes` in total.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// Simulate the platform turning storage off (or back on).
    pub fn set_available(&self, available: bool) {
        self.disabled.store(!available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.disabled.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable);
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_available()?;
        let mut entries = self.lock();

        if let Some(quota) = self.quota_bytes {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = key.len() + value.len();
            let available = quota.saturating_sub(used);
            if needed > available {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available,
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_available()?;
        self.lock().remove(key);
        Ok(())
    }
}

/// One file per key under a directory, written atomically.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<encoded key>.json`. Bytes outside `[A-Za-z0-9_-]` are
    /// percent-encoded so distinct keys never share a file.
    ///
    /// Encodings longer than [`MAX_ENCODED_NAME`] become
    /// `%sha256-<hex>.json`. Percent-encoding never yields `%s`, so hashed
    /// names cannot collide with readable ones.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        let mut name = String::with_capacity(key.len() + 5);
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
                name.push(byte as char);
            } else {
                name.push_str(&format!("%{byte:02X}"));
            }
        }
        if name.len() > MAX_ENCODED_NAME {
            name = format!("%sha256-{}", hex::encode(Sha256::digest(key.as_bytes())));
        }
        name.push_str(".json");
        self.dir.join(name)
    }
}

fn map_io(key: &str, e: std::io::Error) -> StorageError {
    match e.kind() {
        std::io::ErrorKind::StorageFull => StorageError::QuotaExceeded {
            key: key.to_string(),
            needed: 0,
            available: 0,
        },
        _ => StorageError::Io { source: e },
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.entry_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(map_io(key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|e| map_io(key, e))?;

        // Write to a sibling temp file, then rename over the entry
        let mut temp = tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| map_io(key, e))?;
        temp.write_all(value.as_bytes())
            .map_err(|e| map_io(key, e))?;
        temp.persist(self.entry_path(key))
            .map_err(|e| map_io(key, e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(map_io(key, e)),
        }
    }
}
