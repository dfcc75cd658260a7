//! Durable key/value storage for the chosen locale.
//!
//! The site persists exactly one value (the locale code) under one
//! well-known key, but the collaborator is a plain string store so hosts can
//! back it with whatever they have: browser local storage, a JSON file, or
//! memory in tests.
//!
//! Storage handles take `&self`: the same store is shared between the
//! persisted-preference detector and the locale state writer.

use std::cell::RefCell;
use std::collections::BTreeMap;
#[cfg(feature = "json")]
use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Key under which the active locale is persisted.
pub const LOCALE_STORAGE_KEY: &str = "serrure-safe.locale";

/// Durable client-side string store.
pub trait LocaleStorage {
    /// Read a stored value. Unreadable storage reports `None`.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory storage. Survives "restarts" only as long as the value lives,
/// which is exactly what tests simulating a reload need.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RefCell<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one entry.
    #[must_use]
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        store
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }
}

impl LocaleStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON-object file storage (`{"serrure-safe.locale": "en"}`).
///
/// Writes go to a sibling temp file that is then renamed over the target, so
/// a crash mid-write leaves the previous value intact.
#[cfg(feature = "json")]
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

#[cfg(feature = "json")]
impl FileStorage {
    /// Storage backed by the file at `path`. The file need not exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| StorageError::Corrupt(format!("{}: {e}", self.path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(values)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(feature = "json")]
impl LocaleStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        match self.load() {
            Ok(mut values) => values.remove(key),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "locale storage unreadable");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // A corrupt file is replaced; an unreadable one is left alone.
        let mut values = match self.load() {
            Ok(values) => values,
            Err(StorageError::Corrupt(reason)) => {
                tracing::warn!(path = %self.path.display(), %reason, "replacing corrupt locale storage");
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        values.insert(key.to_string(), value.to_string());
        self.store(&values)
    }
}

impl<S: LocaleStorage + ?Sized> LocaleStorage for &S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

impl<S: LocaleStorage + ?Sized> LocaleStorage for std::rc::Rc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}
