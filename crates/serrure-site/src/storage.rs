//! Storage selection from configuration.

use serrure_i18n::{FileStorage, LocaleStorage, MemoryStorage, StorageError};

use crate::config::SiteConfig;

/// Either backend, chosen by `storage_path`.
#[derive(Debug)]
pub enum SiteStorage {
    Memory(MemoryStorage),
    File(FileStorage),
}

impl SiteStorage {
    #[must_use]
    pub fn from_config(config: &SiteConfig) -> Self {
        match &config.storage_path {
            Some(path) => Self::File(FileStorage::new(path.clone())),
            None => Self::Memory(MemoryStorage::new()),
        }
    }
}

impl LocaleStorage for SiteStorage {
    fn get(&self, key: &str) -> Option<String> {
        match self {
            Self::Memory(s) => s.get(key),
            Self::File(s) => s.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            Self::Memory(s) => s.set(key, value),
            Self::File(s) => s.set(key, value),
        }
    }
}
