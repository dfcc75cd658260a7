//! Error types shared by the i18n crate.

use std::fmt;
use std::io;

/// Errors from i18n operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I18nError {
    /// A locale string was malformed.
    InvalidLocale(String),
    /// A catalog source could not be parsed.
    ParseError(String),
    /// Duplicate key in the same locale.
    DuplicateKey { locale: String, key: String },
    /// The requested locale is not in the supported set.
    UnsupportedLocale(String),
    /// Key absent from the requested locale and every fallback.
    MissingTranslationKey { locale: String, key: String },
    /// A locale lacks keys that the reference locale defines.
    IncompleteCatalog { locale: String, missing: Vec<String> },
    /// The persistence collaborator failed.
    Storage(StorageError),
}

impl fmt::Display for I18nError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLocale(l) => write!(f, "invalid locale: {l}"),
            Self::ParseError(msg) => write!(f, "parse error: {msg}"),
            Self::DuplicateKey { locale, key } => {
                write!(f, "duplicate key '{key}' in locale '{locale}'")
            }
            Self::UnsupportedLocale(l) => write!(f, "unsupported locale: {l}"),
            Self::MissingTranslationKey { locale, key } => {
                write!(f, "missing translation key '{key}' for locale '{locale}'")
            }
            Self::IncompleteCatalog { locale, missing } => write!(
                f,
                "locale '{locale}' is missing {} key(s): {}",
                missing.len(),
                missing.join(", ")
            ),
            Self::Storage(err) => write!(f, "locale storage: {err}"),
        }
    }
}

impl std::error::Error for I18nError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for I18nError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

/// Failure reported by a [`LocaleStorage`](crate::storage::LocaleStorage).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Underlying I/O failed (message carries the `io::Error` text).
    Io(String),
    /// Stored data exists but could not be decoded.
    Corrupt(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "i/o error: {msg}"),
            Self::Corrupt(msg) => write!(f, "corrupt data: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            I18nError::UnsupportedLocale("xx".into()).to_string(),
            "unsupported locale: xx"
        );
        assert_eq!(
            I18nError::MissingTranslationKey {
                locale: "en".into(),
                key: "hero.title".into()
            }
            .to_string(),
            "missing translation key 'hero.title' for locale 'en'"
        );
        let incomplete = I18nError::IncompleteCatalog {
            locale: "en".into(),
            missing: vec!["a".into(), "b".into()],
        };
        assert_eq!(
            incomplete.to_string(),
            "locale 'en' is missing 2 key(s): a, b"
        );
    }

    #[test]
    fn storage_error_is_source() {
        use std::error::Error;
        let err = I18nError::from(StorageError::Corrupt("bad json".into()));
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "locale storage: corrupt data: bad json");
    }

    #[test]
    fn io_error_converts() {
        let io = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = StorageError::from(io);
        assert!(matches!(err, StorageError::Io(ref m) if m.contains("denied")));
    }
}
