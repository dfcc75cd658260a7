#![forbid(unsafe_code)]

//! Localized content resolution for the Serrure Safe site.
//!
//! Provides key-based string catalogs with a fallback locale, `{name}`
//! interpolation, ordered initial-locale detection, a single-writer active
//! locale holder, and persistence of the user's choice.
//!
//! # Flow
//!
//! ```text
//! detectors (stored → environment → document) ─┐
//!                                               ├→ LocaleContext ─→ resolve(key, locale?)
//! StringCatalog + fallback ─→ Resolver ─────────┘        │
//!                                                        └→ set_locale(code) → storage
//! ```

pub mod catalog;
pub mod context;
pub mod detect;
pub mod error;
pub mod locale;
pub mod resolver;
pub mod state;
pub mod storage;

pub use catalog::{CoverageReport, LocaleCoverage, LocaleStrings, Lookup, StringCatalog};
pub use context::{LocaleContext, MissingKeyHook};
pub use detect::{
    DEFAULT_DETECTION_ORDER, Detection, DetectorKind, DocumentLanguage, EnvironmentLocale,
    LocaleDetector, StoredPreference, detect_initial_locale, detect_with_source,
};
pub use error::{I18nError, StorageError};
pub use locale::{LocaleTag, SupportedLocales};
pub use resolver::Resolver;
pub use state::{ActiveLocale, BusyGuard, LocaleChange, LocaleSubscription};
#[cfg(feature = "json")]
pub use storage::FileStorage;
pub use storage::{LOCALE_STORAGE_KEY, LocaleStorage, MemoryStorage};
