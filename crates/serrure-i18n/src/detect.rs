//! Initial-locale detection.
//!
//! Detectors are tried strictly in order and the first one that yields a
//! supported locale wins. The site's order is: persisted preference, then the
//! runtime environment, then the document's declared language. An explicit
//! user choice therefore always outranks ambient signals.

use tracing::debug;

use crate::locale::{LocaleTag, SupportedLocales};
use crate::storage::LocaleStorage;

/// A strategy that infers the preferred locale from one signal source.
pub trait LocaleDetector {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Produce a supported locale, or `None` if the signal is absent or names
    /// nothing the site can display.
    fn detect(&self, supported: &SupportedLocales) -> Option<LocaleTag>;
}

/// Signal sources, in the order the site consults them by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectorKind {
    /// Value persisted by a previous explicit choice.
    StoredPreference,
    /// Runtime/environment languages (`navigator.languages`, `LANG`, ...).
    Environment,
    /// Document-level language declaration.
    Document,
}

/// Default detection order.
pub const DEFAULT_DETECTION_ORDER: [DetectorKind; 3] = [
    DetectorKind::StoredPreference,
    DetectorKind::Environment,
    DetectorKind::Document,
];

impl DetectorKind {
    /// Parse a config name (`"stored"`, `"environment"`, `"document"`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "stored" | "storage" | "stored-preference" => Some(Self::StoredPreference),
            "environment" | "env" | "runtime" => Some(Self::Environment),
            "document" | "html" => Some(Self::Document),
            _ => None,
        }
    }
}

/// Reads the locale persisted under a well-known storage key.
#[derive(Debug)]
pub struct StoredPreference<S> {
    storage: S,
    key: String,
}

impl<S: LocaleStorage> StoredPreference<S> {
    /// Detector reading `key` from `storage`.
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }
}

impl<S: LocaleStorage> LocaleDetector for StoredPreference<S> {
    fn name(&self) -> &'static str {
        "stored-preference"
    }

    fn detect(&self, supported: &SupportedLocales) -> Option<LocaleTag> {
        let raw = self.storage.get(&self.key)?;
        supported.negotiate(&raw)
    }
}

/// Runtime signal: an ordered list of preferred languages.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentLocale {
    preferred: Vec<String>,
}

impl EnvironmentLocale {
    /// Use an explicit preference list (e.g., a browser's language list).
    pub fn from_languages<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            preferred: languages.into_iter().map(Into::into).collect(),
        }
    }

    /// Build from POSIX locale variables via a custom lookup.
    ///
    /// Candidates are `LC_ALL`, `LC_MESSAGES`, then `LANG`; unset and empty
    /// variables are skipped.
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let preferred = ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| get_env(var))
            .filter(|value| !value.trim().is_empty())
            .collect();
        Self { preferred }
    }

    /// Build from the current process environment.
    #[must_use]
    pub fn from_process_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Candidate languages in preference order.
    #[must_use]
    pub fn preferred(&self) -> &[String] {
        &self.preferred
    }
}

impl LocaleDetector for EnvironmentLocale {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn detect(&self, supported: &SupportedLocales) -> Option<LocaleTag> {
        self.preferred
            .iter()
            .find_map(|candidate| supported.negotiate(candidate))
    }
}

/// Document-level declaration (the page's `lang` attribute).
#[derive(Debug, Clone, Default)]
pub struct DocumentLanguage {
    lang: Option<String>,
}

impl DocumentLanguage {
    /// Detector for a document declaring `lang` (or nothing).
    pub fn new(lang: Option<impl Into<String>>) -> Self {
        Self {
            lang: lang.map(Into::into),
        }
    }
}

impl LocaleDetector for DocumentLanguage {
    fn name(&self) -> &'static str {
        "document"
    }

    fn detect(&self, supported: &SupportedLocales) -> Option<LocaleTag> {
        self.lang.as_deref().and_then(|lang| supported.negotiate(lang))
    }
}

/// Outcome of initial detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Chosen locale.
    pub locale: LocaleTag,
    /// Name of the winning detector, `None` when the default was used.
    pub source: Option<&'static str>,
}

/// Evaluate detectors in order; first supported result wins.
pub fn detect_with_source(
    detectors: &[&dyn LocaleDetector],
    supported: &SupportedLocales,
    default: &LocaleTag,
) -> Detection {
    for detector in detectors {
        if let Some(locale) = detector.detect(supported) {
            debug!(detector = detector.name(), locale = %locale, "initial locale detected");
            return Detection {
                locale,
                source: Some(detector.name()),
            };
        }
        debug!(detector = detector.name(), "detector found no supported locale");
    }
    debug!(locale = %default, "no detector matched, using default locale");
    Detection {
        locale: default.clone(),
        source: None,
    }
}

/// Evaluate detectors in order and return only the chosen locale.
#[must_use]
pub fn detect_initial_locale(
    detectors: &[&dyn LocaleDetector],
    supported: &SupportedLocales,
    default: &LocaleTag,
) -> LocaleTag {
    detect_with_source(detectors, supported, default).locale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LOCALE_STORAGE_KEY, MemoryStorage};
    use std::cell::Cell;

    struct Fixed {
        value: Option<&'static str>,
        calls: Cell<u32>,
    }

    impl Fixed {
        fn new(value: Option<&'static str>) -> Self {
            Self {
                value,
                calls: Cell::new(0),
            }
        }
    }

    impl LocaleDetector for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn detect(&self, supported: &SupportedLocales) -> Option<LocaleTag> {
            self.calls.set(self.calls.get() + 1);
            self.value.and_then(|v| supported.negotiate(v))
        }
    }

    fn supported() -> SupportedLocales {
        SupportedLocales::new(["fr", "en"]).unwrap()
    }

    fn fr() -> LocaleTag {
        LocaleTag::parse("fr").unwrap()
    }

    #[test]
    fn first_non_none_wins_in_order() {
        let a = Fixed::new(None);
        let b = Fixed::new(Some("en"));
        let c = Fixed::new(Some("fr"));
        let chosen = detect_initial_locale(&[&a, &b, &c], &supported(), &fr());
        assert_eq!(chosen.as_str(), "en");
        assert_eq!(a.calls.get(), 1);
        assert_eq!(b.calls.get(), 1);
        assert_eq!(c.calls.get(), 0, "evaluation must short-circuit");
    }

    #[test]
    fn reordering_changes_winner() {
        let b = Fixed::new(Some("en"));
        let c = Fixed::new(Some("fr"));
        let chosen = detect_initial_locale(&[&c, &b], &supported(), &fr());
        assert_eq!(chosen.as_str(), "fr");
    }

    #[test]
    fn unsupported_result_is_treated_as_none() {
        let a = Fixed::new(Some("de"));
        let b = Fixed::new(Some("en-GB"));
        let detection = detect_with_source(&[&a, &b], &supported(), &fr());
        assert_eq!(detection.locale.as_str(), "en");
        assert_eq!(detection.source, Some("fixed"));
    }

    #[test]
    fn all_none_uses_default() {
        let a = Fixed::new(None);
        let b = Fixed::new(Some("ja"));
        let detection = detect_with_source(&[&a, &b], &supported(), &fr());
        assert_eq!(detection.locale, fr());
        assert_eq!(detection.source, None);
        assert_eq!(detect_initial_locale(&[], &supported(), &fr()), fr());
    }

    #[test]
    fn stored_preference_outranks_environment() {
        let storage = MemoryStorage::with_entry(LOCALE_STORAGE_KEY, "en");
        let stored = StoredPreference::new(&storage, LOCALE_STORAGE_KEY);
        let env = EnvironmentLocale::from_languages(["fr-FR"]);
        let doc = DocumentLanguage::new(Some("fr"));
        let detection = detect_with_source(&[&stored, &env, &doc], &supported(), &fr());
        assert_eq!(detection.locale.as_str(), "en");
        assert_eq!(detection.source, Some("stored-preference"));
    }

    #[test]
    fn stored_garbage_falls_through() {
        let storage = MemoryStorage::with_entry(LOCALE_STORAGE_KEY, "klingon!!");
        let stored = StoredPreference::new(&storage, LOCALE_STORAGE_KEY);
        let env = EnvironmentLocale::from_languages(["en-US", "fr"]);
        let detection = detect_with_source(&[&stored, &env], &supported(), &fr());
        assert_eq!(detection.locale.as_str(), "en");
        assert_eq!(detection.source, Some("environment"));
    }

    #[test]
    fn environment_skips_unsupported_candidates() {
        let env = EnvironmentLocale::from_languages(["de-DE", "es", "en-CA"]);
        assert_eq!(env.detect(&supported()).unwrap().as_str(), "en");
    }

    #[test]
    fn environment_from_posix_vars() {
        let env = EnvironmentLocale::from_env_with(|key| match key {
            "LC_ALL" => Some(String::new()),
            "LANG" => Some("en_GB.UTF-8".into()),
            _ => None,
        });
        assert_eq!(env.preferred(), ["en_GB.UTF-8".to_string()]);
        assert_eq!(env.detect(&supported()).unwrap().as_str(), "en");

        let posix = EnvironmentLocale::from_env_with(|key| {
            (key == "LANG").then(|| "C.UTF-8".to_string())
        });
        assert!(posix.detect(&supported()).is_none());
    }

    #[test]
    fn document_language() {
        assert_eq!(
            DocumentLanguage::new(Some("fr-FR"))
                .detect(&supported())
                .unwrap()
                .as_str(),
            "fr"
        );
        assert!(DocumentLanguage::new(None::<String>).detect(&supported()).is_none());
    }

    #[test]
    fn detector_kind_names() {
        assert_eq!(
            DetectorKind::from_name("Stored"),
            Some(DetectorKind::StoredPreference)
        );
        assert_eq!(DetectorKind::from_name("env"), Some(DetectorKind::Environment));
        assert_eq!(DetectorKind::from_name("html"), Some(DetectorKind::Document));
        assert_eq!(DetectorKind::from_name("cookie"), None);
    }
}
