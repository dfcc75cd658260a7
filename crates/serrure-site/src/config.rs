//! Site configuration.
//!
//! [`SiteConfig`] is built from defaults, an optional JSON document, and
//! environment overrides, in that order:
//!
//! | Env var | Effect |
//! |---------|--------|
//! | `SERRURE_DEFAULT_LOCALE` | default locale when no detector matches |
//! | `SERRURE_STORAGE_PATH` | persist the locale choice to this JSON file |
//! | `SERRURE_SKIP_INTRO` | `1`/`true`/`yes` disables the logo intro |
//! | `SERRURE_COMPLETENESS` | `enforce` or `warn_only` |
//!
//! Environment access goes through a lookup closure so tests never touch the
//! process environment.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer};
use serrure_i18n::{DEFAULT_DETECTION_ORDER, DetectorKind, LOCALE_STORAGE_KEY, LocaleTag, SupportedLocales};

use crate::error::SiteError;

/// What to do when a translation table lacks keys of the fallback table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletenessPolicy {
    /// Refuse to start.
    #[default]
    Enforce,
    /// Log the gaps and rely on fallback.
    WarnOnly,
}

impl CompletenessPolicy {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "enforce" | "strict" => Some(Self::Enforce),
            "warn_only" | "warn-only" | "warn" => Some(Self::WarnOnly),
            _ => None,
        }
    }
}

/// Site core configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub default_locale: String,
    pub fallback_locale: String,
    pub supported_locales: Vec<String>,
    pub storage_key: String,
    /// File to persist the locale choice in; in-memory when `None`.
    pub storage_path: Option<PathBuf>,
    pub completeness: CompletenessPolicy,
    #[serde(deserialize_with = "deserialize_detection_order")]
    pub detection_order: Vec<DetectorKind>,
    pub intro_enabled: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            default_locale: "fr".to_string(),
            fallback_locale: "fr".to_string(),
            supported_locales: vec!["fr".to_string(), "en".to_string()],
            storage_key: LOCALE_STORAGE_KEY.to_string(),
            storage_path: None,
            completeness: CompletenessPolicy::Enforce,
            detection_order: DEFAULT_DETECTION_ORDER.to_vec(),
            intro_enabled: true,
        }
    }
}

fn deserialize_detection_order<'de, D>(deserializer: D) -> Result<Vec<DetectorKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let names = Vec::<String>::deserialize(deserializer)?;
    names
        .iter()
        .map(|name| {
            DetectorKind::from_name(name)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown detector: {name}")))
        })
        .collect()
}

impl SiteConfig {
    /// Parse a JSON document; absent fields keep their defaults.
    pub fn from_json_str(source: &str) -> Result<Self, SiteError> {
        serde_json::from_str(source).map_err(|err| SiteError::Config(err.to_string()))
    }

    /// Defaults with environment overrides applied.
    pub fn from_env_with<F>(get_env: F) -> Result<Self, SiteError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().with_env_overrides(get_env)
    }

    /// Apply `SERRURE_*` overrides on top of `self`.
    pub fn with_env_overrides<F>(mut self, get_env: F) -> Result<Self, SiteError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| get_env(name).filter(|v| !v.trim().is_empty());

        if let Some(locale) = get("SERRURE_DEFAULT_LOCALE") {
            self.default_locale = locale.trim().to_string();
        }
        if let Some(path) = get("SERRURE_STORAGE_PATH") {
            self.storage_path = Some(PathBuf::from(path));
        }
        if let Some(flag) = get("SERRURE_SKIP_INTRO") {
            let skip = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
            self.intro_enabled = !skip;
        }
        if let Some(policy) = get("SERRURE_COMPLETENESS") {
            self.completeness = CompletenessPolicy::from_name(&policy)
                .ok_or_else(|| SiteError::Config(format!("unknown completeness policy: {policy}")))?;
        }
        Ok(self)
    }

    #[must_use]
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = locale.into();
        self
    }

    #[must_use]
    pub fn with_fallback_locale(mut self, locale: impl Into<String>) -> Self {
        self.fallback_locale = locale.into();
        self
    }

    #[must_use]
    pub fn with_supported_locales<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_locales = locales.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    #[must_use]
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_completeness(mut self, policy: CompletenessPolicy) -> Self {
        self.completeness = policy;
        self
    }

    #[must_use]
    pub fn with_detection_order(mut self, order: Vec<DetectorKind>) -> Self {
        self.detection_order = order;
        self
    }

    #[must_use]
    pub fn with_intro(mut self, enabled: bool) -> Self {
        self.intro_enabled = enabled;
        self
    }

    /// Parsed supported set.
    pub fn supported(&self) -> Result<SupportedLocales, SiteError> {
        Ok(SupportedLocales::new(self.supported_locales.iter())?)
    }

    /// Parsed default locale.
    pub fn default_tag(&self) -> Result<LocaleTag, SiteError> {
        Ok(LocaleTag::parse(&self.default_locale)?)
    }

    /// Parsed fallback locale.
    pub fn fallback_tag(&self) -> Result<LocaleTag, SiteError> {
        Ok(LocaleTag::parse(&self.fallback_locale)?)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), SiteError> {
        if self.supported_locales.is_empty() {
            return Err(SiteError::Config("no supported locales".into()));
        }
        let supported = self.supported()?;
        for (field, tag) in [
            ("default_locale", self.default_tag()?),
            ("fallback_locale", self.fallback_tag()?),
        ] {
            if !supported.contains(tag.as_str()) {
                return Err(SiteError::Config(format!(
                    "{field} {tag} is not a supported locale"
                )));
            }
        }
        if self.storage_key.trim().is_empty() {
            return Err(SiteError::Config("storage_key is empty".into()));
        }
        // A persisted choice must win over every ambient signal.
        if self.detection_order.first() != Some(&DetectorKind::StoredPreference) {
            return Err(SiteError::Config(
                "detection_order must start with the stored preference".into(),
            ));
        }
        for (idx, kind) in self.detection_order.iter().enumerate() {
            if self.detection_order[..idx].contains(kind) {
                return Err(SiteError::Config(format!(
                    "detector {kind:?} listed twice"
                )));
            }
        }
        Ok(())
    }
}
