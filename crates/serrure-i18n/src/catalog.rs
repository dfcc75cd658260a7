//! String catalog with locale fallback, interpolation, and coverage checks.
//!
//! # Invariants
//!
//! 1. **Fallback chain terminates**: every lookup tries the requested locale
//!    once, then each chain entry once, returning `None` if none provides the
//!    key.
//!
//! 2. **Interpolation is single-pass**: `format()` replaces `{name}` tokens
//!    once; substituted values are never re-scanned.
//!
//! 3. **Thread safety**: `StringCatalog` is `Send + Sync` and immutable once
//!    handed to a [`Resolver`](crate::resolver::Resolver).
//!
//! # Failure Modes
//!
//! | Situation | Lookup result |
//! |-----------|---------------|
//! | Key absent from the locale and every chain entry | `None` |
//! | Locale never registered | chain entries still consulted |
//! | `{phone}` placeholder without a `phone` argument | placeholder kept verbatim |
//! | Key present only in the reference locale | reported by `verify_complete` |
//! | Nested JSON with a number or list leaf | `I18nError::ParseError` |

use std::collections::HashMap;

use crate::error::I18nError;

/// Strings for a single locale, keyed by dotted path (`"hero.title"`).
#[derive(Debug, Clone, Default)]
pub struct LocaleStrings {
    strings: HashMap<String, String>,
}

impl LocaleStrings {
    /// Create an empty locale string set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a string, replacing any previous value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.strings.insert(key.into(), value.into());
    }

    /// Insert a string, rejecting a key that is already present.
    pub fn try_insert(
        &mut self,
        locale: &str,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), I18nError> {
        let key = key.into();
        if self.strings.contains_key(&key) {
            return Err(I18nError::DuplicateKey {
                locale: locale.to_string(),
                key,
            });
        }
        self.strings.insert(key, value.into());
        Ok(())
    }

    /// Look up a string by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.strings.get(key).map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Whether the locale has no strings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Iterate over all keys in this locale.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.strings.keys().map(String::as_str)
    }

    /// Parse a nested JSON object into dotted keys.
    ///
    /// `{"hero": {"title": "Serrurier"}}` yields `hero.title`. Leaves must be
    /// strings; arrays, numbers, booleans and nulls are rejected. A literal
    /// dotted key that collides with a flattened path is a
    /// [`I18nError::DuplicateKey`].
    #[cfg(feature = "json")]
    pub fn from_json_str(locale: &str, source: &str) -> Result<Self, I18nError> {
        let value: serde_json::Value = serde_json::from_str(source)
            .map_err(|e| I18nError::ParseError(format!("{locale}: {e}")))?;
        let serde_json::Value::Object(root) = value else {
            return Err(I18nError::ParseError(format!(
                "{locale}: catalog root must be an object"
            )));
        };
        let mut strings = Self::new();
        flatten_into(locale, "", &root, &mut strings)?;
        Ok(strings)
    }
}

#[cfg(feature = "json")]
fn flatten_into(
    locale: &str,
    prefix: &str,
    object: &serde_json::Map<String, serde_json::Value>,
    out: &mut LocaleStrings,
) -> Result<(), I18nError> {
    for (name, value) in object {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        match value {
            serde_json::Value::String(text) => out.try_insert(locale, path, text.as_str())?,
            serde_json::Value::Object(child) => flatten_into(locale, &path, child, out)?,
            other => {
                return Err(I18nError::ParseError(format!(
                    "{locale}: key '{path}' must be a string or object, found {other}"
                )));
            }
        }
    }
    Ok(())
}

/// A successful lookup and the locale that actually served it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup<'a> {
    /// Display text.
    pub text: &'a str,
    /// Locale whose table contained the key.
    pub served_by: &'a str,
}

/// Central string catalog with locale fallback.
///
/// # Example
///
/// ```
/// use serrure_i18n::catalog::{LocaleStrings, StringCatalog};
///
/// let mut catalog = StringCatalog::new();
///
/// let mut fr = LocaleStrings::new();
/// fr.insert("hero.title", "Serrurier de confiance");
/// fr.insert("hero.cta", "Appelez {phone}");
/// catalog.add_locale("fr", fr);
///
/// let mut en = LocaleStrings::new();
/// en.insert("hero.title", "Trusted locksmith");
/// catalog.add_locale("en", en);
/// catalog.set_fallback_chain(vec!["fr".into()]);
///
/// assert_eq!(catalog.get("en", "hero.title"), Some("Trusted locksmith"));
/// assert_eq!(
///     catalog.format("en", "hero.cta", &[("phone", "01 23 45 67 89")]),
///     Some("Appelez 01 23 45 67 89".into())
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct StringCatalog {
    locales: HashMap<String, LocaleStrings>,
    fallback_chain: Vec<String>,
}

impl StringCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add strings for a locale, replacing any previous table.
    pub fn add_locale(&mut self, locale: impl Into<String>, strings: LocaleStrings) {
        self.locales.insert(locale.into(), strings);
    }

    /// Set the fallback chain (tried in order when a key is missing).
    ///
    /// The site uses a single-element chain: the fallback locale.
    pub fn set_fallback_chain(&mut self, chain: Vec<String>) {
        self.fallback_chain = chain;
    }

    /// The configured fallback chain.
    #[must_use]
    pub fn fallback_chain(&self) -> &[String] {
        &self.fallback_chain
    }

    /// Whether a table is registered for `locale`.
    #[must_use]
    pub fn has_locale(&self, locale: &str) -> bool {
        self.locales.contains_key(locale)
    }

    /// Strings registered for `locale`, if any.
    #[must_use]
    pub fn strings(&self, locale: &str) -> Option<&LocaleStrings> {
        self.locales.get(locale)
    }

    /// Look up a key, reporting which locale served it.
    ///
    /// Tries the specified locale first, then walks the fallback chain.
    #[must_use]
    pub fn lookup<'a>(&'a self, locale: &str, key: &str) -> Option<Lookup<'a>> {
        let direct = self
            .locales
            .get_key_value(locale)
            .and_then(|(tag, ls)| ls.get(key).map(|text| (tag, text)));
        if let Some((tag, text)) = direct {
            return Some(Lookup {
                text,
                served_by: tag,
            });
        }

        for fallback in &self.fallback_chain {
            if fallback == locale {
                continue;
            }
            if let Some(text) = self.locales.get(fallback).and_then(|ls| ls.get(key)) {
                return Some(Lookup {
                    text,
                    served_by: fallback,
                });
            }
        }

        None
    }

    /// Look up a string by key with fallback.
    #[must_use]
    pub fn get(&self, locale: &str, key: &str) -> Option<&str> {
        self.lookup(locale, key).map(|l| l.text)
    }

    /// Look up a string and perform `{name}` interpolation.
    ///
    /// Each `(name, value)` pair in `args` replaces `{name}` in the
    /// template string. Tokens without matching args are left as-is.
    #[must_use]
    pub fn format(&self, locale: &str, key: &str, args: &[(&str, &str)]) -> Option<String> {
        self.get(locale, key)
            .map(|template| interpolate(template, args))
    }

    /// All registered locale tags, sorted.
    #[must_use]
    pub fn locales(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.locales.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    // -----------------------------------------------------------------
    // Coverage & completeness
    // -----------------------------------------------------------------

    /// Collect all unique keys across every registered locale, sorted.
    #[must_use]
    pub fn all_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .locales
            .values()
            .flat_map(|ls| ls.keys().map(String::from))
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    /// Keys from `reference_keys` that are missing in `locale` even after
    /// fallback, sorted.
    #[must_use]
    pub fn missing_keys(&self, locale: &str, reference_keys: &[&str]) -> Vec<String> {
        let mut missing: Vec<String> = reference_keys
            .iter()
            .filter(|key| self.get(locale, key).is_none())
            .map(|key| key.to_string())
            .collect();
        missing.sort_unstable();
        missing
    }

    /// Coverage of every locale against the union of all keys.
    #[must_use]
    pub fn coverage_report(&self) -> CoverageReport {
        let all = self.all_keys();
        let ref_keys: Vec<&str> = all.iter().map(String::as_str).collect();
        let total = ref_keys.len();

        let locales = self
            .locales()
            .into_iter()
            .map(|tag| {
                let missing = self.missing_keys(tag, &ref_keys);
                let present = total.saturating_sub(missing.len());
                let coverage_percent = if total == 0 {
                    100.0
                } else {
                    (present as f32 / total as f32) * 100.0
                };
                LocaleCoverage {
                    locale: tag.to_string(),
                    present,
                    missing,
                    coverage_percent,
                }
            })
            .collect();

        CoverageReport {
            total_keys: total,
            locales,
        }
    }

    /// Check that every locale defines every key the reference locale does.
    ///
    /// Unlike [`missing_keys`](Self::missing_keys) this ignores the fallback
    /// chain: a key silently served by the fallback counts as missing. The
    /// first offending locale (in sorted order) is reported.
    pub fn verify_complete(&self, reference: &str) -> Result<(), I18nError> {
        let Some(reference_strings) = self.locales.get(reference) else {
            return Err(I18nError::UnsupportedLocale(reference.to_string()));
        };

        for tag in self.locales() {
            if tag == reference {
                continue;
            }
            let Some(strings) = self.locales.get(tag) else {
                continue;
            };
            let mut missing: Vec<String> = reference_strings
                .keys()
                .filter(|key| strings.get(key).is_none())
                .map(String::from)
                .collect();
            if !missing.is_empty() {
                missing.sort_unstable();
                return Err(I18nError::IncompleteCatalog {
                    locale: tag.to_string(),
                    missing,
                });
            }
        }
        Ok(())
    }
}

/// Coverage report for a string catalog.
#[derive(Debug, Clone)]
pub struct CoverageReport {
    /// Total number of unique keys across all locales.
    pub total_keys: usize,
    /// Per-locale coverage data, sorted by tag.
    pub locales: Vec<LocaleCoverage>,
}

/// Per-locale coverage statistics.
#[derive(Debug, Clone)]
pub struct LocaleCoverage {
    /// Locale tag (e.g., `"fr"`).
    pub locale: String,
    /// Number of reference keys present (including via fallback).
    pub present: usize,
    /// Keys from the reference set that are missing even after fallback.
    pub missing: Vec<String>,
    /// Coverage as a percentage (0.0–100.0).
    pub coverage_percent: f32,
}

/// Single-pass `{name}` interpolation. Unmatched tokens left as-is.
pub(crate) fn interpolate(template: &str, args: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars();

    while let Some(ch) = chars.next() {
        if ch != '{' {
            result.push(ch);
            continue;
        }

        let mut token = String::new();
        let mut found_close = false;
        for c in chars.by_ref() {
            if c == '}' {
                found_close = true;
                break;
            }
            token.push(c);
        }

        match args.iter().find(|&&(name, _)| name == token) {
            Some(&(_, value)) if found_close => result.push_str(value),
            _ => {
                result.push('{');
                result.push_str(&token);
                if found_close {
                    result.push('}');
                }
            }
        }
    }

    result
}
