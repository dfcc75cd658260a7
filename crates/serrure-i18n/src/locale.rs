//! Locale tags and the supported-locale set.
//!
//! Tags arrive from many places (persisted preferences, `LANG`, a document
//! `lang` attribute, user clicks) and in many spellings: `fr`, `fr_FR`,
//! `fr_FR.UTF-8@euro`, `EN-us`. [`LocaleTag::parse`] folds them into a single
//! canonical form so comparisons are plain string equality.
//!
//! # Invariants
//!
//! 1. A parsed tag is never empty and its language subtag is lowercase ASCII.
//! 2. Region subtags are uppercase, script subtags are title case.
//! 3. [`SupportedLocales::negotiate`] only ever returns a member of the set.

use std::fmt;

use crate::error::I18nError;

/// Canonical locale identifier (e.g., `"fr"`, `"en-GB"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocaleTag(String);

impl LocaleTag {
    /// Parse and canonicalize a raw locale string.
    ///
    /// Encoding (`.UTF-8`) and modifier (`@euro`) suffixes are dropped and
    /// `_` separators become `-`. The POSIX placeholders `C` and `POSIX` are
    /// rejected since they name no language.
    pub fn parse(raw: &str) -> Result<Self, I18nError> {
        let trimmed = raw.trim();
        let base = trimmed
            .split(['.', '@'])
            .next()
            .unwrap_or_default()
            .replace('_', "-");

        if base.is_empty() || base.eq_ignore_ascii_case("c") || base.eq_ignore_ascii_case("posix")
        {
            return Err(I18nError::InvalidLocale(raw.to_string()));
        }

        let mut parts = base.split('-');
        let language = parts.next().unwrap_or_default();
        if !(2..=3).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(I18nError::InvalidLocale(raw.to_string()));
        }

        let mut canonical = language.to_ascii_lowercase();
        for sub in parts {
            if sub.is_empty() || !sub.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(I18nError::InvalidLocale(raw.to_string()));
            }
            canonical.push('-');
            match sub.len() {
                2 if sub.chars().all(|c| c.is_ascii_alphabetic()) => {
                    canonical.push_str(&sub.to_ascii_uppercase());
                }
                4 if sub.chars().all(|c| c.is_ascii_alphabetic()) => {
                    let mut chars = sub.chars();
                    if let Some(first) = chars.next() {
                        canonical.push(first.to_ascii_uppercase());
                    }
                    canonical.extend(chars.map(|c| c.to_ascii_lowercase()));
                }
                _ => canonical.push_str(&sub.to_ascii_lowercase()),
            }
        }

        Ok(Self(canonical))
    }

    /// The canonical tag text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Primary language subtag (`"en"` for `"en-GB"`).
    #[must_use]
    pub fn language(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for LocaleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LocaleTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for LocaleTag {
    type Err = I18nError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Ordered set of locales the site can display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedLocales {
    tags: Vec<LocaleTag>,
}

impl SupportedLocales {
    /// Build the set from raw tags. Duplicates (after canonicalization) are
    /// dropped, keeping the first occurrence.
    pub fn new<I, S>(tags: I) -> Result<Self, I18nError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<LocaleTag> = Vec::new();
        for raw in tags {
            let tag = LocaleTag::parse(raw.as_ref())?;
            if !out.contains(&tag) {
                out.push(tag);
            }
        }
        Ok(Self { tags: out })
    }

    /// Whether `tag` (already canonical) is a member.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.as_str() == tag)
    }

    /// Match a raw locale string against the set.
    ///
    /// Exact matches win; otherwise the first member sharing the primary
    /// language is chosen, preferring a bare-language member (`en` over
    /// `en-GB` for input `en-US`). Returns `None` for unparsable input.
    #[must_use]
    pub fn negotiate(&self, raw: &str) -> Option<LocaleTag> {
        let wanted = LocaleTag::parse(raw).ok()?;
        if let Some(exact) = self.tags.iter().find(|t| **t == wanted) {
            return Some(exact.clone());
        }
        let language = wanted.language();
        self.tags
            .iter()
            .find(|t| t.as_str() == language)
            .or_else(|| self.tags.iter().find(|t| t.language() == language))
            .cloned()
    }

    /// Iterate members in configured order.
    pub fn iter(&self) -> impl Iterator<Item = &LocaleTag> {
        self.tags.iter()
    }

    /// Number of supported locales.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
