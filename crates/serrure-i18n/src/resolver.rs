//! Key resolution with a single fallback locale.
//!
//! [`Resolver`] is pure: given a fixed catalog and locale, `resolve` always
//! returns the same text and touches no shared state beyond a log line on a
//! miss. The catalog sits behind an `Arc`, so resolvers clone cheaply and can
//! be shared across threads.

use std::sync::Arc;

use tracing::warn;

use crate::catalog::{StringCatalog, interpolate};
use crate::error::I18nError;
use crate::locale::{LocaleTag, SupportedLocales};

/// Resolves dotted keys against a catalog, falling back to one locale.
#[derive(Debug, Clone)]
pub struct Resolver {
    catalog: Arc<StringCatalog>,
    supported: SupportedLocales,
    fallback: LocaleTag,
}

impl Resolver {
    /// Build a resolver.
    ///
    /// The catalog's fallback chain is replaced with `[fallback]`. Fails with
    /// [`I18nError::UnsupportedLocale`] when the fallback is not supported or
    /// has no table, or when a supported locale has no table at all.
    pub fn new(
        mut catalog: StringCatalog,
        supported: SupportedLocales,
        fallback: LocaleTag,
    ) -> Result<Self, I18nError> {
        if !supported.contains(fallback.as_str()) || !catalog.has_locale(fallback.as_str()) {
            return Err(I18nError::UnsupportedLocale(fallback.to_string()));
        }
        if let Some(orphan) = supported.iter().find(|t| !catalog.has_locale(t.as_str())) {
            return Err(I18nError::UnsupportedLocale(orphan.to_string()));
        }
        catalog.set_fallback_chain(vec![fallback.to_string()]);
        Ok(Self {
            catalog: Arc::new(catalog),
            supported,
            fallback,
        })
    }

    /// Look up `key` for `locale`, then for the fallback locale.
    pub fn try_resolve<'a>(&'a self, key: &str, locale: &str) -> Result<&'a str, I18nError> {
        self.catalog
            .get(locale, key)
            .ok_or_else(|| I18nError::MissingTranslationKey {
                locale: locale.to_string(),
                key: key.to_string(),
            })
    }

    /// Resolve for display: a miss is logged and the raw key is returned.
    pub fn resolve<'a>(&'a self, key: &'a str, locale: &str) -> &'a str {
        match self.try_resolve(key, locale) {
            Ok(text) => text,
            Err(_) => {
                warn!(key, locale, "missing translation key");
                key
            }
        }
    }

    /// Resolve and interpolate `{name}` tokens. Misses degrade to the key.
    pub fn format(&self, key: &str, locale: &str, args: &[(&str, &str)]) -> String {
        interpolate(self.resolve(key, locale), args)
    }

    /// Supported locale set.
    #[must_use]
    pub fn supported(&self) -> &SupportedLocales {
        &self.supported
    }

    /// Fallback locale.
    #[must_use]
    pub fn fallback(&self) -> &LocaleTag {
        &self.fallback
    }

    /// Underlying catalog.
    #[must_use]
    pub fn catalog(&self) -> &StringCatalog {
        &self.catalog
    }
}
