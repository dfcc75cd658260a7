//! Site-level errors.

use std::fmt;

use serrure_i18n::I18nError;
use serrure_runtime::TimelineError;

/// Anything that prevents the site core from starting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteError {
    /// Catalog, locale, or storage problem.
    I18n(I18nError),
    /// The intro timeline failed validation.
    Timeline(TimelineError),
    /// Invalid or unparsable configuration.
    Config(String),
}

impl fmt::Display for SiteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I18n(err) => write!(f, "i18n: {err}"),
            Self::Timeline(err) => write!(f, "intro timeline: {err}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for SiteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::I18n(err) => Some(err),
            Self::Timeline(err) => Some(err),
            Self::Config(_) => None,
        }
    }
}

impl From<I18nError> for SiteError {
    fn from(err: I18nError) -> Self {
        Self::I18n(err)
    }
}

impl From<TimelineError> for SiteError {
    fn from(err: TimelineError) -> Self {
        Self::Timeline(err)
    }
}
