//! Tracing subscriber bootstrap.
//!
//! The filter comes from `SERRURE_LOG` (standard `EnvFilter` syntax) and
//! defaults to `warn`, so missing translation keys show up without any
//! setup. Installation is idempotent: a second call reports
//! [`LoggingError::AlreadyInstalled`] instead of panicking.

use std::fmt;

use tracing_subscriber::EnvFilter;

/// Env var holding the filter directives.
pub const LOG_ENV: &str = "SERRURE_LOG";
const DEFAULT_DIRECTIVES: &str = "warn";

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    /// One JSON object per event, for log shippers.
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    InvalidFilter(String),
    AlreadyInstalled,
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFilter(msg) => write!(f, "invalid log filter: {msg}"),
            Self::AlreadyInstalled => write!(f, "a global tracing subscriber is already installed"),
        }
    }
}

impl std::error::Error for LoggingError {}

/// Build the filter from `directives`, or the default when `None`.
pub fn build_filter(directives: Option<&str>) -> Result<EnvFilter, LoggingError> {
    let directives = directives
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_DIRECTIVES);
    EnvFilter::try_new(directives).map_err(|err| LoggingError::InvalidFilter(err.to_string()))
}

/// Install the global subscriber using `SERRURE_LOG`.
pub fn init(format: LogFormat) -> Result<(), LoggingError> {
    init_with(format, |name| std::env::var(name).ok())
}

/// Install the global subscriber with an injected env lookup.
pub fn init_with<F>(format: LogFormat, get_env: F) -> Result<(), LoggingError>
where
    F: Fn(&str) -> Option<String>,
{
    let filter = build_filter(get_env(LOG_ENV).as_deref())?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|_| LoggingError::AlreadyInstalled)
}
