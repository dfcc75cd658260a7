//! Monotonic host clock.

use std::time::Duration;

use web_time::Instant;

/// Milliseconds-since-start clock for hosts without one of their own.
///
/// Works on native and `wasm32-unknown-unknown` (backed by
/// `performance.now()` there).
#[derive(Debug, Clone, Copy)]
pub struct HostClock {
    origin: Instant,
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new()
    }
}

impl HostClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Time since construction, suitable for `SiteRunner::step`.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}
