#![forbid(unsafe_code)]

//! Serrure Safe site core.
//!
//! Wires the bundled French/English content, locale detection and
//! persistence, the padlock logo intro, and the hero particle ambience into
//! a host-driven [`SiteRunner`].
//!
//! ```text
//! SiteConfig ─→ SiteRunner::new ─→ mount(now) ─┬→ step(now) ─→ render() → PageFrame
//!                 │                             │
//!                 ├ bundled catalogs            └ SiteEvent::{SetLocale, SkipIntro, Unmount}
//!                 ├ detection (stored → env → document)
//!                 └ logo intro timeline
//! ```

pub mod clock;
pub mod config;
pub mod content;
pub mod error;
pub mod intro;
pub mod logging;
pub mod runner;
pub mod storage;

pub use clock::HostClock;
pub use config::{CompletenessPolicy, SiteConfig};
pub use error::SiteError;
pub use logging::{LogFormat, LoggingError};
pub use runner::{
    HostSignals, IntroFrame, IntroPiece, LocaleOption, PageFrame, SiteEvent, SiteRunner,
    StepResult,
};
pub use storage::SiteStorage;
