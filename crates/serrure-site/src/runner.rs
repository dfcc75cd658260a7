//! Step-based page runner.
//!
//! [`SiteRunner`] owns the locale context, the timer loop, the logo intro,
//! and the hero ambience. The host drives it from its animation loop:
//!
//! ```text
//! animation frame
//!   → push_event(SiteEvent)   // language switch, skip intro, unmount
//!   → step(now)               // deferred locale changes, events, timers
//!   → render()                // if dirty: PageFrame
//!   → draw the frame
//! ```
//!
//! All time comes from the host as a monotonic [`Duration`], so replaying the
//! same events at the same timestamps yields identical frames.
//!
//! # Invariants
//!
//! 1. The page is revealed exactly once: when the intro completes, when it
//!    is skipped, or at mount when the intro is disabled.
//! 2. After `Unmount`, no timer of this runner fires and `render` returns
//!    `None`.
//! 3. A locale change marks the view dirty through the state subscription;
//!    nothing else needs to poll the locale.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use serrure_i18n::{
    DetectorKind, DocumentLanguage, EnvironmentLocale, I18nError, LocaleChange, LocaleContext,
    LocaleDetector, LocaleStorage, LocaleSubscription, LocaleTag, Resolver, StoredPreference,
    detect_with_source,
};
use serrure_runtime::{
    ParticleField, ParticleSample, PieceTarget, RevealTimeline, Scheduler, SequenceHandle,
    SequencePhase, SequenceRun,
};
use tracing::{debug, info, warn};

use crate::config::SiteConfig;
use crate::content::{self, INTRO_KEYS, PAGE_KEYS};
use crate::error::SiteError;
use crate::intro;
use crate::storage::SiteStorage;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Input delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteEvent {
    /// The visitor picked a language in the switcher.
    SetLocale(String),
    /// The visitor dismissed the logo intro.
    SkipIntro,
    /// The page is being torn down.
    Unmount,
}

/// Outcome of a single [`SiteRunner::step`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepResult {
    /// Queued events processed in this step.
    pub events_processed: u32,
    /// Locale changes deferred by an earlier step and applied now.
    pub deferred_applied: usize,
    /// Timer callbacks fired.
    pub timers_fired: usize,
    /// Whether a render is needed.
    pub dirty: bool,
    /// Whether the runner has been unmounted.
    pub unmounted: bool,
}

/// Ambient locale signals supplied by the host.
#[derive(Debug, Clone, Default)]
pub struct HostSignals {
    pub environment: EnvironmentLocale,
    pub document: DocumentLanguage,
}

impl HostSignals {
    /// Environment languages from `LC_ALL`/`LC_MESSAGES`/`LANG`, no document.
    #[must_use]
    pub fn from_process_env() -> Self {
        Self {
            environment: EnvironmentLocale::from_process_env(),
            document: DocumentLanguage::default(),
        }
    }

    /// Explicit preferred languages, e.g. a browser's language list.
    #[must_use]
    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.environment = EnvironmentLocale::from_languages(languages);
        self
    }

    /// The document's declared `lang`.
    #[must_use]
    pub fn with_document_lang(mut self, lang: impl Into<String>) -> Self {
        self.document = DocumentLanguage::new(Some(lang));
        self
    }
}

/// One logo piece as drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct IntroPiece {
    pub id: String,
    pub visible: bool,
    pub progress: f32,
    pub pose: PieceTarget,
}

/// Intro overlay state; present only while the intro is playing.
#[derive(Debug, Clone, PartialEq)]
pub struct IntroFrame {
    pub phase: SequencePhase,
    pub pieces: Vec<IntroPiece>,
    pub tagline: String,
    pub skip_label: String,
}

/// Entry of the language switcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleOption {
    pub code: String,
    pub label: String,
    pub active: bool,
}

/// Everything the rendering collaborator needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PageFrame {
    /// Sequential frame index (starts at 0).
    pub frame_idx: u64,
    pub locale: LocaleTag,
    /// Whether page content is shown (false while the intro covers it).
    pub page_visible: bool,
    /// Resolved page text in document order.
    pub text: Vec<(&'static str, String)>,
    pub switcher: Vec<LocaleOption>,
    pub intro: Option<IntroFrame>,
    pub particles: Vec<ParticleSample>,
}

impl PageFrame {
    /// Resolved text for `key`, if it is a page key.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.text
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

// ---------------------------------------------------------------------------
// SiteRunner
// ---------------------------------------------------------------------------

/// Step-driven site core (no threads, no blocking).
pub struct SiteRunner<S: LocaleStorage> {
    ctx: LocaleContext<S>,
    scheduler: Scheduler,

    intro_timeline: Option<Rc<RevealTimeline>>,
    intro: Option<SequenceHandle>,
    page_revealed: Rc<Cell<bool>>,
    particles: ParticleField,

    dirty: Rc<Cell<bool>>,
    locale_sub: Option<LocaleSubscription>,
    events: VecDeque<SiteEvent>,

    mounted: bool,
    unmounted: bool,
    mounted_at: Duration,
    frame_idx: u64,
}

impl<S: LocaleStorage> std::fmt::Debug for SiteRunner<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteRunner")
            .field("locale", &self.ctx.locale())
            .field("mounted", &self.mounted)
            .field("unmounted", &self.unmounted)
            .field("intro", &self.intro)
            .field("frame_idx", &self.frame_idx)
            .finish_non_exhaustive()
    }
}

impl SiteRunner<SiteStorage> {
    /// Build a runner whose storage backend is chosen by `config`.
    pub fn from_config(config: &SiteConfig, signals: &HostSignals) -> Result<Self, SiteError> {
        Self::new(config, SiteStorage::from_config(config), signals)
    }
}

impl<S: LocaleStorage> SiteRunner<S> {
    /// Load content, run locale detection, and validate the intro.
    ///
    /// Nothing is scheduled until [`mount`](Self::mount).
    pub fn new(config: &SiteConfig, storage: S, signals: &HostSignals) -> Result<Self, SiteError> {
        config.validate()?;
        let supported = config.supported()?;
        let fallback = config.fallback_tag()?;
        let default = config.default_tag()?;

        let catalog = content::bundled_catalog()?;
        content::check_completeness(&catalog, fallback.as_str(), config.completeness)?;
        let resolver = Resolver::new(catalog, supported, fallback)?;

        let detection = {
            let stored = StoredPreference::new(&storage, config.storage_key.as_str());
            let detectors: Vec<&dyn LocaleDetector> = config
                .detection_order
                .iter()
                .map(|kind| {
                    let detector: &dyn LocaleDetector = match kind {
                        DetectorKind::StoredPreference => &stored,
                        DetectorKind::Environment => &signals.environment,
                        DetectorKind::Document => &signals.document,
                    };
                    detector
                })
                .collect();
            detect_with_source(&detectors, resolver.supported(), &default)
        };
        info!(
            locale = %detection.locale,
            source = detection.source.unwrap_or("default"),
            "initial locale"
        );

        let ctx = LocaleContext::new(
            resolver,
            storage,
            config.storage_key.as_str(),
            detection.locale,
        );

        let dirty = Rc::new(Cell::new(true));
        let flag = Rc::clone(&dirty);
        let locale_sub = ctx.subscribe(move |locale| {
            debug!(locale = %locale, "locale changed, re-render");
            flag.set(true);
        });

        let intro_timeline = if config.intro_enabled {
            Some(Rc::new(intro::logo_intro_timeline()?))
        } else {
            None
        };

        Ok(Self {
            ctx,
            scheduler: Scheduler::new(),
            page_revealed: Rc::new(Cell::new(intro_timeline.is_none())),
            intro_timeline,
            intro: None,
            particles: ParticleField::generate(intro::hero_particles()),
            dirty,
            locale_sub: Some(locale_sub),
            events: VecDeque::new(),
            mounted: false,
            unmounted: false,
            mounted_at: Duration::ZERO,
            frame_idx: 0,
        })
    }

    /// Start the page at host time `now`: begins the intro if enabled.
    ///
    /// Calling it again is a no-op.
    pub fn mount(&mut self, now: Duration) -> StepResult {
        if self.mounted || self.unmounted {
            return self.summary(StepResult::default());
        }
        self.scheduler.advance_to(now);
        self.mounted = true;
        self.mounted_at = self.scheduler.now();
        self.dirty.set(true);

        if let Some(timeline) = &self.intro_timeline {
            let revealed = Rc::clone(&self.page_revealed);
            let dirty = Rc::clone(&self.dirty);
            let handle = SequenceRun::new(Rc::clone(timeline)).start(
                &self.scheduler,
                Some(Box::new(move || {
                    info!("intro complete, page revealed");
                    revealed.set(true);
                    dirty.set(true);
                })),
            );
            self.intro = Some(handle);
        }
        self.summary(StepResult::default())
    }

    // -- Event delivery -----------------------------------------------------

    /// Buffer an event for the next `step`.
    pub fn push_event(&mut self, event: SiteEvent) {
        if self.unmounted {
            return;
        }
        self.events.push_back(event);
    }

    pub fn push_events(&mut self, events: impl IntoIterator<Item = SiteEvent>) {
        for event in events {
            self.push_event(event);
        }
    }

    // -- Step ---------------------------------------------------------------

    /// Apply deferred locale changes, drain events, and fire due timers.
    ///
    /// `now` is the host's monotonic timestamp.
    pub fn step(&mut self, now: Duration) -> StepResult {
        if !self.mounted || self.unmounted {
            return self.summary(StepResult::default());
        }

        let mut result = StepResult {
            deferred_applied: self.ctx.run_deferred(),
            ..StepResult::default()
        };

        while let Some(event) = self.events.pop_front() {
            self.handle_event(event);
            result.events_processed += 1;
            if self.unmounted {
                return self.summary(result);
            }
        }

        result.timers_fired = self.scheduler.advance_to(now);

        if let Some(handle) = &self.intro {
            if handle.is_finished() {
                self.intro = None;
            } else {
                // Pieces are mid-animation.
                self.dirty.set(true);
            }
        }

        self.summary(result)
    }

    /// Switch language directly, bypassing the event queue.
    pub fn set_locale(&self, code: &str) -> Result<LocaleChange, I18nError> {
        self.ctx.set_locale(code)
    }

    fn handle_event(&mut self, event: SiteEvent) {
        match event {
            SiteEvent::SetLocale(code) => match self.ctx.set_locale(&code) {
                Ok(change) => debug!(code = %code, ?change, "locale switch"),
                Err(err) => warn!(error = %err, "locale switch rejected"),
            },
            SiteEvent::SkipIntro => {
                if let Some(handle) = self.intro.take() {
                    handle.cancel();
                    info!("intro skipped");
                }
                self.page_revealed.set(true);
                self.dirty.set(true);
            }
            SiteEvent::Unmount => {
                if let Some(handle) = self.intro.take() {
                    handle.cancel();
                }
                self.locale_sub = None;
                self.events.clear();
                self.unmounted = true;
                self.dirty.set(false);
                info!("site unmounted");
            }
        }
    }

    fn summary(&self, mut result: StepResult) -> StepResult {
        result.dirty = self.dirty.get();
        result.unmounted = self.unmounted;
        result
    }

    // -- Render -------------------------------------------------------------

    /// Render the current frame if dirty.
    pub fn render(&mut self) -> Option<PageFrame> {
        if !self.dirty.get() || !self.mounted || self.unmounted {
            return None;
        }
        Some(self.force_render())
    }

    /// Render unconditionally. Hosts drawing the particle ambience call
    /// this every animation frame.
    pub fn force_render(&mut self) -> PageFrame {
        let ctx = &self.ctx;
        let locale = ctx.locale();
        let elapsed = self.scheduler.now().saturating_sub(self.mounted_at);

        let text = PAGE_KEYS
            .iter()
            .map(|key| (*key, ctx.t(key).to_string()))
            .collect();

        let switcher = ctx
            .resolver()
            .supported()
            .iter()
            .map(|tag| {
                let key = format!("language.{}", tag.language());
                LocaleOption {
                    code: tag.to_string(),
                    label: ctx.t(&key).to_string(),
                    active: *tag == locale,
                }
            })
            .collect();

        let intro = self.intro.as_ref().filter(|h| !h.is_finished()).map(|h| {
            let pieces = h
                .rendered_pieces()
                .into_iter()
                .map(|p| IntroPiece {
                    id: p.id.to_string(),
                    visible: p.visible,
                    progress: p.progress,
                    pose: p.pose,
                })
                .collect();
            IntroFrame {
                phase: h.phase(),
                pieces,
                tagline: ctx.t(INTRO_KEYS[0]).to_string(),
                skip_label: ctx.t(INTRO_KEYS[1]).to_string(),
            }
        });

        let frame = PageFrame {
            frame_idx: self.frame_idx,
            locale,
            page_visible: self.page_revealed.get(),
            text,
            switcher,
            intro,
            particles: self.particles.sample(elapsed),
        };
        self.dirty.set(false);
        self.frame_idx += 1;
        frame
    }

    // -- Accessors ----------------------------------------------------------

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted && !self.unmounted
    }

    #[must_use]
    pub fn is_unmounted(&self) -> bool {
        self.unmounted
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Whether page content has been revealed.
    #[must_use]
    pub fn page_revealed(&self) -> bool {
        self.page_revealed.get()
    }

    /// Phase of the running intro, `None` when not playing.
    #[must_use]
    pub fn intro_phase(&self) -> Option<SequencePhase> {
        self.intro.as_ref().map(SequenceHandle::phase)
    }

    #[must_use]
    pub fn frame_idx(&self) -> u64 {
        self.frame_idx
    }

    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Earliest pending timer, for hosts that sleep between frames.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    #[must_use]
    pub fn context(&self) -> &LocaleContext<S> {
        &self.ctx
    }

    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}
