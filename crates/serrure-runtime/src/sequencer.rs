#![forbid(unsafe_code)]

//! Timed reveal sequencer.
//!
//! Drives a [`RevealTimeline`] through its lifecycle on a [`Scheduler`]:
//!
//! ```text
//! Idle ──start──→ Running ──total──→ Completing ──total+settle──→ Done
//!                    │                    │                        (on_complete fires)
//!                    └──── cancel ────────┴──→ (timers cleared, callback dropped)
//! ```
//!
//! # Invariants
//!
//! 1. The completion callback runs at most once, and never after `cancel`.
//! 2. `cancel` is synchronous and idempotent: once it returns, no timer of
//!    this run remains in the scheduler.
//! 3. Dropping a [`SequenceHandle`] cancels the run.
//! 4. Phases only move forward.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::debug;

use crate::reveal::{PieceFrame, RevealTimeline};
use crate::scheduler::{Scheduler, TimerId};

/// Lifecycle phase of a reveal run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SequencePhase {
    Idle,
    Running,
    Completing,
    Done,
}

/// Boxed completion callback.
pub type OnComplete = Box<dyn FnOnce()>;

/// A reveal that has not been started.
#[derive(Debug, Clone)]
pub struct SequenceRun {
    timeline: Rc<RevealTimeline>,
}

struct RunState {
    phase: SequencePhase,
    started_at: Duration,
    cancelled: bool,
    on_complete: Option<OnComplete>,
    timers: Vec<TimerId>,
}

impl SequenceRun {
    #[must_use]
    pub fn new(timeline: Rc<RevealTimeline>) -> Self {
        Self { timeline }
    }

    /// Always [`SequencePhase::Idle`].
    #[must_use]
    pub fn phase(&self) -> SequencePhase {
        SequencePhase::Idle
    }

    #[must_use]
    pub fn timeline(&self) -> &RevealTimeline {
        &self.timeline
    }

    /// Start the reveal at the scheduler's current time.
    ///
    /// `on_complete` fires once, at `total + settle`, unless the run is
    /// cancelled first.
    pub fn start(self, scheduler: &Scheduler, on_complete: Option<OnComplete>) -> SequenceHandle {
        let started_at = scheduler.now();
        let state = Rc::new(RefCell::new(RunState {
            phase: SequencePhase::Running,
            started_at,
            cancelled: false,
            on_complete,
            timers: Vec::with_capacity(2),
        }));

        let weak = Rc::downgrade(&state);
        let completing = scheduler.schedule_at(
            started_at.saturating_add(self.timeline.total()),
            move || enter_completing(&weak),
        );
        let weak = Rc::downgrade(&state);
        let done = scheduler.schedule_at(
            started_at.saturating_add(self.timeline.completes_at()),
            move || finish(&weak),
        );
        state.borrow_mut().timers.extend([completing, done]);

        debug!(
            started_ms = started_at.as_millis() as u64,
            total_ms = self.timeline.total().as_millis() as u64,
            settle_ms = self.timeline.settle().as_millis() as u64,
            pieces = self.timeline.pieces().len(),
            "reveal started"
        );

        SequenceHandle {
            timeline: self.timeline,
            scheduler: scheduler.clone(),
            state,
        }
    }
}

fn enter_completing(state: &Weak<RefCell<RunState>>) {
    let Some(state) = state.upgrade() else { return };
    let mut state = state.borrow_mut();
    if !state.cancelled && state.phase == SequencePhase::Running {
        state.phase = SequencePhase::Completing;
        debug!("reveal completing");
    }
}

fn finish(state: &Weak<RefCell<RunState>>) {
    let Some(state) = state.upgrade() else { return };
    let callback = {
        let mut state = state.borrow_mut();
        if state.cancelled || state.phase == SequencePhase::Done {
            return;
        }
        state.phase = SequencePhase::Done;
        state.timers.clear();
        state.on_complete.take()
    };
    debug!("reveal done");
    // Run without the borrow so the callback may query or cancel the handle.
    if let Some(callback) = callback {
        callback();
    }
}

/// Live reveal run. Dropping it cancels the run.
pub struct SequenceHandle {
    timeline: Rc<RevealTimeline>,
    scheduler: Scheduler,
    state: Rc<RefCell<RunState>>,
}

impl std::fmt::Debug for SequenceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("SequenceHandle")
            .field("phase", &state.phase)
            .field("started_at", &state.started_at)
            .field("cancelled", &state.cancelled)
            .finish()
    }
}

impl SequenceHandle {
    #[must_use]
    pub fn phase(&self) -> SequencePhase {
        self.state.borrow().phase
    }

    #[must_use]
    pub fn timeline(&self) -> &RevealTimeline {
        &self.timeline
    }

    /// Time since `start`, per the scheduler clock.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.scheduler
            .now()
            .saturating_sub(self.state.borrow().started_at)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.borrow().cancelled
    }

    /// Done or cancelled: the reveal may be torn down.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        let state = self.state.borrow();
        state.cancelled || state.phase == SequencePhase::Done
    }

    /// Whether `piece_id` is currently shown.
    #[must_use]
    pub fn is_visible(&self, piece_id: &str) -> bool {
        !self.is_finished() && self.timeline.visibility_of(piece_id, self.elapsed())
    }

    /// Snapshot of every piece for the current frame; empty once finished.
    #[must_use]
    pub fn rendered_pieces(&self) -> Vec<PieceFrame<'_>> {
        if self.is_finished() {
            return Vec::new();
        }
        self.timeline.frame(self.elapsed())
    }

    /// Stop the run: clear its timers and drop the completion callback.
    ///
    /// Returns `false` if the run had already been cancelled or finished.
    pub fn cancel(&self) -> bool {
        let (timers, callback) = {
            let mut state = self.state.borrow_mut();
            if state.cancelled || state.phase == SequencePhase::Done {
                return false;
            }
            state.cancelled = true;
            (std::mem::take(&mut state.timers), state.on_complete.take())
        };
        for id in timers {
            self.scheduler.cancel(id);
        }
        drop(callback);
        debug!(phase = ?self.phase(), "reveal cancelled");
        true
    }
}

impl Drop for SequenceHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
