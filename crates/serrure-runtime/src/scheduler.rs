#![forbid(unsafe_code)]

//! Host-driven, single-threaded timer loop.
//!
//! [`Scheduler`] never blocks and never reads a clock. The host delivers
//! monotonic timestamps (e.g. `performance.now()` or a frame counter
//! converted to [`Duration`]) through [`advance_to`](Scheduler::advance_to),
//! and due callbacks run on the caller's stack:
//!
//! ```text
//! host frame
//!   → advance_to(now)     // fire due timers in deadline order
//!   → render
//! ```
//!
//! Replaying the same timestamps replays the same callback order.
//!
//! # Invariants
//!
//! 1. Timers fire in `(deadline, id)` order; equal deadlines keep scheduling
//!    order.
//! 2. A cancelled timer never fires, and `cancel` takes effect before it
//!    returns.
//! 3. Time never moves backwards: an earlier `now` is ignored.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tracing::trace;

/// Identifier returned by [`Scheduler::schedule_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

struct Timer {
    id: TimerId,
    deadline: Duration,
    callback: Box<dyn FnOnce()>,
}

struct SchedulerInner {
    now: Duration,
    next_id: u64,
    timers: Vec<Timer>,
}

/// Cooperative timer queue.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Scheduler")
            .field("now", &inner.now)
            .field("pending_timers", &inner.timers.len())
            .finish()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create a scheduler whose clock reads zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                now: Duration::ZERO,
                next_id: 1,
                timers: Vec::new(),
            })),
        }
    }

    /// Timestamp of the most recent `advance_to`.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Run `callback` once the clock reaches `deadline`.
    ///
    /// A deadline in the past fires on the next `advance_to`.
    pub fn schedule_at(&self, deadline: Duration, callback: impl FnOnce() + 'static) -> TimerId {
        let mut inner = self.inner.borrow_mut();
        let id = TimerId(inner.next_id);
        inner.next_id += 1;
        inner.timers.push(Timer {
            id,
            deadline,
            callback: Box::new(callback),
        });
        id
    }

    /// Run `callback` after `delay` from the current clock.
    pub fn schedule_after(&self, delay: Duration, callback: impl FnOnce() + 'static) -> TimerId {
        let deadline = self.now().saturating_add(delay);
        self.schedule_at(deadline, callback)
    }

    /// Cancel a pending timer. Returns `false` if it already fired or was
    /// already cancelled.
    pub fn cancel(&self, id: TimerId) -> bool {
        // Take the callback out first so its captures drop outside the borrow.
        let removed = {
            let mut inner = self.inner.borrow_mut();
            inner
                .timers
                .iter()
                .position(|t| t.id == id)
                .map(|idx| inner.timers.swap_remove(idx))
        };
        removed.is_some()
    }

    /// Whether `id` is still waiting to fire.
    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.inner.borrow().timers.iter().any(|t| t.id == id)
    }

    /// Number of timers waiting to fire.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    /// Earliest pending deadline, for hosts that sleep between frames.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.inner.borrow().timers.iter().map(|t| t.deadline).min()
    }

    /// Move the clock to `now`, firing every timer due at or before it.
    ///
    /// Callbacks observe [`now`](Self::now) equal to their own deadline, and
    /// timers they schedule inside the window also fire in this call.
    pub fn advance_to(&self, now: Duration) -> usize {
        let mut fired = 0;
        loop {
            let due = {
                let mut inner = self.inner.borrow_mut();
                let next = inner
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.deadline <= now)
                    .min_by_key(|(_, t)| (t.deadline, t.id))
                    .map(|(idx, _)| idx);
                next.map(|idx| {
                    let timer = inner.timers.swap_remove(idx);
                    if timer.deadline > inner.now {
                        inner.now = timer.deadline;
                    }
                    timer
                })
            };
            let Some(timer) = due else { break };
            trace!(timer = timer.id.0, deadline_ms = timer.deadline.as_millis() as u64, "timer fired");
            (timer.callback)();
            fired += 1;
        }

        let mut inner = self.inner.borrow_mut();
        if now > inner.now {
            inner.now = now;
        }
        fired
    }
}
