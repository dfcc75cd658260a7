//! Active locale holder with change notification and next-turn deferral.
//!
//! # Design
//!
//! [`ActiveLocale`] keeps the selected [`LocaleTag`] in shared,
//! reference-counted storage (`Rc<RefCell<..>>`). Changing the value bumps a
//! version counter and notifies live subscribers in registration order; the
//! rendering collaborator subscribes to learn when displayed text must be
//! re-resolved.
//!
//! # Invariants
//!
//! 1. `version` increments by exactly 1 per applied change.
//! 2. Setting the current value is a no-op (no version bump, no notification).
//! 3. While the holder is *busy* (notifying subscribers, or inside a guarded
//!    resolution side effect) a `set` never mutates: it is queued and reported
//!    as [`LocaleChange::Deferred`]. The owner drains the queue on its next
//!    turn with [`ActiveLocale::take_pending`].
//! 4. Dropping a [`LocaleSubscription`] stops its callback before the next
//!    notification.
//!
//! # Failure Modes
//!
//! - **Subscriber leak**: guards kept forever keep callbacks alive. Dead weak
//!   references are pruned lazily on notify.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::locale::LocaleTag;

type CallbackRc = Rc<dyn Fn(&LocaleTag)>;
type CallbackWeak = Weak<dyn Fn(&LocaleTag)>;

struct StateInner {
    current: LocaleTag,
    version: u64,
    subscribers: Vec<CallbackWeak>,
    pending: VecDeque<LocaleTag>,
}

/// Result of [`ActiveLocale::set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleChange {
    /// The value changed; holds the previous locale.
    Applied { previous: LocaleTag },
    /// The requested locale was already active.
    Unchanged,
    /// The holder was busy; the change is queued for the next turn.
    Deferred,
}

/// Shared, version-tracked active locale.
///
/// Cloning creates another handle to the **same** state.
#[derive(Clone)]
pub struct ActiveLocale {
    inner: Rc<RefCell<StateInner>>,
    busy: Rc<Cell<u32>>,
}

impl std::fmt::Debug for ActiveLocale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ActiveLocale")
            .field("current", &inner.current)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.subscribers.len())
            .field("pending", &inner.pending.len())
            .finish()
    }
}

impl ActiveLocale {
    /// Create the holder with its startup locale (version 0).
    #[must_use]
    pub fn new(initial: LocaleTag) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StateInner {
                current: initial,
                version: 0,
                subscribers: Vec::new(),
                pending: VecDeque::new(),
            })),
            busy: Rc::new(Cell::new(0)),
        }
    }

    /// Clone of the active locale.
    #[must_use]
    pub fn get(&self) -> LocaleTag {
        self.inner.borrow().current.clone()
    }

    /// Borrow the active locale without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&LocaleTag) -> R) -> R {
        f(&self.inner.borrow().current)
    }

    /// Number of applied changes since creation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Whether a notification or guarded side effect is in progress.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.get() > 0
    }

    /// Mark the holder busy until the guard drops. Nested guards stack.
    #[must_use]
    pub fn busy_guard(&self) -> BusyGuard {
        self.busy.set(self.busy.get() + 1);
        BusyGuard {
            busy: Rc::clone(&self.busy),
        }
    }

    /// Change the active locale, or queue the change when busy.
    pub fn set(&self, locale: LocaleTag) -> LocaleChange {
        if self.is_busy() {
            self.inner.borrow_mut().pending.push_back(locale);
            return LocaleChange::Deferred;
        }

        let previous = {
            let mut inner = self.inner.borrow_mut();
            if inner.current == locale {
                return LocaleChange::Unchanged;
            }
            inner.version += 1;
            std::mem::replace(&mut inner.current, locale)
        };
        self.notify();
        LocaleChange::Applied { previous }
    }

    /// Pop the oldest deferred change. Returns `None` while still busy, so a
    /// queued change is never applied inside the turn that produced it.
    pub fn take_pending(&self) -> Option<LocaleTag> {
        if self.is_busy() {
            return None;
        }
        self.inner.borrow_mut().pending.pop_front()
    }

    /// Number of queued changes.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// Subscribe to applied changes. Dropping the guard unsubscribes.
    pub fn subscribe(&self, callback: impl Fn(&LocaleTag) + 'static) -> LocaleSubscription {
        let strong: CallbackRc = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        LocaleSubscription { _callback: strong }
    }

    /// Registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    fn notify(&self) {
        let (callbacks, value) = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|w| w.strong_count() > 0);
            let live: Vec<CallbackRc> = inner.subscribers.iter().filter_map(Weak::upgrade).collect();
            (live, inner.current.clone())
        };

        let _guard = self.busy_guard();
        for cb in &callbacks {
            cb(&value);
        }
    }
}

/// RAII marker returned by [`ActiveLocale::busy_guard`].
#[derive(Debug)]
pub struct BusyGuard {
    busy: Rc<Cell<u32>>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.set(self.busy.get().saturating_sub(1));
    }
}

/// RAII guard for a locale-change subscriber.
pub struct LocaleSubscription {
    _callback: CallbackRc,
}

impl std::fmt::Debug for LocaleSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocaleSubscription").finish_non_exhaustive()
    }
}
