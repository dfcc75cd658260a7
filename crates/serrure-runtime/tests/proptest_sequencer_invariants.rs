//! Property-based invariant tests for the reveal sequencer.
//!
//! 1. Visibility is monotone in elapsed time and flips exactly at the delay.
//! 2. The completion callback fires exactly once when the clock passes
//!    `total + settle`, regardless of how the host slices time.
//! 3. Cancelling before completion means the callback never fires and no
//!    timers leak.
//! 4. Observed phases never move backwards.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use proptest::prelude::*;
use serrure_runtime::{
    OnComplete, RevealPiece, RevealTimeline, Scheduler, SequencePhase, SequenceRun,
};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Up to six pieces with arbitrary delays; total covers the last one.
fn timeline_strategy() -> impl Strategy<Value = RevealTimeline> {
    (
        proptest::collection::vec((0u64..3000, 0u64..1000), 1..6),
        0u64..500,
        0u64..2000,
    )
        .prop_map(|(pieces, slack, settle)| {
            let pieces: Vec<RevealPiece> = pieces
                .into_iter()
                .enumerate()
                .map(|(i, (delay, transition))| {
                    RevealPiece::new(format!("p{i}"), ms(delay)).transition(ms(transition))
                })
                .collect();
            let last = pieces.iter().map(RevealPiece::settles_at).max().unwrap();
            RevealTimeline::new(pieces, last + ms(slack), ms(settle)).unwrap()
        })
}

/// Monotone host timestamps in ms.
fn steps_strategy() -> impl Strategy<Value = Vec<u64>> {
    proptest::collection::vec(1u64..700, 1..40).prop_map(|deltas| {
        deltas
            .into_iter()
            .scan(0u64, |t, d| {
                *t += d;
                Some(*t)
            })
            .collect()
    })
}

fn counter() -> (Rc<Cell<u32>>, OnComplete) {
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    (hits, Box::new(move || h.set(h.get() + 1)))
}

proptest! {
    #[test]
    fn visibility_flips_at_delay(tl in timeline_strategy(), at_ms in 0u64..6000) {
        for piece in tl.pieces() {
            let t = ms(at_ms);
            prop_assert_eq!(tl.visibility_of(piece.id(), t), t >= piece.delay());
            if tl.visibility_of(piece.id(), t) {
                prop_assert!(tl.visibility_of(piece.id(), t + ms(1)));
            }
        }
    }

    #[test]
    fn completion_fires_exactly_once(tl in timeline_strategy(), steps in steps_strategy()) {
        let completes_at = tl.completes_at();
        let sched = Scheduler::new();
        let (hits, cb) = counter();
        let handle = SequenceRun::new(Rc::new(tl)).start(&sched, Some(cb));

        let mut last_phase = handle.phase();
        for &t in &steps {
            sched.advance_to(ms(t));
            let phase = handle.phase();
            prop_assert!(phase >= last_phase);
            last_phase = phase;
            let expected = u32::from(ms(t) >= completes_at);
            prop_assert_eq!(hits.get(), expected);
        }
        sched.advance_to(completes_at + ms(1));
        prop_assert_eq!(hits.get(), 1);
        prop_assert_eq!(handle.phase(), SequencePhase::Done);
        prop_assert_eq!(sched.pending_timers(), 0);
    }

    #[test]
    fn cancel_suppresses_completion(
        tl in timeline_strategy(),
        steps in steps_strategy(),
        cut in 0usize..40,
    ) {
        let completes_at = tl.completes_at();
        let sched = Scheduler::new();
        let (hits, cb) = counter();
        let handle = SequenceRun::new(Rc::new(tl)).start(&sched, Some(cb));

        let cut = cut.min(steps.len());
        for &t in &steps[..cut] {
            sched.advance_to(ms(t));
        }
        let already_done = handle.phase() == SequencePhase::Done;
        prop_assert_eq!(handle.cancel(), !already_done);
        prop_assert!(!handle.cancel());
        prop_assert_eq!(sched.pending_timers(), 0);

        let before = hits.get();
        sched.advance_to(completes_at + ms(10_000));
        prop_assert_eq!(hits.get(), before);
        prop_assert_eq!(before, u32::from(already_done));
    }
}
