#![forbid(unsafe_code)]

//! Timing primitives for the Serrure Safe site.
//!
//! Everything runs on one thread against a host-supplied clock:
//!
//! - [`scheduler`]: deadline-ordered, cancellable timers.
//! - [`reveal`]: declarative, pure reveal timelines.
//! - [`sequencer`]: the Idle → Running → Completing → Done lifecycle with
//!   cancellable completion.
//! - [`ambient`]: the seeded decorative particle field.

pub mod ambient;
pub mod reveal;
pub mod scheduler;
pub mod sequencer;

pub use ambient::{FieldBounds, Particle, ParticleField, ParticleFieldConfig, ParticleSample, Span};
pub use reveal::{Easing, PieceFrame, PieceTarget, RevealPiece, RevealTimeline, TimelineError};
pub use scheduler::{Scheduler, TimerId};
pub use sequencer::{OnComplete, SequenceHandle, SequencePhase, SequenceRun};
