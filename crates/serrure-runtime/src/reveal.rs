#![forbid(unsafe_code)]

//! Declarative reveal timelines.
//!
//! A [`RevealTimeline`] is a fixed list of pieces, each with a start delay,
//! a transition length, and a start/end pose. Everything here is a pure
//! function of elapsed time, so the same elapsed value always yields the
//! same frame.
//!
//! # Invariants
//!
//! 1. Piece ids are unique within a timeline.
//! 2. `total >= delay + transition` for every piece, so all pieces have
//!    settled by the time the sequence leaves `Running`.
//! 3. `visibility_of(id, t)` is `t >= delay(id)`, and monotone in `t`.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Duplicate piece id | `TimelineError::DuplicatePiece` |
//! | Piece still moving at `total` | `TimelineError::TotalTooShort` |
//! | Unknown piece id queried | reported as not visible |

use std::fmt;
use std::time::Duration;

/// Errors raised while building a [`RevealTimeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    /// Two pieces share an id.
    DuplicatePiece(String),
    /// A piece is still transitioning when the sequence completes.
    TotalTooShort {
        piece: String,
        required: Duration,
        total: Duration,
    },
}

impl fmt::Display for TimelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicatePiece(id) => write!(f, "duplicate reveal piece: {id}"),
            Self::TotalTooShort {
                piece,
                required,
                total,
            } => write!(
                f,
                "piece {piece} settles at {}ms but the sequence ends at {}ms",
                required.as_millis(),
                total.as_millis()
            ),
        }
    }
}

impl std::error::Error for TimelineError {}

/// Easing curve applied to a piece's transition progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    /// Fast start, gentle landing.
    #[default]
    EaseOutCubic,
}

impl Easing {
    /// Map linear progress in `[0, 1]` onto the curve.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseOutCubic => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
        }
    }
}

/// Visual pose of a piece: offset, opacity, scale, rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PieceTarget {
    pub x: f32,
    pub y: f32,
    pub opacity: f32,
    pub scale: f32,
    pub rotation_deg: f32,
}

impl PieceTarget {
    /// Final resting pose.
    pub const RESTING: Self = Self {
        x: 0.0,
        y: 0.0,
        opacity: 1.0,
        scale: 1.0,
        rotation_deg: 0.0,
    };

    /// Transparent at the resting position.
    pub const HIDDEN: Self = Self {
        opacity: 0.0,
        ..Self::RESTING
    };

    #[must_use]
    pub const fn offset(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    #[must_use]
    pub const fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    #[must_use]
    pub const fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    #[must_use]
    pub const fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation_deg = degrees;
        self
    }

    /// Linear blend between two poses.
    #[must_use]
    pub fn lerp(&self, to: &Self, t: f32) -> Self {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Self {
            x: mix(self.x, to.x),
            y: mix(self.y, to.y),
            opacity: mix(self.opacity, to.opacity),
            scale: mix(self.scale, to.scale),
            rotation_deg: mix(self.rotation_deg, to.rotation_deg),
        }
    }
}

impl Default for PieceTarget {
    fn default() -> Self {
        Self::RESTING
    }
}

/// One element of a reveal, e.g. a logo part.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealPiece {
    id: String,
    delay: Duration,
    transition: Duration,
    from: PieceTarget,
    to: PieceTarget,
    easing: Easing,
}

impl RevealPiece {
    /// A piece that fades in at `delay` over 600ms.
    #[must_use]
    pub fn new(id: impl Into<String>, delay: Duration) -> Self {
        Self {
            id: id.into(),
            delay,
            transition: Duration::from_millis(600),
            from: PieceTarget::HIDDEN,
            to: PieceTarget::RESTING,
            easing: Easing::default(),
        }
    }

    #[must_use]
    pub fn transition(mut self, transition: Duration) -> Self {
        self.transition = transition;
        self
    }

    #[must_use]
    pub fn from(mut self, from: PieceTarget) -> Self {
        self.from = from;
        self
    }

    #[must_use]
    pub fn to(mut self, to: PieceTarget) -> Self {
        self.to = to;
        self
    }

    #[must_use]
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    #[must_use]
    pub fn transition_len(&self) -> Duration {
        self.transition
    }

    /// Elapsed time at which this piece reaches its end pose.
    #[must_use]
    pub fn settles_at(&self) -> Duration {
        self.delay.saturating_add(self.transition)
    }

    /// Eased transition progress in `[0, 1]`.
    #[must_use]
    pub fn progress(&self, elapsed: Duration) -> f32 {
        if elapsed < self.delay {
            return 0.0;
        }
        if self.transition.is_zero() {
            return 1.0;
        }
        let into = (elapsed - self.delay).as_secs_f32() / self.transition.as_secs_f32();
        self.easing.apply(into)
    }

    /// Interpolated pose at `elapsed`.
    #[must_use]
    pub fn pose(&self, elapsed: Duration) -> PieceTarget {
        self.from.lerp(&self.to, self.progress(elapsed))
    }
}

/// Rendering state of one piece at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct PieceFrame<'a> {
    pub id: &'a str,
    pub visible: bool,
    pub progress: f32,
    pub pose: PieceTarget,
}

/// Validated, immutable reveal description.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealTimeline {
    pieces: Vec<RevealPiece>,
    total: Duration,
    settle: Duration,
}

impl RevealTimeline {
    /// Validate and build a timeline.
    ///
    /// `total` is when the sequence moves to `Completing`; `settle` is the
    /// extra time before completion is reported.
    pub fn new(
        pieces: Vec<RevealPiece>,
        total: Duration,
        settle: Duration,
    ) -> Result<Self, TimelineError> {
        for (idx, piece) in pieces.iter().enumerate() {
            if pieces[..idx].iter().any(|p| p.id == piece.id) {
                return Err(TimelineError::DuplicatePiece(piece.id.clone()));
            }
            let required = piece.settles_at();
            if required > total {
                return Err(TimelineError::TotalTooShort {
                    piece: piece.id.clone(),
                    required,
                    total,
                });
            }
        }
        Ok(Self {
            pieces,
            total,
            settle,
        })
    }

    #[must_use]
    pub fn pieces(&self) -> &[RevealPiece] {
        &self.pieces
    }

    #[must_use]
    pub fn piece(&self, id: &str) -> Option<&RevealPiece> {
        self.pieces.iter().find(|p| p.id == id)
    }

    /// Time at which the sequence enters `Completing`.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.total
    }

    #[must_use]
    pub fn settle(&self) -> Duration {
        self.settle
    }

    /// Time at which completion is reported: `total + settle`.
    #[must_use]
    pub fn completes_at(&self) -> Duration {
        self.total.saturating_add(self.settle)
    }

    /// Whether `piece_id` has started appearing by `elapsed`.
    ///
    /// Unknown ids are never visible.
    #[must_use]
    pub fn visibility_of(&self, piece_id: &str, elapsed: Duration) -> bool {
        self.piece(piece_id).is_some_and(|p| elapsed >= p.delay)
    }

    /// Eased progress of one piece, `None` for unknown ids.
    #[must_use]
    pub fn piece_progress(&self, piece_id: &str, elapsed: Duration) -> Option<f32> {
        self.piece(piece_id).map(|p| p.progress(elapsed))
    }

    /// Pieces visible at `elapsed`, in declaration order.
    pub fn visible_pieces(&self, elapsed: Duration) -> impl Iterator<Item = &RevealPiece> + '_ {
        self.pieces.iter().filter(move |p| elapsed >= p.delay)
    }

    /// Full per-piece snapshot at `elapsed`.
    #[must_use]
    pub fn frame(&self, elapsed: Duration) -> Vec<PieceFrame<'_>> {
        self.pieces
            .iter()
            .map(|p| PieceFrame {
                id: &p.id,
                visible: elapsed >= p.delay,
                progress: p.progress(elapsed),
                pose: p.pose(elapsed),
            })
            .collect()
    }
}
