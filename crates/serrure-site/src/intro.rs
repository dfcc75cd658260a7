//! Logo intro and hero ambience definitions.
//!
//! The padlock logo assembles piece by piece: the shackle drops in, the body
//! rises, the keyhole pops, then the wordmark and tagline fade up. All
//! pieces have settled at 1.9s, the sequence completes at 2.0s, and the
//! page is revealed after a further 0.8s settle.

use std::time::Duration;

use serrure_runtime::{
    Easing, FieldBounds, ParticleFieldConfig, PieceTarget, RevealPiece, RevealTimeline,
    TimelineError,
};

pub const SHACKLE: &str = "shackle";
pub const BODY: &str = "body";
pub const KEYHOLE: &str = "keyhole";
pub const WORDMARK: &str = "wordmark";
pub const TAGLINE: &str = "tagline";

/// Piece ids in reveal order.
pub const LOGO_PIECES: [&str; 5] = [SHACKLE, BODY, KEYHOLE, WORDMARK, TAGLINE];

const TRANSITION: Duration = Duration::from_millis(600);
const TOTAL: Duration = Duration::from_millis(2000);
const SETTLE: Duration = Duration::from_millis(800);

/// The padlock logo reveal.
pub fn logo_intro_timeline() -> Result<RevealTimeline, TimelineError> {
    let ms = Duration::from_millis;
    RevealTimeline::new(
        vec![
            RevealPiece::new(SHACKLE, ms(0))
                .transition(TRANSITION)
                .from(PieceTarget::HIDDEN.offset(0.0, -40.0)),
            RevealPiece::new(BODY, ms(200))
                .transition(TRANSITION)
                .from(PieceTarget::HIDDEN.offset(0.0, 30.0).with_scale(0.9)),
            RevealPiece::new(KEYHOLE, ms(500))
                .transition(TRANSITION)
                .from(PieceTarget::HIDDEN.with_scale(0.2).with_rotation(-90.0)),
            RevealPiece::new(WORDMARK, ms(800))
                .transition(TRANSITION)
                .from(PieceTarget::HIDDEN.offset(0.0, 12.0)),
            RevealPiece::new(TAGLINE, ms(1100))
                .transition(Duration::from_millis(800))
                .easing(Easing::Linear),
        ],
        TOTAL,
        SETTLE,
    )
}

/// Floating dust behind the hero headline.
#[must_use]
pub fn hero_particles() -> ParticleFieldConfig {
    ParticleFieldConfig::default()
        .with_count(120)
        .with_bounds(FieldBounds {
            x: 12.0,
            y: 7.0,
            z: 5.0,
        })
        .with_opacity(0.15, 0.6)
        .with_period(Duration::from_secs(4), Duration::from_secs(9))
        .with_amplitude(0.2, 0.8)
        .with_seed(0x5e77_0e5a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeline_is_valid() {
        let tl = logo_intro_timeline().unwrap();
        assert_eq!(tl.pieces().len(), LOGO_PIECES.len());
        assert_eq!(tl.total(), Duration::from_millis(2000));
        assert_eq!(tl.completes_at(), Duration::from_millis(2800));
    }

    #[test]
    fn pieces_reveal_in_declared_order() {
        let tl = logo_intro_timeline().unwrap();
        let ids: Vec<&str> = tl.pieces().iter().map(RevealPiece::id).collect();
        assert_eq!(ids, LOGO_PIECES.to_vec());
        let delays: Vec<Duration> = tl.pieces().iter().map(RevealPiece::delay).collect();
        assert!(delays.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn everything_settles_before_total() {
        let tl = logo_intro_timeline().unwrap();
        for piece in tl.pieces() {
            assert!(piece.settles_at() <= tl.total(), "{} late", piece.id());
        }
    }

    #[test]
    fn keyhole_hidden_until_half_second() {
        let tl = logo_intro_timeline().unwrap();
        assert!(!tl.visibility_of(KEYHOLE, Duration::from_millis(499)));
        assert!(tl.visibility_of(KEYHOLE, Duration::from_millis(500)));
    }

    #[test]
    fn hero_particles_config() {
        let config = hero_particles();
        assert_eq!(config.count, 120);
        assert_eq!(config.opacity.min, 0.15);
        assert_eq!(config.opacity.max, 0.6);
    }
}
