#![forbid(unsafe_code)]

//! Ambient particle field behind the hero section.
//!
//! Purely decorative: a seeded, deterministic cloud of points that bob and
//! pulse on independent periods. The field is regenerated from its config,
//! so two fields built from equal configs sample identically.

use std::f32::consts::TAU;
use std::time::Duration;

/// Half-extents of the box particles are scattered in, centred on origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBounds {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for FieldBounds {
    fn default() -> Self {
        Self {
            x: 10.0,
            y: 6.0,
            z: 4.0,
        }
    }
}

/// Inclusive `[min, max]` range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Span<T> {
    /// Build a span, swapping the ends if given in reverse.
    #[must_use]
    pub fn new(a: T, b: T) -> Self {
        if b < a {
            Self { min: b, max: a }
        } else {
            Self { min: a, max: b }
        }
    }
}

/// Tunables for [`ParticleField::generate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleFieldConfig {
    pub count: usize,
    pub bounds: FieldBounds,
    /// Opacity envelope each particle pulses within, clamped to `[0, 1]`.
    pub opacity: Span<f32>,
    /// Bob period per particle.
    pub period: Span<Duration>,
    /// Vertical bob amplitude per particle, in field units.
    pub amplitude: Span<f32>,
    pub seed: u64,
}

impl Default for ParticleFieldConfig {
    fn default() -> Self {
        Self {
            count: 80,
            bounds: FieldBounds::default(),
            opacity: Span::new(0.2, 0.7),
            period: Span::new(Duration::from_secs(3), Duration::from_secs(8)),
            amplitude: Span::new(0.1, 0.5),
            seed: 0x5EED_CAFE,
        }
    }
}

impl ParticleFieldConfig {
    #[must_use]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    #[must_use]
    pub fn with_bounds(mut self, bounds: FieldBounds) -> Self {
        self.bounds = bounds;
        self
    }

    #[must_use]
    pub fn with_opacity(mut self, min: f32, max: f32) -> Self {
        self.opacity = Span::new(min.clamp(0.0, 1.0), max.clamp(0.0, 1.0));
        self
    }

    #[must_use]
    pub fn with_period(mut self, min: Duration, max: Duration) -> Self {
        self.period = Span::new(min, max);
        self
    }

    #[must_use]
    pub fn with_amplitude(mut self, min: f32, max: f32) -> Self {
        self.amplitude = Span::new(min, max);
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// 64-bit LCG (Knuth MMIX constants).
#[derive(Debug, Clone)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0
    }

    /// Uniform in `[0, 1)` from the high 24 bits.
    fn next_unit(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    fn range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_unit()
    }
}

/// One generated particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub origin: [f32; 3],
    /// Phase offset in radians.
    pub phase: f32,
    pub amplitude: f32,
    pub period_secs: f32,
}

impl Particle {
    fn angle(&self, t: Duration) -> f32 {
        if self.period_secs <= 0.0 {
            return self.phase;
        }
        self.phase + TAU * (t.as_secs_f32() / self.period_secs)
    }

    /// Position at `t`: vertical bob plus a half-amplitude sway.
    #[must_use]
    pub fn position_at(&self, t: Duration) -> [f32; 3] {
        let a = self.angle(t);
        [
            self.origin[0] + 0.5 * self.amplitude * a.cos(),
            self.origin[1] + self.amplitude * a.sin(),
            self.origin[2],
        ]
    }

    /// Opacity at `t`, oscillating inside `envelope`.
    #[must_use]
    pub fn opacity_at(&self, t: Duration, envelope: Span<f32>) -> f32 {
        let wave = 0.5 + 0.5 * self.angle(t).sin();
        envelope.min + (envelope.max - envelope.min) * wave
    }
}

/// Sampled particle state for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSample {
    pub position: [f32; 3],
    pub opacity: f32,
}

/// Deterministic particle cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleField {
    config: ParticleFieldConfig,
    particles: Vec<Particle>,
}

impl ParticleField {
    #[must_use]
    pub fn generate(config: ParticleFieldConfig) -> Self {
        let mut rng = Lcg::new(config.seed);
        let b = config.bounds;
        let period = Span::new(
            config.period.min.as_secs_f32(),
            config.period.max.as_secs_f32(),
        );
        let particles = (0..config.count)
            .map(|_| Particle {
                origin: [
                    rng.range(-b.x, b.x),
                    rng.range(-b.y, b.y),
                    rng.range(-b.z, b.z),
                ],
                phase: rng.range(0.0, TAU),
                amplitude: rng.range(config.amplitude.min, config.amplitude.max),
                period_secs: rng.range(period.min, period.max),
            })
            .collect();
        Self { config, particles }
    }

    #[must_use]
    pub fn config(&self) -> &ParticleFieldConfig {
        &self.config
    }

    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Every particle's state at `t`.
    #[must_use]
    pub fn sample(&self, t: Duration) -> Vec<ParticleSample> {
        self.particles
            .iter()
            .map(|p| ParticleSample {
                position: p.position_at(t),
                opacity: p.opacity_at(t, self.config.opacity),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_field() {
        let a = ParticleField::generate(ParticleFieldConfig::default().with_seed(7));
        let b = ParticleField::generate(ParticleFieldConfig::default().with_seed(7));
        assert_eq!(a, b);
        let c = ParticleField::generate(ParticleFieldConfig::default().with_seed(8));
        assert_ne!(a.particles(), c.particles());
    }

    #[test]
    fn particles_start_inside_bounds() {
        let config = ParticleFieldConfig::default()
            .with_count(500)
            .with_bounds(FieldBounds {
                x: 2.0,
                y: 1.0,
                z: 0.5,
            });
        let field = ParticleField::generate(config);
        assert_eq!(field.len(), 500);
        for p in field.particles() {
            assert!(p.origin[0].abs() <= 2.0);
            assert!(p.origin[1].abs() <= 1.0);
            assert!(p.origin[2].abs() <= 0.5);
            assert!((0.0..=TAU).contains(&p.phase));
            assert!((3.0..=8.0).contains(&p.period_secs));
        }
    }

    #[test]
    fn opacity_stays_in_envelope() {
        let field = ParticleField::generate(
            ParticleFieldConfig::default()
                .with_count(64)
                .with_opacity(0.15, 0.6),
        );
        for step in 0..50u64 {
            for s in field.sample(Duration::from_millis(step * 137)) {
                assert!(s.opacity >= 0.15 - 1e-5 && s.opacity <= 0.6 + 1e-5);
            }
        }
    }

    #[test]
    fn bob_bounded_by_amplitude() {
        let field = ParticleField::generate(ParticleFieldConfig::default().with_count(32));
        for (p, s) in field
            .particles()
            .iter()
            .zip(field.sample(Duration::from_millis(1234)))
        {
            assert!((s.position[1] - p.origin[1]).abs() <= p.amplitude + 1e-5);
            assert_eq!(s.position[2], p.origin[2]);
        }
    }

    #[test]
    fn reversed_spans_are_normalized() {
        let config = ParticleFieldConfig::default().with_opacity(0.9, 0.1);
        assert_eq!(config.opacity, Span::new(0.1, 0.9));
        assert_eq!(config.opacity.min, 0.1);
    }

    #[test]
    fn empty_field() {
        let field = ParticleField::generate(ParticleFieldConfig::default().with_count(0));
        assert!(field.is_empty());
        assert!(field.sample(Duration::ZERO).is_empty());
    }

    #[test]
    fn zero_period_is_static() {
        let p = Particle {
            origin: [0.0; 3],
            phase: 1.0,
            amplitude: 1.0,
            period_secs: 0.0,
        };
        assert_eq!(p.position_at(Duration::ZERO), p.position_at(Duration::from_secs(5)));
    }
}
