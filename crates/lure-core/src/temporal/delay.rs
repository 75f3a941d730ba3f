//! Reply delay computation.

use crate::persona::Persona;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::Display;

/// How demanding an inbound message is to read and answer.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComplexityClass {
    Simple,
    Medium,
    Complex,
}

impl ComplexityClass {
    /// Classifies inbound text by length and by how many asks it carries.
    pub fn classify(text: &str) -> Self {
        let chars = text.chars().count();
        let asks = text.matches('?').count()
            + text.matches("http").count()
            + text.lines().filter(|line| !line.trim().is_empty()).count().saturating_sub(1);

        if chars >= 240 || asks >= 3 {
            ComplexityClass::Complex
        } else if chars >= 80 || asks >= 1 {
            ComplexityClass::Medium
        } else {
            ComplexityClass::Simple
        }
    }
}

/// A closed range of seconds sampled uniformly.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct DelayRange {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl DelayRange {
    pub const fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    /// Maps a draw in `[0, 1)` onto the range. Out-of-range draws are clamped.
    pub fn sample(&self, draw: f64) -> f64 {
        let draw = draw.clamp(0.0, 1.0);
        self.min_secs + (self.max_secs - self.min_secs) * draw
    }
}

/// How the distraction delay combines with the tech-savviness multiplier.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DistractionComposition {
    /// `base * multiplier + distraction`
    #[default]
    Additive,
    /// `(base + distraction) * multiplier`
    Multiplicative,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub simple: DelayRange,
    pub medium: DelayRange,
    pub complex: DelayRange,
    pub distraction: DelayRange,
    pub distraction_probability: f64,
    pub floor_secs: f64,
    pub ceiling_secs: f64,
    pub composition: DistractionComposition,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            simple: DelayRange::new(5.0, 20.0),
            medium: DelayRange::new(15.0, 45.0),
            complex: DelayRange::new(30.0, 90.0),
            distraction: DelayRange::new(60.0, 300.0),
            distraction_probability: 0.15,
            floor_secs: 2.0,
            ceiling_secs: 600.0,
            composition: DistractionComposition::Additive,
        }
    }
}

impl TimingConfig {
    pub fn range_for(&self, class: ComplexityClass) -> DelayRange {
        match class {
            ComplexityClass::Simple => self.simple,
            ComplexityClass::Medium => self.medium,
            ComplexityClass::Complex => self.complex,
        }
    }
}

/// The three independent draws a delay computation consumes, each in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayDraws {
    pub base: f64,
    pub distraction_roll: f64,
    pub distraction: f64,
}

impl DelayDraws {
    pub fn new(base: f64, distraction_roll: f64, distraction: f64) -> Self {
        Self {
            base,
            distraction_roll,
            distraction,
        }
    }
}

/// Computes the reply delay for a persona and message class.
///
/// Deterministic for fixed draws. The result is clamped to
/// `[floor_secs, ceiling_secs]` and is never negative.
pub fn compute_delay(
    persona: &Persona,
    class: ComplexityClass,
    draws: DelayDraws,
    config: &TimingConfig,
) -> Duration {
    let multiplier = persona.tech_multiplier();
    let base = config.range_for(class).sample(draws.base);
    let distraction = if draws.distraction_roll < config.distraction_probability {
        config.distraction.sample(draws.distraction)
    } else {
        0.0
    };

    let raw = match config.composition {
        DistractionComposition::Additive => base * multiplier + distraction,
        DistractionComposition::Multiplicative => (base + distraction) * multiplier,
    };

    let floor = if config.floor_secs.is_finite() {
        config.floor_secs.max(0.0)
    } else {
        0.0
    };
    // `max` drops a NaN ceiling in favour of the floor
    let ceiling = config.ceiling_secs.max(floor);
    let secs = if raw.is_finite() { raw.clamp(floor, ceiling) } else { floor };
    tracing::debug!(
        persona = persona.name(),
        class = %class,
        base,
        distraction,
        secs,
        "Computed reply delay"
    );
    Duration::try_from_secs_f64(secs).unwrap_or_else(|_| Duration::from_secs_f64(floor))
}
