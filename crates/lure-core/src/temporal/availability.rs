//! Persona availability at an instant.

use crate::persona::Persona;
use chrono::{DateTime, FixedOffset, NaiveTime, Offset, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Availability {
    Available,
    Sleeping,
    MealBreak,
    Busy,
}

impl Availability {
    pub fn is_available(self) -> bool {
        matches!(self, Availability::Available)
    }
}

fn local_time(persona: &Persona, timestamp: DateTime<Utc>) -> NaiveTime {
    let offset_secs = persona.policy().availability.utc_offset_minutes * 60;
    let offset = FixedOffset::east_opt(offset_secs).unwrap_or_else(|| Utc.fix());
    timestamp.with_timezone(&offset).time()
}

/// Classifies the persona's state at `timestamp`, evaluated in the persona's
/// local time. Sleep wins over meals, meals over busy windows.
pub fn availability(persona: &Persona, timestamp: DateTime<Utc>) -> Availability {
    let profile = &persona.policy().availability;
    let now = local_time(persona, timestamp);

    if profile.sleep_window().contains(now) {
        Availability::Sleeping
    } else if profile.meal_windows.iter().any(|w| w.contains(now)) {
        Availability::MealBreak
    } else if profile.busy_windows.iter().any(|w| w.contains(now)) {
        Availability::Busy
    } else {
        Availability::Available
    }
}

/// Whether the persona would plausibly reply at `timestamp`.
pub fn is_available(persona: &Persona, timestamp: DateTime<Utc>) -> bool {
    availability(persona, timestamp).is_available()
}
