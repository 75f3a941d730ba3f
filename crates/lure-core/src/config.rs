//! Engagement configuration.
//!
//! Every field has a default, so a partial TOML file only needs the values it
//! changes.

use crate::callback::CallbackConfig;
use crate::conversation::StateMachineConfig;
use crate::error::{LureError, Result};
use crate::temporal::TimingConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Conditions under which a session becomes eligible for its final report.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FinalizationConfig {
    pub completeness_threshold: f64,
    /// Minimum turns before a single high-value item makes a session eligible
    pub high_value_min_turns: u32,
    /// Consecutive unanswered persona messages treated as adversary silence
    pub silence_turns: u32,
}

impl Default for FinalizationConfig {
    fn default() -> Self {
        Self {
            completeness_threshold: 0.5,
            high_value_min_turns: 4,
            silence_turns: 3,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Inactivity after which the sweep expires a session
    pub idle_timeout_secs: u64,
    /// How long terminal sessions stay in the store
    pub retention_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 30 * 60,
            retention_secs: 24 * 60 * 60,
            sweep_interval_secs: 60,
        }
    }
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ReplyConfig {
    /// Extra generator calls after a rejected candidate before falling back
    pub max_regenerations: u32,
    /// Inbound turns included in the generator's context
    pub recent_turns: usize,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            max_regenerations: 2,
            recent_turns: 5,
        }
    }
}

/// Root configuration.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EngagementConfig {
    pub conversation: StateMachineConfig,
    pub timing: TimingConfig,
    pub finalization: FinalizationConfig,
    pub callback: CallbackConfig,
    pub session: SessionConfig,
    pub reply: ReplyConfig,
}

impl EngagementConfig {
    /// Parses TOML; an empty document yields the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let conversation = &self.conversation;
        if conversation.max_total_turns == 0 {
            return Err(LureError::config("conversation.max_total_turns must be positive"));
        }
        for (name, bounds) in [
            ("initial", conversation.initial),
            ("confusion", conversation.confusion),
            ("building_trust", conversation.building_trust),
            ("feigned_compliance", conversation.feigned_compliance),
            ("delay_tactics", conversation.delay_tactics),
        ] {
            if bounds.min_turns > bounds.max_turns {
                return Err(LureError::config(format!(
                    "conversation.{name}: min_turns {} exceeds max_turns {}",
                    bounds.min_turns, bounds.max_turns
                )));
            }
            if !(0.0..=1.0).contains(&bounds.transition_probability) {
                return Err(LureError::config(format!(
                    "conversation.{name}: transition_probability must be within [0, 1]"
                )));
            }
        }

        let timing = &self.timing;
        for (name, range) in [
            ("simple", timing.simple),
            ("medium", timing.medium),
            ("complex", timing.complex),
            ("distraction", timing.distraction),
        ] {
            let finite = range.min_secs.is_finite() && range.max_secs.is_finite();
            if !finite || !(0.0 <= range.min_secs && range.min_secs <= range.max_secs) {
                return Err(LureError::config(format!(
                    "timing.{name}: range must be finite with 0 <= min_secs <= max_secs"
                )));
            }
        }
        let finite = timing.floor_secs.is_finite() && timing.ceiling_secs.is_finite();
        if !finite || !(0.0 <= timing.floor_secs && timing.floor_secs <= timing.ceiling_secs) {
            return Err(LureError::config(
                "timing: floor_secs and ceiling_secs must be finite with 0 <= floor_secs <= ceiling_secs",
            ));
        }
        if !(0.0..=1.0).contains(&timing.distraction_probability) {
            return Err(LureError::config("timing.distraction_probability must be within [0, 1]"));
        }

        if !(0.0..=1.0).contains(&self.finalization.completeness_threshold) {
            return Err(LureError::config(
                "finalization.completeness_threshold must be within [0, 1]",
            ));
        }
        if self.callback.max_attempts == 0 {
            return Err(LureError::config("callback.max_attempts must be at least 1"));
        }
        if self.callback.endpoint.trim().is_empty() {
            return Err(LureError::config("callback.endpoint must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(EngagementConfig::from_toml_str("").unwrap(), EngagementConfig::default());
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let config = EngagementConfig::from_toml_str(
            r#"
            [conversation]
            max_total_turns = 12

            [callback]
            max_attempts = 5
            api_key = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.conversation.max_total_turns, 12);
        assert_eq!(config.conversation.confusion.max_turns, 4);
        assert_eq!(config.callback.max_attempts, 5);
        assert_eq!(config.callback.api_key.as_deref(), Some("secret"));
        assert_eq!(config.callback.initial_backoff_ms, 1_000);
        assert_eq!(config.session.idle_timeout_secs, 1_800);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = EngagementConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngagementConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_bounds_are_rejected() {
        let err = EngagementConfig::from_toml_str(
            r#"
            [conversation.confusion]
            min_turns = 5
            max_turns = 2
            transition_probability = 0.4
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, LureError::Config(_)));
    }

    #[test]
    fn test_non_finite_timing_is_rejected() {
        for document in [
            "[timing.simple]\nmin_secs = nan\nmax_secs = 20.0\n",
            "[timing.complex]\nmin_secs = 30.0\nmax_secs = inf\n",
            "[timing]\nceiling_secs = inf\n",
            "[timing]\nfloor_secs = nan\n",
        ] {
            let err = EngagementConfig::from_toml_str(document).unwrap_err();
            assert!(matches!(err, LureError::Config(_)), "{document}");
        }
    }

    #[test]
    fn test_malformed_toml_is_a_serialization_error() {
        let err = EngagementConfig::from_toml_str("[conversation\nmax_total_turns = ").unwrap_err();
        assert!(matches!(err, LureError::Serialization { .. }));
    }
}
