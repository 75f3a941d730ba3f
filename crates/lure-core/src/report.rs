//! Final report and callback outcome.

use crate::callback::DeliveryErrorClass;
use crate::conversation::ConversationState;
use crate::intelligence::{IntelCategory, IntelligenceItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::Display;
use thiserror::Error;

/// Summary used when no behaviour cue was observed in any turn.
pub const NO_CUES_SUMMARY: &str = "No recognizable pressure tactics observed";

/// Reasons a report is refused before any delivery attempt.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("report contains no intelligence items")]
    NoIntelligence,
    #[error("report summary is empty")]
    EmptySummary,
    #[error("session was never marked scam-confirmed")]
    ScamNotConfirmed,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Adversary,
    Persona,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub role: Speaker,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Immutable snapshot delivered to the evaluation endpoint.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinalReport {
    pub session_id: String,
    pub scam_type: String,
    pub persona_name: String,
    pub scam_confirmed: bool,
    pub total_turns: u32,
    pub final_state: ConversationState,
    pub intelligence: BTreeMap<IntelCategory, Vec<IntelligenceItem>>,
    /// One-line behaviour summary
    pub summary: String,
    pub completeness_score: f64,
    /// Mean item confidence, `0.0` when nothing was extracted
    pub average_confidence: f64,
    pub duration_seconds: i64,
    pub transcript: Vec<TranscriptEntry>,
    pub generated_at: DateTime<Utc>,
}

impl FinalReport {
    pub fn intelligence_count(&self) -> usize {
        self.intelligence.values().map(Vec::len).sum()
    }

    /// Checks the report is submittable. Never touches the network.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.intelligence_count() == 0 {
            return Err(ValidationError::NoIntelligence);
        }
        if self.summary.trim().is_empty() {
            return Err(ValidationError::EmptySummary);
        }
        if !self.scam_confirmed {
            return Err(ValidationError::ScamNotConfirmed);
        }
        Ok(())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CallbackStatus {
    Success,
    /// Attempts remain; recorded while the retry loop is still running
    Retrying,
    FailedPermanent,
}

/// Result of a submission, cached on the session.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallbackOutcome {
    pub status: CallbackStatus,
    pub attempts: u32,
    pub last_error: Option<DeliveryErrorClass>,
    pub last_error_message: Option<String>,
    pub succeeded_at: Option<DateTime<Utc>>,
}

impl CallbackOutcome {
    pub fn success(attempts: u32, at: DateTime<Utc>) -> Self {
        Self {
            status: CallbackStatus::Success,
            attempts,
            last_error: None,
            last_error_message: None,
            succeeded_at: Some(at),
        }
    }

    pub fn retrying(attempts: u32, class: DeliveryErrorClass, message: impl Into<String>) -> Self {
        Self {
            status: CallbackStatus::Retrying,
            attempts,
            last_error: Some(class),
            last_error_message: Some(message.into()),
            succeeded_at: None,
        }
    }

    pub fn failed(attempts: u32, class: DeliveryErrorClass, message: impl Into<String>) -> Self {
        Self {
            status: CallbackStatus::FailedPermanent,
            attempts,
            last_error: Some(class),
            last_error_message: Some(message.into()),
            succeeded_at: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CallbackStatus::Success
    }
}
