//! Seam to the external reply generator.

use crate::conversation::{ConversationState, Tactic};
use crate::error::Result;
use crate::persona::{ConsistencyViolation, Persona, validate_consistency};
use crate::report::TranscriptEntry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

/// Messaging platform a conversation runs on.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlatformKind {
    Sms,
    Whatsapp,
    Email,
    #[default]
    Other,
}

impl PlatformKind {
    /// Parses a platform tag, falling back to `Other` for unknown tags.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "sms" => Self::Sms,
            "whatsapp" => Self::Whatsapp,
            "email" => Self::Email,
            _ => Self::Other,
        }
    }

    /// Longest reply the platform accepts, in characters.
    pub fn max_length(self) -> usize {
        match self {
            Self::Sms => 160,
            Self::Whatsapp => 4_096,
            Self::Email | Self::Other => 65_536,
        }
    }
}

/// Everything the generator needs to write the next reply.
#[derive(Serialize, Debug, Clone)]
pub struct ReplyContext {
    pub session_id: String,
    pub persona_name: String,
    /// Rendered static facts and behaviour policy
    pub persona_profile: String,
    pub state: ConversationState,
    pub tactic: Tactic,
    pub platform: PlatformKind,
    pub recent_turns: Vec<TranscriptEntry>,
    pub inbound: String,
    /// Why earlier candidates for this reply were rejected
    pub rejections: Vec<String>,
}

/// Produces candidate reply text. Candidates are checked before use.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, context: &ReplyContext) -> Result<String>;
}

/// Why a candidate reply cannot be sent.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CandidateRejection {
    #[error("reply is empty")]
    Empty,

    #[error("reply has {length} characters; {platform} allows {max}")]
    TooLong {
        platform: PlatformKind,
        length: usize,
        max: usize,
    },

    #[error(transparent)]
    Inconsistent(#[from] ConsistencyViolation),
}

/// Checks a candidate against the platform limit and the persona's facts.
///
/// Text is never edited here; a rejected candidate must be regenerated or replaced.
pub fn check_candidate(
    candidate: &str,
    persona: &Persona,
    platform: PlatformKind,
) -> std::result::Result<(), CandidateRejection> {
    if candidate.trim().is_empty() {
        return Err(CandidateRejection::Empty);
    }
    let length = candidate.chars().count();
    let max = platform.max_length();
    if length > max {
        return Err(CandidateRejection::TooLong {
            platform,
            length,
            max,
        });
    }
    validate_consistency(candidate, persona)?;
    Ok(())
}
