//! Error types for the engagement core.

use crate::callback::DeliveryError;
use crate::conversation::ConversationState;
use crate::persona::ConsistencyViolation;
use crate::reply::CandidateRejection;
use crate::report::ValidationError;
use thiserror::Error;

/// A shared error type for the entire engagement core.
///
/// Validation and consistency failures are returned to the caller for corrective
/// action and never change session status. Delivery failures are normally folded
/// into a `CallbackOutcome` by the finalization manager and only surface here when a
/// single attempt is made directly against a transport.
#[derive(Error, Debug, Clone)]
pub enum LureError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// First message of a conversation arrived without a scam-type tag
    #[error("Session '{0}' cannot be created without a scam-type tag")]
    Untagged(String),

    /// Report refused before any network attempt
    #[error("Report validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Network or server condition while delivering a report
    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    /// Candidate reply contradicts the persona's static facts
    #[error("Persona consistency violation: {0}")]
    PersonaConsistency(#[from] ConsistencyViolation),

    /// Candidate reply breaks a platform constraint (empty, too long)
    #[error("Reply rejected: {0}")]
    ReplyConstraint(String),

    /// Evaluation attempted on a terminal, already-finalized session
    #[error("Session '{session_id}' is finalized in state {state}; no further evaluation")]
    StateTransition {
        session_id: String,
        state: ConversationState,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LureError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a report validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a persona consistency violation
    pub fn is_consistency_violation(&self) -> bool {
        matches!(self, Self::PersonaConsistency(_))
    }

    /// Check if this is a state transition contract violation
    pub fn is_state_transition(&self) -> bool {
        matches!(self, Self::StateTransition { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<CandidateRejection> for LureError {
    fn from(rejection: CandidateRejection) -> Self {
        match rejection {
            CandidateRejection::Inconsistent(violation) => Self::PersonaConsistency(violation),
            other => Self::ReplyConstraint(other.to_string()),
        }
    }
}

impl From<std::io::Error> for LureError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for LureError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for LureError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for LureError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, LureError>`.
pub type Result<T> = std::result::Result<T, LureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = LureError::not_found("Session", "abc");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Entity not found: Session 'abc'");
    }

    #[test]
    fn test_validation_converts() {
        let err: LureError = ValidationError::NoIntelligence.into();
        assert!(err.is_validation());
        assert!(!err.is_state_transition());
    }

    #[test]
    fn test_candidate_rejection_converts() {
        let err: LureError = CandidateRejection::Empty.into();
        assert!(matches!(err, LureError::ReplyConstraint(_)));
        assert!(!err.is_consistency_violation());
    }
}
