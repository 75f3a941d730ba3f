//! Delivery seam for the final report.

use crate::report::FinalReport;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::Display;
use thiserror::Error;

/// Default evaluation endpoint.
pub const DEFAULT_CALLBACK_ENDPOINT: &str = "https://hackathon.guvi.in/api/updateHoneyPotFinalResult";

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryErrorClass {
    Timeout,
    Connection,
    ServerError,
    RateLimited,
    /// Non-retryable rejection (4xx other than 429, unusable request)
    Rejected,
}

/// Failure of a single delivery attempt.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeliveryError {
    /// Retryable network or server condition
    #[error("transient {class} failure: {message}")]
    Transient {
        class: DeliveryErrorClass,
        message: String,
        /// Server-provided minimum wait before the next attempt
        retry_after: Option<Duration>,
    },

    /// Client-side rejection that no retry can fix
    #[error("permanent failure (status {status:?}): {message}")]
    Permanent { status: Option<u16>, message: String },
}

impl DeliveryError {
    pub fn transient(class: DeliveryErrorClass, message: impl Into<String>) -> Self {
        Self::Transient {
            class,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn permanent(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Permanent {
            status,
            message: message.into(),
        }
    }

    /// Maps an HTTP status to a delivery error.
    ///
    /// 429 and every 5xx are retryable; any other status is a permanent rejection.
    pub fn from_status(status: u16, message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        let message = message.into();
        match status {
            429 => Self::Transient {
                class: DeliveryErrorClass::RateLimited,
                message,
                retry_after,
            },
            500..=599 => Self::Transient {
                class: DeliveryErrorClass::ServerError,
                message,
                retry_after,
            },
            _ => Self::Permanent {
                status: Some(status),
                message,
            },
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    pub fn class(&self) -> DeliveryErrorClass {
        match self {
            Self::Transient { class, .. } => *class,
            Self::Permanent { .. } => DeliveryErrorClass::Rejected,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Transient { retry_after, .. } => *retry_after,
            Self::Permanent { .. } => None,
        }
    }
}

/// Performs one delivery attempt of a report snapshot.
///
/// Implementations do not retry; the finalization manager owns the attempt loop.
#[async_trait]
pub trait CallbackTransport: Send + Sync {
    async fn deliver(&self, report: &FinalReport) -> Result<(), DeliveryError>;
}

/// Retry policy and endpoint settings for report delivery.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CallbackConfig {
    pub endpoint: String,
    /// Sent as the `X-API-Key` header when present
    pub api_key: Option<String>,
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: u32,
    pub max_backoff_ms: u64,
    pub attempt_timeout_secs: u64,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_CALLBACK_ENDPOINT.to_string(),
            api_key: None,
            max_attempts: 3,
            initial_backoff_ms: 1_000,
            backoff_multiplier: 2,
            max_backoff_ms: 30_000,
            attempt_timeout_secs: 30,
        }
    }
}

impl CallbackConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }

    /// Wait before retry number `retry` (1-based), capped at `max_backoff_ms`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = u64::from(self.backoff_multiplier.max(1))
            .checked_pow(retry.saturating_sub(1))
            .unwrap_or(u64::MAX);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    /// Waits between consecutive attempts; one entry fewer than `max_attempts`.
    pub fn backoff_schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts).map(|retry| self.backoff(retry)).collect()
    }

    /// Wait before `retry`, stretched to honor a server `Retry-After` within the cap.
    pub fn backoff_after(&self, retry: u32, error: &DeliveryError) -> Duration {
        let base = self.backoff(retry);
        match error.retry_after() {
            Some(hint) => base.max(hint.min(Duration::from_millis(self.max_backoff_ms))),
            None => base,
        }
    }
}
