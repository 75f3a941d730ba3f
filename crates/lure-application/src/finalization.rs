//! Finalization (callback) manager.
//!
//! Decides when a session is ready to be reported, builds the report snapshot
//! and delivers it with bounded, exponentially backed-off retries.

use chrono::{DateTime, Utc};
use lure_core::callback::{CallbackConfig, CallbackTransport, DeliveryError, DeliveryErrorClass};
use lure_core::config::{EngagementConfig, FinalizationConfig};
use lure_core::error::Result;
use lure_core::intelligence::tally_cues;
use lure_core::report::{CallbackOutcome, FinalReport, NO_CUES_SUMMARY};
use lure_core::session::{ConversationSession, SessionHandle, SessionStatus};
use serde::Serialize;
use std::sync::Arc;
use strum::Display;
use tracing::{debug, info, warn};

/// Why a session qualifies for its final report.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EligibilityReason {
    Killed,
    TurnCap,
    Completeness,
    HighValueIntelligence,
    AdversarySilent,
    Expired,
}

/// Evaluates eligibility, builds reports and submits them at most once successfully.
pub struct FinalizationManager {
    transport: Arc<dyn CallbackTransport>,
    callback: CallbackConfig,
    policy: FinalizationConfig,
    max_total_turns: u32,
}

impl FinalizationManager {
    pub fn new(transport: Arc<dyn CallbackTransport>, config: &EngagementConfig) -> Self {
        Self {
            transport,
            callback: config.callback.clone(),
            policy: config.finalization.clone(),
            max_total_turns: config.conversation.max_total_turns,
        }
    }

    pub fn callback_config(&self) -> &CallbackConfig {
        &self.callback
    }

    /// First condition that makes the session eligible, if any.
    pub fn eligibility(&self, session: &ConversationSession) -> Option<EligibilityReason> {
        let turns = session.turn_count();
        let store = session.intelligence();

        if session.is_killed() {
            Some(EligibilityReason::Killed)
        } else if turns >= self.max_total_turns {
            Some(EligibilityReason::TurnCap)
        } else if store.completeness_score() >= self.policy.completeness_threshold {
            Some(EligibilityReason::Completeness)
        } else if store.has_high_value() && turns >= self.policy.high_value_min_turns {
            Some(EligibilityReason::HighValueIntelligence)
        } else if self.policy.silence_turns > 0
            && session.unanswered_outbound() >= self.policy.silence_turns
        {
            Some(EligibilityReason::AdversarySilent)
        } else if session.status() == SessionStatus::Expired {
            Some(EligibilityReason::Expired)
        } else {
            None
        }
    }

    pub fn is_eligible(&self, session: &ConversationSession) -> bool {
        self.eligibility(session).is_some()
    }

    /// Builds an immutable report snapshot from the live session.
    pub fn build_report(&self, session: &ConversationSession, now: DateTime<Utc>) -> FinalReport {
        let tally = tally_cues(session.turns().iter().map(|turn| turn.inbound()));
        let summary = tally
            .dominant()
            .map(|cue| cue.summary().to_string())
            .unwrap_or_else(|| NO_CUES_SUMMARY.to_string());

        FinalReport {
            session_id: session.id().to_string(),
            scam_type: session.scam_type().to_string(),
            persona_name: session.persona().name().to_string(),
            scam_confirmed: session.scam_confirmed(),
            total_turns: session.turn_count(),
            final_state: session.state(),
            intelligence: session.intelligence().by_category(),
            summary,
            completeness_score: session.intelligence().completeness_score(),
            average_confidence: session.intelligence().average_confidence(),
            duration_seconds: session.duration().num_seconds(),
            transcript: session.transcript(),
            generated_at: now,
        }
    }

    /// Submits the session's report.
    ///
    /// A cached success is returned without contacting the transport. An
    /// unsubmittable report fails with a validation error before any attempt.
    /// The session lock is released while attempts are in flight; delivery
    /// runs on the snapshot built under the lock.
    pub async fn submit(&self, handle: &SessionHandle) -> Result<CallbackOutcome> {
        let _gate = handle.lock_submission().await;

        let report = {
            let session = handle.lock().await;
            if let Some(outcome) = session.callback().filter(|outcome| outcome.is_success()) {
                debug!(session_id = %handle.id(), "Report already delivered, returning cached outcome");
                return Ok(outcome.clone());
            }
            let report = self.build_report(&session, Utc::now());
            if let Err(error) = report.validate() {
                warn!(session_id = %handle.id(), %error, "Report refused before delivery");
                return Err(error.into());
            }
            report
        };

        let outcome = self.deliver(handle, &report).await;

        let mut session = handle.lock().await;
        session.record_callback(outcome.clone(), Utc::now());
        Ok(outcome)
    }

    async fn deliver(&self, handle: &SessionHandle, report: &FinalReport) -> CallbackOutcome {
        let max_attempts = self.callback.max_attempts.max(1);
        let timeout = self.callback.attempt_timeout();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = match tokio::time::timeout(timeout, self.transport.deliver(report)).await {
                Ok(result) => result,
                Err(_) => Err(DeliveryError::transient(
                    DeliveryErrorClass::Timeout,
                    format!("no response within {timeout:?}"),
                )),
            };

            match result {
                Ok(()) => {
                    info!(
                        session_id = %report.session_id,
                        attempt,
                        items = report.intelligence_count(),
                        "Final report delivered"
                    );
                    return CallbackOutcome::success(attempt, Utc::now());
                }
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    let wait = self.callback.backoff_after(attempt, &error);
                    warn!(
                        session_id = %report.session_id,
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        %error,
                        "Report delivery failed, retrying"
                    );
                    handle.lock().await.record_callback(
                        CallbackOutcome::retrying(attempt, error.class(), error.to_string()),
                        Utc::now(),
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(error) => {
                    warn!(
                        session_id = %report.session_id,
                        attempt,
                        %error,
                        "Report delivery failed permanently"
                    );
                    return CallbackOutcome::failed(attempt, error.class(), error.to_string());
                }
            }
        }
    }
}
