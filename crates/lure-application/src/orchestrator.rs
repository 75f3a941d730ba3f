//! Session orchestrator.
//!
//! The boundary the API layer talks to. Every operation on a session runs
//! under that session's lock; sessions never share mutable state.
//!
//! # Module Structure
//!
//! - Inbound handling: extraction, state evaluation, delay and availability
//! - Reply composition: generator calls, candidate checks, fallback replies
//! - Operator control: per-session and process-wide kill
//! - Lifecycle: finalization triggers, idle expiry and retention purge

use crate::finalization::{EligibilityReason, FinalizationManager};
use chrono::{DateTime, Utc};
use lure_core::callback::CallbackTransport;
use lure_core::config::EngagementConfig;
use lure_core::conversation::{ConversationState, StateTransition};
use lure_core::error::{LureError, Result};
use lure_core::intelligence::IntelligenceItem;
use lure_core::persona::select_persona;
use lure_core::random::{DrawSource, ThreadRngSource};
use lure_core::reply::{PlatformKind, ReplyContext, ReplyGenerator, check_candidate};
use lure_core::report::CallbackOutcome;
use lure_core::session::{ConversationSession, SessionHandle, SessionStore, SessionSummary};
use lure_core::temporal::{Availability, ComplexityClass, DelayDraws, availability, compute_delay};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A message from the adversary, as handed over by the API layer.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub session_id: String,
    /// Required on the first message of a conversation
    pub scam_type: Option<String>,
    pub platform: PlatformKind,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// What changed after an inbound message was processed.
#[derive(Serialize, Debug, Clone)]
pub struct InboundOutcome {
    pub session_id: String,
    pub created: bool,
    pub turn_index: u32,
    pub state: ConversationState,
    pub transition: Option<StateTransition>,
    pub new_items: Vec<IntelligenceItem>,
    pub completeness_score: f64,
    /// How long the caller should wait before dispatching the reply
    pub reply_delay: Duration,
    /// Whether the persona would plausibly be at the phone right now
    pub availability: Availability,
    pub eligibility: Option<EligibilityReason>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplyOrigin {
    /// Accepted generator output; `attempt` is 1 for the first candidate
    Generated { attempt: u32 },
    /// Safe reply for the current state after every candidate was rejected
    Fallback,
}

#[derive(Serialize, Debug, Clone)]
pub struct ComposedReply {
    pub session_id: String,
    pub turn_index: u32,
    pub text: String,
    pub origin: ReplyOrigin,
    pub state: ConversationState,
    /// Reasons the rejected candidates were refused, in order
    pub rejections: Vec<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct FollowUpOutcome {
    pub session_id: String,
    pub unanswered: u32,
    pub eligibility: Option<EligibilityReason>,
}

#[derive(Serialize, Debug, Clone)]
pub struct KillOutcome {
    pub session_id: String,
    pub transition: Option<StateTransition>,
    pub eligibility: Option<EligibilityReason>,
}

/// Result of one idle-expiry and retention pass.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: Vec<String>,
    pub purged: Vec<String>,
    /// Sessions skipped because an operation held their lock
    pub busy: Vec<String>,
}

pub struct SessionOrchestrator {
    store: Arc<dyn SessionStore>,
    finalizer: FinalizationManager,
    generator: Arc<dyn ReplyGenerator>,
    draws: Arc<dyn DrawSource>,
    config: EngagementConfig,
    shutdown: CancellationToken,
}

impl SessionOrchestrator {
    /// Creates an orchestrator drawing randomness from the thread-local generator.
    pub fn new(
        store: Arc<dyn SessionStore>,
        transport: Arc<dyn CallbackTransport>,
        generator: Arc<dyn ReplyGenerator>,
        config: EngagementConfig,
    ) -> Self {
        Self {
            store,
            finalizer: FinalizationManager::new(transport, &config),
            generator,
            draws: Arc::new(ThreadRngSource),
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Replaces the draw source, e.g. with a seeded one for reproducible runs.
    pub fn with_draw_source(mut self, draws: Arc<dyn DrawSource>) -> Self {
        self.draws = draws;
        self
    }

    pub fn config(&self) -> &EngagementConfig {
        &self.config
    }

    pub fn finalizer(&self) -> &FinalizationManager {
        &self.finalizer
    }

    /// Process-wide token; every session token is a child of it.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    async fn handle(&self, session_id: &str) -> Result<SessionHandle> {
        self.store
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| LureError::not_found("Session", session_id))
    }

    async fn open_session(&self, message: &InboundMessage) -> Result<(SessionHandle, bool)> {
        if let Some(handle) = self.store.find_by_id(&message.session_id).await? {
            return Ok((handle, false));
        }

        let scam_type = message
            .scam_type
            .as_deref()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .ok_or_else(|| LureError::Untagged(message.session_id.clone()))?;

        let persona = select_persona(scam_type);
        let session = ConversationSession::new(
            message.session_id.clone(),
            scam_type,
            message.platform,
            persona,
            message.timestamp,
        );
        let candidate = SessionHandle::new(session, self.shutdown.child_token());
        let stored = self.store.insert_if_absent(candidate.clone()).await?;
        let created = stored.ptr_eq(&candidate);
        if created {
            let session = stored.lock().await;
            info!(
                session_id = %message.session_id,
                scam_type,
                persona = session.persona().name(),
                platform = %message.platform,
                "Session created"
            );
        }
        Ok((stored, created))
    }

    /// Applies a pending kill signal. Called at each safe checkpoint.
    fn observe_kill(&self, handle: &SessionHandle, session: &mut ConversationSession) -> Option<StateTransition> {
        if !handle.is_cancelled() || session.is_killed() {
            return None;
        }
        let transition = session.kill(&self.config.conversation, Utc::now());
        info!(session_id = %handle.id(), "Kill signal observed, conversation concluded");
        transition
    }

    /// Records an inbound message and advances the session.
    ///
    /// Creates the session on its first message, which must carry a scam-type
    /// tag. A session whose report was already delivered rejects the message.
    pub async fn handle_inbound(&self, message: InboundMessage) -> Result<InboundOutcome> {
        let (handle, created) = self.open_session(&message).await?;
        let mut session = handle.lock().await;

        let mut transition = self.observe_kill(&handle, &mut session);

        let (turn_index, new_items) = session.record_inbound(message.text.clone(), message.timestamp)?;
        if !new_items.is_empty() {
            debug!(
                session_id = %handle.id(),
                turn = turn_index,
                new_items = new_items.len(),
                "Stored new intelligence"
            );
        }

        if let Some(evaluated) = session.evaluate_state(self.draws.draw(), &self.config.conversation)? {
            info!(
                session_id = %handle.id(),
                from = %evaluated.from,
                to = %evaluated.to,
                reason = %evaluated.reason,
                "Conversation state changed"
            );
            transition = Some(evaluated);
        }

        let class = ComplexityClass::classify(&message.text);
        let draws = DelayDraws::new(self.draws.draw(), self.draws.draw(), self.draws.draw());
        let reply_delay = compute_delay(session.persona(), class, draws, &self.config.timing);
        let availability = availability(session.persona(), message.timestamp);

        if let Some(killed) = self.observe_kill(&handle, &mut session) {
            transition = Some(killed);
        }

        Ok(InboundOutcome {
            session_id: handle.id().to_string(),
            created,
            turn_index,
            state: session.state(),
            transition,
            new_items,
            completeness_score: session.intelligence().completeness_score(),
            reply_delay,
            availability,
            eligibility: self.finalizer.eligibility(&session),
        })
    }

    /// Checks a candidate reply against the session's persona and platform.
    pub async fn validate_candidate(&self, session_id: &str, candidate: &str) -> Result<()> {
        let handle = self.handle(session_id).await?;
        let (persona, platform) = {
            let session = handle.lock().await;
            (session.persona().clone(), session.platform())
        };
        check_candidate(candidate, &persona, platform)?;
        Ok(())
    }

    /// Produces the reply to a recorded turn and attaches it.
    ///
    /// The session lock is not held while the generator runs. Rejected
    /// candidates are regenerated up to the configured limit; after that a
    /// fallback reply for the current state is used. Text is never edited.
    pub async fn compose_reply(&self, session_id: &str, turn_index: u32) -> Result<ComposedReply> {
        let handle = self.handle(session_id).await?;

        let (mut context, persona) = {
            let mut session = handle.lock().await;
            self.observe_kill(&handle, &mut session);
            let inbound = session
                .turns()
                .get(turn_index as usize)
                .map(|turn| turn.inbound().to_string())
                .ok_or_else(|| LureError::not_found("Turn", format!("{session_id}#{turn_index}")))?;
            let state = session.state();
            let context = ReplyContext {
                session_id: session_id.to_string(),
                persona_name: session.persona().name().to_string(),
                persona_profile: session.persona().render_profile(),
                state,
                tactic: *state.tactic(),
                platform: session.platform(),
                recent_turns: session.recent_transcript(self.config.reply.recent_turns),
                inbound,
                rejections: Vec::new(),
            };
            (context, session.persona().clone())
        };

        let attempts = self.config.reply.max_regenerations + 1;
        let mut accepted = None;
        for attempt in 1..=attempts {
            if handle.is_cancelled() {
                break;
            }
            let candidate = match self.generator.generate(&context).await {
                Ok(candidate) => candidate,
                Err(error) => {
                    warn!(session_id, attempt, %error, "Reply generator failed");
                    context.rejections.push(format!("generator error: {error}"));
                    break;
                }
            };
            match check_candidate(&candidate, &persona, context.platform) {
                Ok(()) => {
                    accepted = Some((candidate, attempt));
                    break;
                }
                Err(rejection) => {
                    warn!(session_id, attempt, %rejection, "Candidate reply rejected");
                    context.rejections.push(rejection.to_string());
                }
            }
        }

        let mut session = handle.lock().await;
        self.observe_kill(&handle, &mut session);
        let state = session.state();
        let (text, origin) = match accepted {
            Some((text, attempt)) if state == context.state => (text, ReplyOrigin::Generated { attempt }),
            _ => {
                let fallbacks = state.tactic().fallback_replies;
                let pick = ((self.draws.draw() * fallbacks.len() as f64) as usize).min(fallbacks.len() - 1);
                (fallbacks[pick].to_string(), ReplyOrigin::Fallback)
            }
        };
        session.attach_outbound(turn_index, text.clone(), Utc::now())?;
        debug!(session_id, turn = turn_index, origin = ?origin, "Reply attached");

        Ok(ComposedReply {
            session_id: session_id.to_string(),
            turn_index,
            text,
            origin,
            state,
            rejections: context.rejections,
        })
    }

    /// Records a persona-initiated message sent while the adversary is silent.
    pub async fn record_follow_up(
        &self,
        session_id: &str,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<FollowUpOutcome> {
        let handle = self.handle(session_id).await?;
        let mut session = handle.lock().await;
        self.observe_kill(&handle, &mut session);
        check_candidate(text, session.persona(), session.platform())?;
        let unanswered = session.record_follow_up(text, at)?;
        debug!(session_id, unanswered, "Follow-up recorded");
        Ok(FollowUpOutcome {
            session_id: session_id.to_string(),
            unanswered,
            eligibility: self.finalizer.eligibility(&session),
        })
    }

    /// Kills one session: forces `Conclusion` and re-checks eligibility.
    pub async fn kill(&self, session_id: &str) -> Result<KillOutcome> {
        let handle = self.handle(session_id).await?;
        handle.cancel_token().cancel();
        let mut session = handle.lock().await;
        let transition = session.kill(&self.config.conversation, Utc::now());
        info!(session_id, "Session killed by operator");
        Ok(KillOutcome {
            session_id: session_id.to_string(),
            transition,
            eligibility: self.finalizer.eligibility(&session),
        })
    }

    /// Kills every session, including ones created after this call.
    pub async fn kill_all(&self) -> Result<Vec<KillOutcome>> {
        self.shutdown.cancel();
        let handles = self.store.list_all().await?;
        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            let mut session = handle.lock().await;
            let transition = session.kill(&self.config.conversation, Utc::now());
            outcomes.push(KillOutcome {
                session_id: handle.id().to_string(),
                transition,
                eligibility: self.finalizer.eligibility(&session),
            });
        }
        info!(sessions = outcomes.len(), "Process-wide kill applied");
        Ok(outcomes)
    }

    /// Builds, validates and submits the session's report.
    pub async fn finalize(&self, session_id: &str) -> Result<CallbackOutcome> {
        let handle = self.handle(session_id).await?;
        self.finalizer.submit(&handle).await
    }

    /// Submits the report only when the session is eligible.
    ///
    /// Returns `Ok(None)` when it is not.
    pub async fn finalize_if_eligible(&self, session_id: &str) -> Result<Option<CallbackOutcome>> {
        let handle = self.handle(session_id).await?;
        let eligibility = {
            let mut session = handle.lock().await;
            self.observe_kill(&handle, &mut session);
            self.finalizer.eligibility(&session)
        };
        match eligibility {
            Some(reason) => {
                debug!(session_id, %reason, "Session eligible for final report");
                self.finalizer.submit(&handle).await.map(Some)
            }
            None => Ok(None),
        }
    }

    /// Expires idle sessions and purges terminal ones past retention.
    ///
    /// Sessions whose lock is held by a running operation are skipped.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let idle = chrono::Duration::from_std(self.config.session.idle_timeout())
            .map_err(|e| LureError::config(format!("session.idle_timeout_secs: {e}")))?;
        let retention = chrono::Duration::from_std(self.config.session.retention())
            .map_err(|e| LureError::config(format!("session.retention_secs: {e}")))?;

        let mut report = SweepReport::default();
        for handle in self.store.list_all().await? {
            let purge = {
                let Ok(mut session) = handle.try_lock() else {
                    report.busy.push(handle.id().to_string());
                    continue;
                };
                if now - session.last_activity() >= idle && session.expire(now) {
                    info!(session_id = %handle.id(), "Session expired after inactivity");
                    report.expired.push(handle.id().to_string());
                }
                session
                    .terminal_at()
                    .is_some_and(|at| now - at >= retention)
            };
            if purge {
                self.store.remove(handle.id()).await?;
                info!(session_id = %handle.id(), "Session purged after retention window");
                report.purged.push(handle.id().to_string());
            }
        }
        Ok(report)
    }

    pub async fn summary(&self, session_id: &str) -> Result<SessionSummary> {
        let handle = self.handle(session_id).await?;
        let session = handle.lock().await;
        Ok(session.summary())
    }

    pub async fn list(&self) -> Result<Vec<SessionSummary>> {
        let mut summaries = Vec::new();
        for handle in self.store.list_all().await? {
            summaries.push(handle.lock().await.summary());
        }
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.session_id.cmp(&b.session_id)));
        Ok(summaries)
    }
}
