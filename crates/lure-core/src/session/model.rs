use crate::callback::DeliveryErrorClass;
use crate::conversation::{ConversationState, ConversationTracker, StateMachineConfig, StateTransition};
use crate::error::{LureError, Result};
use crate::intelligence::{ExtractedItem, IntelligenceItem, IntelligenceStore, extract};
use crate::persona::{BehaviorPolicy, Persona};
use crate::reply::PlatformKind;
use crate::report::{CallbackOutcome, CallbackStatus, Speaker, TranscriptEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Active,
    /// Report delivered successfully
    Completed,
    /// Idle past the configured timeout
    Expired,
    /// Stopped by an operator kill signal
    Killed,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        self != SessionStatus::Active
    }
}

/// One inbound message and the reply sent to it.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Turn {
    index: u32,
    inbound: String,
    received_at: DateTime<Utc>,
    extracted: Vec<ExtractedItem>,
    outbound: Option<String>,
    replied_at: Option<DateTime<Utc>>,
}

impl Turn {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn inbound(&self) -> &str {
        &self.inbound
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Everything matched in this turn's inbound text, new or already known.
    pub fn extracted(&self) -> &[ExtractedItem] {
        &self.extracted
    }

    pub fn outbound(&self) -> Option<&str> {
        self.outbound.as_deref()
    }

    pub fn replied_at(&self) -> Option<DateTime<Utc>> {
        self.replied_at
    }
}

/// Persona-initiated message sent while the adversary is silent.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FollowUp {
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// Operator view of a session.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub scam_type: String,
    pub platform: PlatformKind,
    pub persona_name: String,
    pub state: ConversationState,
    pub status: SessionStatus,
    pub total_turns: u32,
    pub intelligence_count: usize,
    pub completeness_score: f64,
    pub callback_status: Option<CallbackStatus>,
    pub callback_attempts: u32,
    pub last_delivery_error: Option<DeliveryErrorClass>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// One engagement with one adversary.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    id: String,
    scam_type: String,
    platform: PlatformKind,
    persona: Persona,
    tracker: ConversationTracker,
    turns: Vec<Turn>,
    follow_ups: Vec<FollowUp>,
    intelligence: IntelligenceStore,
    status: SessionStatus,
    scam_confirmed: bool,
    killed: bool,
    unanswered_outbound: u32,
    callback: Option<CallbackOutcome>,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    terminal_at: Option<DateTime<Utc>>,
}

impl ConversationSession {
    /// Opens a session for a conversation the upstream classifier tagged as a scam.
    pub fn new(
        id: impl Into<String>,
        scam_type: impl Into<String>,
        platform: PlatformKind,
        persona: Persona,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            scam_type: scam_type.into(),
            platform,
            persona,
            tracker: ConversationTracker::new(),
            turns: Vec::new(),
            follow_ups: Vec::new(),
            intelligence: IntelligenceStore::new(),
            status: SessionStatus::Active,
            scam_confirmed: true,
            killed: false,
            unanswered_outbound: 0,
            callback: None,
            created_at: now,
            last_activity: now,
            terminal_at: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn scam_type(&self) -> &str {
        &self.scam_type
    }

    pub fn platform(&self) -> PlatformKind {
        self.platform
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn state(&self) -> ConversationState {
        self.tracker.state()
    }

    pub fn tracker(&self) -> &ConversationTracker {
        &self.tracker
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn follow_ups(&self) -> &[FollowUp] {
        &self.follow_ups
    }

    /// Number of recorded inbound messages.
    pub fn turn_count(&self) -> u32 {
        self.turns.len() as u32
    }

    pub fn intelligence(&self) -> &IntelligenceStore {
        &self.intelligence
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn scam_confirmed(&self) -> bool {
        self.scam_confirmed
    }

    pub fn is_killed(&self) -> bool {
        self.killed
    }

    pub fn unanswered_outbound(&self) -> u32 {
        self.unanswered_outbound
    }

    pub fn callback(&self) -> Option<&CallbackOutcome> {
        self.callback.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn terminal_at(&self) -> Option<DateTime<Utc>> {
        self.terminal_at
    }

    /// Records an inbound message and returns its turn index with the newly stored items.
    ///
    /// Fails once the report has been delivered; a completed session accepts no input.
    pub fn record_inbound(
        &mut self,
        text: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<(u32, Vec<IntelligenceItem>)> {
        self.ensure_open()?;
        let text = text.into();
        let index = self.turn_count();
        let extracted = extract(&text);
        let added = self.intelligence.add(extracted.clone(), index);

        self.turns.push(Turn {
            index,
            inbound: text,
            received_at: at,
            extracted,
            outbound: None,
            replied_at: None,
        });
        self.tracker.record_turn();
        self.unanswered_outbound = 0;
        self.last_activity = at;
        Ok((index, added))
    }

    /// Runs one state machine evaluation against the current turn count.
    pub fn evaluate_state(&mut self, draw: f64, config: &StateMachineConfig) -> Result<Option<StateTransition>> {
        self.ensure_open()?;
        let total = self.turn_count();
        Ok(self.tracker.evaluate(total, self.killed, draw, config))
    }

    /// Attaches the reply to a turn. A turn's reply is set at most once.
    pub fn attach_outbound(&mut self, index: u32, text: impl Into<String>, at: DateTime<Utc>) -> Result<()> {
        let turn = self
            .turns
            .get_mut(index as usize)
            .ok_or_else(|| LureError::not_found("Turn", format!("{}#{index}", self.id)))?;
        if turn.outbound.is_some() {
            return Err(LureError::internal(format!(
                "turn {index} of session '{}' already has a reply",
                self.id
            )));
        }
        turn.outbound = Some(text.into());
        turn.replied_at = Some(at);
        Ok(())
    }

    /// Records a persona-initiated message that the adversary has not answered yet.
    pub fn record_follow_up(&mut self, text: impl Into<String>, at: DateTime<Utc>) -> Result<u32> {
        self.ensure_open()?;
        self.follow_ups.push(FollowUp {
            text: text.into(),
            sent_at: at,
        });
        self.unanswered_outbound += 1;
        Ok(self.unanswered_outbound)
    }

    /// Swaps the behaviour policy. Static facts are shared with the previous persona.
    pub fn replace_behavior(&mut self, policy: BehaviorPolicy) {
        self.persona = self.persona.with_policy(policy);
    }

    /// Applies an operator kill: one-way, forces `Conclusion`.
    ///
    /// Returns the forced transition, or `None` if the session was already concluded.
    pub fn kill(&mut self, config: &StateMachineConfig, at: DateTime<Utc>) -> Option<StateTransition> {
        if self.killed {
            return None;
        }
        self.killed = true;
        if self.status == SessionStatus::Active {
            self.status = SessionStatus::Killed;
            self.terminal_at = Some(at);
        }
        let total = self.turn_count();
        self.tracker.evaluate(total, true, 1.0, config)
    }

    /// Marks an idle session as expired. No-op unless active.
    pub fn expire(&mut self, at: DateTime<Utc>) -> bool {
        if self.status != SessionStatus::Active {
            return false;
        }
        self.status = SessionStatus::Expired;
        self.terminal_at = Some(at);
        true
    }

    /// Stores a callback outcome; a success completes the session.
    ///
    /// Retention counts from the first terminal moment, so an expired or killed
    /// session keeps its original `terminal_at` when its report lands later.
    pub fn record_callback(&mut self, outcome: CallbackOutcome, at: DateTime<Utc>) {
        if outcome.is_success() {
            self.status = SessionStatus::Completed;
            self.terminal_at.get_or_insert(at);
        }
        self.callback = Some(outcome);
    }

    /// Time between the first and the latest recorded turn.
    pub fn duration(&self) -> chrono::Duration {
        let first = self.turns.first().map(Turn::received_at);
        let last = self
            .turns
            .iter()
            .map(|turn| turn.replied_at.unwrap_or(turn.received_at))
            .max();
        match (first, last) {
            (Some(first), Some(last)) => last - first,
            _ => chrono::Duration::zero(),
        }
    }

    /// All messages in time order.
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        let mut entries = Vec::with_capacity(self.turns.len() * 2 + self.follow_ups.len());
        for turn in &self.turns {
            entries.push(TranscriptEntry {
                role: Speaker::Adversary,
                message: turn.inbound.clone(),
                timestamp: turn.received_at,
            });
            if let (Some(message), Some(timestamp)) = (&turn.outbound, turn.replied_at) {
                entries.push(TranscriptEntry {
                    role: Speaker::Persona,
                    message: message.clone(),
                    timestamp,
                });
            }
        }
        for follow_up in &self.follow_ups {
            entries.push(TranscriptEntry {
                role: Speaker::Persona,
                message: follow_up.text.clone(),
                timestamp: follow_up.sent_at,
            });
        }
        entries.sort_by_key(|entry| entry.timestamp);
        entries
    }

    /// Transcript covering the last `turns` inbound messages and anything after them.
    pub fn recent_transcript(&self, turns: usize) -> Vec<TranscriptEntry> {
        let skip = self.turns.len().saturating_sub(turns);
        let Some(since) = self.turns.get(skip).map(Turn::received_at) else {
            return self.transcript();
        };
        self.transcript()
            .into_iter()
            .filter(|entry| entry.timestamp >= since)
            .collect()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            scam_type: self.scam_type.clone(),
            platform: self.platform,
            persona_name: self.persona.name().to_string(),
            state: self.state(),
            status: self.status,
            total_turns: self.turn_count(),
            intelligence_count: self.intelligence.len(),
            completeness_score: self.intelligence.completeness_score(),
            callback_status: self.callback.as_ref().map(|c| c.status),
            callback_attempts: self.callback.as_ref().map_or(0, |c| c.attempts),
            last_delivery_error: self.callback.as_ref().and_then(|c| c.last_error),
            created_at: self.created_at,
            last_activity: self.last_activity,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.status == SessionStatus::Completed {
            return Err(LureError::StateTransition {
                session_id: self.id.clone(),
                state: self.state(),
            });
        }
        Ok(())
    }
}
