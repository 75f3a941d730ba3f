//! Transition function and per-session tracker.

use super::state::ConversationState;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Dwell bounds for a non-terminal state.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct StateBounds {
    pub min_turns: u32,
    pub max_turns: u32,
    /// Chance of moving on at each evaluation once `min_turns` is reached
    pub transition_probability: f64,
}

impl StateBounds {
    pub const fn new(min_turns: u32, max_turns: u32, transition_probability: f64) -> Self {
        Self {
            min_turns,
            max_turns,
            transition_probability,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StateMachineConfig {
    /// Reaching this many turns forces `Conclusion` from any state
    pub max_total_turns: u32,
    pub initial: StateBounds,
    pub confusion: StateBounds,
    pub building_trust: StateBounds,
    pub feigned_compliance: StateBounds,
    pub delay_tactics: StateBounds,
}

impl Default for StateMachineConfig {
    fn default() -> Self {
        Self {
            max_total_turns: 20,
            initial: StateBounds::new(1, 2, 0.5),
            confusion: StateBounds::new(2, 4, 0.4),
            building_trust: StateBounds::new(2, 5, 0.35),
            feigned_compliance: StateBounds::new(2, 6, 0.3),
            delay_tactics: StateBounds::new(2, 5, 0.35),
        }
    }
}

impl StateMachineConfig {
    /// Bounds of a state; `None` for the terminal state.
    pub fn bounds(&self, state: ConversationState) -> Option<StateBounds> {
        match state {
            ConversationState::Initial => Some(self.initial),
            ConversationState::Confusion => Some(self.confusion),
            ConversationState::BuildingTrust => Some(self.building_trust),
            ConversationState::FeignedCompliance => Some(self.feigned_compliance),
            ConversationState::DelayTactics => Some(self.delay_tactics),
            ConversationState::Conclusion => None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransitionReason {
    Killed,
    GlobalTurnCap,
    MaxTurnsInState,
    Probabilistic,
}

/// Evaluates one step of the state machine.
///
/// Returns the next state and why it was entered, or `None` when the state
/// does not change. Precedence: terminal no-op, kill, global turn cap, the
/// state's own max-turn bound, then the probability draw.
pub fn advance_with_reason(
    state: ConversationState,
    turns_in_state: u32,
    total_turns: u32,
    killed: bool,
    draw: f64,
    config: &StateMachineConfig,
) -> Option<(ConversationState, TransitionReason)> {
    let bounds = config.bounds(state)?;

    if killed {
        return Some((ConversationState::Conclusion, TransitionReason::Killed));
    }
    if total_turns >= config.max_total_turns {
        return Some((ConversationState::Conclusion, TransitionReason::GlobalTurnCap));
    }

    let next = state.next()?;
    if turns_in_state >= bounds.max_turns {
        return Some((next, TransitionReason::MaxTurnsInState));
    }
    if turns_in_state >= bounds.min_turns && draw < bounds.transition_probability {
        return Some((next, TransitionReason::Probabilistic));
    }
    None
}

/// Pure transition function: the state after one evaluation.
pub fn advance(
    state: ConversationState,
    turns_in_state: u32,
    total_turns: u32,
    killed: bool,
    draw: f64,
    config: &StateMachineConfig,
) -> ConversationState {
    advance_with_reason(state, turns_in_state, total_turns, killed, draw, config)
        .map(|(next, _)| next)
        .unwrap_or(state)
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct StateTransition {
    pub from: ConversationState,
    pub to: ConversationState,
    pub at_turn: u32,
    pub reason: TransitionReason,
}

/// Per-session position in the state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTracker {
    state: ConversationState,
    turns_in_state: u32,
    transitions: Vec<StateTransition>,
}

impl Default for ConversationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationTracker {
    pub fn new() -> Self {
        Self {
            state: ConversationState::Initial,
            turns_in_state: 0,
            transitions: Vec::new(),
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn turns_in_state(&self) -> u32 {
        self.turns_in_state
    }

    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    /// Counts one inbound turn against the current state.
    pub fn record_turn(&mut self) {
        self.turns_in_state = self.turns_in_state.saturating_add(1);
    }

    /// Runs one evaluation and applies the resulting transition, if any.
    pub fn evaluate(
        &mut self,
        total_turns: u32,
        killed: bool,
        draw: f64,
        config: &StateMachineConfig,
    ) -> Option<StateTransition> {
        let (to, reason) = advance_with_reason(
            self.state,
            self.turns_in_state,
            total_turns,
            killed,
            draw,
            config,
        )?;
        let transition = StateTransition {
            from: self.state,
            to,
            at_turn: total_turns,
            reason,
        };
        self.state = to;
        self.turns_in_state = 0;
        self.transitions.push(transition.clone());
        Some(transition)
    }
}
