//! Conversation state machine.
//!
//! # Module Structure
//!
//! - `state`: The strictly ordered states and their advisory tactics
//! - `machine`: The pure transition function and the per-session tracker

mod machine;
mod state;

pub use machine::{
    ConversationTracker, StateBounds, StateMachineConfig, StateTransition, TransitionReason,
    advance, advance_with_reason,
};
pub use state::{ConversationState, Tactic};
