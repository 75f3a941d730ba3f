//! Application layer for LURE.
//!
//! This crate provides the use cases that drive engagement sessions: the
//! per-session orchestration boundary used by the API layer and the
//! finalization manager that reports each session exactly once.

pub mod finalization;
pub mod orchestrator;

pub use finalization::{EligibilityReason, FinalizationManager};
pub use orchestrator::{
    ComposedReply, FollowUpOutcome, InboundMessage, InboundOutcome, KillOutcome, ReplyOrigin,
    SessionOrchestrator, SweepReport,
};
