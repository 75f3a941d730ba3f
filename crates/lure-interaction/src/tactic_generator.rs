//! TacticReplyGenerator - offline stand-in for the language-model generator.
//!
//! Replies with the current state's safe lines, rotating through them turn by
//! turn. Used for simulations and demos where no model is available.

use async_trait::async_trait;
use lure_core::error::Result;
use lure_core::reply::{ReplyContext, ReplyGenerator};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct TacticReplyGenerator {
    counter: AtomicUsize,
}

impl TacticReplyGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReplyGenerator for TacticReplyGenerator {
    async fn generate(&self, context: &ReplyContext) -> Result<String> {
        let lines = context.tactic.fallback_replies;
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        Ok(lines[n % lines.len()].to_string())
    }
}
