#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use lure_core::callback::{CallbackTransport, DeliveryError};
use lure_core::error::{LureError, Result};
use lure_core::reply::{ReplyContext, ReplyGenerator};
use lure_core::report::FinalReport;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
}

/// Replays scripted delivery results, then succeeds. Records when each call happened.
#[derive(Default)]
pub struct ScriptedTransport {
    results: Mutex<VecDeque<std::result::Result<(), DeliveryError>>>,
    calls: Mutex<Vec<Instant>>,
    latency: Duration,
}

impl ScriptedTransport {
    pub fn new(results: impl IntoIterator<Item = std::result::Result<(), DeliveryError>>) -> Self {
        Self {
            results: Mutex::new(results.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn ok() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Gaps between consecutive calls.
    pub fn gaps(&self) -> Vec<Duration> {
        let calls = self.calls.lock().unwrap();
        calls.windows(2).map(|pair| pair[1] - pair[0]).collect()
    }
}

#[async_trait]
impl CallbackTransport for ScriptedTransport {
    async fn deliver(&self, _report: &FinalReport) -> std::result::Result<(), DeliveryError> {
        self.calls.lock().unwrap().push(Instant::now());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

/// Never answers; every attempt runs into the per-attempt timeout.
#[derive(Default)]
pub struct HangingTransport {
    calls: Mutex<usize>,
}

impl HangingTransport {
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl CallbackTransport for HangingTransport {
    async fn deliver(&self, _report: &FinalReport) -> std::result::Result<(), DeliveryError> {
        *self.calls.lock().unwrap() += 1;
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// Replays scripted candidates, repeating the last one. Keeps every context it saw.
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String>>>,
    last: String,
    seen: Mutex<Vec<ReplyContext>>,
}

impl ScriptedGenerator {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
            last: replies.last().map(|r| r.to_string()).unwrap_or_default(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([Err(LureError::internal("model unavailable"))])),
            last: String::new(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn contexts(&self) -> Vec<ReplyContext> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplyGenerator for ScriptedGenerator {
    async fn generate(&self, context: &ReplyContext) -> Result<String> {
        self.seen.lock().unwrap().push(context.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(reply) => reply,
            None => Ok(self.last.clone()),
        }
    }
}

/// Signals `entered` on each call, then holds until `release` is notified.
#[derive(Default)]
pub struct GatedGenerator {
    pub entered: Notify,
    pub release: Notify,
}

#[async_trait]
impl ReplyGenerator for GatedGenerator {
    async fn generate(&self, _context: &ReplyContext) -> Result<String> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok("Haan ji, main samajh rahi hoon".to_string())
    }
}

/// Paused-clock waits land on millisecond ticks; allow that much slack.
pub fn assert_waits(actual: &[Duration], expected: &[Duration]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (got, want) in actual.iter().zip(expected) {
        assert!(
            *got >= *want && *got < *want + Duration::from_millis(10),
            "{actual:?} vs {expected:?}"
        );
    }
}
