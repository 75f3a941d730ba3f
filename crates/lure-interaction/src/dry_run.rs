//! DryRunTransport - logs reports instead of sending them.

use async_trait::async_trait;
use lure_core::callback::{CallbackTransport, DeliveryError};
use lure_core::report::FinalReport;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Accepts every report and keeps a copy for inspection.
#[derive(Debug, Clone, Default)]
pub struct DryRunTransport {
    delivered: Arc<Mutex<Vec<FinalReport>>>,
}

impl DryRunTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn delivered(&self) -> Vec<FinalReport> {
        self.delivered.lock().await.clone()
    }
}

#[async_trait]
impl CallbackTransport for DryRunTransport {
    async fn deliver(&self, report: &FinalReport) -> Result<(), DeliveryError> {
        let body = serde_json::to_string_pretty(report)
            .map_err(|err| DeliveryError::permanent(None, err.to_string()))?;
        tracing::info!(session_id = %report.session_id, "Dry run, report not sent:\n{body}");
        self.delivered.lock().await.push(report.clone());
        Ok(())
    }
}
