//! HttpCallbackTransport - reqwest client for the evaluation endpoint.
//!
//! Performs a single POST per call and maps every failure into a transient or
//! permanent `DeliveryError`. Retrying is left to the finalization manager.

use async_trait::async_trait;
use lure_core::callback::{CallbackConfig, CallbackTransport, DeliveryError, DeliveryErrorClass};
use lure_core::error::{LureError, Result};
use lure_core::report::FinalReport;
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::Deserialize;
use std::time::Duration;

const API_KEY_HEADER: &str = "x-api-key";

/// Posts the serialized `FinalReport` as JSON.
#[derive(Clone)]
pub struct HttpCallbackTransport {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpCallbackTransport {
    /// Creates a transport for `endpoint` with a request timeout.
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| LureError::config(format!("Failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    /// Creates a transport from the callback section of the configuration.
    pub fn from_config(config: &CallbackConfig) -> Result<Self> {
        Self::new(config.endpoint.clone(), config.api_key.clone(), config.attempt_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CallbackTransport for HttpCallbackTransport {
    async fn deliver(&self, report: &FinalReport) -> std::result::Result<(), DeliveryError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .json(report);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(map_request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(map_http_error(status, body_text, retry_after));
        }

        tracing::debug!(
            session_id = %report.session_id,
            status = response.status().as_u16(),
            "Evaluation endpoint accepted report"
        );
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(alias = "error", alias = "detail")]
    message: String,
}

fn map_request_error(err: reqwest::Error) -> DeliveryError {
    let message = format!("Callback request failed: {err}");
    if err.is_timeout() {
        DeliveryError::transient(DeliveryErrorClass::Timeout, message)
    } else if err.is_connect() || err.is_request() {
        DeliveryError::transient(DeliveryErrorClass::Connection, message)
    } else {
        // Builder and body encoding failures will not succeed on retry
        DeliveryError::permanent(None, message)
    }
}

fn map_http_error(status: StatusCode, body: String, retry_after: Option<Duration>) -> DeliveryError {
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|parsed| parsed.message)
        .unwrap_or(body);
    DeliveryError::from_status(status.as_u16(), message, retry_after)
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
