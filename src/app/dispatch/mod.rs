//! Sequential dispatch of data requests
//!
//! Each request URL is sent in turn. A 400 response means the data system is
//! not ready yet: the identical request is resent after a fixed interval
//! until some other status arrives. Every outcome is appended to a ledger
//! and the unsent URLs are checkpointed after each request.
//!
//! # Module Organization
//!
//! - [`ledger`] - the incremental summary file and the remaining-URLs checkpoint
//! - [`dispatcher`] - the send/retry loop

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{dispatch, limits};
use crate::errors::DispatchResult;

pub mod dispatcher;
pub mod ledger;

pub use dispatcher::{DispatchSummary, Dispatcher};
pub use ledger::{write_checkpoint, DispatchLedger, LEDGER_HEADER};

/// HTTP status meaning "not ready yet, resend later"
pub const NOT_READY_STATUS: u16 = 400;

/// HTTP status of an accepted request
pub const OK_STATUS: u16 = 200;

/// Status code and decoded JSON body of one request
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResponse {
    pub status: u16,
    pub body: Value,
}

/// Sends one data request
///
/// `OoiClient` sends over HTTP with basic authentication; tests script the
/// responses.
#[allow(async_fn_in_trait)]
pub trait RequestSender {
    /// Send a GET request to `url`
    ///
    /// # Errors
    ///
    /// Returns `DispatchError` if no response was received.
    async fn send(&self, url: &str) -> DispatchResult<DispatchResponse>;
}

impl<T: RequestSender + ?Sized> RequestSender for &T {
    async fn send(&self, url: &str) -> DispatchResult<DispatchResponse> {
        (**self).send(url).await
    }
}

/// Retry policy for not-ready responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Fixed wait before resending a not-ready request
    pub retry_interval: Duration,
    /// Cap on resends of one request; `None` resends until it is ready
    pub max_retries: Option<u32>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            retry_interval: limits::NOT_READY_RETRY_INTERVAL,
            max_retries: None,
        }
    }
}

/// Result of sending one request, as recorded in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub status: String,
    pub request_url: String,
    pub output_url: String,
    /// Final HTTP status, `None` if no response was received
    pub http_status: Option<u16>,
    /// Number of times the request was sent
    pub attempts: u32,
}

impl DispatchOutcome {
    /// Whether the data system accepted the request
    pub fn succeeded(&self) -> bool {
        self.http_status == Some(OK_STATUS)
    }
}

/// Status text and output URL for a response
///
/// A 200 response reports its `status` and `outputURL` fields. Any other
/// response reports `message.status` and has no output URL. Missing fields
/// fall back to fixed defaults.
pub fn interpret_response(response: &DispatchResponse) -> (String, String) {
    if response.status == OK_STATUS {
        let status = text_field(response.body.get("status"))
            .unwrap_or_else(|| dispatch::DEFAULT_SUCCESS_STATUS.to_string());
        let output_url = text_field(response.body.get("outputURL"))
            .unwrap_or_else(|| dispatch::NO_OUTPUT_URL.to_string());
        (status, output_url)
    } else {
        let status = text_field(response.body.pointer("/message/status"))
            .unwrap_or_else(|| dispatch::DEFAULT_FAILURE_STATUS.to_string());
        (status, dispatch::NO_OUTPUT_URL.to_string())
    }
}

/// Render a JSON field as ledger text; strings are written unquoted
fn text_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_reads_status_and_output_url() {
        let response = DispatchResponse {
            status: 200,
            body: json!({
                "status": "Request is being processed",
                "outputURL": "https://opendap.oceanobservatories.org/thredds/catalog/ooi/user/xyz/catalog.html"
            }),
        };
        let (status, output) = interpret_response(&response);
        assert_eq!(status, "Request is being processed");
        assert!(output.ends_with("catalog.html"));
    }

    #[test]
    fn test_success_defaults() {
        let response = DispatchResponse {
            status: 200,
            body: json!({}),
        };
        assert_eq!(
            interpret_response(&response),
            (
                dispatch::DEFAULT_SUCCESS_STATUS.to_string(),
                dispatch::NO_OUTPUT_URL.to_string()
            )
        );
    }

    #[test]
    fn test_failure_reads_message_status() {
        let response = DispatchResponse {
            status: 404,
            body: json!({"message": {"status": "No data in time range"}}),
        };
        assert_eq!(
            interpret_response(&response),
            (
                "No data in time range".to_string(),
                dispatch::NO_OUTPUT_URL.to_string()
            )
        );
    }

    #[test]
    fn test_failure_without_status_uses_default() {
        let response = DispatchResponse {
            status: 500,
            body: json!({"message": "Internal error"}),
        };
        let (status, _) = interpret_response(&response);
        assert_eq!(status, dispatch::DEFAULT_FAILURE_STATUS);
    }

    #[test]
    fn test_default_config_retries_forever_every_minute() {
        let config = DispatchConfig::default();
        assert_eq!(config.retry_interval, Duration::from_secs(60));
        assert_eq!(config.max_retries, None);
    }
}
