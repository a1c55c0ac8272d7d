//! Transport seam between the acquirer and the metrics backend.

#![allow(missing_docs)]

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::header::ACCEPT;
use serde::Serialize;
use thiserror::Error;

use crate::core::config::EndpointConfig;
use crate::core::errors::Result;

/// Body and status of one completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Why an acquisition fell back. Recovered locally; never surfaced as an error.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AcquisitionFailure {
    #[error("transport error: {details}")]
    Transport { details: String },
    #[error("non-success status {code}")]
    Status { code: u16 },
    #[error("malformed body: {details}")]
    Malformed { details: String },
}

impl AcquisitionFailure {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Status { .. } => "status",
            Self::Malformed { .. } => "malformed",
        }
    }

    /// HTTP status, for failures that got as far as a response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { code } => Some(*code),
            Self::Transport { .. } | Self::Malformed { .. } => None,
        }
    }
}

/// One request to the metrics backend per call.
pub trait MetricsTransport: Send + Sync {
    /// Perform exactly one request.
    ///
    /// # Errors
    /// `Transport` when no response was received. Non-2xx responses are
    /// returned as `Ok` and classified by the caller.
    fn fetch(&self) -> std::result::Result<RawResponse, AcquisitionFailure>;

    /// Human-readable target, for logs and diagnostics.
    fn describe(&self) -> String;
}

impl<T: MetricsTransport + ?Sized> MetricsTransport for std::sync::Arc<T> {
    fn fetch(&self) -> std::result::Result<RawResponse, AcquisitionFailure> {
        (**self).fetch()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

// ──────────────────── HTTP ────────────────────

/// Blocking HTTP GET against the configured endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpTransport {
    /// # Errors
    /// `Transport` when the HTTP client cannot be constructed.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("mobdash/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// # Errors
    /// `Transport` when the HTTP client cannot be constructed.
    pub fn from_config(endpoint: &EndpointConfig) -> Result<Self> {
        Self::new(
            endpoint.url.clone(),
            Duration::from_millis(endpoint.timeout_ms),
        )
    }
}

impl MetricsTransport for HttpTransport {
    fn fetch(&self) -> std::result::Result<RawResponse, AcquisitionFailure> {
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|err| AcquisitionFailure::Transport {
                details: err.to_string(),
            })?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|err| AcquisitionFailure::Transport {
                details: format!("reading body: {err}"),
            })?;
        Ok(RawResponse { status, body })
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

// ──────────────────── scripted ────────────────────

/// In-memory transport replaying a fixed script of outcomes.
///
/// Once the script is exhausted every call reports a transport failure.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<std::result::Result<RawResponse, AcquisitionFailure>>>,
    calls: Mutex<usize>,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new(
        outcomes: impl IntoIterator<Item = std::result::Result<RawResponse, AcquisitionFailure>>,
    ) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            calls: Mutex::new(0),
        }
    }

    /// A transport answering once with `200` and `body`.
    #[must_use]
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new([Ok(RawResponse::new(200, body))])
    }

    /// A transport whose every call fails at the network layer.
    #[must_use]
    pub fn unreachable() -> Self {
        Self::default()
    }

    /// Requests made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

impl MetricsTransport for ScriptedTransport {
    fn fetch(&self) -> std::result::Result<RawResponse, AcquisitionFailure> {
        *self.calls.lock() += 1;
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| {
                Err(AcquisitionFailure::Transport {
                    details: "connection refused".to_string(),
                })
            })
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range_is_2xx() {
        assert!(RawResponse::new(200, "").is_success());
        assert!(RawResponse::new(204, "").is_success());
        assert!(!RawResponse::new(199, "").is_success());
        assert!(!RawResponse::new(301, "").is_success());
        assert!(!RawResponse::new(500, "").is_success());
    }

    #[test]
    fn scripted_transport_replays_then_fails() {
        let transport = ScriptedTransport::ok("{}");
        assert_eq!(transport.fetch().expect("first").body, "{}");
        let err = transport.fetch().expect_err("exhausted");
        assert_eq!(err.kind(), "transport");
        assert_eq!(transport.calls(), 2);
    }

    #[test]
    fn failure_serializes_with_kind_tag() {
        let json = serde_json::to_value(AcquisitionFailure::Status { code: 503 }).expect("json");
        assert_eq!(json["kind"], "status");
        assert_eq!(json["code"], 503);
        assert_eq!(AcquisitionFailure::Status { code: 503 }.status(), Some(503));
    }

    #[test]
    fn http_transport_builds_from_config() {
        let transport = HttpTransport::from_config(&EndpointConfig::default()).expect("client");
        assert_eq!(transport.describe(), EndpointConfig::default().url);
    }
}
