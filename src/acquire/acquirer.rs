//! One-shot snapshot acquisition with a deterministic fallback.

#![allow(missing_docs)]

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use super::transport::{AcquisitionFailure, HttpTransport, MetricsTransport};
use crate::core::config::EndpointConfig;
use crate::core::errors::Result;
use crate::metrics::snapshot::{MetricsSnapshot, SchemaWarnings, parse_wire_body};

/// Result of one acquisition. Always carries a usable snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Acquired {
    pub snapshot: MetricsSnapshot,
    pub is_fallback: bool,
    /// Present exactly when `is_fallback` is true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<AcquisitionFailure>,
    /// Drift observed in a live body; empty for fallbacks.
    pub schema: SchemaWarnings,
    pub fetched_at: DateTime<Utc>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl Acquired {
    fn live(snapshot: MetricsSnapshot, schema: SchemaWarnings, elapsed: Duration) -> Self {
        Self {
            snapshot,
            is_fallback: false,
            failure: None,
            schema,
            fetched_at: Utc::now(),
            elapsed,
        }
    }

    fn fallback(failure: AcquisitionFailure, elapsed: Duration) -> Self {
        Self {
            snapshot: MetricsSnapshot::fallback(),
            is_fallback: true,
            failure: Some(failure),
            schema: SchemaWarnings::default(),
            fetched_at: Utc::now(),
            elapsed,
        }
    }

    /// `live` or `fallback`.
    #[must_use]
    pub const fn source(&self) -> &'static str {
        if self.is_fallback { "fallback" } else { "live" }
    }
}

fn serialize_millis<S: Serializer>(
    elapsed: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

/// Fetches snapshots through a [`MetricsTransport`].
#[derive(Debug)]
pub struct Acquirer<T> {
    transport: T,
}

impl Acquirer<HttpTransport> {
    /// Acquirer for the configured HTTP endpoint.
    ///
    /// # Errors
    /// `Transport` when the HTTP client cannot be constructed.
    pub fn from_config(endpoint: &EndpointConfig) -> Result<Self> {
        Ok(Self::new(HttpTransport::from_config(endpoint)?))
    }
}

impl<T: MetricsTransport> Acquirer<T> {
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Issue exactly one request and classify the outcome.
    ///
    /// Transport errors, non-2xx statuses, and malformed bodies all yield
    /// [`MetricsSnapshot::fallback`] with `is_fallback` set. Nothing is retried.
    pub fn acquire(&self) -> Acquired {
        let started = Instant::now();
        let outcome = self.transport.fetch();
        let elapsed = started.elapsed();

        let response = match outcome {
            Ok(response) => response,
            Err(failure) => return Acquired::fallback(failure, elapsed),
        };
        if !response.is_success() {
            return Acquired::fallback(
                AcquisitionFailure::Status {
                    code: response.status,
                },
                elapsed,
            );
        }
        match parse_wire_body(&response.body) {
            Ok(wire) => Acquired::live(wire.snapshot, wire.warnings, elapsed),
            Err(details) => Acquired::fallback(AcquisitionFailure::Malformed { details }, elapsed),
        }
    }

    /// [`Acquirer::acquire`], keeping only the snapshot.
    pub fn acquire_snapshot(&self) -> MetricsSnapshot {
        self.acquire().snapshot
    }
}
