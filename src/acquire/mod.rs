//! Metrics acquisition: one request per refresh, fixed fallback on failure.

pub mod acquirer;
pub mod transport;

pub use acquirer::{Acquired, Acquirer};
pub use transport::{
    AcquisitionFailure, HttpTransport, MetricsTransport, RawResponse, ScriptedTransport,
};
