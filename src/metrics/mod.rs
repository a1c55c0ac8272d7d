//! Metrics data model, wire contract, formatting and card derivation.

pub mod derive;
pub mod format;
pub mod snapshot;

pub use derive::{MetricDescriptor, Trend, derive, derive_with};
pub use format::{MetricFormatter, NumberLocale};
pub use snapshot::{MetricKey, MetricValues, MetricsSnapshot, SchemaWarnings};
