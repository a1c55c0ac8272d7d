//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use mobility_dashboard::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{DashError, Result};

// Acquisition
pub use crate::acquire::{Acquired, Acquirer, AcquisitionFailure, HttpTransport, MetricsTransport};

// Metrics
pub use crate::metrics::{
    MetricDescriptor, MetricFormatter, MetricKey, MetricValues, MetricsSnapshot, NumberLocale,
    Trend, derive, derive_with,
};

// Views and sessions
pub use crate::logger::ActivityLog;
pub use crate::session::{DashboardSession, SessionStats};
pub use crate::view::{View, ViewCatalog, ViewState};
