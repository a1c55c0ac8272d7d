//! Activity logging: append-only JSONL with graceful degradation.

pub mod jsonl;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::config::Config;
use jsonl::{JsonlConfig, JsonlWriter, LogEntry};

/// Cloneable handle to a shared JSONL writer. A disabled log drops entries.
#[derive(Clone, Default)]
pub struct ActivityLog {
    inner: Option<Arc<Mutex<JsonlWriter>>>,
}

impl ActivityLog {
    /// A log that records nothing.
    #[must_use]
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    #[must_use]
    pub fn open(config: JsonlConfig) -> Self {
        Self {
            inner: Some(Arc::new(Mutex::new(JsonlWriter::open(config)))),
        }
    }

    /// Open the log described by `[logging]` and `[paths]`, or a disabled one.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        if config.logging.activity_log_enabled {
            Self::open(JsonlConfig::from_config(config))
        } else {
            Self::disabled()
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    pub fn record(&self, entry: &LogEntry) {
        if let Some(writer) = &self.inner {
            writer.lock().write_entry(entry);
        }
    }

    /// Writer degradation state, `disabled` when nothing is attached.
    #[must_use]
    pub fn state(&self) -> &'static str {
        self.inner
            .as_ref()
            .map_or("disabled", |writer| writer.lock().state())
    }
}

impl std::fmt::Debug for ActivityLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityLog")
            .field("state", &self.state())
            .finish()
    }
}
