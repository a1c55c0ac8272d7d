//! MDB-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, DashError>;

/// Top-level error type for the mobility dashboard core.
#[derive(Debug, Error)]
pub enum DashError {
    #[error("[MDB-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[MDB-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[MDB-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[MDB-2001] unknown or disabled view: {requested:?}")]
    InvalidView { requested: String },

    #[error("[MDB-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[MDB-3001] transport failure: {details}")]
    Transport { details: String },

    #[error("[MDB-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[MDB-3003] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[MDB-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl DashError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "MDB-1001",
            Self::MissingConfig { .. } => "MDB-1002",
            Self::ConfigParse { .. } => "MDB-1003",
            Self::InvalidView { .. } => "MDB-2001",
            Self::Serialization { .. } => "MDB-2101",
            Self::Transport { .. } => "MDB-3001",
            Self::Io { .. } => "MDB-3002",
            Self::ChannelClosed { .. } => "MDB-3003",
            Self::Runtime { .. } => "MDB-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::Io { .. }
                | Self::ChannelClosed { .. }
                | Self::Runtime { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Convenience constructor for view-selection failures.
    #[must_use]
    pub fn invalid_view(requested: impl Into<String>) -> Self {
        Self::InvalidView {
            requested: requested.into(),
        }
    }
}

impl From<serde_json::Error> for DashError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for DashError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<toml::ser::Error> for DashError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Serialization {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<reqwest::Error> for DashError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport {
            details: value.to_string(),
        }
    }
}
