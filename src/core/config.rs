//! Configuration system: TOML file + env var overrides + defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::core::errors::{DashError, Result};
use crate::metrics::format::{MetricFormatter, NumberLocale};
use crate::view::{View, ViewState};

/// Smallest accepted live-dashboard refresh interval.
pub const MIN_REFRESH_MS: u64 = 250;

/// Full mobdash configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub endpoint: EndpointConfig,
    pub views: ViewsConfig,
    pub format: FormatConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

/// Backend metrics endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EndpointConfig {
    pub url: String,
    /// Whole-request timeout handed to the HTTP client.
    pub timeout_ms: u64,
}

/// Enabled views and the one selected at session start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ViewsConfig {
    pub default_view: String,
    pub enabled: Vec<String>,
}

/// Number formatting for metric cards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FormatConfig {
    pub locale: NumberLocale,
    pub currency_symbol: String,
}

/// Live `watch` dashboard behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DashboardConfig {
    pub refresh_ms: u64,
}

/// JSONL activity log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub activity_log_enabled: bool,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub activity_log: PathBuf,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5000/api/dashboard/overview".to_string(),
            timeout_ms: 5_000,
        }
    }
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            default_view: View::Overview.id().to_string(),
            enabled: View::ALL.iter().map(|view| view.id().to_string()).collect(),
        }
    }
}

impl Default for FormatConfig {
    fn default() -> Self {
        let locale = NumberLocale::default();
        Self {
            locale,
            currency_symbol: locale.default_currency_symbol().to_string(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { refresh_ms: 30_000 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            activity_log_enabled: true,
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!(
                    "[MDB-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths"
                );
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        Self {
            config_file: home_dir.join(".config").join("mobdash").join("config.toml"),
            activity_log: home_dir
                .join(".local")
                .join("share")
                .join("mobdash")
                .join("activity.jsonl"),
        }
    }
}

impl FormatConfig {
    /// Formatter described by this section.
    #[must_use]
    pub fn formatter(&self) -> MetricFormatter {
        MetricFormatter::new(self.locale, self.currency_symbol.clone())
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, env_var)
    }

    /// [`Config::load`] with an injectable environment lookup.
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf)
                .map_err(|source| DashError::io(&path_buf, source))?;
            toml::from_str::<Self>(&raw)?
        } else if is_explicit_path {
            return Err(DashError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(lookup)?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for logging.
    ///
    /// FNV-1a over the canonical JSON form, stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Replace the endpoint URL (e.g. from a command-line flag).
    ///
    /// # Errors
    /// `InvalidConfig` when `url` is not an http(s) URL with a host.
    pub fn override_endpoint(&mut self, url: &str) -> Result<()> {
        let url = url.trim();
        validate_url(url)?;
        self.endpoint.url = url.to_string();
        Ok(())
    }

    /// Initial view state for a session.
    pub fn view_state(&self) -> Result<ViewState> {
        ViewState::from_config(&self.views)
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut get = |name: &str| lookup(name).filter(|raw| !raw.trim().is_empty());

        if let Some(raw) = get("MOBDASH_ENDPOINT_URL") {
            self.endpoint.url = raw.trim().to_string();
        }
        if let Some(raw) = get("MOBDASH_ENDPOINT_TIMEOUT_MS") {
            self.endpoint.timeout_ms = parse_env_u64("MOBDASH_ENDPOINT_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = get("MOBDASH_VIEWS_DEFAULT") {
            self.views.default_view = raw.trim().to_string();
        }
        if let Some(raw) = get("MOBDASH_FORMAT_LOCALE") {
            self.format.locale = raw.parse().map_err(|details: String| DashError::ConfigParse {
                context: "env",
                details: format!("MOBDASH_FORMAT_LOCALE={raw:?}: {details}"),
            })?;
        }
        if let Some(raw) = get("MOBDASH_FORMAT_CURRENCY_SYMBOL") {
            self.format.currency_symbol = raw.trim().to_string();
        }
        if let Some(raw) = get("MOBDASH_DASHBOARD_REFRESH_MS") {
            self.dashboard.refresh_ms = parse_env_u64("MOBDASH_DASHBOARD_REFRESH_MS", &raw)?;
        }
        if let Some(raw) = get("MOBDASH_LOGGING_ENABLED") {
            self.logging.activity_log_enabled = parse_env_bool("MOBDASH_LOGGING_ENABLED", &raw)?;
        }
        if let Some(raw) = get("MOBDASH_ACTIVITY_LOG") {
            self.paths.activity_log = PathBuf::from(raw.trim());
        }
        Ok(())
    }

    fn normalize(&mut self) {
        self.endpoint.url = self.endpoint.url.trim().to_string();
        self.views.default_view = self.views.default_view.trim().to_string();
    }

    fn validate(&self) -> Result<()> {
        validate_url(&self.endpoint.url)?;
        if self.endpoint.timeout_ms == 0 {
            return Err(DashError::InvalidConfig {
                details: "endpoint.timeout_ms must be > 0".to_string(),
            });
        }

        // Catalog and default view must agree.
        self.view_state()?;

        if self.format.currency_symbol.trim().is_empty() {
            return Err(DashError::InvalidConfig {
                details: "format.currency_symbol must not be empty".to_string(),
            });
        }

        if self.dashboard.refresh_ms < MIN_REFRESH_MS {
            return Err(DashError::InvalidConfig {
                details: format!(
                    "dashboard.refresh_ms must be >= {MIN_REFRESH_MS}, got {}",
                    self.dashboard.refresh_ms
                ),
            });
        }

        if self.logging.max_size_bytes == 0 {
            return Err(DashError::InvalidConfig {
                details: "logging.max_size_bytes must be > 0".to_string(),
            });
        }

        if self.logging.activity_log_enabled && self.paths.activity_log.as_os_str().is_empty() {
            return Err(DashError::InvalidConfig {
                details: "paths.activity_log must be set when the activity log is enabled"
                    .to_string(),
            });
        }

        Ok(())
    }
}

fn validate_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url).map_err(|error| DashError::InvalidConfig {
        details: format!("endpoint.url {url:?} is not a valid URL: {error}"),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(DashError::InvalidConfig {
            details: format!("endpoint.url must be an http(s) URL with a host, got {url:?}"),
        });
    }
    Ok(())
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim().parse::<u64>().map_err(|error| DashError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(DashError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: expected a boolean"),
        }),
    }
}
