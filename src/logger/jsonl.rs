//! JSONL activity log: one self-contained JSON object per line.
//!
//! Lines are assembled in memory and written with a single `write_all` so a
//! concurrent `tail -f` never sees a partial record.
//!
//! Degradation chain:
//! 1. Primary file path
//! 2. stderr with `[MDB-JSONL]` prefix
//! 3. Silent discard (a dashboard never fails because logging failed)

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions, rename};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::config::{Config, LoggingConfig};
use crate::core::errors::{DashError, Result};

/// Severity level for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Session activity events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SessionStart,
    SessionEnd,
    RefreshComplete,
    FallbackEngaged,
    ViewSelected,
    ViewRejected,
    ConfigLoaded,
}

/// A single JSONL log entry; all fields optional except `ts`, `event`, `severity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 UTC timestamp with millisecond precision.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    /// View identifier involved (selected, rejected, or active).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    /// `live` or `fallback` for refresh events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// HTTP status observed, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// MDB error code if the action failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Freeform details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// Create a new entry stamped with the current UTC time.
    #[must_use]
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            view: None,
            source: None,
            status: None,
            duration_ms: None,
            error_code: None,
            error_message: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    #[must_use]
    pub fn with_duration(mut self, elapsed: Duration) -> Self {
        self.duration_ms = Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Attach the code and message of a failed action.
    #[must_use]
    pub fn with_error(mut self, error: &DashError) -> Self {
        self.error_code = Some(error.code().to_string());
        self.error_message = Some(error.to_string());
        self
    }
}

/// Degradation state of the JSONL writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Normal,
    Stderr,
    Discard,
}

/// Configuration for the JSONL writer.
#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    /// Maximum file size before rotation (bytes).
    pub max_size_bytes: u64,
    /// Number of rotated files to keep.
    pub max_rotated_files: u32,
}

impl JsonlConfig {
    /// Writer settings from the effective configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let LoggingConfig {
            max_size_bytes,
            max_rotated_files,
            ..
        } = config.logging;
        Self {
            path: config.paths.activity_log.clone(),
            max_size_bytes,
            max_rotated_files,
        }
    }
}

/// Append-only JSONL log writer with rotation and a degradation chain.
pub struct JsonlWriter {
    config: JsonlConfig,
    writer: Option<BufWriter<File>>,
    state: WriterState,
    bytes_written: u64,
}

impl JsonlWriter {
    /// Open the JSONL log file. Falls through the degradation chain on failure.
    #[must_use]
    pub fn open(config: JsonlConfig) -> Self {
        let mut w = Self {
            config,
            writer: None,
            state: WriterState::Discard,
            bytes_written: 0,
        };
        w.try_open_primary();
        w
    }

    /// Write one entry as a single line and flush it.
    pub fn write_entry(&mut self, entry: &LogEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[MDB-JSONL] serialize error: {e}");
                return;
            }
        };

        self.write_line(&line);
        self.flush();
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut()
            && w.flush().is_err()
        {
            self.degrade();
        }
    }

    /// Current degradation state.
    #[must_use]
    pub const fn state(&self) -> &'static str {
        match self.state {
            WriterState::Normal => "normal",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }

    /// Number of bytes written to the current file.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    // ──────────────────────── internals ────────────────────────

    fn write_line(&mut self, line: &str) {
        if self.bytes_written + line.len() as u64 > self.config.max_size_bytes
            && self.state == WriterState::Normal
        {
            self.rotate();
        }

        match self.state {
            WriterState::Normal => {
                if let Some(w) = self.writer.as_mut() {
                    if w.write_all(line.as_bytes()).is_err() {
                        self.degrade();
                        self.write_line(line);
                        return;
                    }
                    self.bytes_written += line.len() as u64;
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            WriterState::Stderr => {
                if write!(io::stderr(), "[MDB-JSONL] {line}").is_err() {
                    self.degrade();
                }
            }
            WriterState::Discard => {}
        }
    }

    fn try_open_primary(&mut self) {
        match open_append(&self.config.path) {
            Ok((file, size)) => {
                self.writer = Some(BufWriter::with_capacity(16 * 1024, file));
                self.state = WriterState::Normal;
                self.bytes_written = size;
            }
            Err(e) => {
                self.state = WriterState::Stderr;
                let _ = writeln!(io::stderr(), "[MDB-JSONL] {e}; using stderr");
            }
        }
    }

    fn degrade(&mut self) {
        self.writer = None;
        match self.state {
            WriterState::Normal => {
                self.state = WriterState::Stderr;
                let _ = writeln!(io::stderr(), "[MDB-JSONL] primary write failed, using stderr");
            }
            WriterState::Stderr => self.state = WriterState::Discard,
            WriterState::Discard => {}
        }
    }

    fn rotate(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
        self.writer = None;

        let base = self.config.path.clone();
        if self.config.max_rotated_files == 0 {
            let _ = fs::remove_file(&base);
        } else {
            // .N-1 → .N, …, .1 → .2, current → .1
            for i in (1..self.config.max_rotated_files).rev() {
                let _ = rename(rotated_name(&base, i), rotated_name(&base, i + 1));
            }
            let _ = rename(&base, rotated_name(&base, 1));
        }

        match open_append(&base) {
            Ok((file, _)) => {
                self.writer = Some(BufWriter::with_capacity(16 * 1024, file));
                self.bytes_written = 0;
            }
            Err(_) => self.degrade(),
        }
    }
}

// ──────────────────────── helpers ────────────────────────

/// Open or create a file for appending. Returns `(File, current_size)`.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| DashError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| DashError::io(path, source))?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((file, size))
}

/// Build a rotated filename: `foo.jsonl` → `foo.jsonl.3`.
fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

// ──────────────────────── tests ────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn config_at(path: PathBuf, max_size_bytes: u64) -> JsonlConfig {
        JsonlConfig {
            path,
            max_size_bytes,
            max_rotated_files: 3,
        }
    }

    #[test]
    fn write_entry_produces_valid_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.jsonl");
        let mut writer = JsonlWriter::open(config_at(path.clone(), 1024 * 1024));

        writer.write_entry(&LogEntry::new(EventType::SessionStart, Severity::Info));

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 1);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["event"], "session_start");
        assert_eq!(parsed["severity"], "info");
        assert!(parsed["ts"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn entries_are_visible_without_explicit_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("multi.jsonl");
        let mut writer = JsonlWriter::open(config_at(path.clone(), 1024 * 1024));

        for view in ["overview", "rides", "drivers"] {
            writer.write_entry(
                &LogEntry::new(EventType::ViewSelected, Severity::Info).with_view(view),
            );
        }

        let contents = fs::read_to_string(&path).unwrap();
        let views: Vec<String> = contents
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                value["view"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(views, ["overview", "rides", "drivers"]);
    }

    #[test]
    fn rotation_shifts_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rot.jsonl");
        let mut writer = JsonlWriter::open(config_at(path.clone(), 100));

        for _ in 0..10 {
            writer.write_entry(&LogEntry::new(EventType::RefreshComplete, Severity::Info));
        }

        assert!(path.exists());
        assert!(rotated_name(&path, 1).exists());
        assert!(!rotated_name(&path, 4).exists(), "keeps at most 3 rotations");
    }

    #[test]
    fn unwritable_primary_degrades_to_stderr() {
        let config = config_at(
            PathBuf::from("/nonexistent_mdb_test_dir_12345/primary.jsonl"),
            1024,
        );
        let mut writer = JsonlWriter::open(config);
        assert_eq!(writer.state(), "stderr");
        writer.write_entry(&LogEntry::new(EventType::FallbackEngaged, Severity::Warning));
        assert_eq!(writer.state(), "stderr");
    }

    #[test]
    fn optional_fields_omitted_when_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sparse.jsonl");
        let mut writer = JsonlWriter::open(config_at(path.clone(), 1024 * 1024));

        writer.write_entry(&LogEntry::new(EventType::ConfigLoaded, Severity::Info));

        let line = fs::read_to_string(&path).unwrap();
        assert!(!line.contains("\"view\""));
        assert!(!line.contains("\"status\""));
        assert!(!line.contains("\"error_code\""));
    }

    #[test]
    fn error_fields_carry_code_and_message() {
        let entry = LogEntry::new(EventType::ViewRejected, Severity::Warning)
            .with_error(&DashError::invalid_view("bogus"))
            .with_duration(Duration::from_millis(12));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["error_code"], "MDB-2001");
        assert!(json["error_message"].as_str().unwrap().contains("bogus"));
        assert_eq!(json["duration_ms"], 12);
    }
}
