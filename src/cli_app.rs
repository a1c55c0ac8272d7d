//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use mobility_dashboard::acquire::{Acquirer, HttpTransport};
use mobility_dashboard::cli::dashboard::{self, WatchConfig};
use mobility_dashboard::cli::{render_cards, source_badge, view_rows};
use mobility_dashboard::core::config::{Config, MIN_REFRESH_MS};
use mobility_dashboard::core::errors::DashError;
use mobility_dashboard::logger::ActivityLog;
use mobility_dashboard::logger::jsonl::{EventType, LogEntry, Severity};
use mobility_dashboard::session::DashboardSession;

/// Mobility dashboard: ride, revenue, driver and rating metrics at a glance.
#[derive(Debug, Parser)]
#[command(
    name = "mobdash",
    author,
    version,
    about = "Mobility Dashboard - urban-mobility operator metrics",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Fetch metrics once and print the metric cards.
    Overview(OverviewArgs),
    /// List views, or validate a view selection.
    Views(ViewsArgs),
    /// Live terminal dashboard with background refresh.
    Watch(WatchArgs),
    /// Inspect configuration state.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
    /// Show version and optional build metadata.
    Version(VersionArgs),
}

#[derive(Debug, Clone, Args, Default)]
struct OverviewArgs {
    /// Metrics endpoint URL (overrides config).
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,
    /// View to select before rendering.
    #[arg(long, value_name = "ID")]
    view: Option<String>,
}

#[derive(Debug, Clone, Args, Default)]
struct ViewsArgs {
    /// Select this view and report the resulting state.
    #[arg(long, value_name = "ID")]
    select: Option<String>,
}

#[derive(Debug, Clone, Args, Default)]
struct WatchArgs {
    /// Refresh interval (defaults to `dashboard.refresh_ms`).
    #[arg(long, value_name = "MILLISECONDS")]
    refresh_ms: Option<u64>,
    /// Metrics endpoint URL (overrides config).
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,
}

#[derive(Debug, Clone, Args, Default)]
struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print the config file path.
    Path,
    /// Print the effective configuration.
    Show,
    /// Validate the configuration and print its hash.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Args, Default)]
struct VersionArgs {
    /// Include build metadata.
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
        }
    }
}

impl From<DashError> for CliError {
    fn from(error: DashError) -> Self {
        match error {
            DashError::InvalidConfig { .. }
            | DashError::MissingConfig { .. }
            | DashError::ConfigParse { .. }
            | DashError::InvalidView { .. } => Self::User(error.to_string()),
            DashError::Serialization { .. } => Self::Internal(error.to_string()),
            DashError::Transport { .. }
            | DashError::Io { .. }
            | DashError::ChannelClosed { .. }
            | DashError::Runtime { .. } => Self::Runtime(error.to_string()),
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color || output_mode(cli) == OutputMode::Json {
        control::set_override(false);
    }

    match &cli.command {
        Command::Overview(args) => run_overview(cli, args),
        Command::Views(args) => run_views(cli, args),
        Command::Watch(args) => run_watch(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
        Command::Version(args) => emit_version(cli, args),
    }
}

// ──────────────────── session setup ────────────────────

fn load_config(cli: &Cli, endpoint: Option<&str>) -> Result<(Config, ActivityLog), CliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = endpoint {
        config.override_endpoint(url)?;
    }
    let log = ActivityLog::from_config(&config);
    let mut entry = LogEntry::new(EventType::ConfigLoaded, Severity::Info);
    entry.details = Some(format!(
        "path={} hash={}",
        config.paths.config_file.display(),
        config.stable_hash()?
    ));
    log.record(&entry);
    Ok((config, log))
}

fn open_session(
    config: &Config,
    log: ActivityLog,
) -> Result<DashboardSession<HttpTransport>, CliError> {
    let acquirer = Acquirer::from_config(&config.endpoint)?;
    Ok(
        DashboardSession::new(acquirer, config.view_state()?, config.format.formatter())
            .with_activity_log(log),
    )
}

// ──────────────────── overview ────────────────────

fn run_overview(cli: &Cli, args: &OverviewArgs) -> Result<(), CliError> {
    let (config, log) = load_config(cli, args.endpoint.as_deref())?;
    let mut session = open_session(&config, log)?;
    if let Some(view) = &args.view {
        session.select_view(view)?;
    }

    let acquired = session.refresh().clone();
    if let Some(failure) = &acquired.failure
        && cli.verbose
    {
        eprintln!("mobdash: using offline fallback data ({failure})");
    }
    if acquired.schema.has_drift() && cli.verbose {
        eprintln!(
            "mobdash: schema drift: unknown={:?} missing={:?}",
            acquired.schema.unknown_fields, acquired.schema.missing_fields
        );
    }

    let view = session.active_view();
    match output_mode(cli) {
        OutputMode::Human => {
            let badge = source_badge(session.latest());
            let badge = if acquired.is_fallback {
                badge.yellow()
            } else {
                badge.green()
            };
            println!("{}  [{badge}]", view.label().bold());
            for line in render_cards(session.descriptors()) {
                println!("{line}");
            }
            if acquired.is_fallback && !cli.quiet {
                eprintln!("mobdash: backend unavailable, showing offline data");
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "overview",
                "view": { "id": view.id(), "label": view.label() },
                "endpoint": config.endpoint.url,
                "is_fallback": acquired.is_fallback,
                "source": acquired.source(),
                "failure": acquired.failure,
                "schema": acquired.schema,
                "fetched_at": acquired.fetched_at,
                "elapsed_ms": u64::try_from(acquired.elapsed.as_millis()).unwrap_or(u64::MAX),
                "metrics": session.descriptors(),
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

// ──────────────────── views ────────────────────

fn run_views(cli: &Cli, args: &ViewsArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let mut state = config.view_state()?;
    if let Some(raw) = &args.select {
        state.select(raw)?;
    }

    let rows = view_rows(&state);
    match output_mode(cli) {
        OutputMode::Human => {
            for row in &rows {
                let number = row.number.map_or_else(|| "-".to_string(), |n| n.to_string());
                let marker = if row.active { "*" } else { " " };
                let line = format!("{marker} {number:>2}  {:<20} {}", row.id, row.label);
                if row.active {
                    println!("{}", line.bold());
                } else if row.enabled {
                    println!("{line}");
                } else {
                    println!("{}", format!("{line} (disabled)").dimmed());
                }
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "views",
                "active": state.active().id(),
                "default": config.views.default_view,
                "views": rows,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

// ──────────────────── watch ────────────────────

fn run_watch(cli: &Cli, args: &WatchArgs) -> Result<(), CliError> {
    let (config, log) = load_config(cli, args.endpoint.as_deref())?;
    let refresh_ms = args.refresh_ms.unwrap_or(config.dashboard.refresh_ms);
    if refresh_ms < MIN_REFRESH_MS {
        return Err(CliError::User(format!(
            "--refresh-ms must be >= {MIN_REFRESH_MS}, got {refresh_ms}"
        )));
    }
    if !io::stdout().is_terminal() {
        return Err(CliError::User(
            "watch requires an interactive terminal; use `mobdash overview --json` instead"
                .to_string(),
        ));
    }

    let mut session = open_session(&config, log)?;
    let watch = WatchConfig {
        refresh: Duration::from_millis(refresh_ms),
    };
    dashboard::run(&mut session, &watch)
        .map_err(|e| CliError::Runtime(format!("dashboard: {e}")))
}

// ──────────────────── config ────────────────────

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = Config::load(cli.config.as_deref())?;

            match output_mode(cli) {
                OutputMode::Human => println!("{}", config.to_toml()?),
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config show",
                        "config": serde_json::to_value(&config)?,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let hash = config.stable_hash()?;

                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("Configuration is valid.");
                        println!("  Source: {}", config.paths.config_file.display());
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": true,
                            "path": config.paths.config_file.to_string_lossy(),
                            "hash": hash,
                        });
                        write_json_line(&payload)?;
                    }
                }
                Ok(())
            }
            Err(e) => {
                match output_mode(cli) {
                    OutputMode::Human => {
                        eprintln!("Configuration is INVALID: {e}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": false,
                            "error_code": e.code(),
                            "error": e.to_string(),
                        });
                        write_json_line(&payload)?;
                    }
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

// ──────────────────── version ────────────────────

fn emit_version(cli: &Cli, args: &VersionArgs) -> Result<(), CliError> {
    let version = env!("CARGO_PKG_VERSION");
    let package = env!("CARGO_PKG_NAME");
    let target = option_env!("TARGET").unwrap_or("unknown");
    let profile = option_env!("PROFILE").unwrap_or("unknown");
    let git_sha = option_env!("GIT_SHA").unwrap_or("unknown");

    match output_mode(cli) {
        OutputMode::Human => {
            println!("mobdash {version}");
            if args.verbose {
                println!("package: {package}");
                println!("target: {target}");
                println!("profile: {profile}");
                println!("git_sha: {git_sha}");
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "binary": "mobdash",
                "version": version,
                "package": package,
                "build": {
                    "target": target,
                    "profile": profile,
                    "git_sha": git_sha,
                }
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

// ──────────────────── output helpers ────────────────────

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("MOBDASH_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
