//! End-to-end tests driving the `mobdash` binary.

mod common;

use httpmock::{Method::GET, MockServer};

const LIVE_BODY: &str = r#"{"data":{
    "metricas_principais":{"corridas_concluidas":2031,"receita_total":78950.4,"motoristas_ativos":112,"avaliacao_media":4.82},
    "comparacao_anterior":{"corridas_concluidas":-4.2,"receita_total":2.5,"motoristas_ativos":0,"avaliacao_media":0.1}
}}"#;

#[test]
fn views_lists_every_view_with_overview_active() {
    let home = tempfile::tempdir().expect("home");
    let result = common::run_cli_case("views_list", home.path(), &["views", "--json"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());

    let json = result.json();
    assert_eq!(json["command"], "views");
    assert_eq!(json["active"], "overview");
    let views = json["views"].as_array().expect("views array");
    assert_eq!(views.len(), 11);
    assert_eq!(views[0]["id"], "overview");
    assert_eq!(views[0]["number"], 1);
    assert_eq!(views[9]["id"], "temporal-comparison");
}

#[test]
fn views_select_accepts_legacy_alias() {
    let home = tempfile::tempdir().expect("home");
    let result = common::run_cli_case(
        "views_select_alias",
        home.path(),
        &["views", "--select", "alertas"],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert_eq!(result.json()["active"], "alerts");
}

#[test]
fn views_select_unknown_is_a_user_error() {
    let home = tempfile::tempdir().expect("home");
    let result = common::run_cli_case(
        "views_select_bogus",
        home.path(),
        &["views", "--select", "bogus-id"],
    );
    assert_eq!(result.status.code(), Some(1));
    assert!(result.stderr.contains("MDB-2001"), "stderr: {}", result.stderr);
    assert!(result.stdout.trim().is_empty());
}

#[test]
fn overview_falls_back_when_backend_errors() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/dashboard/overview");
        then.status(500).body("internal error");
    });
    let home = tempfile::tempdir().expect("home");
    let url = server.url("/api/dashboard/overview");

    let result = common::run_cli_case(
        "overview_fallback",
        home.path(),
        &["overview", "--json", "--endpoint", &url],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    mock.assert_hits(1);

    let json = result.json();
    assert_eq!(json["is_fallback"], true);
    assert_eq!(json["source"], "fallback");
    assert_eq!(json["failure"]["kind"], "status");
    assert_eq!(json["failure"]["code"], 500);
    let metrics = json["metrics"].as_array().expect("metrics");
    assert_eq!(metrics.len(), 4);
    assert_eq!(metrics[0]["display_value"], "1.247");
    assert_eq!(metrics[1]["display_value"], "R$ 45.200,00");
    assert_eq!(metrics[3]["display_value"], "4.7");
    assert!(metrics.iter().all(|m| m["trend_up"] == true));
}

#[test]
fn overview_renders_live_metrics_and_logs_activity() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/metrics");
        then.status(200)
            .header("content-type", "application/json")
            .body(LIVE_BODY);
    });
    let home = tempfile::tempdir().expect("home");
    let log_path = home.path().join("activity.jsonl");
    let url = server.url("/metrics");

    let result = common::run_cli_case_with_env(
        "overview_live",
        home.path(),
        &["overview", "--view", "corridas"],
        &[
            ("MOBDASH_ENDPOINT_URL", url.as_str()),
            ("MOBDASH_FORMAT_LOCALE", "en-US"),
            ("MOBDASH_FORMAT_CURRENCY_SYMBOL", "$"),
            ("MOBDASH_ACTIVITY_LOG", log_path.to_str().expect("utf-8 path")),
        ],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    mock.assert_hits(1);

    let json = result.json();
    assert_eq!(json["is_fallback"], false);
    assert_eq!(json["view"]["id"], "rides");
    let metrics = json["metrics"].as_array().expect("metrics");
    assert_eq!(metrics[0]["display_value"], "2,031");
    assert_eq!(metrics[1]["display_value"], "$78,950.40");
    assert_eq!(metrics[3]["display_value"], "4.8");
    assert_eq!(metrics[0]["trend_up"], false);
    assert_eq!(metrics[2]["trend_up"], true);

    let log = std::fs::read_to_string(&log_path).expect("activity log");
    let events: Vec<String> = log
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).expect("json line");
            value["event"].as_str().expect("event").to_string()
        })
        .collect();
    assert_eq!(events.first().map(String::as_str), Some("config_loaded"));
    assert!(events.contains(&"refresh_complete".to_string()));
    assert!(events.contains(&"view_selected".to_string()));
    assert!(!events.contains(&"fallback_engaged".to_string()));
    assert_eq!(events.last().map(String::as_str), Some("session_end"));
}

#[test]
fn overview_with_unknown_view_exits_with_user_error() {
    let home = tempfile::tempdir().expect("home");
    let result = common::run_cli_case_with_env(
        "overview_bad_view",
        home.path(),
        &["overview", "--view", "bogus-id"],
        &[("MOBDASH_LOGGING_ENABLED", "false")],
    );
    assert_eq!(result.status.code(), Some(1));
    assert!(result.stderr.contains("bogus-id"));
}

#[test]
fn overview_rejects_invalid_endpoint_flag() {
    let home = tempfile::tempdir().expect("home");
    let result = common::run_cli_case(
        "overview_bad_endpoint",
        home.path(),
        &["overview", "--endpoint", "localhost:5000"],
    );
    assert_eq!(result.status.code(), Some(1));
    assert!(result.stderr.contains("MDB-1001"));
}

#[test]
fn watch_requires_a_terminal() {
    let home = tempfile::tempdir().expect("home");
    let result = common::run_cli_case_with_env(
        "watch_no_tty",
        home.path(),
        &["watch"],
        &[("MOBDASH_LOGGING_ENABLED", "false")],
    );
    assert_eq!(result.status.code(), Some(1));
    assert!(result.stderr.contains("interactive terminal"));
}

#[test]
fn watch_rejects_too_fast_refresh() {
    let home = tempfile::tempdir().expect("home");
    let result = common::run_cli_case_with_env(
        "watch_fast",
        home.path(),
        &["watch", "--refresh-ms", "10"],
        &[("MOBDASH_LOGGING_ENABLED", "false")],
    );
    assert_eq!(result.status.code(), Some(1));
    assert!(result.stderr.contains("--refresh-ms"));
}

#[test]
fn config_validate_reports_hash_for_defaults() {
    let home = tempfile::tempdir().expect("home");
    let result = common::run_cli_case("config_validate", home.path(), &["config", "validate"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let json = result.json();
    assert_eq!(json["valid"], true);
    assert_eq!(json["hash"].as_str().map(str::len), Some(16));
}

#[test]
fn config_validate_rejects_bad_file() {
    let home = tempfile::tempdir().expect("home");
    let config_path = home.path().join("bad.toml");
    std::fs::write(&config_path, "[dashboard]\nrefresh_ms = 10\n").expect("write config");

    let result = common::run_cli_case(
        "config_validate_bad",
        home.path(),
        &[
            "--config",
            config_path.to_str().expect("utf-8 path"),
            "config",
            "validate",
        ],
    );
    assert_eq!(result.status.code(), Some(1));
    let json = result.json();
    assert_eq!(json["valid"], false);
    assert_eq!(json["error_code"], "MDB-1001");
}

#[test]
fn missing_explicit_config_is_a_user_error() {
    let home = tempfile::tempdir().expect("home");
    let result = common::run_cli_case(
        "config_missing",
        home.path(),
        &["--config", "/nonexistent/mobdash.toml", "config", "show"],
    );
    assert_eq!(result.status.code(), Some(1));
    assert!(result.stderr.contains("MDB-1002"));
}

#[test]
fn config_path_points_into_home() {
    let home = tempfile::tempdir().expect("home");
    let result = common::run_cli_case("config_path", home.path(), &["config", "path"]);
    assert!(result.status.success());
    let json = result.json();
    assert_eq!(json["exists"], false);
    assert!(
        json["path"]
            .as_str()
            .expect("path")
            .ends_with(".config/mobdash/config.toml")
    );
}

#[test]
fn version_reports_binary_name() {
    let home = tempfile::tempdir().expect("home");
    let result = common::run_cli_case("version", home.path(), &["version", "--json"]);
    assert!(result.status.success());
    let json = result.json();
    assert_eq!(json["binary"], "mobdash");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn completions_are_generated() {
    let home = tempfile::tempdir().expect("home");
    let result = common::run_cli_case("completions_bash", home.path(), &["completions", "bash"]);
    assert!(result.status.success());
    assert!(result.stdout.contains("mobdash"));
}
