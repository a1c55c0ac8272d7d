//! Acquisition against a real HTTP server.

use std::time::Duration;

use httpmock::{Method::GET, MockServer};

use mobility_dashboard::acquire::{Acquirer, AcquisitionFailure, HttpTransport};
use mobility_dashboard::metrics::{MetricKey, MetricValues, MetricsSnapshot, derive};

const OVERVIEW_PATH: &str = "/api/dashboard/overview";

fn acquirer_for(server: &MockServer, timeout: Duration) -> Acquirer<HttpTransport> {
    let transport =
        HttpTransport::new(server.url(OVERVIEW_PATH), timeout).expect("build http transport");
    Acquirer::new(transport)
}

#[test]
fn live_body_is_parsed_with_one_request() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path(OVERVIEW_PATH);
        then.status(200)
            .header("content-type", "application/json")
            .body(
                r#"{"data":{
                    "metricas_principais":{"corridas_concluidas":512,"receita_total":18000.25,"motoristas_ativos":33,"avaliacao_media":4.1},
                    "comparacao_anterior":{"corridas_concluidas":-2,"receita_total":6.5,"motoristas_ativos":1,"avaliacao_media":-0.3}
                }}"#,
            );
    });

    let acquired = acquirer_for(&server, Duration::from_secs(2)).acquire();

    mock.assert_hits(1);
    assert!(!acquired.is_fallback);
    assert!(acquired.failure.is_none());
    assert!(!acquired.schema.has_drift());
    assert_eq!(
        acquired.snapshot.current,
        MetricValues::new(512.0, 18000.25, 33.0, 4.1)
    );
    let rating_delta = acquired
        .snapshot
        .previous_comparison
        .get(MetricKey::AverageRating);
    assert!((rating_delta + 0.3).abs() < 1e-9);
}

#[test]
fn server_error_yields_fallback_without_retry() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path(OVERVIEW_PATH);
        then.status(503).body("maintenance");
    });

    let acquired = acquirer_for(&server, Duration::from_secs(2)).acquire();

    mock.assert_hits(1);
    assert!(acquired.is_fallback);
    assert_eq!(acquired.failure, Some(AcquisitionFailure::Status { code: 503 }));
    assert_eq!(acquired.snapshot, MetricsSnapshot::fallback());
}

#[test]
fn malformed_body_yields_fallback() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path(OVERVIEW_PATH);
        then.status(200).body("<html>gateway</html>");
    });

    let acquired = acquirer_for(&server, Duration::from_secs(2)).acquire();

    mock.assert_hits(1);
    assert!(acquired.is_fallback);
    assert!(matches!(
        acquired.failure,
        Some(AcquisitionFailure::Malformed { .. })
    ));
    assert_eq!(acquired.snapshot, MetricsSnapshot::fallback());
}

#[test]
fn body_without_envelope_is_accepted() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(OVERVIEW_PATH);
        then.status(200).body(
            r#"{"metricas_principais":{"corridas_concluidas":7,"receita_total":70,"motoristas_ativos":2,"avaliacao_media":5},
                "comparacao_anterior":{"corridas_concluidas":0,"receita_total":0,"motoristas_ativos":0,"avaliacao_media":0}}"#,
        );
    });

    let acquired = acquirer_for(&server, Duration::from_secs(2)).acquire();

    assert!(!acquired.is_fallback);
    assert_eq!(acquired.snapshot.current.completed_rides, 7.0);
}

#[test]
fn schema_drift_is_reported_but_not_fatal() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(OVERVIEW_PATH);
        then.status(200).body(
            r#"{"data":{
                "metricas_principais":{"corridas_concluidas":40,"receita_total":900,"avaliacao_media":4.0,"cancelamentos":3}
            }}"#,
        );
    });

    let acquired = acquirer_for(&server, Duration::from_secs(2)).acquire();

    assert!(!acquired.is_fallback);
    assert!(acquired.schema.has_drift());
    assert_eq!(
        acquired.schema.unknown_fields,
        vec!["metricas_principais.cancelamentos".to_string()]
    );
    assert!(
        acquired
            .schema
            .missing_fields
            .contains(&"metricas_principais.motoristas_ativos".to_string())
    );
    assert!(
        acquired
            .schema
            .missing_fields
            .contains(&"comparacao_anterior".to_string())
    );
    assert_eq!(acquired.snapshot.current.active_drivers, 0.0);

    let cards = derive(&acquired.snapshot);
    assert_eq!(cards.len(), 4);
    assert!(cards.iter().all(|card| card.trend_up));
}

#[test]
fn unreachable_endpoint_yields_transport_failure() {
    let transport = HttpTransport::new("http://127.0.0.1:9/api", Duration::from_millis(500))
        .expect("build http transport");
    let acquired = Acquirer::new(transport).acquire();

    assert!(acquired.is_fallback);
    let Some(AcquisitionFailure::Transport { details }) = &acquired.failure else {
        panic!("expected transport failure, got {:?}", acquired.failure);
    };
    assert!(!details.is_empty());
    assert!(!details.contains("MDB-"), "raw client error expected: {details}");
    assert_eq!(acquired.source(), "fallback");
}

#[test]
fn each_acquire_issues_a_fresh_request() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path(OVERVIEW_PATH);
        then.status(500);
    });

    let acquirer = acquirer_for(&server, Duration::from_secs(2));
    for _ in 0..3 {
        assert!(acquirer.acquire().is_fallback);
    }
    mock.assert_hits(3);
}
