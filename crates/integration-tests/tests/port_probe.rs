//! Reachability probe against real sockets

use pkgagent_infra_system::{PortProbe, ProbeOutcome, DEFAULT_PROBE_TIMEOUT};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

#[tokio::test]
async fn test_listener_reports_ok_on_uri_port() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let accept = tokio::spawn(async move { listener.accept().await.map(|_| ()) });

    let outcome = PortProbe::default()
        .check(&format!("http://127.0.0.1:{}/jmx", port), 50070)
        .await;

    assert!(outcome.is_ok(), "{}", outcome);
    match outcome {
        ProbeOutcome::Ok { elapsed, port: p } => {
            assert!(elapsed >= 0.0);
            assert!(elapsed < DEFAULT_PROBE_TIMEOUT.as_secs_f64());
            assert_eq!(p, port);
        }
        ProbeOutcome::Critical { .. } => unreachable!(),
    }
    accept.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_default_port_and_fallback_host() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let outcome = PortProbe::new("127.0.0.1", DEFAULT_PROBE_TIMEOUT)
        .check("", port)
        .await;

    match outcome {
        ProbeOutcome::Ok { port: p, .. } => assert_eq!(p, port),
        other => panic!("expected OK, got {}", other),
    }
}

#[tokio::test]
async fn test_closed_port_reports_critical_quickly() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let started = Instant::now();
    let outcome = PortProbe::default()
        .check(&format!("127.0.0.1:{}", port), 1)
        .await;

    assert!(started.elapsed() <= DEFAULT_PROBE_TIMEOUT + Duration::from_millis(500));
    match outcome {
        ProbeOutcome::Critical { error, host, port: p } => {
            assert_eq!(host, "127.0.0.1");
            assert_eq!(p, port);
            assert!(!error.is_empty());
        }
        ProbeOutcome::Ok { .. } => panic!("closed port reported OK"),
    }
}
