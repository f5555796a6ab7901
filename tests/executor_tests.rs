//! Strategy, handle, timeout, and cancellation properties.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use nimbus::prelude::*;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq)]
struct Machine {
    id: String,
}

/// Transport that never produces a response.
struct NeverTransport;

#[async_trait]
impl Transport for NeverTransport {
    async fn roundtrip(&self, _request: WireRequest) -> Result<WireResponse, ClientError> {
        std::future::pending().await
    }
}

/// Transport answering a canned status and body.
struct CannedTransport {
    status: u16,
    body: &'static str,
}

#[async_trait]
impl Transport for CannedTransport {
    async fn roundtrip(&self, _request: WireRequest) -> Result<WireResponse, ClientError> {
        Ok(WireResponse {
            status: self.status,
            headers: reqwest::header::HeaderMap::new(),
            body: Bytes::from(self.body),
        })
    }
}

fn list_machines() -> Operation<Vec<Machine>> {
    Operation::json(OperationDescriptor::new(
        "ListMachines",
        Method::GET,
        "/my/machines",
    ))
}

fn context_with_transport(transport: Arc<dyn Transport>) -> ClientContext {
    ClientConfig::new("https://api.example.invalid")
        .with_strategy(StrategyConfig::pooled_with_workers(2).with_shutdown_grace(Duration::ZERO))
        .with_transport(transport)
        .build()
        .expect("context")
}

#[test]
fn synchronous_timeout_fires_in_its_window() {
    let context = context_with_transport(Arc::new(NeverTransport));
    let operation = Operation::<Vec<Machine>>::json(
        OperationDescriptor::new("ListMachines", Method::GET, "/my/machines")
            .with_timeout(Duration::from_secs(2)),
    );

    let started = Instant::now();
    let err = context.call(&operation, &Args::new()).unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, ClientError::Timeout(_)), "got {err:?}");
    assert!(elapsed >= Duration::from_secs(2), "fired early: {elapsed:?}");
    assert!(
        elapsed < Duration::from_secs(3),
        "fired too late: {elapsed:?}"
    );
    context.shutdown();
}

#[test]
fn timed_out_wait_leaves_the_handle_usable() {
    let context = context_with_transport(Arc::new(NeverTransport));
    let handle = context.submit(&list_machines(), &Args::new()).unwrap();

    let err = handle.wait(Duration::from_millis(50)).unwrap_err();
    assert!(matches!(err, ClientError::Timeout(_)));
    // Still unresolved; the work is merely slower than the caller's patience.
    assert!(!handle.is_resolved());
    context.shutdown();
}

#[test]
fn cancellation_resolves_the_handle() {
    let context = context_with_transport(Arc::new(NeverTransport));
    let handle = context.submit(&list_machines(), &Args::new()).unwrap();

    handle.cancel();
    let err = handle.wait(Duration::from_secs(1)).unwrap_err();
    assert!(matches!(err, ClientError::Cancelled));
    context.shutdown();
}

#[test]
fn resolved_handles_answer_identically_every_time() {
    let context = context_with_transport(Arc::new(CannedTransport {
        status: 200,
        body: r#"[{"id":"m-1"}]"#,
    }));
    let handle = context.submit(&list_machines(), &Args::new()).unwrap();

    let first = handle.wait(Duration::from_secs(5)).unwrap();
    let second = handle.wait(Duration::from_secs(5)).unwrap();
    assert_eq!(first, second);
    context.shutdown();
}

#[test]
fn resolved_error_is_idempotent_too() {
    let context = context_with_transport(Arc::new(CannedTransport {
        status: 500,
        body: "boom",
    }));
    let handle = context.submit(&list_machines(), &Args::new()).unwrap();

    let first = handle.wait(Duration::from_secs(5)).unwrap_err();
    let second = handle.wait(Duration::from_secs(5)).unwrap_err();
    assert_eq!(first.status_code(), Some(500));
    assert_eq!(second.status_code(), Some(500));
    context.shutdown();
}

#[test]
fn continuation_runs_without_blocking_the_attaching_thread() {
    let context = context_with_transport(Arc::new(CannedTransport {
        status: 200,
        body: r#"[{"id":"m-1"}]"#,
    }));
    let handle = context.submit(&list_machines(), &Args::new()).unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    handle.on_ready(move |outcome| {
        tx.send(outcome.map(|machines| machines.len())).unwrap();
    });

    let count = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("continuation ran")
        .unwrap();
    assert_eq!(count, 1);
    context.shutdown();
}

#[test]
fn submissions_after_shutdown_fail_fast() {
    let context = context_with_transport(Arc::new(CannedTransport {
        status: 200,
        body: "[]",
    }));
    context.shutdown();

    let handle = context.submit(&list_machines(), &Args::new()).unwrap();
    let err = handle.wait(Duration::from_millis(100)).unwrap_err();
    assert!(matches!(err, ClientError::Configuration(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pooled_handles_are_independent_futures() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/my/machines"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"[{"id":"m-1"}]"#, "application/json"),
        )
        .mount(&server)
        .await;

    let context = ClientConfig::new(server.uri())
        .with_strategy(StrategyConfig::pooled_with_workers(2).with_shutdown_grace(Duration::ZERO))
        .build()
        .unwrap();

    let first = context.submit(&list_machines(), &Args::new()).unwrap();
    let second = context.submit(&list_machines(), &Args::new()).unwrap();

    // ResultHandle implements Future; neither await blocks the other.
    let (a, b) = futures::join!(first, second);
    assert_eq!(a.unwrap(), b.unwrap());
    context.shutdown();
}
