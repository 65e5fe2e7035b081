//! Retry loop against live HTTP endpoints.
//!
//! Endpoints are a mix of closed ports, stub servers with fixed or scripted
//! answers, and real stand-in replicas.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::http::StatusCode;
use axum::routing::any;
use axum::Router;
use kv_checker::dispatch::{Dispatcher, Transport};
use kv_checker::error::CheckerError;
use kv_checker::operation::Operation;
use kv_checker::replica::Replica;
use kv_checker::retry::{Client, Outcome, RetryPolicy};
use kv_checker::rotator::EndpointRotator;
use kv_checker::shadow::ShadowState;
use kv_checker::topology::EndpointSet;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

const PACING: Duration = Duration::from_millis(10);

/// Address with nothing listening on it.
fn closed_port() -> Result<SocketAddr> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?)
}

async fn serve(app: Router) -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(addr)
}

/// Answers every request with `status`.
async fn fixed_stub(status: StatusCode) -> Result<SocketAddr> {
    serve(Router::new().route("/apply", any(move || async move { status }))).await
}

/// Fails with 503 until the `succeed_on`-th request, then answers 200.
async fn flaky_stub(succeed_on: usize) -> Result<(SocketAddr, Arc<AtomicUsize>)> {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let app = Router::new().route(
        "/apply",
        any(move || {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) + 1 >= succeed_on {
                    StatusCode::OK
                } else {
                    StatusCode::SERVICE_UNAVAILABLE
                }
            }
        }),
    );
    Ok((serve(app).await?, hits))
}

fn client(endpoints: Vec<SocketAddr>) -> Result<Client<Dispatcher>> {
    let endpoints = Arc::new(EndpointSet::new(endpoints)?);
    let policy = RetryPolicy::for_endpoints(&endpoints).with_pacing(PACING);
    Ok(Client::new(
        Dispatcher::with_timeout(Duration::from_secs(1))?,
        Arc::new(EndpointRotator::new(endpoints)),
        Arc::new(ShadowState::new()),
        policy,
    ))
}

#[tokio::test]
async fn create_reaches_third_endpoint() -> Result<()> {
    let mut tasks = JoinSet::new();
    let down = closed_port()?;
    let broken = fixed_stub(StatusCode::INTERNAL_SERVER_ERROR).await?;
    let replica = Replica::bind(2, "127.0.0.1:0".parse()?, Vec::new()).await?;
    let healthy = replica.start(&mut tasks);

    let client = client(vec![down, broken, healthy.addr()])?;
    let outcome = client.submit(&Operation::create("4", "xyz")).await?;

    assert!(outcome.attempt() <= 3);
    assert_eq!(outcome.endpoint(), healthy.addr());
    assert!(matches!(outcome, Outcome::Applied { status, .. } if status == StatusCode::OK));
    assert_eq!(client.shadow().get("4").as_deref(), Some("xyz"));
    assert_eq!(healthy.snapshot().get("4").map(String::as_str), Some("xyz"));

    healthy.stop();
    Ok(())
}

#[tokio::test]
async fn kth_attempt_success_over_http() -> Result<()> {
    let (stub, hits) = flaky_stub(4).await?;
    let client = client(vec![stub, stub])?;

    let outcome = client.submit(&Operation::update("1", "abc")).await?;
    assert_eq!(outcome.attempt(), 4);
    assert_eq!(hits.load(Ordering::SeqCst), 4);
    Ok(())
}

#[tokio::test]
async fn budget_exhaustion_over_http() -> Result<()> {
    let (stub, hits) = flaky_stub(5).await?;
    let client = client(vec![stub, closed_port()?])?;

    // Budget is 4; the stub only sees every other attempt.
    let err = client
        .submit(&Operation::delete("1"))
        .await
        .expect_err("run should abort");
    assert!(matches!(err, CheckerError::RetriesExhausted { attempts: 4, .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn read_of_missing_key_ends_after_one_attempt() -> Result<()> {
    let mut tasks = JoinSet::new();
    let replica = Replica::bind(0, "127.0.0.1:0".parse()?, Vec::new()).await?;
    let handle = replica.start(&mut tasks);
    let (flaky, hits) = flaky_stub(1).await?;

    let client = client(vec![handle.addr(), flaky])?;
    let outcome = client.submit(&Operation::read("7")).await?;

    assert!(matches!(outcome, Outcome::NotFound { attempt: 1, .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    handle.stop();
    Ok(())
}

#[tokio::test]
async fn dispatcher_reports_raw_status_and_body() -> Result<()> {
    let mut tasks = JoinSet::new();
    let replica = Replica::bind(0, "127.0.0.1:0".parse()?, Vec::new()).await?;
    let handle = replica.start(&mut tasks);
    let dispatcher = Dispatcher::new()?;

    let created = dispatcher.send(&Operation::create("5", "Abc"), handle.addr()).await?;
    assert_eq!(created.status, StatusCode::OK);

    let read = dispatcher.send(&Operation::read("5"), handle.addr()).await?;
    assert_eq!(read.status, StatusCode::OK);
    assert_eq!(read.body, r#"{"Key":"5","Value":"Abc"}"#);

    handle.stop();
    Ok(())
}
