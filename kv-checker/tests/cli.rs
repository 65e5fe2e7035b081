//! End-to-end runs of the `kv-client` binary.

use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use kv_checker::cluster::Cluster;
use kv_checker::topology::EndpointSet;
use tokio::process::Command;
use tokio::time::timeout;

const RUN_TIMEOUT: Duration = Duration::from_secs(30);

async fn run_client(binary: &Path, endpoints: &str, extra: &[&str]) -> Result<Output> {
    let mut cmd = Command::new(binary);
    cmd.arg("--endpoint")
        .arg(endpoints)
        .arg("--pacing-ms")
        .arg("5")
        .arg("--timeout-ms")
        .arg("500")
        .args(extra)
        .env("RUST_LOG", "warn")
        .env("RUST_LOG_STYLE", "never")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let child = cmd.spawn().context("failed to spawn kv-client")?;
    timeout(RUN_TIMEOUT, child.wait_with_output())
        .await
        .context("kv-client did not finish in time")?
        .context("failed to collect kv-client output")
}

#[tokio::test]
async fn run_against_live_cluster_prints_final_state() -> Result<()> {
    let binary = assert_cmd::cargo::cargo_bin!("kv-client");
    let mut cluster = Cluster::launch(&EndpointSet::localhost(&[0, 0, 0])?).await?;
    let endpoints = cluster
        .addrs()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");

    let output = run_client(&binary, &endpoints, &["--operations", "12", "--seed", "42"]).await?;
    let stdout = String::from_utf8(output.stdout)?;
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.starts_with("12 operations: "), "stdout: {stdout}");
    assert!(stdout.contains("final shadow state ("), "stdout: {stdout}");

    cluster.stop_all();
    timeout(Duration::from_secs(5), cluster.wait()).await??;
    Ok(())
}

#[tokio::test]
async fn unreachable_cluster_exits_with_failure() -> Result<()> {
    let binary = assert_cmd::cargo::cargo_bin!("kv-client");
    let closed = std::net::TcpListener::bind("127.0.0.1:0")?.local_addr()?;

    let output = run_client(&binary, &closed.to_string(), &["--operations", "3"]).await?;
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("server is not responding or fails"), "stderr: {stderr}");
    assert!(stderr.contains("failed after 2 attempts"), "stderr: {stderr}");
    Ok(())
}
