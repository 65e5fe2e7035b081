//! Issues random CRUD operations against a replica cluster and prints the
//! expected final store contents.
//!
//! Start a cluster first (`cargo run --bin kv-cluster`), then:
//! ```bash
//! cargo run --bin kv-client -- --operations 30
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use kv_checker::cli::ClientArgs;
use kv_checker::dispatch::Dispatcher;
use kv_checker::retry::Client;
use kv_checker::rotator::EndpointRotator;
use kv_checker::runner::{RunReport, Runner};
use kv_checker::shadow::ShadowState;
use kv_checker::workload::Workload;

#[tokio::main]
async fn main() -> Result<()> {
    kv_checker::init_tracing();

    let args = ClientArgs::parse();
    let endpoints = Arc::new(args.endpoints()?);
    let policy = args.retry_policy(&endpoints);
    let dispatcher =
        Dispatcher::with_timeout(args.timeout()).context("failed to build HTTP client")?;

    let workload = match args.seed {
        Some(seed) => Workload::seeded(seed),
        None => Workload::from_entropy(),
    };

    info!(
        endpoints = ?endpoints.addrs(),
        operations = args.operations,
        attempts = policy.attempts,
        "starting run"
    );

    let client = Client::new(
        dispatcher,
        Arc::new(EndpointRotator::new(Arc::clone(&endpoints))),
        Arc::new(ShadowState::new()),
        policy,
    );

    match Runner::new(client, workload, args.operations).run().await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "run aborted");
            Err(err).context("server is not responding or fails")
        }
    }
}

fn print_report(report: &RunReport) {
    println!(
        "{} operations: {} applied, {} not found, {} attempts",
        report.operations, report.applied, report.not_found, report.attempts
    );
    println!("final shadow state ({} keys):", report.final_state.len());
    for (key, value) in &report.final_state {
        println!("  {key} = {value}");
    }
}
