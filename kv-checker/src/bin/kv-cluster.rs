//! Runs a local replica cluster and stops one replica after a delay.
//!
//! ```bash
//! cargo run --bin kv-cluster -- --port 17423,17424,17425 --victim 2 --stop-after-secs 5
//! ```
//!
//! Ctrl-C stops every remaining replica.

use anyhow::Result;
use clap::Parser;
use tracing::warn;

use kv_checker::cli::ClusterArgs;
use kv_checker::cluster::Cluster;

#[tokio::main]
async fn main() -> Result<()> {
    kv_checker::init_tracing();

    let args = ClusterArgs::parse();
    let plan = args.plan()?;

    Cluster::run_until(plan, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = ?err, "failed to install ctrl-c handler");
        }
    })
    .await?;

    Ok(())
}
