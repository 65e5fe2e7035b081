//! Command-line flags for the `kv-client` and `kv-cluster` binaries.
//!
//! Every default equals the constant the library uses on its own.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use crate::cluster::{ClusterPlan, DEFAULT_STOP_AFTER, DEFAULT_VICTIM};
use crate::dispatch::DEFAULT_TIMEOUT;
use crate::error::Result;
use crate::retry::{RetryPolicy, DEFAULT_PACING};
use crate::runner::DEFAULT_OPERATIONS;
use crate::topology::EndpointSet;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Send random CRUD operations to a replicated KV cluster")]
pub struct ClientArgs {
    /// Replica addresses, tried in this order (comma separated).
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "127.0.0.1:17423,127.0.0.1:17424,127.0.0.1:17425"
    )]
    pub endpoint: Vec<SocketAddr>,

    /// Number of operations to issue.
    #[arg(long, default_value_t = DEFAULT_OPERATIONS)]
    pub operations: usize,

    /// Seed for the workload. Random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Pause before each attempt, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_PACING.as_millis() as u64)]
    pub pacing_ms: u64,

    /// Per-attempt HTTP timeout, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_millis() as u64)]
    pub timeout_ms: u64,
}

impl ClientArgs {
    pub fn endpoints(&self) -> Result<EndpointSet> {
        EndpointSet::new(self.endpoint.clone())
    }

    pub fn retry_policy(&self, endpoints: &EndpointSet) -> RetryPolicy {
        RetryPolicy::for_endpoints(endpoints).with_pacing(Duration::from_millis(self.pacing_ms))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Run a local replica cluster and crash one node mid-run")]
pub struct ClusterArgs {
    /// Localhost ports, one replica each (comma separated).
    #[arg(long, value_delimiter = ',', default_value = "17423,17424,17425")]
    pub port: Vec<u16>,

    /// Index of the replica to stop.
    #[arg(long, default_value_t = DEFAULT_VICTIM)]
    pub victim: usize,

    /// Seconds after start-up before the victim is stopped.
    #[arg(long, default_value_t = DEFAULT_STOP_AFTER.as_secs())]
    pub stop_after_secs: u64,
}

impl ClusterArgs {
    pub fn plan(&self) -> Result<ClusterPlan> {
        Ok(ClusterPlan {
            endpoints: EndpointSet::localhost(&self.port)?,
            victim: self.victim,
            stop_after: Duration::from_secs(self.stop_after_secs),
        })
    }
}
