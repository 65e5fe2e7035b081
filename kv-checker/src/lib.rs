//! Randomized correctness checker for a replicated key-value service.
//!
//! The client generates CRUD operations, records each one in a local shadow
//! model, and pushes it to a set of HTTP replicas with round-robin failover.
//! A companion orchestrator runs a local replica cluster and stops one node
//! partway through so the client has a failure to ride out.
//!
//! # Modules
//!
//! - [`operation`]: the CRUD operation and its `/apply` JSON form
//! - [`workload`]: random operation generator over a ten-key space
//! - [`shadow`]: expected store contents, updated before each send
//! - [`topology`]: the fixed, ordered set of replica endpoints
//! - [`rotator`]: shared round-robin cursor over that set
//! - [`dispatch`]: one HTTP attempt against one endpoint
//! - [`retry`]: bounded retry loop across rotating endpoints
//! - [`runner`]: sequential run of N operations with a final report
//! - [`replica`]: in-memory stand-in replica serving `/apply`
//! - [`cluster`]: launches replicas and schedules a simulated crash
//! - [`cli`]: command-line configuration for both binaries
//! - [`error`]: error taxonomy

pub mod cli;
pub mod cluster;
pub mod dispatch;
pub mod error;
pub mod operation;
pub mod replica;
pub mod retry;
pub mod rotator;
pub mod runner;
pub mod shadow;
pub mod topology;
pub mod workload;

/// Installs the `tracing` subscriber used by both binaries.
///
/// Defaults to `info`; `RUST_LOG` overrides it. Logs go to stderr so stdout
/// carries only the run report.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
