//! Drives a fixed number of random operations end to end.

use std::collections::BTreeMap;

use rand::Rng;
use tracing::info;

use crate::dispatch::Transport;
use crate::error::Result;
use crate::retry::{Client, Outcome};
use crate::workload::Workload;

/// Operations issued by a default run.
pub const DEFAULT_OPERATIONS: usize = 30;

/// Summary of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub operations: usize,
    /// Operations a replica answered 2xx.
    pub applied: usize,
    /// Reads answered 404.
    pub not_found: usize,
    /// Attempts spent across all operations.
    pub attempts: usize,
    /// Shadow model after the last operation.
    pub final_state: BTreeMap<String, String>,
}

/// Generates, shadows and delivers operations one at a time.
pub struct Runner<T, R> {
    client: Client<T>,
    workload: Workload<R>,
    operations: usize,
}

impl<T: Transport, R: Rng> Runner<T, R> {
    pub fn new(client: Client<T>, workload: Workload<R>, operations: usize) -> Self {
        Self {
            client,
            workload,
            operations,
        }
    }

    /// Runs every operation to completion before starting the next.
    ///
    /// Stops at the first operation no replica would confirm and returns
    /// that error.
    pub async fn run(mut self) -> Result<RunReport> {
        let mut report = RunReport::default();

        for index in 0..self.operations {
            let op = self.workload.next_operation();
            info!(index, op = %op, "submitting operation");

            let outcome = self.client.submit(&op).await?;
            report.operations += 1;
            report.attempts += outcome.attempt();
            match outcome {
                Outcome::Applied { .. } => report.applied += 1,
                Outcome::NotFound { .. } => report.not_found += 1,
            }
        }

        report.final_state = self.client.shadow().snapshot();
        Ok(report)
    }
}
