//! Local replica cluster with scripted failure injection.
//!
//! [`Cluster::launch`] starts one replica per endpoint, each told about the
//! whole set. [`Cluster::schedule_stop`] arms a timer that stops a single
//! replica later on, which is how a node crash is simulated mid-run.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::select;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{CheckerError, Result};
use crate::replica::{Replica, ReplicaHandle};
use crate::topology::EndpointSet;

/// Index of the replica stopped by default.
pub const DEFAULT_VICTIM: usize = 2;

/// Delay between start-up and the simulated crash.
pub const DEFAULT_STOP_AFTER: Duration = Duration::from_secs(5);

/// What to start and which replica to kill when.
#[derive(Debug, Clone)]
pub struct ClusterPlan {
    pub endpoints: EndpointSet,
    pub victim: usize,
    pub stop_after: Duration,
}

impl ClusterPlan {
    pub fn new(endpoints: EndpointSet) -> Self {
        Self {
            endpoints,
            victim: DEFAULT_VICTIM,
            stop_after: DEFAULT_STOP_AFTER,
        }
    }
}

/// Running replicas plus the tasks serving them.
pub struct Cluster {
    replicas: Vec<ReplicaHandle>,
    tasks: JoinSet<Result<usize>>,
}

impl Cluster {
    /// Binds every endpoint, then starts all replicas concurrently.
    ///
    /// Nothing is served if any bind fails.
    pub async fn launch(endpoints: &EndpointSet) -> Result<Self> {
        let peers = endpoints.addrs().to_vec();
        let mut bound = Vec::with_capacity(peers.len());
        for (id, addr) in peers.iter().enumerate() {
            bound.push(Replica::bind(id, *addr, peers.clone()).await?);
        }

        let mut tasks = JoinSet::new();
        let replicas = bound
            .into_iter()
            .map(|replica| replica.start(&mut tasks))
            .collect();
        Ok(Self { replicas, tasks })
    }

    pub fn replicas(&self) -> &[ReplicaHandle] {
        &self.replicas
    }

    /// Actual listening addresses, in endpoint order.
    pub fn addrs(&self) -> Vec<SocketAddr> {
        self.replicas.iter().map(ReplicaHandle::addr).collect()
    }

    /// Stops replica `index` once `delay` has elapsed.
    pub fn schedule_stop(&self, index: usize, delay: Duration) -> Result<ScheduledStop> {
        let replica = self
            .replicas
            .get(index)
            .cloned()
            .ok_or(CheckerError::ReplicaIndex {
                index,
                len: self.replicas.len(),
            })?;
        Ok(ScheduledStop::spawn(replica, delay))
    }

    pub fn stop_all(&self) {
        for replica in &self.replicas {
            replica.stop();
        }
    }

    /// Waits until every replica task has finished.
    ///
    /// Keeps draining after a failure and reports the first one.
    pub async fn wait(&mut self) -> Result<()> {
        let mut first_error = None;
        while let Some(joined) = self.tasks.join_next().await {
            match joined.map_err(CheckerError::from).and_then(|served| served) {
                Ok(id) => info!(id, "replica terminated"),
                Err(error) => {
                    warn!(%error, "replica terminated with error");
                    first_error.get_or_insert(error);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Launches the plan and blocks until all replicas are gone.
    ///
    /// When `shutdown` resolves first, every remaining replica is stopped.
    pub async fn run_until<F>(plan: ClusterPlan, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut cluster = Cluster::launch(&plan.endpoints).await?;
        info!(replicas = ?cluster.addrs(), "cluster started");
        let scheduled = cluster.schedule_stop(plan.victim, plan.stop_after)?;
        tokio::pin!(shutdown);

        let finished = select! {
            result = cluster.wait() => Some(result),
            _ = &mut shutdown => None,
        };
        scheduled.cancel();

        match finished {
            Some(result) => result,
            None => {
                info!("shutdown requested, stopping all replicas");
                cluster.stop_all();
                cluster.wait().await
            }
        }
    }
}

/// Owned, cancellable delayed stop of one replica.
#[derive(Debug)]
pub struct ScheduledStop {
    handle: JoinHandle<SocketAddr>,
}

impl ScheduledStop {
    fn spawn(replica: ReplicaHandle, delay: Duration) -> Self {
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            warn!(
                id = replica.id(),
                addr = %replica.addr(),
                "stopping replica to simulate a crash"
            );
            replica.stop();
            replica.addr()
        });
        Self { handle }
    }

    /// Disarms the timer. No effect once it has fired.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Address of the stopped replica, or `None` if cancelled first.
    pub async fn fired(self) -> Option<SocketAddr> {
        self.handle.await.ok()
    }
}
