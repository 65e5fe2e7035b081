//! Bounded retry of one operation across rotating endpoints.
//!
//! The loop applies the operation to the shadow model first, then keeps
//! drawing endpoints from the shared rotator until one of them confirms it.
//! Per-attempt failures stay inside the loop; only running out of attempts
//! escapes, as [`CheckerError::RetriesExhausted`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::dispatch::{Dispatcher, Reply, Transport};
use crate::error::{CheckerError, Result};
use crate::operation::{OpKind, Operation};
use crate::rotator::EndpointRotator;
use crate::shadow::ShadowState;
use crate::topology::EndpointSet;

/// Pause before every attempt, including the first.
pub const DEFAULT_PACING: Duration = Duration::from_secs(1);

/// How many attempts an operation gets and how they are spaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub pacing: Duration,
}

impl RetryPolicy {
    /// Two passes over the endpoint set, one second apart.
    pub fn for_endpoints(endpoints: &EndpointSet) -> Self {
        Self {
            attempts: endpoints.attempt_budget(),
            pacing: DEFAULT_PACING,
        }
    }

    #[must_use]
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }
}

/// How a confirmed operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A replica answered 2xx.
    Applied {
        endpoint: SocketAddr,
        attempt: usize,
        status: StatusCode,
    },
    /// A read came back 404: the key is absent, which is a valid answer.
    NotFound { endpoint: SocketAddr, attempt: usize },
}

impl Outcome {
    /// 1-based attempt that produced this outcome.
    pub fn attempt(&self) -> usize {
        match self {
            Outcome::Applied { attempt, .. } | Outcome::NotFound { attempt, .. } => *attempt,
        }
    }

    pub fn endpoint(&self) -> SocketAddr {
        match self {
            Outcome::Applied { endpoint, .. } | Outcome::NotFound { endpoint, .. } => *endpoint,
        }
    }
}

/// Decides whether a reply ends the loop.
///
/// Returns `None` when the next endpoint should be tried.
pub fn classify(
    kind: OpKind,
    reply: &Reply,
    endpoint: SocketAddr,
    attempt: usize,
) -> Option<Outcome> {
    if reply.status.is_success() {
        return Some(Outcome::Applied {
            endpoint,
            attempt,
            status: reply.status,
        });
    }
    if reply.status == StatusCode::NOT_FOUND && kind == OpKind::Read {
        return Some(Outcome::NotFound { endpoint, attempt });
    }
    None
}

/// Submits operations to the cluster with failover.
///
/// The shadow model and rotator are injected so several clients (or a test)
/// can share them.
pub struct Client<T = Dispatcher> {
    transport: T,
    rotator: Arc<EndpointRotator>,
    shadow: Arc<ShadowState>,
    policy: RetryPolicy,
}

impl<T: Transport> Client<T> {
    pub fn new(
        transport: T,
        rotator: Arc<EndpointRotator>,
        shadow: Arc<ShadowState>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            rotator,
            shadow,
            policy,
        }
    }

    pub fn shadow(&self) -> &Arc<ShadowState> {
        &self.shadow
    }

    /// Applies `op` to the shadow model, then delivers it.
    ///
    /// The shadow update is not rolled back if delivery fails.
    pub async fn submit(&self, op: &Operation) -> Result<Outcome> {
        self.shadow.apply(op);
        self.deliver(op).await
    }

    /// Retry loop proper, without touching the shadow model.
    pub async fn deliver(&self, op: &Operation) -> Result<Outcome> {
        for attempt in 1..=self.policy.attempts {
            sleep(self.policy.pacing).await;
            let endpoint = self.rotator.next_endpoint();
            debug!(%endpoint, attempt, op = %op, "sending operation");

            let reply = match self.transport.send(op, endpoint).await {
                Ok(reply) => reply,
                Err(error) => {
                    warn!(%endpoint, attempt, %error, "timeout or transport error");
                    continue;
                }
            };

            info!(%endpoint, attempt, status = reply.status.as_u16(), "response status");
            if let Some(outcome) = classify(op.kind, &reply, endpoint, attempt) {
                return Ok(outcome);
            }
        }

        Err(CheckerError::RetriesExhausted {
            key: op.key.clone(),
            kind: op.kind,
            attempts: self.policy.attempts,
        })
    }
}
