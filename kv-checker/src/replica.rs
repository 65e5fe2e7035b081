//! Stand-in replica serving the `/apply` contract.
//!
//! Each instance keeps its own in-memory map and does not talk to its peers;
//! it exists so the orchestrator has real processes to start and kill and so
//! the client can be exercised against live HTTP endpoints. A consensus-backed
//! replica speaking the same contract can replace it without client changes.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::dispatch::APPLY_PATH;
use crate::error::Result;
use crate::operation::{OpKind, Operation};

/// Body returned for a successful read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// Shared map behind a replica's handlers.
#[derive(Debug, Clone, Default)]
pub struct ReplicaState {
    data: Arc<Mutex<BTreeMap<String, String>>>,
}

impl ReplicaState {
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Router serving `GET`/`POST /apply` against `state`.
pub fn router(state: ReplicaState) -> Router {
    Router::new()
        .route(APPLY_PATH, get(apply).post(apply))
        .with_state(state)
}

async fn apply(
    State(state): State<ReplicaState>,
    method: Method,
    Json(op): Json<Operation>,
) -> Response {
    // Reads travel as GET, everything else as POST.
    let expected = if op.kind == OpKind::Read {
        Method::GET
    } else {
        Method::POST
    };
    if method != expected {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            format!("{} must be sent with {expected}", op.kind),
        )
            .into_response();
    }

    if op.kind.carries_value() != op.value.is_some() {
        let rule = if op.kind.carries_value() {
            "requires a value"
        } else {
            "takes no value"
        };
        return (StatusCode::BAD_REQUEST, format!("{} {rule}", op.kind)).into_response();
    }

    match op.kind {
        OpKind::Read => match state.lock().get(&op.key) {
            Some(value) => Json(Entry {
                key: op.key.clone(),
                value: value.clone(),
            })
            .into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        },
        OpKind::Create | OpKind::Update => {
            if let Some(value) = op.value {
                state.lock().insert(op.key, value);
            }
            StatusCode::OK.into_response()
        }
        OpKind::Delete => {
            state.lock().remove(&op.key);
            StatusCode::OK.into_response()
        }
    }
}

/// A bound but not yet serving replica.
pub struct Replica {
    id: usize,
    addr: SocketAddr,
    listener: TcpListener,
    peers: Vec<SocketAddr>,
    state: ReplicaState,
}

impl Replica {
    pub async fn bind(id: usize, addr: SocketAddr, peers: Vec<SocketAddr>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        Ok(Self {
            id,
            addr,
            listener,
            peers,
            state: ReplicaState::default(),
        })
    }

    /// Starts serving on a task registered with `tasks`.
    ///
    /// The task yields the replica id once the server has shut down.
    pub fn start(self, tasks: &mut JoinSet<Result<usize>>) -> ReplicaHandle {
        let (shutdown, stopped) = watch::channel(false);
        let handle = ReplicaHandle {
            id: self.id,
            addr: self.addr,
            state: self.state.clone(),
            shutdown: Arc::new(shutdown),
        };
        tasks.spawn(self.serve(stopped));
        handle
    }

    async fn serve(self, mut stopped: watch::Receiver<bool>) -> Result<usize> {
        let Replica {
            id,
            addr,
            listener,
            peers,
            state,
        } = self;
        info!(id, %addr, ?peers, "replica serving");

        let app = router(state).layer(TraceLayer::new_for_http());
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                if stopped.wait_for(|stop| *stop).await.is_err() {
                    warn!(id, "replica handle dropped, shutting down");
                }
            })
            .await?;

        info!(id, %addr, "replica stopped");
        Ok(id)
    }
}

/// Control handle for a running replica.
#[derive(Debug, Clone)]
pub struct ReplicaHandle {
    id: usize,
    addr: SocketAddr,
    state: ReplicaState,
    shutdown: Arc<watch::Sender<bool>>,
}

impl ReplicaHandle {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Current contents of the replica's map.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.state.snapshot()
    }

    /// Begins graceful shutdown of this replica only.
    pub fn stop(&self) {
        if !self.shutdown.send_replace(true) {
            info!(id = self.id, addr = %self.addr, "stopping replica");
        }
    }

    pub fn is_stopped(&self) -> bool {
        *self.shutdown.borrow()
    }
}
