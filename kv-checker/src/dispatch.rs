//! Single-attempt delivery of an operation to one replica.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use reqwest::{Client as HttpClient, StatusCode};

use crate::error::Result;
use crate::operation::{OpKind, Operation};

/// Path every replica serves operations on.
pub const APPLY_PATH: &str = "/apply";

/// Per-attempt deadline covering connect, send and response.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Raw status and body returned by a replica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends one operation to one endpoint, exactly once.
///
/// An `Err` means no status came back at all; the retry loop treats every
/// such error as "endpoint unreachable".
pub trait Transport: Send + Sync {
    fn send(
        &self,
        op: &Operation,
        endpoint: SocketAddr,
    ) -> impl Future<Output = Result<Reply>> + Send;
}

/// HTTP transport speaking the `/apply` JSON contract.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    http: HttpClient,
}

impl Dispatcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        // Replicas live on localhost; never route them through a proxy.
        let http = HttpClient::builder().timeout(timeout).no_proxy().build()?;
        Ok(Self { http })
    }

    fn url(endpoint: SocketAddr) -> String {
        format!("http://{endpoint}{APPLY_PATH}")
    }
}

impl Transport for Dispatcher {
    async fn send(&self, op: &Operation, endpoint: SocketAddr) -> Result<Reply> {
        let url = Self::url(endpoint);
        // Reads go out as GET with a JSON body; replicas expect it that way.
        let request = match op.kind {
            OpKind::Read => self.http.get(&url),
            _ => self.http.post(&url),
        };

        let response = request.json(op).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(Reply { status, body })
    }
}
