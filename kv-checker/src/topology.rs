//! The fixed set of replica addresses a run talks to.

use std::net::{Ipv4Addr, SocketAddr};

use crate::error::{CheckerError, Result};

/// Ports of the default three-replica cluster.
pub const DEFAULT_PORTS: [u16; 3] = [17423, 17424, 17425];

/// Fixed, ordered set of replica addresses.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSet {
    endpoints: Vec<SocketAddr>,
}

impl EndpointSet {
    pub fn new(endpoints: Vec<SocketAddr>) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(CheckerError::EmptyTopology);
        }
        Ok(Self { endpoints })
    }

    /// One endpoint per port on the loopback interface.
    pub fn localhost(ports: &[u16]) -> Result<Self> {
        Self::new(
            ports
                .iter()
                .map(|port| SocketAddr::from((Ipv4Addr::LOCALHOST, *port)))
                .collect(),
        )
    }

    pub fn addrs(&self) -> &[SocketAddr] {
        &self.endpoints
    }

    /// Attempts allowed per operation: two full passes over every endpoint.
    pub fn attempt_budget(&self) -> usize {
        2 * self.endpoints.len()
    }
}
