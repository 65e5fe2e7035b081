//! Round-robin hand-out of replica endpoints.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::topology::EndpointSet;

/// Infinite round-robin sequence over an [`EndpointSet`].
///
/// The cursor only moves forward. Each call to [`next_endpoint`] claims one
/// slot atomically, so concurrent callers never receive the same slot; they
/// may still end up talking to the same endpoint.
///
/// [`next_endpoint`]: EndpointRotator::next_endpoint
#[derive(Debug)]
pub struct EndpointRotator {
    endpoints: Arc<EndpointSet>,
    cursor: AtomicUsize,
}

impl EndpointRotator {
    pub fn new(endpoints: Arc<EndpointSet>) -> Self {
        Self {
            endpoints,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn next_endpoint(&self) -> SocketAddr {
        let slot = self.cursor.fetch_add(1, Ordering::Relaxed);
        let addrs = self.endpoints.addrs();
        addrs[slot % addrs.len()]
    }

    /// Lazy view over the shared cursor. Never returns `None`.
    pub fn iter(&self) -> Rotation<'_> {
        Rotation { rotator: self }
    }
}

pub struct Rotation<'a> {
    rotator: &'a EndpointRotator,
}

impl Iterator for Rotation<'_> {
    type Item = SocketAddr;

    fn next(&mut self) -> Option<SocketAddr> {
        Some(self.rotator.next_endpoint())
    }
}
