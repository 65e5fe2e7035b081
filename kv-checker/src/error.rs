//! Error types for the checker.

use thiserror::Error;

use crate::operation::OpKind;

/// Errors surfaced by the checker library.
#[derive(Debug, Error)]
pub enum CheckerError {
    /// A single HTTP attempt failed before a status came back.
    ///
    /// Timeouts, refused connections and resolution failures all land here.
    #[error("replica unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// No endpoint confirmed the operation within the attempt budget.
    #[error("{kind} on key {key:?} failed after {attempts} attempts: replicated service is not responding")]
    RetriesExhausted {
        key: String,
        kind: OpKind,
        attempts: usize,
    },

    #[error("endpoint set must contain at least one address")]
    EmptyTopology,

    #[error("replica index {index} out of range for a cluster of {len}")]
    ReplicaIndex { index: usize, len: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("replica task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type for checker operations.
pub type Result<T> = std::result::Result<T, CheckerError>;
