//! Client-side model of what the replicated store should contain.
//!
//! Every generated operation is applied here before it is sent anywhere, so
//! the model runs ahead of the cluster. If an operation never reaches a
//! replica the run aborts, which is the only point where the two could
//! otherwise drift apart silently.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::operation::{OpKind, Operation};

/// Thread-safe expected key-value contents.
///
/// The lock is held only for the map update itself and never across a
/// network call.
///
/// `BTreeMap` keeps the final report in key order.
#[derive(Debug, Default)]
pub struct ShadowState {
    data: Mutex<BTreeMap<String, String>>,
}

impl ShadowState {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self {
            data: Mutex::new(BTreeMap::new()),
        }
    }

    /// Applies one operation to the model.
    ///
    /// Create and update overwrite, delete removes the key if present, read
    /// leaves the model untouched.
    pub fn apply(&self, op: &Operation) {
        match op.kind {
            OpKind::Create | OpKind::Update => {
                let value = op.value.clone().unwrap_or_default();
                self.lock().insert(op.key.clone(), value);
            }
            OpKind::Delete => {
                self.lock().remove(&op.key);
            }
            OpKind::Read => {}
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns a copy of the whole model.
    ///
    /// Cloning keeps the lock scope to this call.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
