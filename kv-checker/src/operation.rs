//! CRUD operations exchanged with replicas.
//!
//! An [`Operation`] is both the unit of work produced by the
//! [`crate::workload::Workload`] and the JSON body sent to `/apply`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The four request kinds understood by a replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Create,
    Read,
    Update,
    Delete,
}

impl OpKind {
    pub const ALL: [OpKind; 4] = [OpKind::Create, OpKind::Read, OpKind::Update, OpKind::Delete];

    /// Whether operations of this kind carry a value.
    pub fn carries_value(self) -> bool {
        matches!(self, OpKind::Create | OpKind::Update)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OpKind::Create => "create",
            OpKind::Read => "read",
            OpKind::Update => "update",
            OpKind::Delete => "delete",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One CRUD request.
///
/// Serializes as `{"Key": .., "Value": .., "Op": ..}`, omitting `Value` when
/// absent. Use the constructors to keep the value present only for
/// create/update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "Op")]
    pub kind: OpKind,
}

impl Operation {
    pub fn create(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            kind: OpKind::Create,
        }
    }

    pub fn read(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            kind: OpKind::Read,
        }
    }

    pub fn update(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            kind: OpKind::Update,
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            kind: OpKind::Delete,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} {}={}", self.kind, self.key, value),
            None => write!(f, "{} {}", self.kind, self.key),
        }
    }
}
