use crate::status::FileStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Weak reference to the entity a file is attached to.
///
/// Only identifies the owner; the tracker never loads or calls into it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerRef {
    pub entity_type: String,
    pub entity_id: i64,
}

impl OwnerRef {
    pub fn new(entity_type: impl Into<String>, entity_id: i64) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id,
        }
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entity_type, self.entity_id)
    }
}

/// A file path known to the tracker, with its last known scan status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedFile {
    pub id: i64,
    pub path: String,
    pub status: FileStatus,
    pub owner: Option<OwnerRef>,
    pub viruses_found: String,
    pub url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub scanned_at: Option<String>,
}

impl TrackedFile {
    /// A fresh record in the initial state. `id` is assigned by the store.
    pub fn new(path: &str, owner: Option<&OwnerRef>, url: Option<&str>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: 0,
            path: path.to_string(),
            status: FileStatus::Standing,
            owner: owner.cloned(),
            viruses_found: String::new(),
            url: url.map(str::to_string),
            created_at: now.clone(),
            updated_at: now,
            scanned_at: None,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}
