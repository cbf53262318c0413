use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::entities::{Item, Snapshot, SnapshotError};
use crate::value_objects::SessionId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("{action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReceipt {
    pub path: PathBuf,
    pub bytes: u64,
    pub dropped_duplicates: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSnapshot {
    pub session_id: SessionId,
    pub bytes: u64,
    pub modified: DateTime<Utc>,
}

/// One snapshot file per session. Loads of corrupt files delete them and report absence.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    async fn save(&self, snapshot: &Snapshot) -> Result<SaveReceipt, StoreError>;
    async fn load(&self, session_id: &SessionId) -> Result<Option<Snapshot>, StoreError>;
    /// Returns whether a file was removed.
    async fn delete(&self, session_id: &SessionId) -> Result<bool, StoreError>;
    async fn list(&self) -> Result<Vec<StoredSnapshot>, StoreError>;
    async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<SessionId>, StoreError>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn load_items(&self, path: &str) -> anyhow::Result<Vec<Item>>;
    /// Writes `items` back into the document at `path`, keeping its other fields.
    async fn save_items(&self, path: &str, items: &[Item]) -> anyhow::Result<()>;
}
