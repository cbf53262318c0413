use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{debug, warn};

use raidguard_domain::ports::{SaveReceipt, SnapshotRepository, StoreError, StoredSnapshot};
use raidguard_domain::{
    check_size, decode_snapshot, encode_snapshot, SessionId, Snapshot, SnapshotError,
};

use crate::utils::{system_time_to_utc, write_atomic, TEMP_MARKER};

const SNAPSHOT_EXTENSION: &str = "json";

/// Stores each session's snapshot at `<root>/<sessionId>.json`.
pub struct SnapshotFileRepository {
    root: PathBuf,
    max_bytes: u64,
}

impl SnapshotFileRepository {
    pub fn new(root: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, session_id: &SessionId) -> PathBuf {
        self.root
            .join(format!("{}.{}", session_id.as_str(), SNAPSHOT_EXTENSION))
    }

    async fn discard_corrupt(&self, path: &Path, err: &SnapshotError) {
        warn!(path = %path.display(), "deleting unreadable snapshot: {}", err);
        if let Err(remove_err) = fs::remove_file(path).await {
            warn!(path = %path.display(), "failed to delete unreadable snapshot: {}", remove_err);
        }
    }
}

#[async_trait]
impl SnapshotRepository for SnapshotFileRepository {
    async fn save(&self, snapshot: &Snapshot) -> Result<SaveReceipt, StoreError> {
        let encoded = encode_snapshot(snapshot, self.max_bytes)?;
        let path = self.path_for(&snapshot.session_id);
        write_atomic(&path, &encoded.bytes)
            .await
            .map_err(|err| StoreError::io("write", &path, err))?;
        debug!(path = %path.display(), bytes = encoded.bytes.len(), "snapshot written");
        Ok(SaveReceipt {
            path,
            bytes: encoded.bytes.len() as u64,
            dropped_duplicates: encoded.dropped_duplicates,
        })
    }

    async fn load(&self, session_id: &SessionId) -> Result<Option<Snapshot>, StoreError> {
        let path = self.path_for(session_id);
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::io("stat", &path, err)),
        };
        check_size(metadata.len(), self.max_bytes)?;

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::io("read", &path, err)),
        };
        let snapshot = match decode_snapshot(&bytes, self.max_bytes) {
            Ok(snapshot) => snapshot,
            Err(err @ (SnapshotError::Parse(_) | SnapshotError::Validation(_))) => {
                self.discard_corrupt(&path, &err).await;
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        if snapshot.session_id != *session_id {
            let err = SnapshotError::validation(format!(
                "file belongs to session '{}'",
                snapshot.session_id
            ));
            self.discard_corrupt(&path, &err).await;
            return Ok(None);
        }
        Ok(Some(snapshot))
    }

    async fn delete(&self, session_id: &SessionId) -> Result<bool, StoreError> {
        let path = self.path_for(session_id);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StoreError::io("delete", &path, err)),
        }
    }

    async fn list(&self) -> Result<Vec<StoredSnapshot>, StoreError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::io("list", &self.root, err)),
        };
        let mut out = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| StoreError::io("list", &self.root, err))?
        {
            let path = entry.path();
            let Some(session_id) = session_from_path(&path) else {
                continue;
            };
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(err) => {
                    warn!(path = %path.display(), "skipping snapshot without metadata: {}", err);
                    continue;
                }
            };
            let modified = metadata
                .modified()
                .map(system_time_to_utc)
                .unwrap_or_else(|_| Utc::now());
            out.push(StoredSnapshot {
                session_id,
                bytes: metadata.len(),
                modified,
            });
        }
        out.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        Ok(out)
    }

    async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<SessionId>, StoreError> {
        let mut pruned = Vec::new();
        for stored in self.list().await? {
            if stored.modified >= cutoff {
                continue;
            }
            if self.delete(&stored.session_id).await? {
                pruned.push(stored.session_id);
            }
        }
        remove_stale_temps(&self.root, cutoff).await;
        Ok(pruned)
    }
}

fn session_from_path(path: &Path) -> Option<SessionId> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(SNAPSHOT_EXTENSION) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    SessionId::parse(stem).ok()
}

/// Temp siblings left by a process that died between write and rename.
async fn remove_stale_temps(root: &Path, cutoff: DateTime<Utc>) {
    let Ok(mut entries) = fs::read_dir(root).await else {
        return;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        if !entry.file_name().to_string_lossy().contains(TEMP_MARKER) {
            continue;
        }
        let stale = entry
            .metadata()
            .await
            .and_then(|metadata| metadata.modified())
            .map(|modified| system_time_to_utc(modified) < cutoff)
            .unwrap_or(false);
        if stale {
            let _ = fs::remove_file(entry.path()).await;
        }
    }
}
