// In-memory ports for command and query tests

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use raidguard_domain::ports::{
    ProfileRepository, SaveReceipt, SnapshotRepository, StoreError, StoredSnapshot,
};
use raidguard_domain::{
    encode_snapshot, CaptureOptions, EquipmentSlot, Item, RuntimeConfig, SessionId, Snapshot,
    MAX_SNAPSHOT_BYTES,
};
use tokio::sync::RwLock;

use crate::{AppState, CoordinationTable};

#[derive(Default)]
pub struct MemorySnapshots {
    pub files: RwLock<HashMap<SessionId, Snapshot>>,
    pub fail_loads: bool,
}

#[async_trait]
impl SnapshotRepository for MemorySnapshots {
    async fn save(&self, snapshot: &Snapshot) -> Result<SaveReceipt, StoreError> {
        let encoded = encode_snapshot(snapshot, MAX_SNAPSHOT_BYTES)?;
        self.files
            .write()
            .await
            .insert(snapshot.session_id.clone(), snapshot.clone());
        Ok(SaveReceipt {
            path: PathBuf::from(format!("{}.json", snapshot.session_id)),
            bytes: encoded.bytes.len() as u64,
            dropped_duplicates: encoded.dropped_duplicates,
        })
    }

    async fn load(&self, session_id: &SessionId) -> Result<Option<Snapshot>, StoreError> {
        if self.fail_loads {
            return Err(StoreError::io(
                "read",
                "memory",
                std::io::Error::new(std::io::ErrorKind::Other, "injected"),
            ));
        }
        Ok(self.files.read().await.get(session_id).cloned())
    }

    async fn delete(&self, session_id: &SessionId) -> Result<bool, StoreError> {
        Ok(self.files.write().await.remove(session_id).is_some())
    }

    async fn list(&self) -> Result<Vec<StoredSnapshot>, StoreError> {
        let files = self.files.read().await;
        let mut out: Vec<StoredSnapshot> = files
            .values()
            .map(|snapshot| StoredSnapshot {
                session_id: snapshot.session_id.clone(),
                bytes: 0,
                modified: snapshot.timestamp,
            })
            .collect();
        out.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        Ok(out)
    }

    async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<SessionId>, StoreError> {
        let mut files = self.files.write().await;
        let stale: Vec<SessionId> = files
            .values()
            .filter(|snapshot| snapshot.timestamp < cutoff)
            .map(|snapshot| snapshot.session_id.clone())
            .collect();
        for id in &stale {
            files.remove(id);
        }
        Ok(stale)
    }
}

#[derive(Default)]
pub struct MemoryProfiles {
    pub files: RwLock<HashMap<String, Vec<Item>>>,
}

#[async_trait]
impl ProfileRepository for MemoryProfiles {
    async fn load_items(&self, path: &str) -> anyhow::Result<Vec<Item>> {
        self.files
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no profile at {path}"))
    }

    async fn save_items(&self, path: &str, items: &[Item]) -> anyhow::Result<()> {
        self.files
            .write()
            .await
            .insert(path.to_string(), items.to_vec());
        Ok(())
    }
}

pub fn runtime_config() -> RuntimeConfig {
    RuntimeConfig {
        snapshots_dir: "memory".to_string(),
        enabled_slots: EquipmentSlot::ALL
            .iter()
            .map(|slot| slot.as_str().to_string())
            .collect(),
        capture: CaptureOptions::default(),
        max_snapshot_bytes: MAX_SNAPSHOT_BYTES,
        coordination_ttl_seconds: 300,
        mod_version: "test".to_string(),
    }
}

pub struct Fixture {
    pub state: AppState,
    pub snapshots: Arc<MemorySnapshots>,
    pub profiles: Arc<MemoryProfiles>,
}

impl Fixture {
    /// Same stores, fresh coordination table, as a second `raidguard` process sees them.
    pub fn next_process(&self) -> Fixture {
        Fixture {
            state: AppState {
                config: self.state.config.clone(),
                snapshot_repo: self.snapshots.clone(),
                profile_repo: self.profiles.clone(),
                coordination: Arc::new(CoordinationTable::default()),
            },
            snapshots: self.snapshots.clone(),
            profiles: self.profiles.clone(),
        }
    }
}

pub fn fixture() -> Fixture {
    fixture_with(MemorySnapshots::default())
}

pub fn fixture_with(snapshots: MemorySnapshots) -> Fixture {
    let snapshots = Arc::new(snapshots);
    let profiles = Arc::new(MemoryProfiles::default());
    let state = AppState {
        config: runtime_config(),
        snapshot_repo: snapshots.clone(),
        profile_repo: profiles.clone(),
        coordination: Arc::new(CoordinationTable::default()),
    };
    Fixture {
        state,
        snapshots,
        profiles,
    }
}

pub fn session(id: &str) -> SessionId {
    SessionId::parse(id).expect("session")
}

pub fn child(id: &str, parent: &str, slot: &str) -> Item {
    Item::new(id, "tpl").with_parent(parent, slot)
}

pub fn snapshot(id: &str, included: Option<&[&str]>, items: Vec<Item>) -> Snapshot {
    Snapshot {
        session_id: session(id),
        timestamp: Utc::now(),
        location: "factory4_day".to_string(),
        taken_in_raid: true,
        mod_version: "test".to_string(),
        included_slots: included.map(|slots| slots.iter().map(|s| s.to_string()).collect()),
        empty_slots: Some(Vec::new()),
        items,
    }
}
