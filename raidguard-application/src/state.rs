use std::sync::Arc;

use raidguard_domain::ports::{ProfileRepository, SnapshotRepository};
use raidguard_domain::RuntimeConfig;

use crate::CoordinationTable;

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub snapshot_repo: Arc<dyn SnapshotRepository>,
    pub profile_repo: Arc<dyn ProfileRepository>,
    pub coordination: Arc<CoordinationTable>,
}
