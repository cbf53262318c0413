use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use raidguard_application::{AppState, CoordinationTable};
use raidguard_infrastructure::{AppConfig, ProfileFileRepository, SnapshotFileRepository};

pub struct AppContext {
    pub config: AppConfig,
    pub state: AppState,
}

impl AppContext {
    pub async fn new(config_path: Option<&str>) -> Result<Self> {
        let config = AppConfig::load(config_path).await?;
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: AppConfig) -> Self {
        let runtime_config = config.to_runtime_config();
        let snapshot_repo = Arc::new(SnapshotFileRepository::new(
            runtime_config.snapshots_dir.clone(),
            runtime_config.max_snapshot_bytes,
        ));
        let coordination = CoordinationTable::process_wide(Duration::from_secs(
            runtime_config.coordination_ttl_seconds,
        ));

        let state = AppState {
            config: runtime_config,
            snapshot_repo,
            profile_repo: Arc::new(ProfileFileRepository::new()),
            coordination,
        };
        Self { config, state }
    }
}
