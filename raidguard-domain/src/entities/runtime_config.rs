// Runtime configuration handed to the application layer

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureOptions {
    pub exclude_found_in_raid: bool,
    pub exclude_insured: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub snapshots_dir: String,
    pub enabled_slots: Vec<String>,
    pub capture: CaptureOptions,
    pub max_snapshot_bytes: u64,
    pub coordination_ttl_seconds: u64,
    pub mod_version: String,
}
