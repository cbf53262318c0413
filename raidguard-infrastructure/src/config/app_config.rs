use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use raidguard_domain::{CaptureOptions, EquipmentSlot, RuntimeConfig, SlotSet, MAX_SNAPSHOT_BYTES};

use crate::config::{validate_slot_name, validate_snapshot_limit};

pub const DEFAULT_CONFIG_PATH: &str = "./raidguard.toml";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub snapshots_dir: String,
    pub enabled_slots: Vec<String>,
    pub exclude_found_in_raid: bool,
    pub exclude_insured: bool,
    pub max_snapshot_bytes: u64,
    pub coordination_ttl_seconds: u64,
    pub mod_version: String,
    pub log_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            snapshots_dir: "./snapshots".to_string(),
            enabled_slots: EquipmentSlot::ALL
                .iter()
                .map(|slot| slot.as_str().to_string())
                .collect(),
            exclude_found_in_raid: false,
            exclude_insured: false,
            max_snapshot_bytes: MAX_SNAPSHOT_BYTES,
            coordination_ttl_seconds: 300,
            mod_version: env!("CARGO_PKG_VERSION").to_string(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Loads from `path`, or from `RAIDGUARD_CONFIG`, or from `./raidguard.toml`.
    pub async fn load(path: Option<&str>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_string(),
            None => env::var("RAIDGUARD_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()),
        };
        let file_path = Path::new(&path);
        let base_dir = file_path.parent();
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            toml::from_str::<AppConfig>(&content)
                .map_err(|err| anyhow!("invalid config {}: {}", file_path.display(), err))?
        } else {
            warn!("{} not found, using defaults", file_path.display());
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn normalize(&mut self) {
        if let Some(log_dir) = &self.log_dir {
            if log_dir.trim().is_empty() {
                self.log_dir = None;
            }
        }
        if self.mod_version.trim().is_empty() {
            self.mod_version = env!("CARGO_PKG_VERSION").to_string();
        }
        self.enabled_slots = normalize_slot_list(std::mem::take(&mut self.enabled_slots));
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.snapshots_dir = resolve_path(base, &self.snapshots_dir);
        if let Some(log_dir) = &self.log_dir {
            self.log_dir = Some(resolve_path(base, log_dir));
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.snapshots_dir.trim().is_empty() {
            return Err(anyhow!("snapshots_dir must not be empty"));
        }
        for slot in &self.enabled_slots {
            validate_slot_name(slot)?;
        }
        validate_snapshot_limit(self.max_snapshot_bytes)?;
        if self.coordination_ttl_seconds == 0 {
            return Err(anyhow!("coordination_ttl_seconds must be greater than 0"));
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            snapshots_dir: self.snapshots_dir.clone(),
            enabled_slots: self.enabled_slots.clone(),
            capture: CaptureOptions {
                exclude_found_in_raid: self.exclude_found_in_raid,
                exclude_insured: self.exclude_insured,
            },
            max_snapshot_bytes: self.max_snapshot_bytes,
            coordination_ttl_seconds: self.coordination_ttl_seconds,
            mod_version: self.mod_version.clone(),
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("RAIDGUARD_SNAPSHOTS_DIR") {
            self.snapshots_dir = value;
        }
        if let Some(value) = lookup("RAIDGUARD_ENABLED_SLOTS") {
            self.enabled_slots = parse_env_list(&value);
        }
        if let Some(value) = lookup("RAIDGUARD_EXCLUDE_FOUND_IN_RAID") {
            self.exclude_found_in_raid = value.parse().unwrap_or(self.exclude_found_in_raid);
        }
        if let Some(value) = lookup("RAIDGUARD_EXCLUDE_INSURED") {
            self.exclude_insured = value.parse().unwrap_or(self.exclude_insured);
        }
        if let Some(value) = lookup("RAIDGUARD_MAX_SNAPSHOT_BYTES") {
            self.max_snapshot_bytes = value.parse().unwrap_or(self.max_snapshot_bytes);
        }
        if let Some(value) = lookup("RAIDGUARD_COORDINATION_TTL_SECONDS") {
            self.coordination_ttl_seconds = value.parse().unwrap_or(self.coordination_ttl_seconds);
        }
        if let Some(value) = lookup("RAIDGUARD_MOD_VERSION") {
            self.mod_version = value;
        }
        if let Some(value) = lookup("RAIDGUARD_LOG_DIR") {
            self.log_dir = Some(value);
        }
    }
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}

fn parse_env_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Trims, folds known slots onto their canonical spelling, and drops repeats.
/// Unknown names are kept so validation can report them.
fn normalize_slot_list(values: Vec<String>) -> Vec<String> {
    let mut seen = SlotSet::new();
    values
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .map(|item| match EquipmentSlot::parse(&item) {
            Some(slot) => slot.as_str().to_string(),
            None => item,
        })
        .filter(|item| seen.insert(item.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_enable_every_slot() {
        let config = AppConfig::default();
        assert_eq!(config.enabled_slots.len(), 19);
        assert_eq!(config.max_snapshot_bytes, MAX_SNAPSHOT_BYTES);
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("RAIDGUARD_ENABLED_SLOTS", "backpack, Pockets ,,BACKPACK"),
            ("RAIDGUARD_EXCLUDE_INSURED", "true"),
            ("RAIDGUARD_COORDINATION_TTL_SECONDS", "not-a-number"),
        ]);
        let mut config = AppConfig::default();
        config.apply_overrides_from(|key| vars.get(key).map(|v| v.to_string()));
        config.normalize();

        assert_eq!(config.enabled_slots, vec!["Backpack", "Pockets"]);
        assert!(config.exclude_insured);
        assert_eq!(config.coordination_ttl_seconds, 300);
    }

    #[test]
    fn validation_rejects_unknown_slots_and_bad_limits() {
        let mut config = AppConfig {
            enabled_slots: vec!["Backpack".to_string(), "Shoulder".to_string()],
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        config.enabled_slots = vec!["Backpack".to_string()];
        config.max_snapshot_bytes = MAX_SNAPSHOT_BYTES * 2;
        assert!(config.validate().is_err());

        config.max_snapshot_bytes = 4096;
        config.coordination_ttl_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn loads_toml_and_resolves_paths_against_its_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("raidguard.toml");
        std::fs::write(
            &path,
            "snapshots_dir = \"snaps\"\nenabled_slots = [\"SecuredContainer\", \"headwear\"]\nexclude_found_in_raid = true\nlog_dir = \"  \"\n",
        )
        .expect("write config");

        let config = AppConfig::load(path.to_str()).await.expect("load");
        assert_eq!(config.snapshots_dir, dir.path().join("snaps").to_string_lossy());
        assert_eq!(config.enabled_slots, vec!["SecuredContainer", "Headwear"]);
        assert!(config.exclude_found_in_raid);
        assert_eq!(config.log_dir, None);

        let runtime = config.to_runtime_config();
        assert!(runtime.capture.exclude_found_in_raid);
        assert!(!runtime.capture.exclude_insured);
    }
}
