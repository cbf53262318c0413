use anyhow::{anyhow, Result};

use raidguard_domain::{EquipmentSlot, MAX_SNAPSHOT_BYTES};

pub fn validate_slot_name(value: &str) -> Result<EquipmentSlot> {
    if value.trim().is_empty() {
        return Err(anyhow!("slot name is empty"));
    }
    EquipmentSlot::parse(value).ok_or_else(|| anyhow!("unknown equipment slot '{}'", value.trim()))
}

pub fn validate_snapshot_limit(value: u64) -> Result<()> {
    if value == 0 || value > MAX_SNAPSHOT_BYTES {
        return Err(anyhow!(
            "max_snapshot_bytes must be between 1 and {}",
            MAX_SNAPSHOT_BYTES
        ));
    }
    Ok(())
}
