// Snapshot entity
// A time-stamped capture of the equipment subtree of one profile

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::Item;
use crate::value_objects::{SessionId, SlotSet};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot payload is {size} bytes, above the {limit} byte limit")]
    Oversized { size: u64, limit: u64 },
    #[error("snapshot is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("invalid snapshot: {0}")]
    Validation(String),
}

impl SnapshotError {
    pub fn validation(message: impl Into<String>) -> Self {
        SnapshotError::Validation(message.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub session_id: SessionId,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub taken_in_raid: bool,
    #[serde(default)]
    pub mod_version: String,
    /// `None` marks a legacy snapshot; `Some([])` means the player protected nothing.
    #[serde(default)]
    pub included_slots: Option<Vec<String>>,
    #[serde(default)]
    pub empty_slots: Option<Vec<String>>,
    pub items: Vec<Item>,
}

pub const SNAPSHOT_KEYS: &[&str] = &[
    "sessionId",
    "timestamp",
    "location",
    "takenInRaid",
    "modVersion",
    "includedSlots",
    "emptySlots",
    "items",
];

impl Snapshot {
    pub fn equipment_root(&self) -> Option<&Item> {
        self.items.iter().find(|item| item.is_equipment_root())
    }

    pub fn empty_slots(&self) -> &[String] {
        self.empty_slots.as_deref().unwrap_or(&[])
    }

    /// Slots filled directly under the equipment root.
    pub fn filled_slots(&self) -> SlotSet {
        let Some(root) = self.equipment_root() else {
            return SlotSet::new();
        };
        self.items
            .iter()
            .filter(|item| item.parent_id() == Some(root.id.as_str()))
            .filter_map(|item| item.slot_id())
            .collect()
    }

    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.items.is_empty() {
            return Err(SnapshotError::validation("items must not be empty"));
        }
        if let Some(item) = self.items.iter().find(|item| item.id.trim().is_empty()) {
            return Err(SnapshotError::validation(format!(
                "item with template '{}' has an empty _id",
                item.tpl
            )));
        }
        let roots = self
            .items
            .iter()
            .filter(|item| item.is_equipment_root())
            .count();
        if roots == 0 {
            return Err(SnapshotError::validation("no equipment root in items"));
        }
        if roots > 1 {
            tracing::warn!(
                session_id = %self.session_id,
                roots,
                "snapshot carries more than one equipment root"
            );
        }
        Ok(())
    }

    pub fn summary(&self) -> SnapshotSummary {
        let mut seen = HashSet::new();
        let unique_items = self
            .items
            .iter()
            .filter(|item| seen.insert(item.id.as_str()))
            .count();
        SnapshotSummary {
            session_id: self.session_id.clone(),
            timestamp: self.timestamp,
            location: self.location.clone(),
            taken_in_raid: self.taken_in_raid,
            mod_version: self.mod_version.clone(),
            item_count: unique_items,
            filled_slots: self.filled_slots(),
            empty_slots: self.empty_slots().iter().collect(),
            included_slots: self.included_slots.as_ref().map(|slots| slots.iter().collect()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub session_id: SessionId,
    pub timestamp: DateTime<Utc>,
    pub location: String,
    pub taken_in_raid: bool,
    pub mod_version: String,
    pub item_count: usize,
    pub filled_slots: SlotSet,
    pub empty_slots: SlotSet,
    pub included_slots: Option<SlotSet>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Snapshot {
        Snapshot {
            session_id: SessionId::parse("pmc01").expect("session"),
            timestamp: Utc::now(),
            location: "Hideout".to_string(),
            taken_in_raid: false,
            mod_version: "0.3.0".to_string(),
            included_slots: Some(vec!["Backpack".to_string(), "Holster".to_string()]),
            empty_slots: Some(vec!["Holster".to_string()]),
            items: vec![
                Item::equipment_root("eq"),
                Item::new("bp", "backpack_tpl").with_parent("eq", "Backpack"),
                Item::new("ammo", "ammo_tpl").with_parent("bp", "main"),
            ],
        }
    }

    #[test]
    fn validate_requires_an_equipment_root() {
        let mut snapshot = sample();
        snapshot.validate().expect("valid");
        snapshot.items.retain(|item| !item.is_equipment_root());
        let err = snapshot.validate().expect_err("missing root");
        assert!(err.to_string().contains("equipment root"));
    }

    #[test]
    fn validate_rejects_blank_ids_and_empty_item_lists() {
        let mut snapshot = sample();
        snapshot.items[1].id = " ".to_string();
        assert!(matches!(snapshot.validate(), Err(SnapshotError::Validation(_))));
        snapshot.items.clear();
        assert!(matches!(snapshot.validate(), Err(SnapshotError::Validation(_))));
    }

    #[test]
    fn summary_reports_slot_coverage() {
        let summary = sample().summary();
        assert_eq!(summary.item_count, 3);
        assert!(summary.filled_slots.contains("backpack"));
        assert!(summary.empty_slots.contains("Holster"));
        assert_eq!(summary.included_slots.map(|s| s.len()), Some(2));
    }

    #[test]
    fn null_included_slots_serializes_explicitly() {
        let mut snapshot = sample();
        snapshot.included_slots = None;
        let value = serde_json::to_value(&snapshot).expect("serialize");
        assert_eq!(value["includedSlots"], json!(null));
        assert_eq!(value["sessionId"], json!("pmc01"));
    }
}
