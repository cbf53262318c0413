// Dynamic per-item fields
// Every field is optional; unrecognised keys are carried in `extra` and written back as-is.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Upd {
    #[serde(rename = "StackObjectsCount", default, skip_serializing_if = "Option::is_none")]
    pub stack_objects_count: Option<u64>,
    /// Found-in-raid marker.
    #[serde(rename = "SpawnedInSession", default, skip_serializing_if = "Option::is_none")]
    pub spawned_in_session: Option<bool>,
    #[serde(rename = "Repairable", default, skip_serializing_if = "Option::is_none")]
    pub repairable: Option<Repairable>,
    #[serde(rename = "MedKit", default, skip_serializing_if = "Option::is_none")]
    pub med_kit: Option<MedKit>,
    #[serde(rename = "Key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<KeyUsage>,
    #[serde(rename = "Foldable", default, skip_serializing_if = "Option::is_none")]
    pub foldable: Option<Foldable>,
    #[serde(rename = "FireMode", default, skip_serializing_if = "Option::is_none")]
    pub fire_mode: Option<FireMode>,
    #[serde(rename = "Dogtag", default, skip_serializing_if = "Option::is_none")]
    pub dogtag: Option<Dogtag>,
    #[serde(rename = "Cartridges", default, skip_serializing_if = "Option::is_none")]
    pub cartridges: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Upd {
    pub fn stack(count: u64) -> Self {
        Self {
            stack_objects_count: Some(count),
            ..Self::default()
        }
    }

    pub fn found_in_raid() -> Self {
        Self {
            spawned_in_session: Some(true),
            ..Self::default()
        }
    }
}

// Numeric resources stay as `Number` so `100` is not rewritten as `100.0`.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Repairable {
    #[serde(rename = "Durability", default, skip_serializing_if = "Option::is_none")]
    pub durability: Option<Number>,
    #[serde(rename = "MaxDurability", default, skip_serializing_if = "Option::is_none")]
    pub max_durability: Option<Number>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedKit {
    #[serde(rename = "HpResource", default, skip_serializing_if = "Option::is_none")]
    pub hp_resource: Option<Number>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyUsage {
    #[serde(rename = "NumberOfUsages", default, skip_serializing_if = "Option::is_none")]
    pub number_of_usages: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Foldable {
    #[serde(rename = "Folded", default, skip_serializing_if = "Option::is_none")]
    pub folded: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FireMode {
    #[serde(rename = "FireMode", default, skip_serializing_if = "Option::is_none")]
    pub fire_mode: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dogtag {
    #[serde(rename = "AccountId", default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(rename = "ProfileId", default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    #[serde(rename = "Nickname", default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(rename = "Side", default, skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    #[serde(rename = "Level", default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(rename = "Time", default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(rename = "Status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "KillerAccountId", default, skip_serializing_if = "Option::is_none")]
    pub killer_account_id: Option<String>,
    #[serde(rename = "KillerProfileId", default, skip_serializing_if = "Option::is_none")]
    pub killer_profile_id: Option<String>,
    #[serde(rename = "KillerName", default, skip_serializing_if = "Option::is_none")]
    pub killer_name: Option<String>,
    #[serde(rename = "WeaponName", default, skip_serializing_if = "Option::is_none")]
    pub weapon_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Canonical key spellings, used by the codec for case-insensitive reads.
pub const UPD_KEYS: &[&str] = &[
    "StackObjectsCount",
    "SpawnedInSession",
    "Repairable",
    "MedKit",
    "Key",
    "Foldable",
    "FireMode",
    "Dogtag",
    "Cartridges",
];

pub const UPD_NESTED_KEYS: &[(&str, &[&str])] = &[
    ("Repairable", &["Durability", "MaxDurability"]),
    ("MedKit", &["HpResource"]),
    ("Key", &["NumberOfUsages"]),
    ("Foldable", &["Folded"]),
    ("FireMode", &["FireMode"]),
    (
        "Dogtag",
        &[
            "AccountId",
            "ProfileId",
            "Nickname",
            "Side",
            "Level",
            "Time",
            "Status",
            "KillerAccountId",
            "KillerProfileId",
            "KillerName",
            "WeaponName",
        ],
    ),
];
