// Snapshot codec
// Known keys are folded onto their canonical spelling before typed deserialization.
// Unknown keys pass through. Output is canonical, pretty-printed JSON.

use std::borrow::Cow;

use serde_json::{Map, Value};
use tracing::warn;

use crate::entities::{Item, Snapshot, SnapshotError, SNAPSHOT_KEYS, UPD_KEYS, UPD_NESTED_KEYS};
use crate::services::dedup_items;

/// Ceiling on snapshot payloads, enforced on both read and write.
pub const MAX_SNAPSHOT_BYTES: u64 = 10 * 1024 * 1024;

const ITEM_KEYS: &[&str] = &["_id", "_tpl", "parentId", "slotId", "location", "upd"];
const LOCATION_KEYS: &[&str] = &["x", "y", "r", "isSearched"];

#[derive(Debug, Clone)]
pub struct EncodedSnapshot {
    pub bytes: Vec<u8>,
    pub dropped_duplicates: usize,
}

pub fn check_size(size: u64, limit: u64) -> Result<(), SnapshotError> {
    let limit = limit.min(MAX_SNAPSHOT_BYTES);
    if size > limit {
        return Err(SnapshotError::Oversized { size, limit });
    }
    Ok(())
}

pub fn encode_snapshot(snapshot: &Snapshot, limit: u64) -> Result<EncodedSnapshot, SnapshotError> {
    let (items, dropped) = dedup_items(&snapshot.items);
    let snapshot = if dropped > 0 {
        warn!(
            session_id = %snapshot.session_id,
            dropped,
            "dropping repeated item ids before save"
        );
        Cow::Owned(Snapshot {
            items,
            ..snapshot.clone()
        })
    } else {
        Cow::Borrowed(snapshot)
    };
    snapshot.validate()?;

    let bytes = serde_json::to_vec_pretty(snapshot.as_ref())
        .map_err(|err| SnapshotError::validation(format!("cannot encode snapshot: {err}")))?;
    check_size(bytes.len() as u64, limit)?;
    Ok(EncodedSnapshot {
        bytes,
        dropped_duplicates: dropped,
    })
}

pub fn decode_snapshot(bytes: &[u8], limit: u64) -> Result<Snapshot, SnapshotError> {
    check_size(bytes.len() as u64, limit)?;
    let mut value: Value = serde_json::from_slice(bytes).map_err(SnapshotError::Parse)?;
    let Value::Object(root) = &mut value else {
        return Err(SnapshotError::validation("snapshot root must be a JSON object"));
    };
    canonicalize_keys(root, SNAPSHOT_KEYS);
    if let Some(Value::Array(items)) = root.get_mut("items") {
        items.iter_mut().for_each(canonicalize_item);
    }

    let snapshot: Snapshot =
        serde_json::from_value(value).map_err(|err| SnapshotError::validation(err.to_string()))?;
    snapshot.validate()?;
    Ok(snapshot)
}

/// Reads a profile's item list: either a bare array, or an object carrying
/// `Inventory.items` (keys matched case-insensitively).
pub fn decode_profile_items(value: Value) -> Result<Vec<Item>, SnapshotError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut root) => {
            let inventory = take_ignore_case(&mut root, "Inventory")
                .ok_or_else(|| SnapshotError::validation("profile has no Inventory object"))?;
            let Value::Object(mut inventory) = inventory else {
                return Err(SnapshotError::validation("profile Inventory is not an object"));
            };
            match take_ignore_case(&mut inventory, "items") {
                Some(Value::Array(items)) => items,
                _ => return Err(SnapshotError::validation("profile Inventory has no items array")),
            }
        }
        _ => return Err(SnapshotError::validation("profile must be an array or an object")),
    };
    decode_items(items)
}

pub fn decode_items(mut items: Vec<Value>) -> Result<Vec<Item>, SnapshotError> {
    items.iter_mut().for_each(canonicalize_item);
    items
        .into_iter()
        .map(|value| {
            serde_json::from_value(value).map_err(|err| SnapshotError::validation(err.to_string()))
        })
        .collect()
}

fn canonicalize_item(value: &mut Value) {
    let Value::Object(item) = value else {
        return;
    };
    canonicalize_keys(item, ITEM_KEYS);
    if let Some(Value::Object(location)) = item.get_mut("location") {
        canonicalize_keys(location, LOCATION_KEYS);
    }
    if let Some(Value::Object(upd)) = item.get_mut("upd") {
        canonicalize_keys(upd, UPD_KEYS);
        for (key, nested_keys) in UPD_NESTED_KEYS {
            if let Some(Value::Object(nested)) = upd.get_mut(*key) {
                canonicalize_keys(nested, nested_keys);
            }
        }
    }
}

/// Renames keys that match a canonical key case-insensitively. An exact match wins
/// over a differently-cased duplicate, which is left in place as an unknown field.
fn canonicalize_keys(map: &mut Map<String, Value>, canonical: &[&str]) {
    for key in canonical {
        if map.contains_key(*key) {
            continue;
        }
        let found = map
            .keys()
            .find(|existing| existing.eq_ignore_ascii_case(key))
            .cloned();
        if let Some(found) = found {
            if let Some(value) = map.remove(&found) {
                map.insert((*key).to_string(), value);
            }
        }
    }
}

fn take_ignore_case(map: &mut Map<String, Value>, key: &str) -> Option<Value> {
    let found = map.keys().find(|k| k.eq_ignore_ascii_case(key)).cloned()?;
    map.remove(&found)
}
