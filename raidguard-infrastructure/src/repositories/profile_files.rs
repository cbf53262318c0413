use std::collections::HashSet;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;

use raidguard_domain::{decode_profile_items, Item, LiveEquipment, ProfileRepository};

use crate::utils::write_atomic;

/// Profile documents on disk: either a bare item array or a profile object
/// whose `Inventory.items` holds the array.
pub struct ProfileFileRepository;

impl ProfileFileRepository {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProfileFileRepository {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_json(path: &str) -> Result<Value> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {path}"))
}

#[async_trait]
impl ProfileRepository for ProfileFileRepository {
    async fn load_items(&self, path: &str) -> Result<Vec<Item>> {
        let document = read_json(path).await?;
        Ok(decode_profile_items(document)?)
    }

    async fn save_items(&self, path: &str, items: &[Item]) -> Result<()> {
        let items = serde_json::to_value(items)?;
        let document = match read_json(path).await? {
            Value::Array(_) => items,
            Value::Object(mut root) => {
                let inventory = find_key_mut(&mut root, "Inventory")
                    .and_then(Value::as_object_mut)
                    .ok_or_else(|| anyhow!("{path} has no Inventory object"))?;
                match find_key_mut(inventory, "items") {
                    Some(slot) => *slot = items,
                    None => {
                        inventory.insert("items".to_string(), items);
                    }
                }
                Value::Object(root)
            }
            _ => return Err(anyhow!("{path} is neither an item array nor a profile object")),
        };
        let bytes = serde_json::to_vec_pretty(&document)?;
        write_atomic(Path::new(path), &bytes)
            .await
            .with_context(|| format!("writing {path}"))?;
        Ok(())
    }
}

fn find_key_mut<'a>(map: &'a mut serde_json::Map<String, Value>, key: &str) -> Option<&'a mut Value> {
    map.iter_mut()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
        .map(|(_, value)| value)
}

/// Reads the live equipment tree exported by the capture trigger.
pub async fn read_live_equipment(path: &str) -> Result<LiveEquipment> {
    let document = read_json(path).await?;
    serde_json::from_value(document).with_context(|| format!("{path} is not an equipment tree"))
}

/// Reads a JSON array of insured template ids.
pub async fn read_insured_templates(path: &str) -> Result<HashSet<String>> {
    let document = read_json(path).await?;
    serde_json::from_value(document).with_context(|| format!("{path} is not a list of templates"))
}
