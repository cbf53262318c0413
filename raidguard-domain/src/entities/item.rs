// Item entity
// One node of the parent-pointer inventory graph

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::entities::Upd;

/// Template of the item that roots the worn-equipment subtree.
pub const EQUIPMENT_TEMPLATE_ID: &str = "55d7217a4bdc2d86028b456d";

/// Slot id used by magazines and ammo boxes for their cartridge stacks.
pub const CARTRIDGES_SLOT_ID: &str = "cartridges";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error("cartridge index {0} is negative")]
    NegativeCartridgeIndex(i64),
    #[error("cartridge index {0} does not fit in a signed 32-bit integer")]
    CartridgeIndexOutOfRange(i64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_tpl")]
    pub tpl: String,
    #[serde(rename = "parentId", default, with = "blank_as_none")]
    pub parent_id: Option<String>,
    #[serde(rename = "slotId", default, with = "blank_as_none")]
    pub slot_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_location",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<ItemLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upd: Option<Upd>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    pub fn new(id: impl Into<String>, tpl: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tpl: tpl.into(),
            parent_id: None,
            slot_id: None,
            location: None,
            upd: None,
            extra: Map::new(),
        }
    }

    pub fn equipment_root(id: impl Into<String>) -> Self {
        Self::new(id, EQUIPMENT_TEMPLATE_ID)
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>, slot_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self.slot_id = Some(slot_id.into());
        self
    }

    pub fn with_location(mut self, location: ItemLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_upd(mut self, upd: Upd) -> Self {
        self.upd = Some(upd);
        self
    }

    pub fn is_equipment_root(&self) -> bool {
        self.tpl == EQUIPMENT_TEMPLATE_ID
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn slot_id(&self) -> Option<&str> {
        self.slot_id.as_deref()
    }

    pub fn is_found_in_raid(&self) -> bool {
        self.upd
            .as_ref()
            .and_then(|upd| upd.spawned_in_session)
            .unwrap_or(false)
    }

    /// Strict setter: rejects indices the wire format cannot carry.
    pub fn set_cartridge_index(&mut self, index: i64) -> Result<(), ItemError> {
        self.location = Some(ItemLocation::Cartridge(CartridgeIndex::new(index)?));
        Ok(())
    }

    /// Lenient setter used on ingest: negative becomes absent, overflow becomes 0.
    pub fn ingest_cartridge_index(&mut self, index: i64) {
        self.location = CartridgeIndex::from_wire(index).map(ItemLocation::Cartridge);
    }

    pub fn set_grid_location(&mut self, grid: GridLocation) {
        self.location = Some(ItemLocation::Grid(grid));
    }
}

/// Position of an item inside its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemLocation {
    Grid(GridLocation),
    Cartridge(CartridgeIndex),
}

impl ItemLocation {
    pub fn cartridge(index: u32) -> Result<Self, ItemError> {
        Ok(ItemLocation::Cartridge(CartridgeIndex::new(i64::from(index))?))
    }

    pub fn grid(x: i32, y: i32, r: Rotation, is_searched: bool) -> Self {
        ItemLocation::Grid(GridLocation {
            x,
            y,
            r,
            is_searched,
        })
    }

    pub fn from_value(value: Value) -> Result<Option<Self>, String> {
        match value {
            Value::Null => Ok(None),
            Value::Number(number) => {
                // Integral floats such as 5.0 are indices too; `as` saturates out of range.
                let raw = number
                    .as_i64()
                    .or_else(|| {
                        number
                            .as_f64()
                            .filter(|value| value.fract() == 0.0)
                            .map(|value| value as i64)
                    })
                    .unwrap_or(0);
                Ok(CartridgeIndex::from_wire(raw).map(ItemLocation::Cartridge))
            }
            Value::Object(_) => serde_json::from_value::<GridLocation>(value)
                .map(|grid| Some(ItemLocation::Grid(grid)))
                .map_err(|err| format!("invalid grid location: {err}")),
            other => Err(format!("unsupported location value: {other}")),
        }
    }
}

impl Serialize for ItemLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ItemLocation::Grid(grid) => grid.serialize(serializer),
            ItemLocation::Cartridge(index) => serializer.serialize_u32(index.get()),
        }
    }
}

fn deserialize_location<'de, D>(deserializer: D) -> Result<Option<ItemLocation>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    ItemLocation::from_value(value).map_err(serde::de::Error::custom)
}

/// Cartridge index, always within `0..=i32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CartridgeIndex(u32);

impl CartridgeIndex {
    pub fn new(index: i64) -> Result<Self, ItemError> {
        if index < 0 {
            return Err(ItemError::NegativeCartridgeIndex(index));
        }
        if index > i64::from(i32::MAX) {
            return Err(ItemError::CartridgeIndexOutOfRange(index));
        }
        Ok(Self(index as u32))
    }

    pub fn from_wire(raw: i64) -> Option<Self> {
        if raw < i64::from(i32::MIN) || raw > i64::from(i32::MAX) {
            return Some(Self(0));
        }
        if raw < 0 {
            return None;
        }
        Some(Self(raw as u32))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLocation {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub r: Rotation,
    #[serde(rename = "isSearched", default)]
    pub is_searched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Horizontal,
    Vertical,
}

impl Serialize for Rotation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(match self {
            Rotation::Horizontal => 0,
            Rotation::Vertical => 1,
        })
    }
}

impl<'de> Deserialize<'de> for Rotation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(Rotation::Horizontal),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Ok(Rotation::Horizontal),
                Some(1) => Ok(Rotation::Vertical),
                _ => Err(serde::de::Error::custom(format!("invalid rotation {n}"))),
            },
            Value::String(s) if s.eq_ignore_ascii_case("horizontal") => Ok(Rotation::Horizontal),
            Value::String(s) if s.eq_ignore_ascii_case("vertical") => Ok(Rotation::Vertical),
            other => Err(serde::de::Error::custom(format!("invalid rotation {other}"))),
        }
    }
}

/// `parentId`/`slotId`: `null`, `""` and absent all mean "none"; none is written as `""`.
mod blank_as_none {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::String(s) if s.is_empty() => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Err(serde::de::Error::custom(format!(
                "expected string, found {other}"
            ))),
        }
    }
}
