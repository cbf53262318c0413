// Live inventory view
// Host-agnostic shape of the player's equipment tree at capture time.

use serde::{Deserialize, Serialize};

use crate::entities::{GridLocation, Upd, EQUIPMENT_TEMPLATE_ID};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveEquipment {
    pub id: String,
    #[serde(default = "default_equipment_tpl")]
    pub tpl: String,
    #[serde(default)]
    pub slots: Vec<LiveSlot>,
}

fn default_equipment_tpl() -> String {
    EQUIPMENT_TEMPLATE_ID.to_string()
}

impl LiveEquipment {
    pub fn slot_item(&self, slot: &str) -> Option<&LiveItem> {
        self.slots
            .iter()
            .filter(|candidate| candidate.name.eq_ignore_ascii_case(slot))
            .find_map(|candidate| candidate.item.as_ref())
    }
}

/// Named slot of an item; `item` is `None` when the slot is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveSlot {
    pub name: String,
    #[serde(default)]
    pub item: Option<LiveItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveItem {
    pub id: String,
    pub tpl: String,
    #[serde(default)]
    pub upd: Option<Upd>,
    /// Address location for slot-style placement, if the host exposes one.
    #[serde(default)]
    pub location: Option<GridLocation>,
    #[serde(default)]
    pub slots: Vec<LiveSlot>,
    #[serde(default)]
    pub grids: Vec<LiveGrid>,
    /// Magazine or ammo box contents, in cartridge-index order.
    #[serde(default)]
    pub cartridges: Vec<LiveItem>,
}

impl LiveItem {
    pub fn new(id: impl Into<String>, tpl: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tpl: tpl.into(),
            upd: None,
            location: None,
            slots: Vec::new(),
            grids: Vec::new(),
            cartridges: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveGrid {
    pub id: String,
    #[serde(default)]
    pub items: Vec<LiveGridEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveGridEntry {
    pub item: LiveItem,
    pub location: GridLocation,
}
