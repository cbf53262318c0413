// Snapshot capture from the live equipment tree

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::entities::{
    CaptureOptions, GridLocation, Item, ItemError, LiveEquipment, LiveItem, Snapshot,
    CARTRIDGES_SLOT_ID,
};
use crate::services::{TraversalLimitExceeded, MAX_TRAVERSAL_ITEMS};
use crate::value_objects::{EquipmentSlot, SessionId, SlotSet};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error(transparent)]
    TraversalLimit(#[from] TraversalLimitExceeded),
    #[error("item '{id}': {source}")]
    Item {
        id: String,
        #[source]
        source: ItemError,
    },
}

#[derive(Debug, Clone)]
pub struct CaptureRequest<'a> {
    pub session_id: SessionId,
    pub equipment: &'a LiveEquipment,
    pub enabled_slots: &'a [String],
    pub options: &'a CaptureOptions,
    /// Templates on the player's insurance list.
    pub insured_templates: &'a HashSet<String>,
    pub location: String,
    pub taken_in_raid: bool,
    pub mod_version: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub snapshot: Snapshot,
    /// Items left out by the found-in-raid or insurance filters, subtrees not counted.
    pub excluded: usize,
    /// Repeated ids the host exposed under more than one view.
    pub duplicates_skipped: usize,
}

enum Placement {
    Address(Option<GridLocation>),
    Grid(GridLocation),
    Cartridge(usize),
}

struct Pending<'a> {
    item: &'a LiveItem,
    parent_id: &'a str,
    slot_id: &'a str,
    placement: Placement,
}

pub fn capture_snapshot(request: CaptureRequest<'_>) -> Result<CaptureOutcome, CaptureError> {
    let equipment = request.equipment;
    let mut items = vec![Item::new(equipment.id.clone(), equipment.tpl.clone())];
    let mut seen: HashSet<&str> = HashSet::from([equipment.id.as_str()]);
    let mut empty_slots = Vec::new();
    let mut visited_slots = SlotSet::new();
    let mut excluded = 0usize;
    let mut duplicates_skipped = 0usize;

    for configured in request.enabled_slots {
        if !visited_slots.insert(configured.as_str()) {
            continue;
        }
        let slot_name = EquipmentSlot::parse(configured)
            .map(|slot| slot.as_str())
            .unwrap_or(configured.as_str());
        let Some(root_item) = equipment.slot_item(configured) else {
            empty_slots.push(configured.clone());
            continue;
        };

        let mut stack = vec![Pending {
            item: root_item,
            parent_id: equipment.id.as_str(),
            slot_id: slot_name,
            placement: Placement::Address(root_item.location),
        }];
        while let Some(pending) = stack.pop() {
            let live = pending.item;
            if !seen.insert(live.id.as_str()) {
                duplicates_skipped += 1;
                warn!(item_id = %live.id, "item exposed twice during capture; keeping first");
                continue;
            }
            if is_excluded(live, &request) {
                excluded += 1;
                continue;
            }
            if items.len() >= MAX_TRAVERSAL_ITEMS {
                return Err(TraversalLimitExceeded {
                    limit: MAX_TRAVERSAL_ITEMS,
                }
                .into());
            }

            let mut item = Item::new(live.id.clone(), live.tpl.clone())
                .with_parent(pending.parent_id, pending.slot_id);
            item.upd = live.upd.clone();
            match pending.placement {
                Placement::Address(Some(grid)) | Placement::Grid(grid) => {
                    item.set_grid_location(grid)
                }
                Placement::Address(None) => {}
                Placement::Cartridge(index) => item
                    .set_cartridge_index(index as i64)
                    .map_err(|source| CaptureError::Item {
                        id: live.id.clone(),
                        source,
                    })?,
            }
            items.push(item);

            // Pushed in reverse so children pop in host order.
            for (index, round) in live.cartridges.iter().enumerate().rev() {
                stack.push(Pending {
                    item: round,
                    parent_id: live.id.as_str(),
                    slot_id: CARTRIDGES_SLOT_ID,
                    placement: Placement::Cartridge(index),
                });
            }
            for grid in live.grids.iter().rev() {
                for entry in grid.items.iter().rev() {
                    stack.push(Pending {
                        item: &entry.item,
                        parent_id: live.id.as_str(),
                        slot_id: grid.id.as_str(),
                        placement: Placement::Grid(entry.location),
                    });
                }
            }
            for slot in live.slots.iter().rev() {
                if let Some(child) = &slot.item {
                    stack.push(Pending {
                        item: child,
                        parent_id: live.id.as_str(),
                        slot_id: slot.name.as_str(),
                        placement: Placement::Address(child.location),
                    });
                }
            }
        }
    }

    debug!(
        session_id = %request.session_id,
        items = items.len(),
        empty = empty_slots.len(),
        excluded,
        "captured equipment"
    );

    Ok(CaptureOutcome {
        snapshot: Snapshot {
            session_id: request.session_id,
            timestamp: request.timestamp,
            location: request.location,
            taken_in_raid: request.taken_in_raid,
            mod_version: request.mod_version,
            included_slots: Some(request.enabled_slots.to_vec()),
            empty_slots: Some(empty_slots),
            items,
        },
        excluded,
        duplicates_skipped,
    })
}

fn is_excluded(item: &LiveItem, request: &CaptureRequest<'_>) -> bool {
    let found_in_raid = item
        .upd
        .as_ref()
        .and_then(|upd| upd.spawned_in_session)
        .unwrap_or(false);
    (request.options.exclude_found_in_raid && found_in_raid)
        || (request.options.exclude_insured && request.insured_templates.contains(&item.tpl))
}
