use std::collections::HashSet;

use crate::entities::Item;
use crate::services::ItemGraph;

/// Longest parent chain followed before giving up.
pub const MAX_TRACE_DEPTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootSlot<'a> {
    /// Slot of the ancestor sitting directly under the equipment root.
    Slot(&'a str),
    /// Chain ends at an empty or unknown parent.
    Detached,
    Cycle,
    DepthExceeded,
}

/// Walks `parentId` upward from `item` until the parent is `equipment_id`.
pub fn trace_root_slot<'a>(
    item: &'a Item,
    equipment_id: &str,
    lookup: &ItemGraph<'a>,
) -> RootSlot<'a> {
    let mut visited: HashSet<&'a str> = HashSet::new();
    let mut current = item;
    for _ in 0..MAX_TRACE_DEPTH {
        if !visited.insert(current.id.as_str()) {
            return RootSlot::Cycle;
        }
        let Some(parent_id) = current.parent_id() else {
            return RootSlot::Detached;
        };
        if parent_id == equipment_id {
            return match current.slot_id() {
                Some(slot) => RootSlot::Slot(slot),
                None => RootSlot::Detached,
            };
        }
        match lookup.get(parent_id) {
            Some(parent) => current = parent,
            None => return RootSlot::Detached,
        }
    }
    RootSlot::DepthExceeded
}
