// Partial death penalty for the late post-raid pathway
// Unmanaged root slots are lost except the secured container (kept whole), pockets
// (kept empty) and the scabbard.

use std::collections::HashSet;

use tracing::debug;

use crate::entities::{DeathPenaltyReport, Item};
use crate::services::{ItemGraph, RestoreError, MAX_TRAVERSAL_ITEMS};
use crate::value_objects::{EquipmentSlot, SlotSet};

#[derive(Debug, Clone)]
pub struct DeathPenaltyOutcome {
    pub items: Vec<Item>,
    pub report: DeathPenaltyReport,
}

/// Applies the death penalty to every root slot not in `spared`.
pub fn apply_death_penalty(
    items: &[Item],
    spared: &SlotSet,
) -> Result<DeathPenaltyOutcome, RestoreError> {
    let graph = ItemGraph::build(items);
    let roots: Vec<&Item> = graph.equipment_roots().collect();
    if roots.is_empty() {
        return Err(RestoreError::MissingEquipmentRoot);
    }

    let mut protected: HashSet<&str> = roots.iter().map(|root| root.id.as_str()).collect();
    let mut seeds: Vec<&str> = Vec::new();
    for root in &roots {
        for child in graph.children_of(&root.id) {
            let Some(slot) = child.slot_id() else {
                continue;
            };
            if spared.contains(slot) {
                continue;
            }
            match EquipmentSlot::parse(slot) {
                Some(preserved) if preserved.is_death_preserved() => {
                    protected.insert(child.id.as_str());
                    // Pockets stay but lose what they hold.
                    if preserved == EquipmentSlot::Pockets {
                        seeds.extend(graph.children_of(&child.id).map(|c| c.id.as_str()));
                    }
                }
                _ => seeds.push(child.id.as_str()),
            }
        }
    }

    let mut doomed = graph.collect_descendants(seeds, MAX_TRAVERSAL_ITEMS)?;
    doomed.retain(|id| !protected.contains(id));

    let kept: Vec<Item> = items
        .iter()
        .filter(|item| !doomed.contains(item.id.as_str()))
        .cloned()
        .collect();
    let removed = items.len() - kept.len();
    debug!(removed, spared = %spared, "partial death penalty applied");

    Ok(DeathPenaltyOutcome {
        items: kept,
        report: DeathPenaltyReport {
            removed,
            spared_slots: spared.clone(),
        },
    })
}
