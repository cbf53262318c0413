// Snapshot restoration
// Managed slots decide which root subtrees are replaced by the snapshot state.
// Permanent containers (SecuredContainer, Pockets) are never removed, even in a managed
// slot, but their contents are.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, warn};

use crate::entities::{Item, RestoreReport, Snapshot};
use crate::services::{
    trace_root_slot, ItemGraph, RootSlot, TraversalLimitExceeded, MAX_TRAVERSAL_ITEMS,
};
use crate::value_objects::{is_permanent_slot, SlotPolicy};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestoreError {
    #[error("profile has no equipment root")]
    MissingEquipmentRoot,
    #[error(transparent)]
    TraversalLimit(#[from] TraversalLimitExceeded),
}

#[derive(Debug, Clone, Copy)]
pub struct RestoreRequest<'a> {
    pub profile_items: &'a [Item],
    pub snapshot_items: &'a [Item],
    pub included_slots: Option<&'a [String]>,
    pub empty_slots: &'a [String],
}

impl<'a> RestoreRequest<'a> {
    pub fn from_snapshot(profile_items: &'a [Item], snapshot: &'a Snapshot) -> Self {
        Self {
            profile_items,
            snapshot_items: &snapshot.items,
            included_slots: snapshot.included_slots.as_deref(),
            empty_slots: snapshot.empty_slots(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RestoreOutcome {
    pub items: Vec<Item>,
    pub equipment_id: String,
    pub report: RestoreReport,
}

pub fn restore_inventory(request: RestoreRequest<'_>) -> Result<RestoreOutcome, RestoreError> {
    let profile = ItemGraph::build(request.profile_items);
    let snapshot = ItemGraph::build(request.snapshot_items);

    let profile_root = profile
        .equipment_roots()
        .next()
        .ok_or(RestoreError::MissingEquipmentRoot)?;
    let snapshot_root = snapshot.equipment_roots().next();

    let all_roots: HashSet<&str> = profile
        .equipment_roots()
        .chain(snapshot.equipment_roots())
        .map(|item| item.id.as_str())
        .collect();
    if profile.equipment_roots().count() > 1 {
        warn!(
            equipment_id = %profile_root.id,
            "profile carries more than one equipment root; using the first"
        );
    }

    let snapshot_slots: Vec<&str> = snapshot_root
        .map(|root| {
            snapshot
                .children_of(&root.id)
                .filter(|child| !child.is_equipment_root())
                .filter_map(Item::slot_id)
                .collect()
        })
        .unwrap_or_default();
    let policy = SlotPolicy::resolve(
        request.included_slots,
        request.empty_slots,
        snapshot_slots.iter().copied(),
    );

    let mut report = RestoreReport {
        policy: policy.kind(),
        managed_slots: policy.managed_slots(),
        ..RestoreReport::default()
    };

    if policy == SlotPolicy::ExplicitNone {
        debug!("snapshot manages no slots; profile left as-is");
        return Ok(RestoreOutcome {
            items: request.profile_items.to_vec(),
            equipment_id: profile_root.id.clone(),
            report,
        });
    }

    // Removal phase.
    let mut protected: HashSet<&str> = all_roots.clone();
    let mut live_containers: HashMap<String, &str> = HashMap::new();
    let mut seeds: Vec<&str> = Vec::new();
    for root_id in &all_roots {
        for child in profile.children_of(root_id) {
            let Some(slot) = child.slot_id() else {
                continue;
            };
            let permanent = is_permanent_slot(slot);
            if permanent {
                protected.insert(child.id.as_str());
                if child.parent_id() == Some(profile_root.id.as_str()) {
                    live_containers
                        .entry(slot.to_ascii_lowercase())
                        .or_insert(child.id.as_str());
                }
            }
            if !policy.is_managed(slot) {
                continue;
            }
            if permanent {
                seeds.extend(profile.children_of(&child.id).map(|c| c.id.as_str()));
            } else {
                seeds.push(child.id.as_str());
            }
        }
    }

    let mut doomed = profile.collect_descendants(seeds, MAX_TRAVERSAL_ITEMS)?;
    doomed.retain(|id| !protected.contains(id));

    let mut items: Vec<Item> = Vec::with_capacity(request.profile_items.len());
    for item in request.profile_items {
        if doomed.contains(item.id.as_str()) {
            report.removed += 1;
        } else {
            items.push(item.clone());
        }
    }

    // Addition phase.
    let Some(snapshot_root) = snapshot_root else {
        report.non_managed_skipped = request.snapshot_items.len();
        warn!("snapshot has no equipment root; nothing to add");
        return Ok(RestoreOutcome {
            items,
            equipment_id: profile_root.id.clone(),
            report,
        });
    };

    let mut aliases: HashMap<&str, &str> = HashMap::new();
    for child in snapshot.children_of(&snapshot_root.id) {
        let Some(slot) = child.slot_id() else {
            continue;
        };
        if !is_permanent_slot(slot) || !policy.is_managed(slot) {
            continue;
        }
        if let Some(&live_id) = live_containers.get(&slot.to_ascii_lowercase()) {
            if live_id != child.id {
                aliases.insert(child.id.as_str(), live_id);
            }
        }
    }

    let mut present: HashSet<String> = items.iter().map(|item| item.id.clone()).collect();
    for candidate in request.snapshot_items {
        if candidate.is_equipment_root() || all_roots.contains(candidate.id.as_str()) {
            continue;
        }
        if aliases.contains_key(candidate.id.as_str()) {
            report.containers_merged += 1;
            continue;
        }
        if present.contains(&candidate.id) {
            report.duplicates += 1;
            continue;
        }
        match trace_root_slot(candidate, &snapshot_root.id, &snapshot) {
            RootSlot::Slot(slot) if policy.is_managed(slot) => {}
            RootSlot::Slot(_) | RootSlot::Detached => {
                report.non_managed_skipped += 1;
                continue;
            }
            violation @ (RootSlot::Cycle | RootSlot::DepthExceeded) => {
                warn!(item_id = %candidate.id, trace = ?violation, "parent chain is malformed; skipping item");
                report.invariant_violations += 1;
                report.non_managed_skipped += 1;
                continue;
            }
        }

        let mut copy = candidate.clone();
        match candidate.parent_id() {
            Some(parent) if parent == snapshot_root.id => {
                copy.parent_id = Some(profile_root.id.clone());
            }
            Some(parent) => {
                if let Some(&live_id) = aliases.get(parent) {
                    copy.parent_id = Some(live_id.to_string());
                }
            }
            None => {}
        }
        present.insert(copy.id.clone());
        items.push(copy);
        report.added += 1;
    }

    debug!(
        added = report.added,
        removed = report.removed,
        duplicates = report.duplicates,
        skipped = report.non_managed_skipped,
        "restoration computed"
    );

    Ok(RestoreOutcome {
        items,
        equipment_id: profile_root.id.clone(),
        report,
    })
}

/// Structural checks on a restored item list. Returns one message per violation.
pub fn check_invariants(before: &[Item], after: &[Item], equipment_id: &str) -> Vec<String> {
    let mut problems = Vec::new();

    let roots: Vec<&Item> = after.iter().filter(|i| i.is_equipment_root()).collect();
    if !roots.iter().any(|root| root.id == equipment_id) {
        problems.push(format!("equipment root {equipment_id} is missing"));
    }

    let mut ids = HashSet::with_capacity(after.len());
    for item in after {
        if !ids.insert(item.id.as_str()) {
            problems.push(format!("duplicate id {}", item.id));
        }
    }

    for item in before {
        if item.parent_id() == Some(equipment_id)
            && item.slot_id().is_some_and(is_permanent_slot)
            && !ids.contains(item.id.as_str())
        {
            problems.push(format!(
                "permanent container {} in {} was removed",
                item.id,
                item.slot_id().unwrap_or_default()
            ));
        }
    }

    let before_ids: HashSet<&str> = before.iter().map(|i| i.id.as_str()).collect();
    let orphaned_before: HashSet<&str> = before
        .iter()
        .filter(|i| i.parent_id().is_some_and(|p| !before_ids.contains(p)))
        .map(|i| i.id.as_str())
        .collect();
    for item in after {
        if item.is_equipment_root() {
            continue;
        }
        if let Some(parent) = item.parent_id() {
            if !ids.contains(parent) && !orphaned_before.contains(item.id.as_str()) {
                problems.push(format!("item {} points at missing parent {parent}", item.id));
            }
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EQUIPMENT_TEMPLATE_ID;

    fn eq(id: &str) -> Item {
        Item::equipment_root(id)
    }

    fn child(id: &str, parent: &str, slot: &str) -> Item {
        Item::new(id, format!("tpl_{id}")).with_parent(parent, slot)
    }

    fn slots(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn ids(items: &[Item]) -> HashSet<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    fn run(
        profile: &[Item],
        snapshot: &[Item],
        included: Option<&[String]>,
        empty: &[String],
    ) -> RestoreOutcome {
        restore_inventory(RestoreRequest {
            profile_items: profile,
            snapshot_items: snapshot,
            included_slots: included,
            empty_slots: empty,
        })
        .expect("restore")
    }

    #[test]
    fn managed_slot_replaces_current_item() {
        let profile = vec![eq("E"), child("w_live", "E", "FirstPrimaryWeapon")];
        let snapshot = vec![eq("E2"), child("w_snap", "E2", "FirstPrimaryWeapon")];
        let included = slots(&["FirstPrimaryWeapon"]);
        let out = run(&profile, &snapshot, Some(included.as_slice()), &[]);

        let got = ids(&out.items);
        assert!(got.contains("E") && got.contains("w_snap"));
        assert!(!got.contains("w_live"));
        let restored = out.items.iter().find(|i| i.id == "w_snap").expect("w_snap");
        assert_eq!(restored.parent_id(), Some("E"));
        assert_eq!(out.report.added, 1);
        assert_eq!(out.report.removed, 1);
        assert!(check_invariants(&profile, &out.items, "E").is_empty());
    }

    #[test]
    fn secured_container_contents_are_managed_but_container_kept() {
        let profile = vec![
            eq("E"),
            child("gamma", "E", "SecuredContainer"),
            child("junk", "gamma", "main"),
        ];
        let snapshot = vec![eq("E")];
        let included = slots(&["SecuredContainer"]);
        let out = run(&profile, &snapshot, Some(included.as_slice()), &[]);

        let got = ids(&out.items);
        assert!(got.contains("gamma"));
        assert!(!got.contains("junk"));
        assert_eq!(out.report.added, 0);
        assert_eq!(out.report.removed, 1);
    }

    #[test]
    fn pockets_contents_are_replaced_by_snapshot_state() {
        let profile = vec![
            eq("E"),
            child("pockets", "E", "Pockets"),
            child("used_medkit", "pockets", "pocket1"),
            child("looted", "pockets", "pocket2"),
        ];
        let snapshot = vec![
            eq("E"),
            child("pockets", "E", "Pockets"),
            child("used_medkit", "pockets", "pocket1"),
        ];
        let included = slots(&["Pockets"]);
        let out = run(&profile, &snapshot, Some(included.as_slice()), &[]);

        let got = ids(&out.items);
        assert!(got.contains("pockets"));
        assert!(got.contains("used_medkit"));
        assert!(!got.contains("looted"));
        assert_eq!(out.report.duplicates, 1);
        assert_eq!(out.items.iter().filter(|i| i.id == "pockets").count(), 1);
        assert!(check_invariants(&profile, &out.items, "E").is_empty());
    }

    #[test]
    fn unmanaged_slot_is_untouched() {
        let profile = vec![
            eq("E"),
            child("backpack", "E", "Backpack"),
            child("weapon", "E", "FirstPrimaryWeapon"),
        ];
        let snapshot = vec![
            eq("E"),
            child("snap_weapon", "E", "FirstPrimaryWeapon"),
            child("snap_backpack", "E", "Backpack"),
        ];
        let included = slots(&["FirstPrimaryWeapon"]);
        let out = run(&profile, &snapshot, Some(included.as_slice()), &[]);

        let got = ids(&out.items);
        assert!(got.contains("backpack"));
        assert!(got.contains("snap_weapon"));
        assert!(!got.contains("weapon"));
        assert!(!got.contains("snap_backpack"));
        assert_eq!(out.report.non_managed_skipped, 1);
    }

    #[test]
    fn empty_included_slots_is_a_no_op() {
        let profile = vec![
            eq("E"),
            child("backpack", "E", "Backpack"),
            child("weapon", "E", "FirstPrimaryWeapon"),
        ];
        let snapshot = vec![eq("E"), child("snap_weapon", "E", "FirstPrimaryWeapon")];
        let included: Vec<String> = Vec::new();
        let out = run(&profile, &snapshot, Some(included.as_slice()), &[]);

        assert_eq!(out.items, profile);
        assert_eq!(out.report.added, 0);
        assert_eq!(out.report.removed, 0);
        assert_eq!(out.report.policy, "explicit-none");
    }

    #[test]
    fn managed_children_of_every_equipment_root_are_removed() {
        let profile = vec![eq("E1"), eq("E2"), child("w", "E2", "FirstPrimaryWeapon")];
        let snapshot = vec![eq("E1")];
        let included = slots(&["FirstPrimaryWeapon"]);
        let out = run(&profile, &snapshot, Some(included.as_slice()), &[]);

        assert!(!ids(&out.items).contains("w"));
        assert_eq!(out.equipment_id, "E1");
    }

    #[test]
    fn missing_profile_root_is_an_error() {
        let profile = vec![child("w", "E", "FirstPrimaryWeapon")];
        let snapshot = vec![eq("E")];
        let err = restore_inventory(RestoreRequest {
            profile_items: &profile,
            snapshot_items: &snapshot,
            included_slots: None,
            empty_slots: &[],
        })
        .expect_err("no root");
        assert_eq!(err, RestoreError::MissingEquipmentRoot);
    }

    #[test]
    fn legacy_snapshot_manages_snapshot_and_empty_slots() {
        let profile = vec![
            eq("E"),
            child("helmet_loot", "E", "Headwear"),
            child("rig_live", "E", "TacticalVest"),
            child("bp_live", "E", "Backpack"),
        ];
        let snapshot = vec![eq("E"), child("rig_snap", "E", "TacticalVest")];
        let empty = slots(&["Headwear"]);
        let out = run(&profile, &snapshot, None, &empty);

        let got = ids(&out.items);
        assert!(!got.contains("helmet_loot"));
        assert!(!got.contains("rig_live"));
        assert!(got.contains("rig_snap"));
        assert!(got.contains("bp_live"));
        assert_eq!(out.report.policy, "legacy");
        assert!(out.report.managed_slots.contains("headwear"));
    }

    #[test]
    fn legacy_and_modern_snapshots_restore_identically() {
        let profile = vec![
            eq("E"),
            child("w_live", "E", "FirstPrimaryWeapon"),
            child("bp_live", "E", "Backpack"),
            child("loot", "bp_live", "main"),
            child("vest_live", "E", "ArmorVest"),
        ];
        let snapshot = vec![
            eq("E"),
            child("w_snap", "E", "FirstPrimaryWeapon"),
            child("bp_snap", "E", "Backpack"),
            child("kit", "bp_snap", "main"),
        ];
        let legacy = run(&profile, &snapshot, None, &[]);
        let included = slots(&["FirstPrimaryWeapon", "Backpack"]);
        let modern = run(&profile, &snapshot, Some(included.as_slice()), &[]);
        assert_eq!(legacy.items, modern.items);
        assert_eq!(legacy.report.managed_slots, modern.report.managed_slots);
        assert!(ids(&modern.items).contains("vest_live"));
    }

    #[test]
    fn slot_names_match_case_insensitively() {
        let profile = vec![eq("E"), child("w_live", "E", "firstprimaryweapon")];
        let snapshot = vec![eq("E"), child("w_snap", "E", "FIRSTPRIMARYWEAPON")];
        let included = slots(&["FirstPrimaryWeapon"]);
        let out = run(&profile, &snapshot, Some(included.as_slice()), &[]);
        let got = ids(&out.items);
        assert!(got.contains("w_snap") && !got.contains("w_live"));
    }

    #[test]
    fn snapshot_cycles_are_skipped_and_flagged() {
        let profile = vec![eq("E"), child("bp", "E", "Backpack")];
        let snapshot = vec![
            eq("E"),
            child("bp_snap", "E", "Backpack"),
            child("a", "b", "main"),
            child("b", "a", "main"),
        ];
        let included = slots(&["Backpack"]);
        let out = run(&profile, &snapshot, Some(included.as_slice()), &[]);

        let got = ids(&out.items);
        assert!(got.contains("bp_snap"));
        assert!(!got.contains("a") && !got.contains("b"));
        assert_eq!(out.report.invariant_violations, 2);
        assert!(check_invariants(&profile, &out.items, "E").is_empty());
    }

    #[test]
    fn profile_cycles_terminate() {
        let profile = vec![
            eq("E"),
            child("bp", "E", "Backpack"),
            child("x", "y", "main"),
            child("y", "x", "main"),
            child("inner", "bp", "main"),
        ];
        let snapshot = vec![eq("E")];
        let included = slots(&["Backpack"]);
        let out = run(&profile, &snapshot, Some(included.as_slice()), &[]);
        let got = ids(&out.items);
        assert!(!got.contains("bp") && !got.contains("inner"));
        assert!(got.contains("x") && got.contains("y"));
    }

    #[test]
    fn equipment_root_is_never_removed_or_duplicated() {
        // The snapshot root shares the profile root id and even claims a parent.
        let mut legacy_root = eq("E");
        legacy_root.parent_id = Some("E".to_string());
        legacy_root.slot_id = Some("pmc-session".to_string());
        let profile = vec![eq("E"), child("w", "E", "Holster")];
        let snapshot = vec![legacy_root, child("w2", "E", "Holster")];
        let out = run(&profile, &snapshot, None, &[]);

        let roots: Vec<&Item> = out.items.iter().filter(|i| i.tpl == EQUIPMENT_TEMPLATE_ID).collect();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].id, "E");
        assert!(ids(&out.items).contains("w2"));
    }

    #[test]
    fn permanent_container_with_new_id_absorbs_snapshot_contents() {
        let profile = vec![
            eq("E"),
            child("sc_live", "E", "SecuredContainer"),
            child("junk", "sc_live", "main"),
        ];
        let snapshot = vec![
            eq("E"),
            child("sc_old", "E", "SecuredContainer"),
            child("keycard", "sc_old", "main"),
        ];
        let included = slots(&["SecuredContainer"]);
        let out = run(&profile, &snapshot, Some(included.as_slice()), &[]);

        let got = ids(&out.items);
        assert!(got.contains("sc_live"));
        assert!(!got.contains("sc_old"));
        assert!(!got.contains("junk"));
        let keycard = out.items.iter().find(|i| i.id == "keycard").expect("keycard");
        assert_eq!(keycard.parent_id(), Some("sc_live"));
        assert_eq!(out.report.containers_merged, 1);
        assert!(check_invariants(&profile, &out.items, "E").is_empty());
    }

    #[test]
    fn unmanaged_permanent_containers_keep_their_contents() {
        let profile = vec![
            eq("E"),
            child("pockets", "E", "Pockets"),
            child("loot", "pockets", "pocket1"),
        ];
        let snapshot = vec![eq("E"), child("pockets", "E", "Pockets")];
        let included = slots(&["Backpack"]);
        let out = run(&profile, &snapshot, Some(included.as_slice()), &[]);
        assert!(ids(&out.items).contains("loot"));
        assert_eq!(out.report.removed, 0);
    }

    #[test]
    fn items_outside_equipment_are_untouched() {
        let profile = vec![
            eq("E"),
            Item::new("stash", "stash_tpl"),
            child("stash_gun", "stash", "hideout"),
            child("w", "E", "Holster"),
        ];
        let snapshot = vec![eq("E"), child("w", "E", "Holster")];
        let included = slots(&["Holster"]);
        let out = run(&profile, &snapshot, Some(included.as_slice()), &[]);
        let got = ids(&out.items);
        assert!(got.contains("stash") && got.contains("stash_gun") && got.contains("w"));
        assert_eq!(out.report.removed, 1);
        assert_eq!(out.report.added, 1);
    }

    #[test]
    fn universal_invariants_hold_across_policies() {
        let profile = vec![
            eq("E"),
            child("sc", "E", "SecuredContainer"),
            child("sc_item", "sc", "main"),
            child("pk", "E", "Pockets"),
            child("pk_item", "pk", "pocket1"),
            child("bp", "E", "Backpack"),
            child("bp_item", "bp", "main"),
            child("knife", "E", "Scabbard"),
        ];
        let snapshot = vec![
            eq("E"),
            child("sc", "E", "SecuredContainer"),
            child("pk", "E", "Pockets"),
            child("pk_snap", "pk", "pocket1"),
            child("bp2", "E", "Backpack"),
            child("bp2_item", "bp2", "main"),
        ];
        let everything: Vec<String> = crate::value_objects::EquipmentSlot::ALL
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();
        let nothing: Vec<String> = Vec::new();
        let some = slots(&["Pockets", "Backpack"]);
        let cases: [Option<&[String]>; 4] = [
            None,
            Some(nothing.as_slice()),
            Some(some.as_slice()),
            Some(everything.as_slice()),
        ];
        for included in cases {
            let out = run(&profile, &snapshot, included, &[]);
            let problems = check_invariants(&profile, &out.items, "E");
            assert!(problems.is_empty(), "{included:?}: {problems:?}");
            let got = ids(&out.items);
            assert!(got.contains("sc") && got.contains("pk"));
            assert_eq!(got.len(), out.items.len());
        }
    }
}
