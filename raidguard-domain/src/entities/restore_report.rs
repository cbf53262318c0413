// Restoration report entity

use serde::Serialize;

use crate::value_objects::SlotSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub policy: &'static str,
    pub added: usize,
    pub removed: usize,
    pub duplicates: usize,
    pub non_managed_skipped: usize,
    /// Snapshot permanent containers folded onto the live container in the same slot.
    pub containers_merged: usize,
    /// Parent-chain traces that hit a cycle or the depth bound.
    pub invariant_violations: usize,
    pub managed_slots: SlotSet,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeathPenaltyReport {
    pub removed: usize,
    pub spared_slots: SlotSet,
}
