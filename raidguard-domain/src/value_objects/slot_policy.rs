// Slot management policy

use crate::value_objects::SlotSet;

/// Which root slots a snapshot manages.
///
/// The three shapes of `includedSlots` on disk map to the three variants:
/// `null` is a legacy snapshot, `[]` is an explicit opt-out, anything else is the
/// list the player enabled at capture time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotPolicy {
    /// Managed iff the slot held an item in the snapshot or was recorded empty.
    Legacy(SlotSet),
    ExplicitNone,
    Managed(SlotSet),
}

impl SlotPolicy {
    pub fn resolve<'a>(
        included_slots: Option<&[String]>,
        empty_slots: &[String],
        snapshot_slots: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        match included_slots {
            None => {
                let mut slots: SlotSet = snapshot_slots.into_iter().collect();
                for slot in empty_slots {
                    slots.insert(slot.as_str());
                }
                SlotPolicy::Legacy(slots)
            }
            Some([]) => SlotPolicy::ExplicitNone,
            Some(list) => SlotPolicy::Managed(list.iter().collect()),
        }
    }

    pub fn is_managed(&self, slot: &str) -> bool {
        match self {
            SlotPolicy::Legacy(slots) | SlotPolicy::Managed(slots) => slots.contains(slot),
            SlotPolicy::ExplicitNone => false,
        }
    }

    pub fn managed_slots(&self) -> SlotSet {
        match self {
            SlotPolicy::Legacy(slots) | SlotPolicy::Managed(slots) => slots.clone(),
            SlotPolicy::ExplicitNone => SlotSet::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SlotPolicy::Legacy(_) => "legacy",
            SlotPolicy::ExplicitNone => "explicit-none",
            SlotPolicy::Managed(_) => "managed",
        }
    }
}
