// Equipment slot value objects

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EquipmentSlot {
    FirstPrimaryWeapon,
    SecondPrimaryWeapon,
    Holster,
    Scabbard,
    Headwear,
    Earpiece,
    FaceCover,
    ArmorVest,
    Eyewear,
    ArmBand,
    TacticalVest,
    Backpack,
    Pockets,
    SecuredContainer,
    Compass,
    Dogtag,
    SpecialSlot1,
    SpecialSlot2,
    SpecialSlot3,
}

impl EquipmentSlot {
    pub const ALL: [EquipmentSlot; 19] = [
        EquipmentSlot::FirstPrimaryWeapon,
        EquipmentSlot::SecondPrimaryWeapon,
        EquipmentSlot::Holster,
        EquipmentSlot::Scabbard,
        EquipmentSlot::Headwear,
        EquipmentSlot::Earpiece,
        EquipmentSlot::FaceCover,
        EquipmentSlot::ArmorVest,
        EquipmentSlot::Eyewear,
        EquipmentSlot::ArmBand,
        EquipmentSlot::TacticalVest,
        EquipmentSlot::Backpack,
        EquipmentSlot::Pockets,
        EquipmentSlot::SecuredContainer,
        EquipmentSlot::Compass,
        EquipmentSlot::Dogtag,
        EquipmentSlot::SpecialSlot1,
        EquipmentSlot::SpecialSlot2,
        EquipmentSlot::SpecialSlot3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentSlot::FirstPrimaryWeapon => "FirstPrimaryWeapon",
            EquipmentSlot::SecondPrimaryWeapon => "SecondPrimaryWeapon",
            EquipmentSlot::Holster => "Holster",
            EquipmentSlot::Scabbard => "Scabbard",
            EquipmentSlot::Headwear => "Headwear",
            EquipmentSlot::Earpiece => "Earpiece",
            EquipmentSlot::FaceCover => "FaceCover",
            EquipmentSlot::ArmorVest => "ArmorVest",
            EquipmentSlot::Eyewear => "Eyewear",
            EquipmentSlot::ArmBand => "ArmBand",
            EquipmentSlot::TacticalVest => "TacticalVest",
            EquipmentSlot::Backpack => "Backpack",
            EquipmentSlot::Pockets => "Pockets",
            EquipmentSlot::SecuredContainer => "SecuredContainer",
            EquipmentSlot::Compass => "Compass",
            EquipmentSlot::Dogtag => "Dogtag",
            EquipmentSlot::SpecialSlot1 => "SpecialSlot1",
            EquipmentSlot::SpecialSlot2 => "SpecialSlot2",
            EquipmentSlot::SpecialSlot3 => "SpecialSlot3",
        }
    }

    /// Case-insensitive lookup in the slot vocabulary.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|slot| slot.as_str().eq_ignore_ascii_case(value))
    }

    /// The occupant of this slot is never removed by restoration.
    pub fn is_permanent_container(&self) -> bool {
        matches!(self, EquipmentSlot::SecuredContainer | EquipmentSlot::Pockets)
    }

    /// Preserved as a container by the partial death penalty of the late pathway.
    pub fn is_death_preserved(&self) -> bool {
        matches!(
            self,
            EquipmentSlot::SecuredContainer | EquipmentSlot::Pockets | EquipmentSlot::Scabbard
        )
    }
}

impl fmt::Display for EquipmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_permanent_slot(slot: &str) -> bool {
    EquipmentSlot::parse(slot).is_some_and(|slot| slot.is_permanent_container())
}

/// Slot name compared case-insensitively. The original spelling is kept for output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotName(String);

impl SlotName {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn folded(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.bytes().map(|b| b.to_ascii_lowercase())
    }
}

impl PartialEq for SlotName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for SlotName {}

impl Hash for SlotName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.folded() {
            state.write_u8(byte);
        }
        state.write_u8(0xff);
    }
}

impl Ord for SlotName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded().cmp(other.folded())
    }
}

impl PartialOrd for SlotName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SlotName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<&String> for SlotName {
    fn from(value: &String) -> Self {
        Self::new(value.as_str())
    }
}

impl From<EquipmentSlot> for SlotName {
    fn from(value: EquipmentSlot) -> Self {
        Self::new(value.as_str())
    }
}

/// Ordered, case-insensitive set of slot names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotSet(BTreeSet<SlotName>);

impl SlotSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, slot: impl Into<SlotName>) -> bool {
        self.0.insert(slot.into())
    }

    pub fn contains(&self, slot: &str) -> bool {
        self.0.contains(&SlotName::new(slot))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlotName> {
        self.0.iter()
    }

}

impl<S: Into<SlotName>> FromIterator<S> for SlotSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        SlotSet(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for SlotSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(SlotName::as_str).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(
            EquipmentSlot::parse("securedcontainer"),
            Some(EquipmentSlot::SecuredContainer)
        );
        assert_eq!(
            EquipmentSlot::parse(" FIRSTPRIMARYWEAPON "),
            Some(EquipmentSlot::FirstPrimaryWeapon)
        );
        assert_eq!(EquipmentSlot::parse("mod_magazine"), None);
    }

    #[test]
    fn permanent_and_death_preserved_sets_differ_by_scabbard() {
        assert!(EquipmentSlot::Pockets.is_permanent_container());
        assert!(EquipmentSlot::SecuredContainer.is_permanent_container());
        assert!(!EquipmentSlot::Scabbard.is_permanent_container());
        assert!(EquipmentSlot::Scabbard.is_death_preserved());
        assert!(is_permanent_slot("POCKETS"));
        assert!(!is_permanent_slot("Backpack"));
    }

    #[test]
    fn slot_set_ignores_case() {
        let set: SlotSet = ["Backpack", "pockets"].into_iter().collect();
        assert!(set.contains("backpack"));
        assert!(set.contains("Pockets"));
        assert!(!set.contains("Holster"));

        let mut set = set;
        assert!(!set.insert("BACKPACK"));
        assert_eq!(set.len(), 2);
    }
}
