// Raid exit status value object

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaidExitStatus {
    Survived,
    Runner,
    Transit,
    Killed,
    Left,
    MissingInAction,
    Unknown,
}

impl RaidExitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RaidExitStatus::Survived => "Survived",
            RaidExitStatus::Runner => "Runner",
            RaidExitStatus::Transit => "Transit",
            RaidExitStatus::Killed => "Killed",
            RaidExitStatus::Left => "Left",
            RaidExitStatus::MissingInAction => "MissingInAction",
            RaidExitStatus::Unknown => "Unknown",
        }
    }

    pub fn is_extraction(&self) -> bool {
        matches!(
            self,
            RaidExitStatus::Survived | RaidExitStatus::Runner | RaidExitStatus::Transit
        )
    }

    pub fn is_death(&self) -> bool {
        matches!(
            self,
            RaidExitStatus::Killed | RaidExitStatus::Left | RaidExitStatus::MissingInAction
        )
    }
}

impl From<&str> for RaidExitStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "survived" => RaidExitStatus::Survived,
            "runner" | "run-through" | "runthrough" => RaidExitStatus::Runner,
            "transit" => RaidExitStatus::Transit,
            "killed" => RaidExitStatus::Killed,
            "left" => RaidExitStatus::Left,
            "missinginaction" | "mia" => RaidExitStatus::MissingInAction,
            _ => RaidExitStatus::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_exit_statuses() {
        assert!(RaidExitStatus::from("SURVIVED").is_extraction());
        assert!(RaidExitStatus::from("runner").is_extraction());
        assert!(RaidExitStatus::from("Killed").is_death());
        assert!(RaidExitStatus::from("mia").is_death());
        let unknown = RaidExitStatus::from("fled");
        assert_eq!(unknown, RaidExitStatus::Unknown);
        assert!(!unknown.is_death() && !unknown.is_extraction());
    }
}
