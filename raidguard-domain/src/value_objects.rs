// Domain value objects
pub mod equipment_slot;
pub mod exit_status;
pub mod identifiers;
pub mod slot_policy;

pub use equipment_slot::*;
pub use exit_status::*;
pub use identifiers::*;
pub use slot_policy::*;
