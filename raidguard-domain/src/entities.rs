// Domain entities

pub mod item;
pub mod live_inventory;
pub mod restore_report;
pub mod runtime_config;
pub mod snapshot;
pub mod upd;

pub use item::*;
pub use live_inventory::*;
pub use restore_report::*;
pub use runtime_config::*;
pub use snapshot::*;
pub use upd::*;
