// Domain services
// Pure functions over the item graph: capture, encode, restore

pub mod capture;
pub mod death_penalty;
pub mod item_graph;
pub mod restorer;
pub mod snapshot_codec;
pub mod trace;

pub use capture::*;
pub use death_penalty::*;
pub use item_graph::*;
pub use restorer::*;
pub use snapshot_codec::*;
pub use trace::*;
