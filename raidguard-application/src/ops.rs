pub mod coordination_table;

pub use coordination_table::*;
