pub mod context;
pub mod lifecycle;

pub use lifecycle::{init_logging, run, Command};
