// Raidguard Application Layer

pub mod commands;
pub mod error;
pub mod ops;
pub mod queries;
pub mod state;

pub use error::AppError;
pub use ops::CoordinationTable;
pub use state::AppState;

#[cfg(test)]
pub(crate) mod testing;
