// Repository port traits
// Define what the domain needs from infrastructure

pub mod repositories;

pub use repositories::*;
