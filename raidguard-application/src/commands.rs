pub mod capture_commands;
pub mod extraction_commands;
pub mod restore_commands;
