pub mod profile_files;
pub mod snapshot_files;

pub use profile_files::*;
pub use snapshot_files::*;
