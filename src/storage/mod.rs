//! Storage layer for sshvault
//!
//! Provides JSON file storage with atomic owner-only writes and the
//! `BackupStore` seam used by the command line.

pub mod file_io;
pub mod store;

pub use file_io::{read_json_required, write_json_atomic};
pub use store::{validate_name, BackupInfo, BackupStore, JsonFileStore};
