//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the library.

pub mod backup;
pub mod passphrase;
pub mod restore;
pub mod scan;

pub use backup::{
    handle_backup_command, handle_delete_command, handle_list_command, handle_verify_command,
    BackupArgs, DeleteArgs, VerifyArgs,
};
pub use passphrase::{handle_passphrase_command, PassphraseArgs};
pub use restore::{handle_restore_command, RestoreArgs};
pub use scan::{handle_scan_command, ScanArgs};
