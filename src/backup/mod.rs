//! Backup and restore of SSH directories
//!
//! # Architecture
//!
//! - `BackupReader`: reads a directory, classifies every file and builds a
//!   plaintext `BackupData` with a checksum per file
//! - `RestoreEngine`: writes a decrypted `BackupData` back to disk with the
//!   exact captured permissions
//! - `permissions`: mode handling and post-restore verification
//!
//! Encryption sits between the two and is driven through
//! `BackupData::encrypt_files` / `decrypt_files`.
//!
//! # Example
//!
//! ```rust,ignore
//! use sshvault::backup::{BackupReader, RestoreEngine, RestoreOptions};
//!
//! let mut backup = reader.read_directory(&ssh_dir)?;
//! backup.encrypt_files(&engine, &passphrase)?;
//!
//! // Later
//! backup.decrypt_files(&engine, &passphrase)?;
//! let report = RestoreEngine::default().restore_backup(&backup, &target, &RestoreOptions::default())?;
//! println!("{}", report.summary());
//! ```

pub mod permissions;
mod reader;
mod restore;

pub use permissions::{PermissionIssue, Severity};
pub use reader::{validate_backup, validate_directory, validate_integrity, BackupReader};
pub use restore::{
    ConflictPrompt, RestoreEngine, RestoreOptions, RestoreOutcome, RestoreReport, SkipReason,
    StdinPrompt,
};
