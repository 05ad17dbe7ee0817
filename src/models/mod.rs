//! Core data models for sshvault
//!
//! This module contains the data structures shared by detection,
//! classification, encryption and restore: classified keys, scan results,
//! and the persisted backup record.

pub mod backup;
pub mod detection;
pub mod key;

pub use backup::{compute_checksum, BackupData, FileData, BACKUP_VERSION};
pub use detection::{DetectionResult, DetectionSummary};
pub use key::{KeyFormat, KeyInfo, KeyPairInfo, KeyPurpose, KeyType};
