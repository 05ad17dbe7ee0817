//! Custom error types for sshvault
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for sshvault operations
#[derive(Error, Debug)]
pub enum SshVaultError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Input rejected before any I/O or crypto took place
    #[error("Validation error: {0}")]
    Validation(String),

    /// Stored checksum does not match the content
    #[error("Integrity check failed for '{filename}': checksum mismatch")]
    Integrity { filename: String },

    /// Encryption errors (randomness, cipher construction)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// GCM tag verification failed: wrong passphrase or tampered data
    #[error("Decryption failed: invalid passphrase or corrupted data")]
    Decryption,

    /// Restored files with insecure permissions
    #[error("Permission verification failed: {critical} critical, {warnings} warning issue(s)")]
    Permission { critical: usize, warnings: usize },

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Backup store errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl SshVaultError {
    /// Create a "not found" error for stored backups
    pub fn backup_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Backup",
            identifier: identifier.into(),
        }
    }

    /// Create an integrity error for a file
    pub fn integrity(filename: impl Into<String>) -> Self {
        Self::Integrity {
            filename: filename.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is an authentication failure on decrypt
    pub fn is_decryption(&self) -> bool {
        matches!(self, Self::Decryption)
    }

    /// Check if this is an integrity failure
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity { .. })
    }
}

impl From<std::io::Error> for SshVaultError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SshVaultError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for sshvault operations
pub type SshVaultResult<T> = Result<T, SshVaultError>;
