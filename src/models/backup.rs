//! Backup record models
//!
//! `BackupData` is the unit handed to the backup store. Each file travels as
//! a `FileData` holding either its plaintext (base64 on the wire) or its
//! `EncryptedData`, never both once encrypted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::detection::DetectionResult;
use super::key::KeyInfo;
use crate::crypto::{validate_passphrase, EncryptedData, EncryptionEngine, SecureBytes};
use crate::error::{SshVaultError, SshVaultResult};

/// Current backup record version
pub const BACKUP_VERSION: &str = "1.0";

/// Metadata key marking an encrypted record
pub const META_ENCRYPTED: &str = "encrypted";

/// Hex SHA-256 of `content`
pub fn compute_checksum(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// One backed-up file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileData {
    pub filename: String,

    /// Plaintext, present until encryption and again after decryption
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "content_base64"
    )]
    pub content: Option<SecureBytes>,

    /// POSIX mode bits, stored as a plain integer
    pub permissions: u32,

    pub size: u64,

    pub mod_time: DateTime<Utc>,

    /// Hex SHA-256 of the plaintext
    pub checksum: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_info: Option<KeyInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<EncryptedData>,
}

impl FileData {
    /// Wrap freshly read content, computing its checksum
    pub fn new(content: SecureBytes, key_info: KeyInfo) -> Self {
        Self {
            filename: key_info.filename.clone(),
            checksum: compute_checksum(&content),
            content: Some(content),
            permissions: key_info.permissions,
            size: key_info.size,
            mod_time: key_info.mod_time,
            key_info: Some(key_info),
            encrypted: None,
        }
    }

    /// Recompute the checksum of the plaintext and compare
    pub fn validate_integrity(&self) -> SshVaultResult<()> {
        let content = self.content.as_ref().ok_or_else(|| {
            SshVaultError::Validation(format!(
                "No plaintext content for '{}' to verify",
                self.filename
            ))
        })?;

        if compute_checksum(content) != self.checksum {
            return Err(SshVaultError::integrity(&self.filename));
        }
        Ok(())
    }

    /// Move the plaintext into an `EncryptedData`
    ///
    /// Empty files have nothing to protect and stay as empty plaintext.
    pub fn encrypt(&mut self, engine: &EncryptionEngine, passphrase: &str) -> SshVaultResult<()> {
        let content = self.content.take().ok_or_else(|| {
            SshVaultError::Validation(format!("No plaintext content for '{}'", self.filename))
        })?;

        if content.is_empty() {
            debug!(file = %self.filename, "empty file left unencrypted");
            self.content = Some(content);
            return Ok(());
        }

        match engine.encrypt(&content, passphrase) {
            Ok(encrypted) => {
                self.encrypted = Some(encrypted);
                Ok(())
            }
            Err(e) => {
                self.content = Some(content);
                Err(e)
            }
        }
    }

    /// Restore the plaintext from `encrypted` and verify its checksum
    pub fn decrypt(&mut self, engine: &EncryptionEngine, passphrase: &str) -> SshVaultResult<()> {
        let Some(encrypted) = &self.encrypted else {
            return Ok(());
        };

        let plaintext = engine.decrypt(encrypted, passphrase)?;
        self.content = Some(plaintext);
        self.encrypted = None;
        self.validate_integrity()
    }

    /// Key type of this file, `Unknown` when it was never classified
    pub fn key_type(&self) -> crate::models::KeyType {
        self.key_info
            .as_ref()
            .map_or(crate::models::KeyType::Unknown, |k| k.key_type)
    }
}

/// The persisted backup record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupData {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub hostname: String,
    pub username: String,
    pub ssh_dir: String,
    pub ssh_dir_normalized: String,
    pub files: BTreeMap<String, FileData>,
    pub analysis: DetectionResult,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl BackupData {
    /// True if any file still carries ciphertext
    pub fn is_encrypted(&self) -> bool {
        self.files.values().any(|f| f.encrypted.is_some())
    }

    /// Encrypt every file under one passphrase, each with its own salt and IV
    pub fn encrypt_files(&mut self, engine: &EncryptionEngine, passphrase: &str) -> SshVaultResult<()> {
        validate_passphrase(passphrase)?;

        for file in self.files.values_mut() {
            if file.encrypted.is_none() {
                file.encrypt(engine, passphrase)?;
            }
        }

        self.metadata
            .insert(META_ENCRYPTED.to_string(), "true".to_string());
        Ok(())
    }

    /// Decrypt every file and verify each checksum
    pub fn decrypt_files(&mut self, engine: &EncryptionEngine, passphrase: &str) -> SshVaultResult<()> {
        validate_passphrase(passphrase)?;

        for file in self.files.values_mut() {
            file.decrypt(engine, passphrase)?;
        }

        self.metadata
            .insert(META_ENCRYPTED.to_string(), "false".to_string());
        Ok(())
    }

    /// Check that `files` matches the analysis and every plaintext checksum
    pub fn validate(&self) -> SshVaultResult<()> {
        let analysed: Vec<&str> = self.analysis.filenames().collect();
        let stored: Vec<&str> = self.files.keys().map(String::as_str).collect();
        if analysed != stored {
            return Err(SshVaultError::Validation(
                "Backup files do not match the recorded analysis".into(),
            ));
        }

        for file in self.files.values() {
            if file.content.is_some() {
                file.validate_integrity()?;
            } else if file.encrypted.is_none() {
                return Err(SshVaultError::Validation(format!(
                    "'{}' has neither content nor ciphertext",
                    file.filename
                )));
            }
        }
        Ok(())
    }
}

/// Plaintext content as base64
mod content_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::crypto::SecureBytes;

    pub fn serialize<S>(content: &Option<SecureBytes>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match content {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes.as_bytes())),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SecureBytes>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|s| {
                STANDARD
                    .decode(s)
                    .map(SecureBytes::new)
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
    }
}
