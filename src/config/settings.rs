//! User settings for sshvault
//!
//! Manages the KDF strength, the default SSH directory, the log level, and
//! the ordered classification rules.

use serde::{Deserialize, Serialize};

use super::paths::VaultPaths;
use crate::classify::enhancer::{
    default_purpose_rules, default_service_rules, validate_rules, PurposeRule, ServiceRule,
};
use crate::classify::ClassificationEnhancer;
use crate::crypto::key_derivation::{validate_iterations, DEFAULT_ITERATIONS};
use crate::crypto::EncryptionEngine;
use crate::error::SshVaultError;
use crate::storage::file_io::write_json_atomic;

/// User settings for sshvault
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// PBKDF2 iterations for new encryptions
    #[serde(default = "default_iterations")]
    pub kdf_iterations: u32,

    /// SSH directory to back up when none is given (defaults to ~/.ssh)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error, off)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Service patterns, first match wins
    #[serde(default = "default_service_rules")]
    pub service_patterns: Vec<ServiceRule>,

    /// Purpose rules, first match wins
    #[serde(default = "default_purpose_rules")]
    pub purpose_rules: Vec<PurposeRule>,
}

fn default_schema_version() -> u32 {
    1
}

fn default_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            kdf_iterations: default_iterations(),
            ssh_dir: None,
            log_level: default_log_level(),
            service_patterns: default_service_rules(),
            purpose_rules: default_purpose_rules(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &VaultPaths) -> Result<Self, SshVaultError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            // Don't save yet - let caller decide when to persist
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| SshVaultError::Io(format!("Failed to read settings file: {}", e)))?;

        let settings: Settings = serde_json::from_str(&contents)
            .map_err(|e| SshVaultError::Config(format!("Failed to parse settings file: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self, paths: &VaultPaths) -> Result<(), SshVaultError> {
        paths.ensure_directories()?;
        write_json_atomic(paths.settings_file(), self)
    }

    /// Reject out-of-range iteration counts and malformed patterns
    pub fn validate(&self) -> Result<(), SshVaultError> {
        validate_iterations(self.kdf_iterations)
            .map_err(|e| SshVaultError::Config(format!("kdf_iterations: {}", e)))?;
        validate_rules(&self.service_patterns, &self.purpose_rules)
    }

    /// Encryption engine configured with these settings
    pub fn encryption_engine(&self) -> Result<EncryptionEngine, SshVaultError> {
        EncryptionEngine::new(self.kdf_iterations)
    }

    /// Classification enhancer built from the configured rules
    pub fn enhancer(&self) -> ClassificationEnhancer {
        ClassificationEnhancer::new(&self.service_patterns, &self.purpose_rules)
    }
}
