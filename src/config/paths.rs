//! Path management for sshvault
//!
//! Provides XDG-compliant path resolution for configuration and the local
//! backup store.
//!
//! ## Path Resolution Order
//!
//! 1. `SSHVAULT_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/sshvault` or `~/.config/sshvault`
//! 3. Windows: `%APPDATA%\sshvault`

use std::path::PathBuf;

use directories::BaseDirs;

use crate::error::SshVaultError;
use crate::storage::file_io::ensure_private_dir;

/// Environment variable overriding the base directory
pub const BASE_DIR_ENV: &str = "SSHVAULT_DIR";

/// Manages all paths used by sshvault
#[derive(Debug, Clone)]
pub struct VaultPaths {
    /// Base directory for all sshvault data
    base_dir: PathBuf,
}

impl VaultPaths {
    /// Create a new VaultPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, SshVaultError> {
        let base_dir = match std::env::var(BASE_DIR_ENV) {
            Ok(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create VaultPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.config/sshvault/ or equivalent)
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the local backup store directory (~/.config/sshvault/backups/)
    pub fn store_dir(&self) -> PathBuf {
        self.base_dir.join("backups")
    }

    /// Ensure the base directory exists and is owner-only
    pub fn ensure_directories(&self) -> Result<(), SshVaultError> {
        ensure_private_dir(&self.base_dir)
    }
}

/// The conventional SSH directory of the current user
pub fn default_ssh_dir() -> Result<PathBuf, SshVaultError> {
    let dirs = BaseDirs::new()
        .ok_or_else(|| SshVaultError::Config("Could not determine home directory".into()))?;
    Ok(dirs.home_dir().join(".ssh"))
}

/// Resolve the default base directory based on platform
fn resolve_default_path() -> Result<PathBuf, SshVaultError> {
    // config_dir honours XDG_CONFIG_HOME on Linux and APPDATA on Windows
    let dirs = BaseDirs::new()
        .ok_or_else(|| SshVaultError::Config("Could not determine home directory".into()))?;
    Ok(dirs.config_dir().join("sshvault"))
}
