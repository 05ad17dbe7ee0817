//! Backup persistence
//!
//! `BackupStore` is the seam to wherever backup records are kept. The local
//! implementation keeps one JSON document per backup under the store
//! directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::file_io::{ensure_private_dir, read_json_required, write_json_atomic};
use crate::error::{SshVaultError, SshVaultResult};
use crate::models::BackupData;

const MAX_NAME_LEN: usize = 128;

/// Metadata about a stored backup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub hostname: String,
    pub file_count: usize,
    pub encrypted: bool,
    pub size_bytes: u64,
}

/// Storage backend for backup records
pub trait BackupStore {
    /// Store a backup under `name`, replacing any existing one
    fn save(&self, name: &str, backup: &BackupData) -> SshVaultResult<()>;

    /// Load the backup stored under `name`
    fn load(&self, name: &str) -> SshVaultResult<BackupData>;

    /// All stored backups, newest first
    fn list(&self) -> SshVaultResult<Vec<BackupInfo>>;

    /// Remove the backup stored under `name`
    fn delete(&self, name: &str) -> SshVaultResult<()>;
}

/// Backup names become filenames, so keep them to a safe alphabet
pub fn validate_name(name: &str) -> SshVaultResult<()> {
    if name.is_empty() {
        return Err(SshVaultError::Validation("Backup name cannot be empty".into()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(SshVaultError::Validation(format!(
            "Backup name too long (max {} characters)",
            MAX_NAME_LEN
        )));
    }
    if name.starts_with('.')
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(SshVaultError::Validation(format!(
            "Invalid backup name '{}': use letters, digits, '-', '_' and '.'",
            name
        )));
    }
    Ok(())
}

/// Fields read when listing, without decoding any file content
#[derive(Deserialize)]
struct BackupHeader {
    timestamp: DateTime<Utc>,
    hostname: String,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

/// Keeps each backup as `<name>.json` in one directory
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> SshVaultResult<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{}.json", name)))
    }

    fn parse_info(path: &Path) -> Option<BackupInfo> {
        let name = path.file_stem()?.to_str()?.to_string();
        let size_bytes = fs::metadata(path).ok()?.len();

        let header: BackupHeader = match read_json_required(path) {
            Ok(h) => h,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping unreadable backup");
                return None;
            }
        };

        Some(BackupInfo {
            name,
            created_at: header.timestamp,
            hostname: header.hostname,
            file_count: header
                .metadata
                .get("file_count")
                .and_then(|c| c.parse().ok())
                .unwrap_or(0),
            encrypted: header.metadata.get("encrypted").map(String::as_str) == Some("true"),
            size_bytes,
        })
    }
}

impl BackupStore for JsonFileStore {
    fn save(&self, name: &str, backup: &BackupData) -> SshVaultResult<()> {
        let path = self.path_for(name)?;
        ensure_private_dir(&self.dir)?;
        write_json_atomic(&path, backup)?;
        info!(name, path = %path.display(), "backup stored");
        Ok(())
    }

    fn load(&self, name: &str) -> SshVaultResult<BackupData> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Err(SshVaultError::backup_not_found(name));
        }
        debug!(name, path = %path.display(), "loading backup");
        read_json_required(&path)
    }

    fn list(&self) -> SshVaultResult<Vec<BackupInfo>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(|e| {
            SshVaultError::Storage(format!("Failed to read backup directory: {}", e))
        })? {
            let path = entry
                .map_err(|e| SshVaultError::Storage(format!("Failed to read directory entry: {}", e)))?
                .path();

            if path.extension().map_or(false, |ext| ext == "json") {
                if let Some(info) = Self::parse_info(&path) {
                    backups.push(info);
                }
            }
        }

        // Sort by date, newest first
        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.name.cmp(&b.name)));
        Ok(backups)
    }

    fn delete(&self, name: &str) -> SshVaultResult<()> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Err(SshVaultError::backup_not_found(name));
        }
        fs::remove_file(&path)
            .map_err(|e| SshVaultError::Storage(format!("Failed to delete backup: {}", e)))?;
        info!(name, "backup deleted");
        Ok(())
    }
}
