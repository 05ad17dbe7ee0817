//! Directory reader
//!
//! Reads an SSH directory into a `BackupData`: list, read, detect, classify,
//! pair, checksum. Files that cannot be read are logged and left out; the
//! scan as a whole still succeeds.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::permissions::mode_of;
use crate::classify::{match_pairs, ClassificationEnhancer};
use crate::crypto::SecureBytes;
use crate::detect::{DetectorChain, FileMeta};
use crate::error::{SshVaultError, SshVaultResult};
use crate::models::{BackupData, DetectionResult, FileData, KeyInfo, BACKUP_VERSION};
use crate::normalize::PathNormalizer;

/// A file that made it through reading
struct ReadFile {
    name: String,
    content: SecureBytes,
    meta: FileMeta,
}

/// Builds backup records from a directory
pub struct BackupReader {
    chain: DetectorChain,
    enhancer: ClassificationEnhancer,
    normalizer: PathNormalizer,
}

impl BackupReader {
    pub fn new(
        chain: DetectorChain,
        enhancer: ClassificationEnhancer,
        normalizer: PathNormalizer,
    ) -> Self {
        Self {
            chain,
            enhancer,
            normalizer,
        }
    }

    /// Classify a directory without keeping any content
    pub fn scan(&self, dir: &Path) -> SshVaultResult<DetectionResult> {
        let dir = validate_directory(dir)?;
        let files = read_files(&dir)?;
        let (analysis, _) = self.analyse(files);
        Ok(analysis)
    }

    /// Read a directory into a plaintext backup record
    pub fn read_directory(&self, dir: &Path) -> SshVaultResult<BackupData> {
        let dir = validate_directory(dir)?;
        let files = read_files(&dir)?;
        let (analysis, mut contents) = self.analyse(files);

        let files: BTreeMap<String, FileData> = analysis
            .keys
            .iter()
            .filter_map(|key| {
                let content = contents.remove(&key.filename)?;
                Some((key.filename.clone(), FileData::new(content, key.clone())))
            })
            .collect();

        let mut metadata = BTreeMap::new();
        metadata.insert(
            "tool_version".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        );
        metadata.insert("file_count".to_string(), files.len().to_string());
        metadata.insert("encrypted".to_string(), "false".to_string());

        info!(dir = %dir.display(), files = files.len(), "read SSH directory");

        Ok(BackupData {
            version: BACKUP_VERSION.to_string(),
            timestamp: Utc::now(),
            hostname: hostname(),
            username: username(),
            ssh_dir: dir.to_string_lossy().into_owned(),
            ssh_dir_normalized: self.normalizer.normalize(&dir)?,
            files,
            analysis,
            metadata,
        })
    }

    /// Detect, enhance and pair, handing back contents by filename
    fn analyse(&self, files: Vec<ReadFile>) -> (DetectionResult, BTreeMap<String, SecureBytes>) {
        let mut keys: Vec<KeyInfo> = Vec::with_capacity(files.len());
        let mut contents = BTreeMap::new();
        for file in files {
            let key = self.chain.classify(&file.name, &file.content, &file.meta);
            keys.push(self.enhancer.enhance(key));
            contents.insert(file.name, file.content);
        }

        let pairs = match_pairs(&keys);
        (DetectionResult::new(keys, pairs), contents)
    }
}

/// Check that `dir` names an existing directory and make it absolute
pub fn validate_directory(dir: &Path) -> SshVaultResult<PathBuf> {
    if dir.as_os_str().is_empty() {
        return Err(SshVaultError::Validation("Directory path cannot be empty".into()));
    }

    let meta = fs::metadata(dir).map_err(|e| {
        SshVaultError::Validation(format!("Cannot access {}: {}", dir.display(), e))
    })?;
    if !meta.is_dir() {
        return Err(SshVaultError::Validation(format!(
            "Not a directory: {}",
            dir.display()
        )));
    }

    fs::canonicalize(dir).map_err(SshVaultError::from)
}

/// Regular files directly inside `dir`, sorted by name
fn read_files(dir: &Path) -> SshVaultResult<Vec<ReadFile>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            warn!(path = %path.display(), "skipping file with non UTF-8 name");
            continue;
        };

        match read_file(&path) {
            Ok(Some((content, meta))) => files.push(ReadFile {
                name,
                content,
                meta,
            }),
            Ok(None) => debug!(file = %name, "skipping non-regular file"),
            Err(e) => warn!(file = %name, error = %e, "skipping unreadable file"),
        }
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

fn read_file(path: &Path) -> std::io::Result<Option<(SecureBytes, FileMeta)>> {
    let meta = fs::metadata(path)?;
    if !meta.is_file() {
        return Ok(None);
    }

    let content = SecureBytes::new(fs::read(path)?);
    let mod_time: DateTime<Utc> = meta.modified()?.into();

    Ok(Some((
        content,
        FileMeta {
            permissions: mode_of(&meta),
            size: meta.len(),
            mod_time,
        },
    )))
}

/// Recompute a file's checksum and compare it with the stored one
pub fn validate_integrity(file: &FileData) -> SshVaultResult<()> {
    file.validate_integrity()
}

/// Check a whole backup record before it is restored or stored
pub fn validate_backup(backup: &BackupData) -> SshVaultResult<()> {
    if backup.version != BACKUP_VERSION {
        return Err(SshVaultError::Validation(format!(
            "Unsupported backup version: {}",
            backup.version
        )));
    }

    for file in backup.files.values() {
        if let Some(encrypted) = &file.encrypted {
            encrypted.validate()?;
        }
    }

    backup.validate()
}

/// Host name from the OS, then `HOSTNAME`/`COMPUTERNAME`, else "unknown"
fn hostname() -> String {
    let from_os = gethostname::gethostname().to_string_lossy().trim().to_string();
    Some(from_os)
        .filter(|s| !s.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .or_else(|| std::env::var("COMPUTERNAME").ok())
        .unwrap_or_else(|| "unknown".to_string())
}

fn username() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
