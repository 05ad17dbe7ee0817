//! Mode bits on disk
//!
//! Platform-specific permission handling lives here so the reader and the
//! restore engine can stay platform-neutral. On non-unix targets modes are
//! reported as `0600`, never applied, and never verified.

use std::fs::{self, File, Metadata};
use std::io;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, error};

use crate::models::{FileData, KeyType};

/// Mode given to files before their captured mode is applied
pub const PRIVATE_FILE_MODE: u32 = 0o600;

/// Mode required for the restore target directory
pub const TARGET_DIR_MODE: u32 = 0o700;

/// Group and other bits
const GROUP_OTHER_MASK: u32 = 0o077;

/// Permission bits (including setuid/setgid/sticky) of a file
#[cfg(unix)]
pub fn mode_of(meta: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
pub fn mode_of(_meta: &Metadata) -> u32 {
    PRIVATE_FILE_MODE
}

/// Set exact mode bits on a path
#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
pub fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

/// Create a new file readable only by its owner
#[cfg(unix)]
pub fn create_private_file(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(PRIVATE_FILE_MODE)
        .open(path)
}

#[cfg(not(unix))]
pub fn create_private_file(path: &Path) -> io::Result<File> {
    fs::OpenOptions::new().write(true).create_new(true).open(path)
}

/// Mode to write for a captured value
///
/// Zero means the record is corrupt; such files get `0600`.
pub fn effective_mode(filename: &str, captured: u32) -> u32 {
    let mode = captured & 0o7777;
    if mode == 0 {
        error!(
            file = filename,
            "CRITICAL: captured permissions are 0000, backup may be corrupt; using 0600"
        );
        return PRIVATE_FILE_MODE;
    }
    mode
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
}

/// A restored file whose mode is insecure or unexpected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionIssue {
    pub filename: String,
    pub expected: u32,
    pub actual: u32,
    pub severity: Severity,
}

impl std::fmt::Display for PermissionIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.severity {
            Severity::Critical => write!(
                f,
                "{}: private key is accessible by group or others ({:04o})",
                self.filename, self.actual
            ),
            Severity::Warning => write!(
                f,
                "{}: mode {:04o} differs from captured {:04o}",
                self.filename, self.actual, self.expected
            ),
        }
    }
}

/// Check one restored file against its captured mode
///
/// Private keys open to group or others are critical, any other mismatch is
/// a warning.
pub fn check_file(file: &FileData, actual: u32) -> Option<PermissionIssue> {
    let expected = file.permissions & 0o7777;
    let expected = if expected == 0 { PRIVATE_FILE_MODE } else { expected };

    let severity = if file.key_type() == KeyType::Private && actual & GROUP_OTHER_MASK != 0 {
        Severity::Critical
    } else if actual != expected {
        Severity::Warning
    } else {
        return None;
    };

    Some(PermissionIssue {
        filename: file.filename.clone(),
        expected,
        actual,
        severity,
    })
}

/// Check every restored file in `target`
///
/// Without unix mode bits there is nothing to compare, so no issues are
/// reported.
pub fn verify_permissions<'a>(
    target: &Path,
    files: impl IntoIterator<Item = &'a FileData>,
) -> io::Result<Vec<PermissionIssue>> {
    if !cfg!(unix) {
        debug!(dir = %target.display(), "mode bits unsupported, skipping permission check");
        return Ok(Vec::new());
    }

    let mut issues = Vec::new();
    for file in files {
        let meta = fs::symlink_metadata(target.join(&file.filename))?;
        if let Some(issue) = check_file(file, mode_of(&meta)) {
            issues.push(issue);
        }
    }
    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SecureBytes;
    use crate::models::{KeyFormat, KeyInfo, KeyPurpose};
    use chrono::Utc;

    fn file(key_type: KeyType, permissions: u32) -> FileData {
        let info = KeyInfo {
            filename: "f".into(),
            key_type,
            format: KeyFormat::Unknown,
            service: None,
            purpose: KeyPurpose::Personal,
            permissions,
            size: 1,
            mod_time: Utc::now(),
        };
        FileData::new(SecureBytes::from(&b"x"[..]), info)
    }

    #[test]
    fn test_effective_mode() {
        assert_eq!(effective_mode("f", 0o644), 0o644);
        assert_eq!(effective_mode("f", 0o100600), 0o600);
        assert_eq!(effective_mode("f", 0), PRIVATE_FILE_MODE);
    }

    #[test]
    fn test_private_key_exposure_is_critical() {
        let issue = check_file(&file(KeyType::Private, 0o644), 0o644).unwrap();
        assert_eq!(issue.severity, Severity::Critical);
        assert!(check_file(&file(KeyType::Private, 0o600), 0o600).is_none());
        assert!(check_file(&file(KeyType::Private, 0o400), 0o400).is_none());
    }

    #[test]
    fn test_mismatch_is_warning() {
        let issue = check_file(&file(KeyType::Public, 0o644), 0o600).unwrap();
        assert_eq!(issue.severity, Severity::Warning);
        assert!(check_file(&file(KeyType::Public, 0o644), 0o644).is_none());
        assert!(check_file(&file(KeyType::Config, 0), 0o600).is_none());
    }

    #[test]
    fn test_verify_only_where_modes_exist() {
        let temp = tempfile::TempDir::new().unwrap();
        fs::write(temp.path().join("f"), b"x").unwrap();
        set_mode(&temp.path().join("f"), 0o600).unwrap();

        let captured = file(KeyType::Public, 0o644);
        let issues = verify_permissions(temp.path(), [&captured]).unwrap();
        if cfg!(unix) {
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].severity, Severity::Warning);
        } else {
            assert!(issues.is_empty());
        }
    }
}
