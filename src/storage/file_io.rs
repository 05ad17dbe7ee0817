//! File I/O utilities with atomic writes
//!
//! Everything written here may hold key material, so files are created
//! owner-only before any byte reaches them.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::backup::permissions::{create_private_file, set_mode, TARGET_DIR_MODE};
use crate::error::SshVaultError;

/// Read a JSON document that must already exist
pub fn read_json_required<T, P>(path: P) -> Result<T, SshVaultError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let storage_err = |what: &str, e: &dyn std::fmt::Display| {
        SshVaultError::Storage(format!("{} {}: {}", what, path.display(), e))
    };

    let file = File::open(path).map_err(|e| storage_err("Cannot open", &e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| storage_err("Cannot parse", &e))
}

/// Create a directory (and parents) accessible only by its owner
pub fn ensure_private_dir(dir: &Path) -> Result<(), SshVaultError> {
    fs::create_dir_all(dir).map_err(|e| {
        SshVaultError::Storage(format!("Failed to create directory {}: {}", dir.display(), e))
    })?;
    set_mode(dir, TARGET_DIR_MODE).map_err(|e| {
        SshVaultError::Storage(format!("Failed to secure directory {}: {}", dir.display(), e))
    })
}

/// Write JSON to a file atomically (write to temp, then rename)
///
/// The file is either completely written or not modified at all. The result
/// has mode 0600.
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), SshVaultError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        ensure_private_dir(parent)?;
    }

    // Temp file must live in the same directory for the rename to be atomic
    let temp_path = path.with_extension("json.tmp");
    if temp_path.exists() {
        fs::remove_file(&temp_path)
            .map_err(|e| SshVaultError::Storage(format!("Failed to remove stale temp file: {}", e)))?;
    }

    if let Err(e) = write_temp(&temp_path, data) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        SshVaultError::Storage(format!("Failed to rename temp file: {}", e))
    })?;

    Ok(())
}

fn write_temp<T: Serialize>(temp_path: &Path, data: &T) -> Result<(), SshVaultError> {
    let file = create_private_file(temp_path)
        .map_err(|e| SshVaultError::Storage(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| SshVaultError::Storage(format!("Failed to serialize data: {}", e)))?;

    writer
        .flush()
        .map_err(|e| SshVaultError::Storage(format!("Failed to flush data: {}", e)))?;

    // Sync to disk before rename
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| SshVaultError::Storage(format!("Failed to sync data: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Header {
        hostname: String,
        file_count: usize,
    }

    fn data() -> Header {
        Header {
            hostname: "laptop".to_string(),
            file_count: 3,
        }
    }

    #[test]
    fn test_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("laptop.json");

        write_json_atomic(&path, &data()).unwrap();
        assert_eq!(read_json_required::<Header, _>(&path).unwrap(), data());
    }

    #[test]
    fn test_stale_temp_file_is_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("laptop.json");
        let temp_path = temp_dir.path().join("laptop.json.tmp");

        // A stale temp file from an interrupted write must not block the next one
        fs::write(&temp_path, "partial").unwrap();
        write_json_atomic(&path, &data()).unwrap();

        assert!(path.exists());
        assert!(!temp_path.exists());
    }

    #[test]
    fn test_write_creates_private_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("vault").join("backups");
        let path = dir.join("laptop.json");

        write_json_atomic(&path, &data()).unwrap();
        assert!(path.exists());

        #[cfg(unix)]
        {
            use crate::backup::permissions::mode_of;
            assert_eq!(mode_of(&fs::metadata(&path).unwrap()), 0o600);
            assert_eq!(mode_of(&fs::metadata(&dir).unwrap()), 0o700);
        }
    }

    #[test]
    fn test_read_missing_or_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("laptop.json");

        let err = read_json_required::<Header, _>(&path).unwrap_err();
        assert!(matches!(err, SshVaultError::Storage(_)));

        fs::write(&path, "{\"hostname\": ").unwrap();
        assert!(read_json_required::<Header, _>(&path).is_err());
    }
}
