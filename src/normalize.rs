//! Portable directory paths
//!
//! Backups record the SSH directory both as captured and in a home-relative
//! form (`~/.ssh`) so the record can be restored on a machine where the home
//! directory lives elsewhere.

use std::fs;
use std::path::{Component, Path, PathBuf};

use directories::BaseDirs;

use crate::error::{SshVaultError, SshVaultResult};

/// Converts absolute paths to and from their home-relative form
#[derive(Debug, Clone)]
pub struct PathNormalizer {
    home: PathBuf,
}

impl PathNormalizer {
    /// Create a normalizer for the current user's home directory
    pub fn new() -> SshVaultResult<Self> {
        let dirs = BaseDirs::new()
            .ok_or_else(|| SshVaultError::Config("Could not determine home directory".into()))?;
        Ok(Self {
            home: dirs.home_dir().to_path_buf(),
        })
    }

    /// Create a normalizer for an explicit home directory (useful for testing)
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// The home directory this normalizer resolves `~` against
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Convert an absolute path to its portable form
    ///
    /// Paths inside the home directory become `~` or `~/<rest>`; any other
    /// absolute path is returned unchanged. The home directory is compared
    /// both as given and with symlinks resolved, so a canonicalized path
    /// under a symlinked home (`/home` -> `/usr/home`) still normalizes.
    pub fn normalize(&self, path: &Path) -> SshVaultResult<String> {
        if path.as_os_str().is_empty() {
            return Err(SshVaultError::Validation("Path cannot be empty".into()));
        }
        if !path.is_absolute() {
            return Err(SshVaultError::Validation(format!(
                "Path must be absolute: {}",
                path.display()
            )));
        }

        let cleaned = clean(path);
        let homes = [Some(clean(&self.home)), fs::canonicalize(&self.home).ok()];
        let rest = homes
            .iter()
            .flatten()
            .find_map(|home| cleaned.strip_prefix(home).ok());

        match rest {
            Some(rest) if rest.as_os_str().is_empty() => Ok("~".to_string()),
            Some(rest) => Ok(format!("~/{}", to_portable(rest))),
            None => Ok(cleaned.to_string_lossy().into_owned()),
        }
    }

    /// Resolve a portable path back to an absolute path on this machine
    pub fn denormalize(&self, portable: &str) -> SshVaultResult<PathBuf> {
        if portable.is_empty() {
            return Err(SshVaultError::Validation("Path cannot be empty".into()));
        }

        if portable == "~" {
            return Ok(self.home.clone());
        }
        if let Some(rest) = portable.strip_prefix("~/") {
            let mut path = self.home.clone();
            path.extend(rest.split('/').filter(|s| !s.is_empty()));
            return Ok(path);
        }

        let path = PathBuf::from(portable);
        if !path.is_absolute() {
            return Err(SshVaultError::Validation(format!(
                "Path must be absolute or home-relative: {}",
                portable
            )));
        }
        Ok(path)
    }
}

/// Drop `.` components and trailing separators without touching the filesystem
fn clean(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn to_portable(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> PathNormalizer {
        PathNormalizer::with_home("/home/alice")
    }

    #[test]
    fn test_normalize_inside_home() {
        let n = normalizer();
        assert_eq!(n.normalize(Path::new("/home/alice/.ssh")).unwrap(), "~/.ssh");
        assert_eq!(n.normalize(Path::new("/home/alice/")).unwrap(), "~");
        assert_eq!(
            n.normalize(Path::new("/home/alice/./keys/work")).unwrap(),
            "~/keys/work"
        );
    }

    #[test]
    fn test_normalize_outside_home() {
        let n = normalizer();
        assert_eq!(n.normalize(Path::new("/etc/ssh")).unwrap(), "/etc/ssh");
        // Sibling directory sharing a prefix is not inside home
        assert_eq!(
            n.normalize(Path::new("/home/alicex/.ssh")).unwrap(),
            "/home/alicex/.ssh"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_normalize_through_symlinked_home() {
        let temp = tempfile::TempDir::new().unwrap();
        let real_home = temp.path().join("usr_home").join("alice");
        fs::create_dir_all(real_home.join(".ssh")).unwrap();
        let link = temp.path().join("home_alice");
        std::os::unix::fs::symlink(&real_home, &link).unwrap();

        let n = PathNormalizer::with_home(&link);
        let resolved = fs::canonicalize(link.join(".ssh")).unwrap();
        assert_eq!(n.normalize(&resolved).unwrap(), "~/.ssh");
        assert_eq!(n.normalize(&link.join(".ssh")).unwrap(), "~/.ssh");
        assert_eq!(n.denormalize("~/.ssh").unwrap(), link.join(".ssh"));
    }

    #[test]
    fn test_normalize_rejects_bad_input() {
        let n = normalizer();
        assert!(n.normalize(Path::new("")).unwrap_err().is_validation());
        assert!(n.normalize(Path::new(".ssh")).unwrap_err().is_validation());
    }

    #[test]
    fn test_denormalize() {
        let n = PathNormalizer::with_home("/Users/bob");
        assert_eq!(n.denormalize("~/.ssh").unwrap(), PathBuf::from("/Users/bob/.ssh"));
        assert_eq!(n.denormalize("~").unwrap(), PathBuf::from("/Users/bob"));
        assert_eq!(n.denormalize("/etc/ssh").unwrap(), PathBuf::from("/etc/ssh"));
        assert!(n.denormalize("relative/path").is_err());
        assert!(n.denormalize("").is_err());
    }

    #[test]
    fn test_round_trip_across_homes() {
        let portable = normalizer()
            .normalize(Path::new("/home/alice/.ssh"))
            .unwrap();
        let restored = PathNormalizer::with_home("/Users/alice")
            .denormalize(&portable)
            .unwrap();
        assert_eq!(restored, PathBuf::from("/Users/alice/.ssh"));
    }
}
