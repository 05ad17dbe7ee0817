//! Backup restoration for sshvault
//!
//! Writes a decrypted `BackupData` back to a directory. Each file passes
//! through the same steps in order:
//!
//! 1. Filtered out by `file_filter` or `type_filter`: skipped, no I/O.
//! 2. Dry run: logged as would-restore, no I/O.
//! 3. Target exists: overwritten only with `overwrite`, or after an
//!    interactive confirmation. Otherwise skipped.
//! 4. Written with the exact captured mode and, best-effort, mtime.
//!
//! A write failure aborts the whole call. Files restored before the failure
//! stay on disk.

use std::io::{self, BufRead, Write};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use glob::{MatchOptions, Pattern};
use tracing::{error, info, warn};

use super::permissions::{
    create_private_file, effective_mode, mode_of, set_mode, verify_permissions, PermissionIssue,
    Severity, TARGET_DIR_MODE,
};
use crate::error::{SshVaultError, SshVaultResult};
use crate::models::{BackupData, FileData, KeyType};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Restore knobs; the default restores everything and skips on conflict
#[derive(Debug, Clone, Default)]
pub struct RestoreOptions {
    pub dry_run: bool,
    pub overwrite: bool,
    pub interactive: bool,
    /// Glob patterns over filenames; empty means no filtering
    pub file_filter: Vec<String>,
    /// Key types to restore; empty means no filtering
    pub type_filter: Vec<KeyType>,
}

/// Why a file was not written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Filtered,
    Exists,
    Declined,
}

/// Terminal state of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored,
    WouldRestore,
    Skipped(SkipReason),
}

/// Result of a restore operation
#[derive(Debug, Default)]
pub struct RestoreReport {
    /// Directory the files were restored into
    pub target: PathBuf,
    /// Outcome per filename, in backup order
    pub outcomes: Vec<(String, RestoreOutcome)>,
    /// Non-critical permission deviations found after writing
    pub warnings: Vec<PermissionIssue>,
}

impl RestoreReport {
    fn count(&self, pred: impl Fn(&RestoreOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }

    pub fn restored(&self) -> usize {
        self.count(|o| *o == RestoreOutcome::Restored)
    }

    pub fn would_restore(&self) -> usize {
        self.count(|o| *o == RestoreOutcome::WouldRestore)
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RestoreOutcome::Skipped(_)))
    }

    /// Outcome recorded for a file
    pub fn outcome(&self, filename: &str) -> Option<RestoreOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == filename)
            .map(|(_, o)| *o)
    }

    /// Get a summary of what was restored
    pub fn summary(&self) -> String {
        if self.would_restore() > 0 {
            format!(
                "Dry run: {} file(s) would be restored to {}, {} skipped",
                self.would_restore(),
                self.target.display(),
                self.skipped()
            )
        } else {
            format!(
                "Restored {} file(s) to {}, {} skipped, {} permission warning(s)",
                self.restored(),
                self.target.display(),
                self.skipped(),
                self.warnings.len()
            )
        }
    }
}

/// Decides whether an existing file may be overwritten
pub trait ConflictPrompt {
    fn confirm_overwrite(&mut self, path: &Path) -> SshVaultResult<bool>;
}

/// Asks on the terminal
pub struct StdinPrompt;

impl ConflictPrompt for StdinPrompt {
    fn confirm_overwrite(&mut self, path: &Path) -> SshVaultResult<bool> {
        eprint!("{} exists. Overwrite? (y/N): ", path.display());
        io::stderr().flush()?;

        let mut input = String::new();
        io::stdin().lock().read_line(&mut input)?;

        let answer = input.trim().to_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}

/// Compiled file and type filters
struct RestoreFilter {
    patterns: Vec<Pattern>,
    types: Vec<KeyType>,
}

impl RestoreFilter {
    fn new(options: &RestoreOptions) -> SshVaultResult<Self> {
        let patterns = options
            .file_filter
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| {
                    SshVaultError::Validation(format!("Invalid file filter '{}': {}", p, e))
                })
            })
            .collect::<SshVaultResult<Vec<_>>>()?;

        Ok(Self {
            patterns,
            types: options.type_filter.clone(),
        })
    }

    fn accepts(&self, file: &FileData) -> bool {
        let name_ok = self.patterns.is_empty()
            || self
                .patterns
                .iter()
                .any(|p| p.matches_with(&file.filename, MATCH_OPTIONS));
        let type_ok = self.types.is_empty() || self.types.contains(&file.key_type());
        name_ok && type_ok
    }
}

/// Writes backups back to disk
pub struct RestoreEngine<P: ConflictPrompt = StdinPrompt> {
    prompt: P,
}

impl Default for RestoreEngine<StdinPrompt> {
    fn default() -> Self {
        Self::new(StdinPrompt)
    }
}

impl<P: ConflictPrompt> RestoreEngine<P> {
    pub fn new(prompt: P) -> Self {
        Self { prompt }
    }

    /// Restore every file of a decrypted backup into `target`
    ///
    /// Returns `Permission` if a restored private key ends up readable or
    /// writable by group or others.
    pub fn restore_backup(
        &mut self,
        backup: &BackupData,
        target: &Path,
        options: &RestoreOptions,
    ) -> SshVaultResult<RestoreReport> {
        let filter = RestoreFilter::new(options)?;

        if !options.dry_run {
            ensure_target_dir(target)?;
        }

        let mut report = RestoreReport {
            target: target.to_path_buf(),
            ..Default::default()
        };
        let mut written = Vec::new();

        for file in backup.files.values() {
            let outcome = self.restore_one(file, target, options, &filter)?;
            if outcome == RestoreOutcome::Restored {
                written.push(file);
            }
            report.outcomes.push((file.filename.clone(), outcome));
        }

        if options.dry_run {
            info!(dir = %target.display(), files = report.would_restore(), "dry run complete");
            return Ok(report);
        }

        let issues = verify_permissions(target, written)?;
        let (critical, warnings): (Vec<_>, Vec<_>) = issues
            .into_iter()
            .partition(|i| i.severity == Severity::Critical);

        for issue in &warnings {
            warn!("{}", issue);
        }
        if !critical.is_empty() {
            for issue in &critical {
                error!("CRITICAL: {}", issue);
            }
            return Err(SshVaultError::Permission {
                critical: critical.len(),
                warnings: warnings.len(),
            });
        }

        report.warnings = warnings;
        info!(
            dir = %target.display(),
            restored = report.restored(),
            skipped = report.skipped(),
            "restore complete"
        );
        Ok(report)
    }

    /// Restore a single file into `target`
    pub fn restore_file(
        &mut self,
        file: &FileData,
        target: &Path,
        options: &RestoreOptions,
    ) -> SshVaultResult<RestoreOutcome> {
        let filter = RestoreFilter::new(options)?;
        if !options.dry_run && filter.accepts(file) {
            ensure_target_dir(target)?;
        }
        self.restore_one(file, target, options, &filter)
    }

    fn restore_one(
        &mut self,
        file: &FileData,
        target: &Path,
        options: &RestoreOptions,
        filter: &RestoreFilter,
    ) -> SshVaultResult<RestoreOutcome> {
        validate_filename(&file.filename)?;

        if !filter.accepts(file) {
            return Ok(RestoreOutcome::Skipped(SkipReason::Filtered));
        }

        let path = target.join(&file.filename);

        if options.dry_run {
            info!(
                file = %file.filename,
                path = %path.display(),
                mode = %format!("{:04o}", file.permissions & 0o7777),
                "would restore"
            );
            return Ok(RestoreOutcome::WouldRestore);
        }

        if path.symlink_metadata().is_ok() {
            if options.overwrite {
                info!(path = %path.display(), "overwriting existing file");
            } else if options.interactive {
                if !self.prompt.confirm_overwrite(&path)? {
                    return Ok(RestoreOutcome::Skipped(SkipReason::Declined));
                }
            } else {
                info!(path = %path.display(), "file exists, skipping");
                return Ok(RestoreOutcome::Skipped(SkipReason::Exists));
            }
        }

        let content = file.content.as_ref().ok_or_else(|| {
            SshVaultError::Validation(format!(
                "'{}' has no plaintext content; the backup is corrupt or still encrypted",
                file.filename
            ))
        })?;

        let mode = effective_mode(&file.filename, file.permissions);
        write_file(&path, content, mode, SystemTime::from(file.mod_time))?;

        info!(file = %file.filename, mode = %format!("{:04o}", mode), "restored");
        Ok(RestoreOutcome::Restored)
    }
}

/// Create the target directory with 0700, or correct its mode
fn ensure_target_dir(target: &Path) -> SshVaultResult<()> {
    match std::fs::metadata(target) {
        Ok(meta) if meta.is_dir() => {
            let mode = mode_of(&meta) & 0o777;
            if cfg!(unix) && mode != TARGET_DIR_MODE {
                warn!(
                    dir = %target.display(),
                    mode = %format!("{:04o}", mode),
                    "correcting target directory permissions to 0700"
                );
                set_mode(target, TARGET_DIR_MODE)?;
            }
            Ok(())
        }
        Ok(_) => Err(SshVaultError::Validation(format!(
            "Restore target is not a directory: {}",
            target.display()
        ))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            std::fs::create_dir_all(target)?;
            set_mode(target, TARGET_DIR_MODE)?;
            info!(dir = %target.display(), "created target directory");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Filenames must name a file directly inside the target
fn validate_filename(filename: &str) -> SshVaultResult<()> {
    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(SshVaultError::Validation(format!(
            "Refusing to restore unsafe filename '{}'",
            filename
        ))),
    }
}

fn write_file(path: &Path, content: &[u8], mode: u32, mod_time: SystemTime) -> SshVaultResult<()> {
    // Existing files may be read-only; replace rather than truncate
    if path.symlink_metadata().is_ok() {
        std::fs::remove_file(path)?;
    }

    let mut file = create_private_file(path)?;
    file.write_all(content)?;
    file.sync_all()?;

    if let Err(e) = file.set_modified(mod_time) {
        warn!(path = %path.display(), error = %e, "could not restore modification time");
    }
    drop(file);

    set_mode(path, mode)?;
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::crypto::SecureBytes;
    use crate::models::{KeyFormat, KeyInfo, KeyPurpose, BACKUP_VERSION};
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    use crate::models::DetectionResult;

    /// Answers every prompt the same way and counts calls
    struct FixedPrompt {
        answer: bool,
        asked: usize,
    }

    impl ConflictPrompt for FixedPrompt {
        fn confirm_overwrite(&mut self, _path: &Path) -> SshVaultResult<bool> {
            self.asked += 1;
            Ok(self.answer)
        }
    }

    fn engine(answer: bool) -> RestoreEngine<FixedPrompt> {
        RestoreEngine::new(FixedPrompt { answer, asked: 0 })
    }

    fn file(name: &str, key_type: KeyType, mode: u32, content: &str) -> FileData {
        let info = KeyInfo {
            filename: name.into(),
            key_type,
            format: KeyFormat::Unknown,
            service: None,
            purpose: KeyPurpose::Personal,
            permissions: mode,
            size: content.len() as u64,
            mod_time: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        };
        FileData::new(SecureBytes::from(content.as_bytes()), info)
    }

    fn backup(files: Vec<FileData>) -> BackupData {
        let keys = files.iter().filter_map(|f| f.key_info.clone()).collect();
        BackupData {
            version: BACKUP_VERSION.into(),
            timestamp: Utc::now(),
            hostname: "host".into(),
            username: "user".into(),
            ssh_dir: "/home/user/.ssh".into(),
            ssh_dir_normalized: "~/.ssh".into(),
            files: files.into_iter().map(|f| (f.filename.clone(), f)).collect(),
            analysis: DetectionResult::new(keys, BTreeMap::new()),
            metadata: BTreeMap::new(),
        }
    }

    fn mode(path: &Path) -> u32 {
        mode_of(&fs::metadata(path).unwrap())
    }

    #[test]
    fn test_restore_exact_modes() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("ssh");
        let files = [0o400, 0o600, 0o644, 0o755, 0o777]
            .iter()
            .map(|m| file(&format!("f{:o}", m), KeyType::Public, *m, "data"))
            .collect();

        let report = engine(false)
            .restore_backup(&backup(files), &target, &RestoreOptions::default())
            .unwrap();

        assert_eq!(report.restored(), 5);
        for m in [0o400, 0o600, 0o644, 0o755, 0o777] {
            assert_eq!(mode(&target.join(format!("f{:o}", m))), m);
        }
        assert_eq!(mode(&target), 0o700);
    }

    #[test]
    fn test_zero_mode_falls_back() {
        let temp = TempDir::new().unwrap();
        let b = backup(vec![file("config", KeyType::Config, 0, "Host x\n")]);
        engine(false)
            .restore_backup(&b, temp.path(), &RestoreOptions::default())
            .unwrap();
        assert_eq!(mode(&temp.path().join("config")), 0o600);
    }

    #[test]
    fn test_mtime_restored() {
        let temp = TempDir::new().unwrap();
        let f = file("known_hosts", KeyType::Hosts, 0o644, "h ssh-rsa AAAA\n");
        let expected = SystemTime::from(f.mod_time);
        engine(false)
            .restore_backup(&backup(vec![f]), temp.path(), &RestoreOptions::default())
            .unwrap();
        let actual = fs::metadata(temp.path().join("known_hosts"))
            .unwrap()
            .modified()
            .unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("never");
        let options = RestoreOptions {
            dry_run: true,
            ..Default::default()
        };

        let report = engine(false)
            .restore_backup(&backup(vec![file("a", KeyType::Public, 0o644, "x")]), &target, &options)
            .unwrap();

        assert_eq!(report.outcome("a"), Some(RestoreOutcome::WouldRestore));
        assert!(!target.exists());
    }

    #[test]
    fn test_existing_file_skipped_by_default() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a"), "old").unwrap();

        let mut e = engine(true);
        let report = e
            .restore_backup(
                &backup(vec![file("a", KeyType::Public, 0o644, "new")]),
                temp.path(),
                &RestoreOptions::default(),
            )
            .unwrap();

        assert_eq!(report.outcome("a"), Some(RestoreOutcome::Skipped(SkipReason::Exists)));
        assert_eq!(fs::read_to_string(temp.path().join("a")).unwrap(), "old");
        assert_eq!(e.prompt.asked, 0);
    }

    #[test]
    fn test_overwrite_replaces_read_only_file() {
        let temp = TempDir::new().unwrap();
        let existing = temp.path().join("a");
        fs::write(&existing, "old").unwrap();
        set_mode(&existing, 0o400).unwrap();

        let options = RestoreOptions {
            overwrite: true,
            ..Default::default()
        };
        engine(false)
            .restore_backup(&backup(vec![file("a", KeyType::Public, 0o644, "new")]), temp.path(), &options)
            .unwrap();

        assert_eq!(fs::read_to_string(&existing).unwrap(), "new");
        assert_eq!(mode(&existing), 0o644);
    }

    #[test]
    fn test_interactive_prompt() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a"), "old").unwrap();
        let b = backup(vec![file("a", KeyType::Public, 0o644, "new")]);
        let options = RestoreOptions {
            interactive: true,
            ..Default::default()
        };

        let mut declined = engine(false);
        let report = declined.restore_backup(&b, temp.path(), &options).unwrap();
        assert_eq!(report.outcome("a"), Some(RestoreOutcome::Skipped(SkipReason::Declined)));
        assert_eq!(declined.prompt.asked, 1);
        assert_eq!(fs::read_to_string(temp.path().join("a")).unwrap(), "old");

        let mut accepted = engine(true);
        let report = accepted.restore_backup(&b, temp.path(), &options).unwrap();
        assert_eq!(report.outcome("a"), Some(RestoreOutcome::Restored));
        assert_eq!(fs::read_to_string(temp.path().join("a")).unwrap(), "new");
    }

    #[test]
    fn test_filters() {
        let temp = TempDir::new().unwrap();
        let b = backup(vec![
            file("id_rsa", KeyType::Private, 0o600, "k"),
            file("id_rsa.pub", KeyType::Public, 0o644, "p"),
            file("config", KeyType::Config, 0o644, "c"),
        ]);

        let options = RestoreOptions {
            file_filter: vec!["id_*".into()],
            type_filter: vec![KeyType::Public],
            ..Default::default()
        };
        let report = engine(false).restore_backup(&b, temp.path(), &options).unwrap();

        assert_eq!(report.outcome("id_rsa.pub"), Some(RestoreOutcome::Restored));
        assert_eq!(report.outcome("id_rsa"), Some(RestoreOutcome::Skipped(SkipReason::Filtered)));
        assert_eq!(report.outcome("config"), Some(RestoreOutcome::Skipped(SkipReason::Filtered)));
        assert!(!temp.path().join("config").exists());
    }

    #[test]
    fn test_invalid_filter_rejected() {
        let temp = TempDir::new().unwrap();
        let options = RestoreOptions {
            file_filter: vec!["[".into()],
            ..Default::default()
        };
        let err = engine(false)
            .restore_backup(&backup(vec![]), temp.path(), &options)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_missing_content_aborts() {
        let temp = TempDir::new().unwrap();
        let a = file("a", KeyType::Public, 0o644, "x");
        let mut b_file = file("b", KeyType::Public, 0o644, "y");
        b_file.content = None;

        let err = engine(false)
            .restore_backup(&backup(vec![a, b_file]), temp.path(), &RestoreOptions::default())
            .unwrap_err();

        assert!(err.is_validation());
        // No rollback: earlier files stay
        assert!(temp.path().join("a").exists());
        assert!(!temp.path().join("b").exists());
    }

    #[test]
    fn test_exposed_private_key_is_critical() {
        let temp = TempDir::new().unwrap();
        let b = backup(vec![file("id_rsa", KeyType::Private, 0o644, "k")]);
        let err = engine(false)
            .restore_backup(&b, temp.path(), &RestoreOptions::default())
            .unwrap_err();
        assert!(matches!(err, SshVaultError::Permission { critical: 1, .. }));
    }

    #[test]
    fn test_target_dir_mode_corrected() {
        let temp = TempDir::new().unwrap();
        set_mode(temp.path(), 0o755).unwrap();
        engine(false)
            .restore_backup(&backup(vec![]), temp.path(), &RestoreOptions::default())
            .unwrap();
        assert_eq!(mode(temp.path()), 0o700);
    }

    #[test]
    fn test_unsafe_filename_rejected() {
        let temp = TempDir::new().unwrap();
        let mut f = file("x", KeyType::Public, 0o644, "x");
        f.filename = "../escape".into();
        let err = engine(false)
            .restore_file(&f, temp.path(), &RestoreOptions::default())
            .unwrap_err();
        assert!(err.is_validation());
    }
}
