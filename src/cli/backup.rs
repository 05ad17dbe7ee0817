//! Backup CLI commands
//!
//! Implements creating, listing, verifying and deleting stored backups.

use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use tracing::info;

use super::passphrase::{read_new_passphrase, read_passphrase};
use super::scan::resolve_ssh_dir;
use crate::backup::{validate_backup, BackupReader};
use crate::config::settings::Settings;
use crate::detect::DetectorChain;
use crate::error::{SshVaultError, SshVaultResult};
use crate::models::BackupData;
use crate::normalize::PathNormalizer;
use crate::storage::BackupStore;

/// Arguments for `sshvault backup`
#[derive(Args)]
pub struct BackupArgs {
    /// Directory to back up (defaults to the configured SSH directory)
    pub dir: Option<PathBuf>,

    /// Name to store the backup under (defaults to backup-<timestamp>)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Store file contents unencrypted
    #[arg(long)]
    pub no_encrypt: bool,

    /// Read the passphrase from this environment variable instead of prompting
    #[arg(long, value_name = "VAR")]
    pub passphrase_env: Option<String>,
}

/// Arguments for `sshvault verify`
#[derive(Args)]
pub struct VerifyArgs {
    /// Backup name (use 'latest' for most recent)
    pub name: String,

    /// Read the passphrase from this environment variable instead of prompting
    #[arg(long, value_name = "VAR")]
    pub passphrase_env: Option<String>,
}

/// Arguments for `sshvault delete`
#[derive(Args)]
pub struct DeleteArgs {
    /// Backup name
    pub name: String,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

/// Handle `sshvault backup`
pub fn handle_backup_command(
    store: &dyn BackupStore,
    settings: &Settings,
    args: BackupArgs,
) -> SshVaultResult<()> {
    let name = args
        .name
        .unwrap_or_else(|| format!("backup-{}", Utc::now().format("%Y%m%d-%H%M%S")));
    crate::storage::validate_name(&name)?;

    let normalizer = PathNormalizer::new()?;
    let dir = resolve_ssh_dir(args.dir, settings, &normalizer)?;
    let reader = BackupReader::new(DetectorChain::standard(), settings.enhancer(), normalizer);

    println!("Reading {}...", dir.display());
    let mut backup = reader.read_directory(&dir)?;

    if args.no_encrypt {
        println!("WARNING: file contents will be stored unencrypted.");
    } else {
        let passphrase = read_new_passphrase(args.passphrase_env.as_deref())?;
        println!("Encrypting {} file(s)...", backup.files.len());
        backup.encrypt_files(&settings.encryption_engine()?, &passphrase)?;
    }

    store.save(&name, &backup)?;
    info!(name = %name, files = backup.files.len(), "backup created");

    println!("Backup created: {}", name);
    println!(
        "  {} file(s), {} key pair(s), encrypted: {}",
        backup.files.len(),
        backup.analysis.summary.key_pairs,
        if backup.is_encrypted() { "yes" } else { "no" }
    );
    Ok(())
}

/// Handle `sshvault list`
pub fn handle_list_command(store: &dyn BackupStore) -> SshVaultResult<()> {
    let backups = store.list()?;

    if backups.is_empty() {
        println!("No backups found.");
        println!("Create one with: sshvault backup");
        return Ok(());
    }

    println!("Available Backups");
    println!("=================");
    println!();

    for (i, backup) in backups.iter().enumerate() {
        let age = Utc::now().signed_duration_since(backup.created_at);
        println!(
            "  {}. {} ({} ago, {}, {} file(s) from {}){}",
            i + 1,
            backup.name,
            format_duration(age),
            format_size(backup.size_bytes),
            backup.file_count,
            backup.hostname,
            if backup.encrypted { " [encrypted]" } else { "" },
        );
    }

    println!();
    println!("Total: {} backup(s)", backups.len());
    Ok(())
}

/// Handle `sshvault verify`
///
/// Checks the record structure and, after decrypting, every checksum.
pub fn handle_verify_command(
    store: &dyn BackupStore,
    settings: &Settings,
    args: VerifyArgs,
) -> SshVaultResult<()> {
    let name = resolve_backup_name(store, &args.name)?;
    let mut backup = store.load(&name)?;
    validate_backup(&backup)?;

    if backup.is_encrypted() {
        let passphrase = read_passphrase(args.passphrase_env.as_deref())?;
        backup.decrypt_files(&settings.encryption_engine()?, &passphrase)?;
    }

    print_backup_details(&name, &backup);
    println!();
    println!("Status: OK ({} file(s) verified)", backup.files.len());
    Ok(())
}

/// Handle `sshvault delete`
pub fn handle_delete_command(store: &dyn BackupStore, args: DeleteArgs) -> SshVaultResult<()> {
    // Fails early with NotFound for unknown names
    store.load(&args.name)?;

    if !args.force {
        println!("This will permanently delete backup '{}'.", args.name);
        println!("To proceed, run again with --force flag:");
        println!("  sshvault delete {} --force", args.name);
        return Ok(());
    }

    store.delete(&args.name)?;
    println!("Deleted backup: {}", args.name);
    Ok(())
}

/// Resolve a backup identifier, handling the "latest" keyword
pub fn resolve_backup_name(store: &dyn BackupStore, name: &str) -> SshVaultResult<String> {
    if name.eq_ignore_ascii_case("latest") {
        return store
            .list()?
            .into_iter()
            .next()
            .map(|b| b.name)
            .ok_or_else(|| SshVaultError::backup_not_found("latest"));
    }
    Ok(name.to_string())
}

/// Print where a backup came from
pub fn print_backup_details(name: &str, backup: &BackupData) {
    println!("Backup Details");
    println!("==============");
    println!("Name:      {}", name);
    println!("Created:   {}", backup.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Source:    {}@{}:{}", backup.username, backup.hostname, backup.ssh_dir);
    println!("Portable:  {}", backup.ssh_dir_normalized);
    println!("Version:   {}", backup.version);
    println!("Files:     {}", backup.files.len());
}

/// Format a duration in human-readable form
fn format_duration(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds();

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    format!("{}d", hours / 24)
}

/// Format bytes in human-readable form
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
