//! Restore CLI command

use std::path::PathBuf;

use clap::Args;

use super::backup::{print_backup_details, resolve_backup_name};
use super::passphrase::read_passphrase;
use crate::backup::{validate_backup, RestoreEngine, RestoreOptions, RestoreOutcome, SkipReason};
use crate::config::settings::Settings;
use crate::error::SshVaultResult;
use crate::models::KeyType;
use crate::normalize::PathNormalizer;
use crate::storage::BackupStore;

/// Arguments for `sshvault restore`
#[derive(Args)]
pub struct RestoreArgs {
    /// Backup name (use 'latest' for most recent)
    pub name: String,

    /// Directory to restore into (defaults to the backed-up directory on this machine)
    #[arg(short, long)]
    pub target: Option<PathBuf>,

    /// Show what would be restored without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Replace files that already exist
    #[arg(long)]
    pub overwrite: bool,

    /// Ask before replacing each existing file
    #[arg(short, long)]
    pub interactive: bool,

    /// Only restore files matching this glob (repeatable)
    #[arg(long = "file", value_name = "GLOB")]
    pub files: Vec<String>,

    /// Only restore files of this type (repeatable)
    #[arg(long = "type", value_name = "TYPE", value_parser = parse_key_type)]
    pub types: Vec<KeyType>,

    /// Read the passphrase from this environment variable instead of prompting
    #[arg(long, value_name = "VAR")]
    pub passphrase_env: Option<String>,
}

fn parse_key_type(s: &str) -> Result<KeyType, String> {
    KeyType::parse(s).ok_or_else(|| {
        format!(
            "unknown type '{}' (expected private, public, config, hosts, authorized, certificate or unknown)",
            s
        )
    })
}

/// Handle `sshvault restore`
pub fn handle_restore_command(
    store: &dyn BackupStore,
    settings: &Settings,
    args: RestoreArgs,
) -> SshVaultResult<()> {
    let name = resolve_backup_name(store, &args.name)?;
    let mut backup = store.load(&name)?;
    validate_backup(&backup)?;

    if backup.is_encrypted() {
        let passphrase = read_passphrase(args.passphrase_env.as_deref())?;
        backup.decrypt_files(&settings.encryption_engine()?, &passphrase)?;
    }

    let target = match args.target {
        Some(target) => target,
        None => PathNormalizer::new()?.denormalize(&backup.ssh_dir_normalized)?,
    };

    print_backup_details(&name, &backup);
    println!("Target:    {}", target.display());
    println!();

    let options = RestoreOptions {
        dry_run: args.dry_run,
        overwrite: args.overwrite,
        interactive: args.interactive,
        file_filter: args.files,
        type_filter: args.types,
    };

    let report = RestoreEngine::default().restore_backup(&backup, &target, &options)?;

    for (file, outcome) in &report.outcomes {
        let label = match outcome {
            RestoreOutcome::Restored => "restored",
            RestoreOutcome::WouldRestore => "would restore",
            RestoreOutcome::Skipped(SkipReason::Filtered) => "skipped (filtered)",
            RestoreOutcome::Skipped(SkipReason::Exists) => "skipped (exists, use --overwrite)",
            RestoreOutcome::Skipped(SkipReason::Declined) => "skipped (declined)",
        };
        println!("  {:<30} {}", file, label);
    }
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }

    println!();
    println!("{}", report.summary());
    Ok(())
}
