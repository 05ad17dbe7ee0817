use anyhow::Result;
use clap::{Parser, Subcommand};

use sshvault::cli::{
    handle_backup_command, handle_delete_command, handle_list_command, handle_passphrase_command,
    handle_restore_command, handle_scan_command, handle_verify_command, BackupArgs, DeleteArgs,
    PassphraseArgs, RestoreArgs, ScanArgs, VerifyArgs,
};
use sshvault::config::{paths::VaultPaths, settings::Settings};
use sshvault::logging::init_logging;
use sshvault::storage::JsonFileStore;

#[derive(Parser)]
#[command(
    name = "sshvault",
    author = "Kaylee Beyene",
    version,
    about = "Classify, encrypt, back up and restore SSH directories",
    long_about = "sshvault reads an SSH directory, works out what every file is \
                  (keys, config, known_hosts, authorized_keys), stores an encrypted \
                  backup, and restores it later with the exact original permissions."
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true, env = "SSHVAULT_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the files in an SSH directory
    Scan(ScanArgs),

    /// Read, encrypt and store an SSH directory
    Backup(BackupArgs),

    /// Restore a stored backup
    Restore(RestoreArgs),

    /// List stored backups
    #[command(alias = "ls")]
    List,

    /// Check a stored backup's structure and checksums
    Verify(VerifyArgs),

    /// Delete a stored backup
    Delete(DeleteArgs),

    /// Generate a random passphrase
    Passphrase(PassphraseArgs),

    /// Show current configuration and paths
    Config {
        /// Write the current settings to the config file
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = VaultPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    init_logging(cli.log_level.as_deref().unwrap_or(&settings.log_level));

    let store = JsonFileStore::new(paths.store_dir());

    match cli.command {
        Some(Commands::Scan(args)) => handle_scan_command(&settings, args)?,
        Some(Commands::Backup(args)) => handle_backup_command(&store, &settings, args)?,
        Some(Commands::Restore(args)) => handle_restore_command(&store, &settings, args)?,
        Some(Commands::List) => handle_list_command(&store)?,
        Some(Commands::Verify(args)) => handle_verify_command(&store, &settings, args)?,
        Some(Commands::Delete(args)) => handle_delete_command(&store, args)?,
        Some(Commands::Passphrase(args)) => handle_passphrase_command(args)?,
        Some(Commands::Config { init }) => {
            if init {
                settings.save(&paths)?;
                println!("Settings written to {}", paths.settings_file().display());
                println!();
            }
            println!("sshvault Configuration");
            println!("======================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Settings file:    {}", paths.settings_file().display());
            println!("Backup directory: {}", paths.store_dir().display());
            println!();
            println!("Settings:");
            println!("  KDF iterations:   {}", settings.kdf_iterations);
            println!(
                "  SSH directory:    {}",
                settings.ssh_dir.as_deref().unwrap_or("~/.ssh (default)")
            );
            println!("  Log level:        {}", settings.log_level);
            println!("  Service rules:    {}", settings.service_patterns.len());
            println!("  Purpose rules:    {}", settings.purpose_rules.len());
        }
        None => {
            println!("sshvault - SSH directory backup and restore");
            println!();
            println!("Run 'sshvault --help' for usage information.");
            println!("Run 'sshvault scan' to see what is in ~/.ssh.");
        }
    }

    Ok(())
}
