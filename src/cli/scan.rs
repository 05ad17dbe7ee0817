//! Scan CLI command
//!
//! Classifies an SSH directory and prints what was found without reading
//! anything into a backup.

use std::path::PathBuf;

use clap::Args;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::backup::BackupReader;
use crate::config::paths::default_ssh_dir;
use crate::config::settings::Settings;
use crate::detect::DetectorChain;
use crate::error::SshVaultResult;
use crate::models::{DetectionResult, KeyInfo};
use crate::normalize::PathNormalizer;

/// Arguments for `sshvault scan`
#[derive(Args)]
pub struct ScanArgs {
    /// Directory to scan (defaults to the configured SSH directory)
    pub dir: Option<PathBuf>,
}

#[derive(Tabled)]
struct KeyRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Type")]
    key_type: String,
    #[tabled(rename = "Format")]
    format: String,
    #[tabled(rename = "Purpose")]
    purpose: String,
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Size")]
    size: u64,
}

impl From<&KeyInfo> for KeyRow {
    fn from(key: &KeyInfo) -> Self {
        Self {
            file: key.filename.clone(),
            key_type: key.key_type.to_string(),
            format: key.format.to_string(),
            purpose: key.purpose.to_string(),
            service: key.service.clone().unwrap_or_else(|| "-".to_string()),
            mode: format!("{:04o}", key.permissions),
            size: key.size,
        }
    }
}

/// Handle `sshvault scan`
pub fn handle_scan_command(settings: &Settings, args: ScanArgs) -> SshVaultResult<()> {
    let normalizer = PathNormalizer::new()?;
    let dir = resolve_ssh_dir(args.dir, settings, &normalizer)?;

    let reader = BackupReader::new(DetectorChain::standard(), settings.enhancer(), normalizer);
    let result = reader.scan(&dir)?;

    println!("SSH directory: {}", dir.display());
    println!();
    print!("{}", format_detection(&result));
    Ok(())
}

/// The directory to read: explicit, configured, or `~/.ssh`
pub fn resolve_ssh_dir(
    explicit: Option<PathBuf>,
    settings: &Settings,
    normalizer: &PathNormalizer,
) -> SshVaultResult<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    match &settings.ssh_dir {
        Some(configured) => normalizer.denormalize(configured),
        None => default_ssh_dir(),
    }
}

/// Render the detection table, key pairs and summary
pub fn format_detection(result: &DetectionResult) -> String {
    if result.keys.is_empty() {
        return "No files found.\n".to_string();
    }

    let rows: Vec<KeyRow> = result.keys.iter().map(KeyRow::from).collect();
    let mut output = Table::new(rows).with(Style::sharp()).to_string();
    output.push('\n');

    if !result.key_pairs.is_empty() {
        output.push_str("\nKey pairs:\n");
        for (base, pair) in &result.key_pairs {
            output.push_str(&format!(
                "  {}: private={} public={}\n",
                base,
                pair.private_file.as_deref().unwrap_or("-"),
                pair.public_file.as_deref().unwrap_or("-"),
            ));
        }
    }

    let s = &result.summary;
    output.push_str(&format!(
        "\nSummary: {} file(s), {} private, {} public, {} pair(s), {} system, {} unknown\n",
        s.total_files, s.private_keys, s.public_keys, s.key_pairs, s.system_files, s.unknown_files
    ));

    if !s.services.is_empty() {
        let services: Vec<String> = s
            .services
            .iter()
            .map(|(name, count)| format!("{} ({})", name, count))
            .collect();
        output.push_str(&format!("Services: {}\n", services.join(", ")));
    }

    output
}
