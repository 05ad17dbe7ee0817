//! Passphrase input and generation

use clap::Args;

use crate::crypto::{generate_passphrase, validate_passphrase, SecureString};
use crate::error::{SshVaultError, SshVaultResult};

/// Arguments for `sshvault passphrase`
#[derive(Args)]
pub struct PassphraseArgs {
    /// Number of characters to generate (16-512)
    #[arg(short, long, default_value_t = 32)]
    pub length: usize,
}

/// Print a freshly generated passphrase
pub fn handle_passphrase_command(args: PassphraseArgs) -> SshVaultResult<()> {
    let passphrase = generate_passphrase(args.length);
    println!("{}", passphrase.as_str());
    Ok(())
}

/// Read a passphrase from the named environment variable
pub fn passphrase_from_env(var: &str) -> SshVaultResult<SecureString> {
    let value = std::env::var(var).map_err(|_| {
        SshVaultError::Config(format!("Environment variable {} is not set", var))
    })?;
    let passphrase = SecureString::new(value);
    validate_passphrase(&passphrase)?;
    Ok(passphrase)
}

/// Get the passphrase for an existing backup
pub fn read_passphrase(env_var: Option<&str>) -> SshVaultResult<SecureString> {
    match env_var {
        Some(var) => passphrase_from_env(var),
        None => prompt_passphrase("Backup passphrase: "),
    }
}

/// Get a passphrase for a new backup, asking twice on the terminal
pub fn read_new_passphrase(env_var: Option<&str>) -> SshVaultResult<SecureString> {
    if let Some(var) = env_var {
        return passphrase_from_env(var);
    }

    loop {
        let pass1 = prompt_passphrase("Enter new passphrase: ")?;

        if let Err(e) = validate_passphrase(&pass1) {
            eprintln!("{}. Please try again.", e);
            continue;
        }

        let pass2 = prompt_passphrase("Confirm passphrase: ")?;

        if pass1.as_str() != pass2.as_str() {
            eprintln!("Passphrases do not match. Please try again.");
            continue;
        }

        return Ok(pass1);
    }
}

/// Prompt for a passphrase (hidden input)
fn prompt_passphrase(prompt: &str) -> SshVaultResult<SecureString> {
    rpassword::prompt_password(prompt)
        .map(SecureString::new)
        .map_err(|e| SshVaultError::Io(format!("Failed to read passphrase: {}", e)))
}
