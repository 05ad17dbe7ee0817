//! Passphrase validation and generation

use rand::rngs::OsRng;
use rand::Rng;
use tracing::warn;

use super::secure_memory::SecureString;
use crate::error::{SshVaultError, SshVaultResult};

/// Shortest passphrase accepted for encryption
pub const MIN_PASSPHRASE_LENGTH: usize = 8;

/// Bounds for generated passphrases
pub const MIN_GENERATED_LENGTH: usize = 16;
pub const MAX_GENERATED_LENGTH: usize = 512;

const CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+[]{};:,.<>?";

/// Reject passphrases that are empty, too short, or contain NUL bytes
pub fn validate_passphrase(passphrase: &str) -> SshVaultResult<()> {
    if passphrase.is_empty() {
        return Err(SshVaultError::Validation(
            "Passphrase cannot be empty".into(),
        ));
    }
    if passphrase.chars().count() < MIN_PASSPHRASE_LENGTH {
        return Err(SshVaultError::Validation(format!(
            "Passphrase must be at least {} characters",
            MIN_PASSPHRASE_LENGTH
        )));
    }
    if passphrase.contains('\0') {
        return Err(SshVaultError::Validation(
            "Passphrase cannot contain null bytes".into(),
        ));
    }
    Ok(())
}

/// Generate a random passphrase from the OS CSPRNG
///
/// Lengths outside `[16, 512]` are clamped with a warning.
pub fn generate_passphrase(length: usize) -> SecureString {
    let clamped = length.clamp(MIN_GENERATED_LENGTH, MAX_GENERATED_LENGTH);
    if clamped != length {
        warn!(
            requested = length,
            used = clamped,
            "passphrase length out of range, clamping"
        );
    }

    let mut rng = OsRng;
    let passphrase: String = (0..clamped)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();

    SecureString::new(passphrase)
}
