//! Key derivation using PBKDF2-HMAC-SHA256
//!
//! Stretches a passphrase and a random salt into a 256-bit AES key.

use std::fmt;

use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{SshVaultError, SshVaultResult};

/// Salt length in bytes
pub const SALT_SIZE: usize = 16;

/// Derived key length in bytes (AES-256)
pub const KEY_SIZE: usize = 32;

/// Iteration count used when none is configured
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Lowest accepted iteration count
pub const MIN_ITERATIONS: u32 = 10_000;

/// Highest accepted iteration count
pub const MAX_ITERATIONS: u32 = 1_000_000;

/// A derived encryption key, zeroed on drop
pub struct DerivedKey {
    key: Zeroizing<[u8; KEY_SIZE]>,
}

impl DerivedKey {
    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey").finish_non_exhaustive()
    }
}

/// Check an iteration count against the accepted range
pub fn validate_iterations(iterations: u32) -> SshVaultResult<()> {
    if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&iterations) {
        return Err(SshVaultError::Validation(format!(
            "Iteration count {} out of range [{}, {}]",
            iterations, MIN_ITERATIONS, MAX_ITERATIONS
        )));
    }
    Ok(())
}

/// Generate a fresh random salt
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive an encryption key from a passphrase
pub fn derive_key(passphrase: &str, salt: &[u8], iterations: u32) -> SshVaultResult<DerivedKey> {
    validate_iterations(iterations)?;

    if salt.len() != SALT_SIZE {
        return Err(SshVaultError::Validation(format!(
            "Invalid salt size: expected {}, got {}",
            SALT_SIZE,
            salt.len()
        )));
    }

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, iterations, &mut *key);

    Ok(DerivedKey { key })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key() {
        let salt = generate_salt();
        let key = derive_key("test_passphrase", &salt, MIN_ITERATIONS).unwrap();
        assert_eq!(key.as_bytes().len(), KEY_SIZE);
    }

    #[test]
    fn test_same_inputs_same_key() {
        let salt = [3u8; SALT_SIZE];
        let key1 = derive_key("test_passphrase", &salt, MIN_ITERATIONS).unwrap();
        let key2 = derive_key("test_passphrase", &salt, MIN_ITERATIONS).unwrap();
        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_passphrase_different_key() {
        let salt = [3u8; SALT_SIZE];
        let key1 = derive_key("passphrase1", &salt, MIN_ITERATIONS).unwrap();
        let key2 = derive_key("passphrase2", &salt, MIN_ITERATIONS).unwrap();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_salt_different_key() {
        let key1 = derive_key("same_passphrase", &generate_salt(), MIN_ITERATIONS).unwrap();
        let key2 = derive_key("same_passphrase", &generate_salt(), MIN_ITERATIONS).unwrap();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_iteration_bounds() {
        assert!(validate_iterations(MIN_ITERATIONS - 1).is_err());
        assert!(validate_iterations(MAX_ITERATIONS + 1).is_err());
        assert!(validate_iterations(DEFAULT_ITERATIONS).is_ok());
    }

    #[test]
    fn test_bad_salt_rejected() {
        let err = derive_key("passphrase", &[0u8; 4], MIN_ITERATIONS).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_debug_hides_key() {
        let key = derive_key("passphrase", &[7u8; SALT_SIZE], MIN_ITERATIONS).unwrap();
        assert_eq!(format!("{:?}", key), "DerivedKey { .. }");
    }
}
