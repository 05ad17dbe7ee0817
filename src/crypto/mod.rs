//! Cryptographic functions for sshvault
//!
//! Provides AES-256-GCM encryption with PBKDF2-HMAC-SHA256 key derivation
//! for backed-up SSH files.

pub mod encryption;
pub mod key_derivation;
pub mod passphrase;
pub mod secure_memory;

pub use encryption::{EncryptedData, EncryptionEngine, ALGORITHM};
pub use key_derivation::{DerivedKey, DEFAULT_ITERATIONS, MAX_ITERATIONS, MIN_ITERATIONS};
pub use passphrase::{generate_passphrase, validate_passphrase};
pub use secure_memory::{SecureBytes, SecureString};
