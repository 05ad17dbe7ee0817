//! File-type detection for SSH directories
//!
//! Detection runs an explicit, ordered list of independent detectors. Each
//! looks at a filename and a content prefix and may claim the file; the first
//! claim wins. The last detector claims everything, so no file in a scanned
//! directory is ever dropped.
//!
//! # Order
//!
//! 1. `RsaDetector` - `.pub` files, RSA/OpenSSH private keys, `*rsa*` names
//! 2. `PemDetector` - PEM private keys and certificates
//! 3. `OpenSshDetector` - Ed25519/ECDSA keys, other OpenSSH private keys
//! 4. `ConfigDetector` - client configuration
//! 5. `KnownHostsDetector`
//! 6. `AuthorizedKeysDetector`
//! 7. `CatchAllDetector`

mod authorized_keys;
mod catch_all;
mod config;
mod known_hosts;
mod openssh;
mod pem;
mod rsa;

pub use authorized_keys::AuthorizedKeysDetector;
pub use catch_all::CatchAllDetector;
pub use config::ConfigDetector;
pub use known_hosts::KnownHostsDetector;
pub use openssh::OpenSshDetector;
pub use pem::PemDetector;
pub use rsa::RsaDetector;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::classify::pairing::base_name;
use crate::models::{KeyFormat, KeyInfo, KeyPurpose, KeyType};

/// Maximum number of content bytes handed to detectors
pub const CONTENT_PREFIX_LEN: usize = 8 * 1024;

pub(crate) const RSA_PRIVATE_MARKER: &str = "BEGIN RSA PRIVATE KEY";
pub(crate) const OPENSSH_PRIVATE_MARKER: &str = "BEGIN OPENSSH PRIVATE KEY";
pub(crate) const EC_PRIVATE_MARKER: &str = "BEGIN EC PRIVATE KEY";
pub(crate) const CERTIFICATE_MARKER: &str = "BEGIN CERTIFICATE";
pub(crate) const PEM_PRIVATE_MARKERS: [&str; 3] = [
    "BEGIN PRIVATE KEY",
    "BEGIN ENCRYPTED PRIVATE KEY",
    "BEGIN DSA PRIVATE KEY",
];

/// What a detector concluded about a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub key_type: KeyType,
    pub format: KeyFormat,
}

impl Detection {
    pub fn new(key_type: KeyType, format: KeyFormat) -> Self {
        Self { key_type, format }
    }
}

/// A single classifier in the detection chain
pub trait Detector {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Claim the file, or return `None` to pass it down the chain
    fn detect(&self, filename: &str, content: &str) -> Option<Detection>;

    /// Other files in the directory that belong with `key`
    fn related_files(&self, key: &KeyInfo, all_files: &[String]) -> Vec<String>;
}

/// Filesystem facts captured alongside a file's content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    pub permissions: u32,
    pub size: u64,
    pub mod_time: DateTime<Utc>,
}

/// Ordered, immutable list of detectors
pub struct DetectorChain {
    detectors: Vec<Box<dyn Detector>>,
}

impl Default for DetectorChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl DetectorChain {
    /// The standard chain in its fixed priority order
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(RsaDetector),
            Box::new(PemDetector),
            Box::new(OpenSshDetector),
            Box::new(ConfigDetector),
            Box::new(KnownHostsDetector),
            Box::new(AuthorizedKeysDetector),
        ])
    }

    /// Build a chain from custom detectors
    ///
    /// A catch-all detector is always appended last.
    pub fn new(mut detectors: Vec<Box<dyn Detector>>) -> Self {
        detectors.push(Box::new(CatchAllDetector));
        Self { detectors }
    }

    /// Names of the detectors in evaluation order
    pub fn names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Run the chain over a file, returning the winning detection
    pub fn detect(&self, filename: &str, content: &[u8]) -> (Detection, &'static str) {
        let prefix = &content[..content.len().min(CONTENT_PREFIX_LEN)];
        let text = String::from_utf8_lossy(prefix);

        for detector in &self.detectors {
            if let Some(detection) = detector.detect(filename, &text) {
                return (detection, detector.name());
            }
        }

        // Unreachable with the catch-all in place
        (
            Detection::new(KeyType::Unknown, KeyFormat::Unknown),
            "none",
        )
    }

    /// Classify a file into a `KeyInfo`
    ///
    /// Service and purpose are filled in later by the classification
    /// enhancer; the placeholder purpose here is `Personal`.
    pub fn classify(&self, filename: &str, content: &[u8], meta: &FileMeta) -> KeyInfo {
        let (detection, detector) = self.detect(filename, content);
        debug!(
            file = filename,
            detector,
            key_type = %detection.key_type,
            format = %detection.format,
            "classified file"
        );

        KeyInfo {
            filename: filename.to_string(),
            key_type: detection.key_type,
            format: detection.format,
            service: None,
            purpose: KeyPurpose::Personal,
            permissions: meta.permissions,
            size: meta.size,
            mod_time: meta.mod_time,
        }
    }

    /// Files related to `key`, from the first detector that knows any
    pub fn related_files(&self, key: &KeyInfo, all_files: &[String]) -> Vec<String> {
        self.detectors
            .iter()
            .map(|d| d.related_files(key, all_files))
            .find(|related| !related.is_empty())
            .unwrap_or_default()
    }
}

/// Names that identify a specific system file regardless of content
pub(crate) fn reserved_type(filename: &str) -> Option<KeyType> {
    let lower = filename.to_lowercase();
    if lower.contains("known_hosts") {
        Some(KeyType::Hosts)
    } else if lower.contains("authorized_keys") {
        Some(KeyType::Authorized)
    } else if lower == "config" {
        Some(KeyType::Config)
    } else {
        None
    }
}

/// True if a content rule for `own` may look at this file
pub(crate) fn content_rules_apply(filename: &str, own: KeyType) -> bool {
    match reserved_type(filename) {
        Some(reserved) => reserved == own,
        None => true,
    }
}

/// Other private/public halves sharing the key's base name
pub(crate) fn same_base_name(key: &KeyInfo, all_files: &[String]) -> Vec<String> {
    if !key.key_type.is_key() {
        return Vec::new();
    }
    let base = base_name(&key.filename);
    all_files
        .iter()
        .filter(|f| f.as_str() != key.filename && base_name(f) == base)
        .cloned()
        .collect()
}
