//! RSA keys, and every `.pub` file

use super::{
    same_base_name, Detection, Detector, OPENSSH_PRIVATE_MARKER, RSA_PRIVATE_MARKER,
};
use crate::models::{KeyFormat, KeyInfo, KeyType};

/// First detector in the chain
///
/// A `.pub` suffix always means a public key, whatever the content says.
pub struct RsaDetector;

impl Detector for RsaDetector {
    fn name(&self) -> &'static str {
        "rsa"
    }

    fn detect(&self, filename: &str, content: &str) -> Option<Detection> {
        let lower = filename.to_lowercase();

        if lower.ends_with(".pub") {
            return Some(Detection::new(KeyType::Public, public_format(content)));
        }

        if content.contains(RSA_PRIVATE_MARKER) {
            return Some(Detection::new(KeyType::Private, KeyFormat::Rsa));
        }

        // Other algorithms are left to the OpenSSH detector
        if content.contains(OPENSSH_PRIVATE_MARKER) && !names_other_algorithm(&lower) {
            return Some(Detection::new(KeyType::Private, KeyFormat::Rsa));
        }

        if lower.contains("rsa") {
            return Some(Detection::new(KeyType::Private, KeyFormat::Rsa));
        }

        None
    }

    fn related_files(&self, key: &KeyInfo, all_files: &[String]) -> Vec<String> {
        same_base_name(key, all_files)
    }
}

fn names_other_algorithm(lower_name: &str) -> bool {
    ["ed25519", "ecdsa", "dsa"]
        .iter()
        .any(|alg| lower_name.contains(alg))
}

/// Format of a `.pub` file, `Rsa` unless the key line says otherwise
fn public_format(content: &str) -> KeyFormat {
    let first = content.trim_start();
    if first.starts_with("ssh-ed25519") {
        KeyFormat::Ed25519
    } else if first.starts_with("ecdsa-sha2-") || first.starts_with("ssh-ecdsa") {
        KeyFormat::Ecdsa
    } else {
        KeyFormat::Rsa
    }
}
