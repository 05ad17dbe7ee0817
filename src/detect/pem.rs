//! PEM-encoded private keys and certificates

use super::{Detection, Detector, CERTIFICATE_MARKER, PEM_PRIVATE_MARKERS};
use crate::models::{KeyFormat, KeyInfo, KeyType};

pub struct PemDetector;

impl Detector for PemDetector {
    fn name(&self) -> &'static str {
        "pem"
    }

    fn detect(&self, filename: &str, content: &str) -> Option<Detection> {
        let is_pem_name = filename.to_lowercase().ends_with(".pem");
        let has_private = PEM_PRIVATE_MARKERS.iter().any(|m| content.contains(m));
        let has_certificate = content.contains(CERTIFICATE_MARKER);

        if has_certificate {
            return Some(Detection::new(KeyType::Certificate, KeyFormat::Pem));
        }
        if has_private || is_pem_name {
            return Some(Detection::new(KeyType::Private, KeyFormat::Pem));
        }
        None
    }

    fn related_files(&self, _key: &KeyInfo, _all_files: &[String]) -> Vec<String> {
        Vec::new()
    }
}
