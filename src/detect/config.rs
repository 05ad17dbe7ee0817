//! SSH client configuration

use super::{content_rules_apply, Detection, Detector};
use crate::models::{KeyFormat, KeyInfo, KeyType};

const CONFIG_KEYWORDS: [&str; 3] = ["host ", "hostname ", "identityfile "];

pub struct ConfigDetector;

impl Detector for ConfigDetector {
    fn name(&self) -> &'static str {
        "config"
    }

    fn detect(&self, filename: &str, content: &str) -> Option<Detection> {
        if filename.eq_ignore_ascii_case("config") {
            return Some(Detection::new(KeyType::Config, KeyFormat::Config));
        }

        if !content_rules_apply(filename, KeyType::Config) {
            return None;
        }

        let lower = content.to_lowercase();
        if CONFIG_KEYWORDS.iter().any(|k| lower.contains(k)) {
            return Some(Detection::new(KeyType::Config, KeyFormat::Config));
        }

        None
    }

    fn related_files(&self, _key: &KeyInfo, _all_files: &[String]) -> Vec<String> {
        Vec::new()
    }
}
