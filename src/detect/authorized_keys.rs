//! authorized_keys files

use super::{content_rules_apply, Detection, Detector};
use crate::models::{KeyFormat, KeyInfo, KeyType};

/// Content with this many key lines or more is not treated as authorized_keys
const MAX_CONTENT_LINES: usize = 50;

pub struct AuthorizedKeysDetector;

impl Detector for AuthorizedKeysDetector {
    fn name(&self) -> &'static str {
        "authorized_keys"
    }

    fn detect(&self, filename: &str, content: &str) -> Option<Detection> {
        if filename.to_lowercase().contains("authorized_keys") {
            return Some(Detection::new(KeyType::Authorized, KeyFormat::Openssh));
        }

        if !content_rules_apply(filename, KeyType::Authorized) {
            return None;
        }

        let lines: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let looks_like_keys = !lines.is_empty()
            && lines.len() < MAX_CONTENT_LINES
            && lines.iter().all(|line| line.starts_with("ssh-"));

        looks_like_keys.then(|| Detection::new(KeyType::Authorized, KeyFormat::Openssh))
    }

    fn related_files(&self, _key: &KeyInfo, _all_files: &[String]) -> Vec<String> {
        Vec::new()
    }
}
