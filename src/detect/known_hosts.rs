//! known_hosts files

use super::{content_rules_apply, Detection, Detector};
use crate::models::{KeyFormat, KeyInfo, KeyType};

pub struct KnownHostsDetector;

impl Detector for KnownHostsDetector {
    fn name(&self) -> &'static str {
        "known_hosts"
    }

    fn detect(&self, filename: &str, content: &str) -> Option<Detection> {
        if filename.to_lowercase().contains("known_hosts") {
            return Some(Detection::new(KeyType::Hosts, KeyFormat::Hosts));
        }

        if !content_rules_apply(filename, KeyType::Hosts) {
            return None;
        }

        let has_host_line = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .any(|line| line.contains(" ssh-"));

        has_host_line.then(|| Detection::new(KeyType::Hosts, KeyFormat::Hosts))
    }

    fn related_files(&self, key: &KeyInfo, all_files: &[String]) -> Vec<String> {
        if key.key_type != KeyType::Hosts {
            return Vec::new();
        }
        all_files
            .iter()
            .filter(|f| f.as_str() != key.filename && f.to_lowercase().contains("known_hosts"))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name() {
        assert!(KnownHostsDetector.detect("known_hosts.old", "").is_some());
    }

    #[test]
    fn test_by_content() {
        let d = KnownHostsDetector;
        assert!(d
            .detect("hosts_backup", "\n|1|abc= ssh-rsa AAAA\n")
            .is_some());
        assert!(d.detect("hosts_backup", "no key lines here").is_none());
    }

    #[test]
    fn test_leaves_authorized_keys_alone() {
        let content = "command=\"/bin/true\" ssh-ed25519 AAAA ci@runner\n";
        assert!(KnownHostsDetector.detect("authorized_keys", content).is_none());
    }
}
