//! Aggregate result of scanning an SSH directory

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::key::{KeyInfo, KeyPairInfo, KeyPurpose, KeyType};

/// Counts describing a scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub total_files: usize,
    pub private_keys: usize,
    pub public_keys: usize,
    pub key_pairs: usize,
    pub system_files: usize,
    pub unknown_files: usize,
    /// Number of files attributed to each named service
    #[serde(default)]
    pub services: BTreeMap<String, usize>,
}

/// Everything learned from one directory scan
///
/// Built once and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Classified files, sorted by filename
    pub keys: Vec<KeyInfo>,
    /// Pair records keyed by base name
    pub key_pairs: BTreeMap<String, KeyPairInfo>,
    /// Filenames grouped by purpose
    pub categories: BTreeMap<KeyPurpose, Vec<String>>,
    pub system_files: Vec<String>,
    pub unknown_files: Vec<String>,
    pub summary: DetectionSummary,
}

impl DetectionResult {
    /// Assemble the result from classified keys and their pairs
    pub fn new(mut keys: Vec<KeyInfo>, key_pairs: BTreeMap<String, KeyPairInfo>) -> Self {
        keys.sort_by(|a, b| a.filename.cmp(&b.filename));

        let mut categories: BTreeMap<KeyPurpose, Vec<String>> = BTreeMap::new();
        let mut system_files = Vec::new();
        let mut unknown_files = Vec::new();
        let mut summary = DetectionSummary {
            total_files: keys.len(),
            key_pairs: key_pairs.len(),
            ..Default::default()
        };

        for key in &keys {
            categories
                .entry(key.purpose)
                .or_default()
                .push(key.filename.clone());

            match key.key_type {
                KeyType::Private => summary.private_keys += 1,
                KeyType::Public => summary.public_keys += 1,
                KeyType::Unknown => unknown_files.push(key.filename.clone()),
                t if t.is_system() => system_files.push(key.filename.clone()),
                _ => {}
            }

            if let Some(service) = &key.service {
                *summary.services.entry(service.clone()).or_default() += 1;
            }
        }

        summary.system_files = system_files.len();
        summary.unknown_files = unknown_files.len();

        Self {
            keys,
            key_pairs,
            categories,
            system_files,
            unknown_files,
            summary,
        }
    }

    /// Look up the classification of a file
    pub fn key(&self, filename: &str) -> Option<&KeyInfo> {
        self.keys.iter().find(|k| k.filename == filename)
    }

    /// Filenames of all classified files
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|k| k.filename.as_str())
    }
}
