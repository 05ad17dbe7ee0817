//! Key-pair matching
//!
//! A private key and its public half are associated through their base name:
//! the filename with one known key suffix removed.

use std::collections::BTreeMap;

use tracing::debug;

use crate::models::{KeyInfo, KeyPairInfo, KeyType};

/// Suffixes stripped to obtain a base name
pub const KEY_SUFFIXES: [&str; 6] = [".pub", ".pem", ".rsa", ".dsa", ".ecdsa", ".ed25519"];

/// Strip a single trailing key suffix; the longest matching suffix wins
///
/// Matching ignores ASCII case. A name that consists only of a suffix is
/// returned unchanged.
pub fn base_name(filename: &str) -> &str {
    KEY_SUFFIXES
        .iter()
        .filter_map(|suffix| {
            let idx = filename.len().checked_sub(suffix.len())?;
            let tail = filename.get(idx..)?;
            (idx > 0 && tail.eq_ignore_ascii_case(suffix)).then_some(idx)
        })
        .min()
        .map_or(filename, |idx| &filename[..idx])
}

/// Group private and public keys into pair records keyed by base name
///
/// Keys are visited in filename order. When two files compete for the same
/// slot of a base name, the later one replaces the earlier one.
pub fn match_pairs(keys: &[KeyInfo]) -> BTreeMap<String, KeyPairInfo> {
    let mut ordered: Vec<&KeyInfo> = keys.iter().filter(|k| k.key_type.is_key()).collect();
    ordered.sort_by(|a, b| a.filename.cmp(&b.filename));

    let mut pairs: BTreeMap<String, KeyPairInfo> = BTreeMap::new();

    for key in ordered {
        let base = base_name(&key.filename).to_string();
        let pair = pairs
            .entry(base.clone())
            .or_insert_with(|| KeyPairInfo::new(base.clone()));

        let slot = match key.key_type {
            KeyType::Private => &mut pair.private_file,
            _ => &mut pair.public_file,
        };

        if let Some(previous) = slot.replace(key.filename.clone()) {
            debug!(
                base_name = %base,
                replaced = %previous,
                by = %key.filename,
                "duplicate key for base name, keeping the later file"
            );
        }
    }

    pairs
}
