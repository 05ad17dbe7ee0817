//! Key classification models
//!
//! Represents one classified file in an SSH directory and the private/public
//! pairs derived from those classifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a file is, as far as SSH is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    /// Private key material
    Private,
    /// Public key
    Public,
    /// SSH client configuration
    Config,
    /// known_hosts style file
    Hosts,
    /// authorized_keys style file
    Authorized,
    /// X.509 certificate
    Certificate,
    /// Anything the detectors did not recognize
    Unknown,
}

impl KeyType {
    /// Returns true for files that configure SSH rather than hold identities
    pub fn is_system(&self) -> bool {
        matches!(self, Self::Config | Self::Hosts | Self::Authorized)
    }

    /// Returns true for key halves that take part in pairing
    pub fn is_key(&self) -> bool {
        matches!(self, Self::Private | Self::Public)
    }

    /// Parse key type from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "private" => Some(Self::Private),
            "public" => Some(Self::Public),
            "config" => Some(Self::Config),
            "hosts" | "known_hosts" => Some(Self::Hosts),
            "authorized" | "authorized_keys" => Some(Self::Authorized),
            "certificate" | "cert" => Some(Self::Certificate),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Private => "private",
            Self::Public => "public",
            Self::Config => "config",
            Self::Hosts => "hosts",
            Self::Authorized => "authorized",
            Self::Certificate => "certificate",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Encoding or algorithm family of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyFormat {
    Rsa,
    Pem,
    Openssh,
    Ed25519,
    Ecdsa,
    Config,
    Hosts,
    Unknown,
}

impl fmt::Display for KeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Rsa => "rsa",
            Self::Pem => "pem",
            Self::Openssh => "openssh",
            Self::Ed25519 => "ed25519",
            Self::Ecdsa => "ecdsa",
            Self::Config => "config",
            Self::Hosts => "hosts",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Coarse intent of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyPurpose {
    /// Bound to a named external service (GitHub, GitLab, ...)
    Service,
    /// Personal identity
    Personal,
    /// Work identity
    Work,
    /// Cloud infrastructure access
    Cloud,
    /// SSH's own bookkeeping files
    System,
}

impl KeyPurpose {
    /// Parse purpose from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "service" => Some(Self::Service),
            "personal" => Some(Self::Personal),
            "work" => Some(Self::Work),
            "cloud" => Some(Self::Cloud),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

impl fmt::Display for KeyPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Service => "service",
            Self::Personal => "personal",
            Self::Work => "work",
            Self::Cloud => "cloud",
            Self::System => "system",
        };
        f.write_str(s)
    }
}

/// A classified file
///
/// Created by the detector chain, enriched once by the classification
/// enhancer, and not modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInfo {
    /// File name inside the SSH directory
    pub filename: String,

    #[serde(rename = "type")]
    pub key_type: KeyType,

    pub format: KeyFormat,

    /// Named service, set only when purpose is `Service`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    pub purpose: KeyPurpose,

    /// POSIX mode bits as captured from disk
    pub permissions: u32,

    /// Size in bytes
    pub size: u64,

    /// Last modification time
    pub mod_time: DateTime<Utc>,
}

/// A private key and its public counterpart, grouped by base name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPairInfo {
    pub base_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_file: Option<String>,
}

impl KeyPairInfo {
    /// Create an empty pair record
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            private_file: None,
            public_file: None,
        }
    }

    /// Returns true if both halves are present
    pub fn is_complete(&self) -> bool {
        self.private_file.is_some() && self.public_file.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_type_parse() {
        assert_eq!(KeyType::parse("private"), Some(KeyType::Private));
        assert_eq!(KeyType::parse("KNOWN_HOSTS"), Some(KeyType::Hosts));
        assert_eq!(KeyType::parse("nope"), None);
    }

    #[test]
    fn test_key_type_system() {
        assert!(KeyType::Config.is_system());
        assert!(KeyType::Authorized.is_system());
        assert!(!KeyType::Private.is_system());
        assert!(KeyType::Public.is_key());
    }

    #[test]
    fn test_key_info_serialization() {
        let info = KeyInfo {
            filename: "id_rsa".into(),
            key_type: KeyType::Private,
            format: KeyFormat::Rsa,
            service: None,
            purpose: KeyPurpose::Personal,
            permissions: 0o600,
            size: 42,
            mod_time: Utc::now(),
        };

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["type"], "private");
        assert_eq!(json["format"], "rsa");
        assert_eq!(json["permissions"], 384);
        assert!(json.get("service").is_none());

        let back: KeyInfo = serde_json::from_value(json).unwrap();
        assert_eq!(back, info);
    }

    #[test]
    fn test_pair_complete() {
        let mut pair = KeyPairInfo::new("id_rsa");
        assert!(!pair.is_complete());
        pair.private_file = Some("id_rsa".into());
        pair.public_file = Some("id_rsa.pub".into());
        assert!(pair.is_complete());
    }
}
