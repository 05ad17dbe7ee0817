//! Service and purpose classification
//!
//! Precedence is strict:
//!
//! 1. A service pattern match sets `service` and purpose `Service`.
//! 2. Otherwise a purpose rule match sets that purpose.
//! 3. Otherwise config/hosts/authorized files are `System`, everything
//!    else `Personal`.
//!
//! Within each level rules are tried in declaration order and the first
//! match wins. Patterns are globs matched case-insensitively against the
//! filename alone; a `.pub` file only follows a rule whose pattern matches
//! its own name.

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{SshVaultError, SshVaultResult};
use crate::models::{KeyInfo, KeyPurpose};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Glob patterns that identify a named service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRule {
    pub service: String,
    pub patterns: Vec<String>,
}

impl ServiceRule {
    pub fn new(service: &str, patterns: &[&str]) -> Self {
        Self {
            service: service.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// A glob pattern mapped to a purpose
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurposeRule {
    pub pattern: String,
    pub purpose: KeyPurpose,
}

impl PurposeRule {
    pub fn new(pattern: &str, purpose: KeyPurpose) -> Self {
        Self {
            pattern: pattern.to_string(),
            purpose,
        }
    }
}

/// Built-in service patterns, in evaluation order
pub fn default_service_rules() -> Vec<ServiceRule> {
    vec![
        ServiceRule::new("github", &["*github*", "*gh_*"]),
        ServiceRule::new("gitlab", &["*gitlab*"]),
        ServiceRule::new("bitbucket", &["*bitbucket*"]),
        ServiceRule::new("aws", &["*aws*"]),
        ServiceRule::new("azure", &["*azure*"]),
        ServiceRule::new("gcp", &["*gcp*", "*gcloud*"]),
        ServiceRule::new("heroku", &["*heroku*"]),
        ServiceRule::new("digitalocean", &["*digitalocean*"]),
    ]
}

/// Built-in purpose rules, in evaluation order
pub fn default_purpose_rules() -> Vec<PurposeRule> {
    vec![
        PurposeRule::new("*work*", KeyPurpose::Work),
        PurposeRule::new("*corp*", KeyPurpose::Work),
        PurposeRule::new("*company*", KeyPurpose::Work),
        PurposeRule::new("*office*", KeyPurpose::Work),
        PurposeRule::new("*cloud*", KeyPurpose::Cloud),
        PurposeRule::new("*ec2*", KeyPurpose::Cloud),
        PurposeRule::new("*k8s*", KeyPurpose::Cloud),
        PurposeRule::new("*vps*", KeyPurpose::Cloud),
        PurposeRule::new("*personal*", KeyPurpose::Personal),
        PurposeRule::new("id_rsa", KeyPurpose::Personal),
        PurposeRule::new("id_ed25519", KeyPurpose::Personal),
        PurposeRule::new("id_ecdsa", KeyPurpose::Personal),
        PurposeRule::new("id_dsa", KeyPurpose::Personal),
    ]
}

/// Check that every pattern in the rule sets is a valid glob
pub fn validate_rules(services: &[ServiceRule], purposes: &[PurposeRule]) -> SshVaultResult<()> {
    let patterns = services
        .iter()
        .flat_map(|s| s.patterns.iter())
        .chain(purposes.iter().map(|p| &p.pattern));

    for pattern in patterns {
        Pattern::new(pattern).map_err(|e| {
            SshVaultError::Config(format!("Invalid glob pattern '{}': {}", pattern, e))
        })?;
    }
    Ok(())
}

fn compile(pattern: &str) -> Option<Pattern> {
    match Pattern::new(pattern) {
        Ok(p) => Some(p),
        Err(e) => {
            warn!(pattern, error = %e, "ignoring invalid classification pattern");
            None
        }
    }
}

/// Match outcome before falling back to type defaults
enum RuleMatch {
    Service(String),
    Purpose(KeyPurpose),
}

/// Assigns service and purpose to detected files
#[derive(Debug, Clone)]
pub struct ClassificationEnhancer {
    services: Vec<(String, Vec<Pattern>)>,
    purposes: Vec<(Pattern, KeyPurpose)>,
}

impl Default for ClassificationEnhancer {
    fn default() -> Self {
        Self::new(&default_service_rules(), &default_purpose_rules())
    }
}

impl ClassificationEnhancer {
    /// Compile rule sets; invalid patterns are skipped with a warning
    pub fn new(services: &[ServiceRule], purposes: &[PurposeRule]) -> Self {
        Self {
            services: services
                .iter()
                .map(|rule| {
                    let patterns = rule.patterns.iter().filter_map(|p| compile(p)).collect();
                    (rule.service.clone(), patterns)
                })
                .collect(),
            purposes: purposes
                .iter()
                .filter_map(|rule| compile(&rule.pattern).map(|p| (p, rule.purpose)))
                .collect(),
        }
    }

    /// Return `key` with service and purpose assigned
    pub fn enhance(&self, mut key: KeyInfo) -> KeyInfo {
        match self.match_rules(&key.filename) {
            Some(RuleMatch::Service(service)) => {
                key.service = Some(service);
                key.purpose = KeyPurpose::Service;
            }
            Some(RuleMatch::Purpose(purpose)) => {
                key.service = None;
                key.purpose = purpose;
            }
            None => {
                key.service = None;
                key.purpose = if key.key_type.is_system() {
                    KeyPurpose::System
                } else {
                    KeyPurpose::Personal
                };
            }
        }

        key
    }

    fn match_rules(&self, filename: &str) -> Option<RuleMatch> {
        if let Some(service) = self.match_service(filename) {
            return Some(RuleMatch::Service(service.to_string()));
        }
        self.match_purpose(filename).map(RuleMatch::Purpose)
    }

    fn match_service(&self, filename: &str) -> Option<&str> {
        self.services
            .iter()
            .find(|(_, patterns)| {
                patterns
                    .iter()
                    .any(|p| p.matches_with(filename, MATCH_OPTIONS))
            })
            .map(|(service, _)| service.as_str())
    }

    fn match_purpose(&self, filename: &str) -> Option<KeyPurpose> {
        self.purposes
            .iter()
            .find(|(p, _)| p.matches_with(filename, MATCH_OPTIONS))
            .map(|(_, purpose)| *purpose)
    }
}
