//! Configuration module for sshvault
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - User settings persistence
//! - Classification rules and KDF strength

pub mod paths;
pub mod settings;

pub use paths::VaultPaths;
pub use settings::Settings;
