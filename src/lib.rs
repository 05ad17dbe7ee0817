//! sshvault - classify, encrypt, back up and restore SSH directories
//!
//! This library provides the core functionality for the sshvault command
//! line tool. It reads an SSH directory, works out what every file is,
//! packages the files into an encrypted backup record, and later restores
//! them with their exact permissions.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `logging`: `tracing` subscriber setup
//! - `models`: Core data models (keys, scan results, backup records)
//! - `normalize`: Home-relative directory paths
//! - `detect`: Ordered file-type detector chain
//! - `classify`: Service/purpose rules and key-pair matching
//! - `crypto`: AES-256-GCM with PBKDF2 key derivation, secure memory
//! - `backup`: Directory reader and permission-exact restore
//! - `storage`: Atomic JSON storage of backup records
//! - `cli`: Command handlers for the `sshvault` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use sshvault::config::{paths::VaultPaths, settings::Settings};
//!
//! let paths = VaultPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! ```

pub mod backup;
pub mod classify;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod detect;
pub mod error;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod storage;

pub use error::{SshVaultError, SshVaultResult};
