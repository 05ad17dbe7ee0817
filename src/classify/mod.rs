//! Classification beyond file type
//!
//! - `enhancer`: assigns a service label and a purpose to detected files
//! - `pairing`: groups private and public keys by base name

pub mod enhancer;
pub mod pairing;

pub use enhancer::{ClassificationEnhancer, PurposeRule, ServiceRule};
pub use pairing::{base_name, match_pairs, KEY_SUFFIXES};
