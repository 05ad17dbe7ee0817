//! Claims whatever nothing else did

use super::{Detection, Detector};
use crate::models::{KeyFormat, KeyInfo, KeyType};

pub struct CatchAllDetector;

impl Detector for CatchAllDetector {
    fn name(&self) -> &'static str {
        "catch_all"
    }

    fn detect(&self, _filename: &str, _content: &str) -> Option<Detection> {
        Some(Detection::new(KeyType::Unknown, KeyFormat::Unknown))
    }

    fn related_files(&self, _key: &KeyInfo, _all_files: &[String]) -> Vec<String> {
        Vec::new()
    }
}
