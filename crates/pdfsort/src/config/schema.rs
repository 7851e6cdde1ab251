use serde::{Deserialize, Serialize};

use crate::categorizer::{DEFAULT_KEYWORDS, DEFAULT_UNDESIRED_KEYWORDS};
use crate::worker::{default_worker_count, DEFAULT_MAX_DEPTH};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SorterConfig {
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    #[serde(default = "default_undesired_keywords")]
    pub undesired_keywords: Vec<String>,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Directory levels below the root searched for PDFs.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_keywords() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

fn default_undesired_keywords() -> Vec<String> {
    DEFAULT_UNDESIRED_KEYWORDS
        .iter()
        .map(|k| k.to_string())
        .collect()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for SorterConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            undesired_keywords: default_undesired_keywords(),
            ocr: OcrConfig::default(),
            worker_count: default_worker_count(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Tesseract language codes, e.g. `eng` or `fra`.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_languages() -> Vec<String> {
    vec!["eng".to_string()]
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            languages: default_languages(),
        }
    }
}
