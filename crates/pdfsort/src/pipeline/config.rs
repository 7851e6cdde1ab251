use std::path::PathBuf;

use crate::categorizer::KeywordSet;
use crate::config::SorterConfig;

pub struct PipelineConfig {
    pub root_directory: PathBuf,
    pub dry_run: bool,
    /// Reported but not applied when filing documents.
    pub year_filter: Option<i32>,
    pub keywords: KeywordSet,
    pub undesired_keywords: KeywordSet,
    pub ocr_enabled: bool,
    pub ocr_languages: Vec<String>,
}

impl PipelineConfig {
    pub fn from_config(config: &SorterConfig, root_directory: impl Into<PathBuf>) -> Self {
        Self {
            root_directory: root_directory.into(),
            dry_run: false,
            year_filter: None,
            keywords: KeywordSet::new(&config.keywords),
            undesired_keywords: KeywordSet::new(&config.undesired_keywords),
            ocr_enabled: config.ocr.enabled,
            ocr_languages: config.ocr.languages.clone(),
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_year_filter(mut self, year: Option<i32>) -> Self {
        self.year_filter = year;
        self
    }

    /// Adds keywords after the configured ones.
    pub fn with_extra_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords.extend(keywords);
        self
    }
}
