use std::path::PathBuf;

use crate::categorizer::Classification;
use crate::worker::job::Job;

use super::error::PipelineWarning;

pub struct PipelineContext {
    // Input
    pub job: Job,

    // Step 1 results: lowercased document text and how it was obtained
    pub text: String,
    pub pages_read: usize,
    pub ocr_images: usize,
    pub ocr_used: bool,

    // Step 2 result
    pub classification: Option<Classification>,

    // Step 3 result: final path, or the planned one in preview mode
    pub destination: Option<PathBuf>,

    // Non-fatal warnings
    pub warnings: Vec<PipelineWarning>,
}

impl PipelineContext {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            text: String::new(),
            pages_read: 0,
            ocr_images: 0,
            ocr_used: false,
            classification: None,
            destination: None,
            warnings: Vec::new(),
        }
    }

    /// Appends a text fragment: lowercased, newlines flattened, separated
    /// from what came before by a single space.
    pub fn append_text(&mut self, fragment: &str) {
        let fragment = fragment.replace(['\r', '\n'], " ").to_lowercase();
        if fragment.trim().is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(&fragment);
    }
}
