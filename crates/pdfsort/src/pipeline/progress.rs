use std::path::PathBuf;

use crate::categorizer::Classification;
use crate::worker::job::JobResult;

/// Events emitted while a run progresses. Per-document events carry the
/// source path because one reporter is shared by every worker.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    ArchiveExtracted {
        archive: PathBuf,
        entries: usize,
    },
    /// Preview mode: the archive would have been extracted.
    ArchivePending {
        archive: PathBuf,
    },
    ArchiveFailed {
        archive: PathBuf,
        error: String,
    },
    ScanCompleted {
        files: usize,
    },
    DocumentStarted {
        path: PathBuf,
        pages: usize,
    },
    PageText {
        path: PathBuf,
        page: u32,
        chars: usize,
    },
    OcrStarted {
        path: PathBuf,
        page: u32,
        images: usize,
    },
    OcrImage {
        path: PathBuf,
        page: u32,
        index: usize,
        total: usize,
    },
    /// Enough text was recognized; the rest of the page's images are skipped.
    OcrSettled {
        path: PathBuf,
        page: u32,
        skipped: usize,
    },
    /// No embedded image was readable; the whole page was rendered for OCR.
    PageRendered {
        path: PathBuf,
        page: u32,
    },
    ImageSkipped {
        path: PathBuf,
        page: u32,
        image: String,
        reason: String,
    },
    Classified {
        path: PathBuf,
        classification: Classification,
    },
    Failed {
        path: PathBuf,
        error: String,
    },
    FileCompleted {
        completed: usize,
        total: usize,
        result: JobResult,
    },
    DirectoriesPruned {
        removed: Vec<PathBuf>,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for library use and unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Completion percentage, 100 for an empty run.
pub fn percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        completed as f64 * 100.0 / total as f64
    }
}
