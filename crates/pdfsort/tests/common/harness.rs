//! Test harness for isolated sorting runs.
//!
//! The `TestHarness` owns a temporary root directory and fake collaborators:
//! a document source that serves registered pages by path, and an OCR
//! engine that answers by image width and counts its calls.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::DynamicImage;
use tempfile::TempDir;
use walkdir::WalkDir;

use pdfsort::categorizer::Categorizer;
use pdfsort::config::SorterConfig;
use pdfsort::dates::DateExtractor;
use pdfsort::error::ProcessError;
use pdfsort::processor::{DocumentSource, OcrEngine, PdfPage};
use pdfsort::{Pipeline, PipelineConfig, ProgressEvent, ProgressReporter, RunReport, Sorter};

/// Year the date extractor treats as "now".
pub const PINNED_YEAR: i32 = 2026;

#[derive(Default)]
pub struct FakeSource {
    documents: Mutex<HashMap<PathBuf, Vec<PdfPage>>>,
    open_delay: Mutex<Duration>,
}

impl DocumentSource for FakeSource {
    fn open(&self, path: &Path) -> Result<Vec<PdfPage>, ProcessError> {
        let delay = *self.open_delay.lock().unwrap();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        self.documents
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| ProcessError::PdfProcessing(format!("unreadable: {}", path.display())))
    }
}

#[derive(Default)]
pub struct FakeOcr {
    texts: Mutex<HashMap<u32, String>>,
    calls: AtomicUsize,
}

impl OcrEngine for FakeOcr {
    fn recognize(&self, image: &DynamicImage) -> Result<String, ProcessError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts
            .lock()
            .unwrap()
            .get(&image.width())
            .cloned()
            .ok_or_else(|| ProcessError::OcrFailed(format!("no text for width {}", image.width())))
    }
}

#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct TestHarness {
    temp_dir: TempDir,
    pub root: PathBuf,
    pub config: SorterConfig,
    pub worker_count: usize,
    pub year_filter: Option<i32>,
    source: Arc<FakeSource>,
    ocr: Arc<FakeOcr>,
    pub progress: Arc<RecordingProgress>,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("scans");
        std::fs::create_dir_all(&root).expect("Failed to create root");

        Self {
            temp_dir,
            root,
            config: SorterConfig::default(),
            worker_count: 4,
            year_filter: None,
            source: Arc::new(FakeSource::default()),
            ocr: Arc::new(FakeOcr::default()),
            progress: Arc::new(RecordingProgress::default()),
        }
    }

    /// Writes a placeholder PDF at `relative` whose pages the fake source
    /// will serve.
    pub fn write_pdf(&self, relative: &str, pages: Vec<PdfPage>) -> PathBuf {
        let path = self.write_file(relative, b"%PDF-1.5 placeholder");
        self.source
            .documents
            .lock()
            .unwrap()
            .insert(path.clone(), pages);
        path
    }

    /// Registers pages for a file that will appear later, e.g. from an
    /// archive.
    pub fn register_pages(&self, relative: &str, pages: Vec<PdfPage>) {
        self.source
            .documents
            .lock()
            .unwrap()
            .insert(self.root.join(relative), pages);
    }

    /// Writes a raw file below the root.
    pub fn write_file(&self, relative: &str, content: &[u8]) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// OCR answer for images that are `width` pixels wide after downscaling.
    pub fn set_ocr_text(&self, width: u32, text: &str) {
        self.ocr
            .texts
            .lock()
            .unwrap()
            .insert(width, text.to_string());
    }

    /// Makes every document open take `delay`, to keep workers busy.
    pub fn set_open_delay(&self, delay: Duration) {
        *self.source.open_delay.lock().unwrap() = delay;
    }

    pub fn ocr_calls(&self) -> usize {
        self.ocr.calls.load(Ordering::SeqCst)
    }

    pub fn sorter(&self, dry_run: bool, extra_keywords: &[&str]) -> Sorter {
        let config = Arc::new(
            PipelineConfig::from_config(&self.config, &self.root)
                .with_dry_run(dry_run)
                .with_year_filter(self.year_filter)
                .with_extra_keywords(extra_keywords),
        );
        let categorizer = Categorizer::new(
            config.keywords.clone(),
            config.undesired_keywords.clone(),
        )
        .with_date_extractor(DateExtractor::with_current_year(PINNED_YEAR));
        let ocr = self
            .config
            .ocr
            .enabled
            .then(|| Arc::clone(&self.ocr) as Arc<dyn OcrEngine>);

        let pipeline = Pipeline::new(config, Arc::clone(&self.source) as Arc<dyn DocumentSource>, ocr)
            .with_categorizer(categorizer);

        Sorter::new(pipeline)
            .with_worker_count(self.worker_count)
            .with_max_depth(self.config.max_depth)
            .with_progress(Arc::clone(&self.progress) as Arc<dyn ProgressReporter>)
    }

    pub fn run(&self) -> RunReport {
        self.sorter(false, &[]).run().expect("Sorting run failed")
    }

    pub fn preview(&self) -> RunReport {
        self.sorter(true, &[]).run().expect("Preview run failed")
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.root.join(relative).exists()
    }

    /// Every file below the root, relative and sorted.
    pub fn files(&self) -> Vec<String> {
        self.walk(|entry| entry.file_type().is_file())
    }

    /// Every directory below the root, relative and sorted.
    pub fn directories(&self) -> Vec<String> {
        self.walk(|entry| entry.file_type().is_dir())
    }

    fn walk(&self, keep: impl Fn(&walkdir::DirEntry) -> bool) -> Vec<String> {
        let mut paths: Vec<String> = WalkDir::new(&self.root)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| keep(e))
            .map(|e| {
                e.path()
                    .strip_prefix(&self.root)
                    .expect("Entry outside root")
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        paths.sort();
        paths
    }
}
