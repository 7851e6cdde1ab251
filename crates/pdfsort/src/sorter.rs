use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use log::{debug, info, warn};
use tracing::info_span;

use crate::error::{PdfSortError, WorkerError};
use crate::pipeline::{NoopProgress, Pipeline, ProgressEvent, ProgressReporter};
use crate::stats::RunReport;
use crate::storage::{extract_archive, find_archives};
use crate::worker::{default_worker_count, DirectoryScanner, Job, WorkerPool, DEFAULT_MAX_DEPTH};

const RESULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runs one sorting pass over a root directory: archive pre-pass,
/// discovery, concurrent processing and empty directory cleanup.
pub struct Sorter {
    pipeline: Arc<Pipeline>,
    worker_count: usize,
    max_depth: usize,
    progress: Arc<dyn ProgressReporter>,
    shutdown: Arc<AtomicBool>,
}

impl Sorter {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            worker_count: default_worker_count(),
            max_depth: DEFAULT_MAX_DEPTH,
            progress: Arc::new(NoopProgress),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count.max(1);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Flag that interrupts the run when set, e.g. from a Ctrl-C handler.
    pub fn with_shutdown(mut self, shutdown: Arc<AtomicBool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn run(&self) -> Result<RunReport, PdfSortError> {
        let config = self.pipeline.config();
        let root = config.root_directory.as_path();
        let _span = info_span!("sorter.run", dry_run = config.dry_run).entered();

        let mut report = RunReport::new(config.dry_run, config.year_filter);
        if let Some(year) = config.year_filter {
            info!("Year filter {} requested; documents are filed by their own date", year);
        }

        report.stats.zip_extracted = self.extract_archives(root, config.dry_run)?;

        let jobs = DirectoryScanner::new(root)
            .with_max_depth(self.max_depth)
            .scan()?;
        self.progress.report(ProgressEvent::ScanCompleted { files: jobs.len() });

        if jobs.is_empty() {
            info!("No PDF files found in {}", root.display());
            report.finish();
            return Ok(report);
        }

        self.process(jobs, &mut report)?;

        if !config.dry_run {
            let removed = self.pipeline.storage().prune_empty_directories();
            if !removed.is_empty() {
                info!("Removed {} empty directories", removed.len());
            }
            report.removed_directories = removed.clone();
            self.progress
                .report(ProgressEvent::DirectoriesPruned { removed });
        }

        report.finish();
        info!(
            "Sorted {} of {} files ({} unsorted, {} errors) in {:.2?}",
            report.stats.sorted_files,
            report.stats.total_files,
            report.stats.unsorted_files,
            report.stats.errors,
            report.stats.elapsed()
        );
        Ok(report)
    }

    /// Extracts every archive directly in the root into the root. Returns the
    /// number extracted; preview mode only reports them.
    fn extract_archives(&self, root: &Path, dry_run: bool) -> Result<usize, PdfSortError> {
        let mut extracted = 0;

        for archive in find_archives(root)? {
            if dry_run {
                self.progress
                    .report(ProgressEvent::ArchivePending { archive });
                continue;
            }

            match extract_archive(&archive, root) {
                Ok(entries) => {
                    extracted += 1;
                    self.progress
                        .report(ProgressEvent::ArchiveExtracted { archive, entries });
                }
                Err(e) => {
                    info!("Skipping archive {}: {}", archive.display(), e);
                    self.progress.report(ProgressEvent::ArchiveFailed {
                        archive,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(extracted)
    }

    fn process(&self, jobs: Vec<Job>, report: &mut RunReport) -> Result<(), WorkerError> {
        let total = jobs.len();
        let pool = WorkerPool::new(
            Arc::clone(&self.pipeline),
            self.worker_count.min(total),
            Arc::clone(&self.progress),
            Arc::clone(&self.shutdown),
        );

        let outcome = thread::scope(|scope| {
            let feeder_pool = &pool;
            scope.spawn(move || {
                for job in jobs {
                    if let Err(e) = feeder_pool.submit(job) {
                        debug!("Stopped submitting jobs: {}", e);
                        break;
                    }
                }
            });

            self.collect(&pool, total, report)
        });

        if outcome.is_err() {
            pool.shutdown();
        }
        pool.wait();

        if let Err(WorkerError::Interrupted) = &outcome {
            warn!(
                "Interrupted after {} of {} files; completed moves are kept",
                report.stats.total_files, total
            );
        }
        outcome
    }

    /// Folds results until every job has reported or the run is interrupted.
    fn collect(
        &self,
        pool: &WorkerPool,
        total: usize,
        report: &mut RunReport,
    ) -> Result<(), WorkerError> {
        let mut completed = 0;

        while completed < total {
            if self.shutdown.load(Ordering::Relaxed) {
                return Err(WorkerError::Interrupted);
            }

            match pool.recv_result_timeout(RESULT_POLL_INTERVAL) {
                Ok(result) => {
                    completed += 1;
                    self.progress.report(ProgressEvent::FileCompleted {
                        completed,
                        total,
                        result: result.clone(),
                    });
                    report.record(result);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(if self.shutdown.load(Ordering::Relaxed) {
                        WorkerError::Interrupted
                    } else {
                        WorkerError::ChannelClosed
                    });
                }
            }
        }

        Ok(())
    }
}
