//! Run statistics, folded from the stream of per-file results.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::worker::job::JobResult;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub total_files: usize,
    /// Includes commande files.
    pub sorted_files: usize,
    /// Includes failed files.
    pub unsorted_files: usize,
    pub ocr_processed: usize,
    pub commande_files: usize,
    pub errors: usize,
    pub zip_extracted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunStats {
    pub fn start() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Counts one terminal outcome.
    pub fn record(&mut self, result: &JobResult) {
        self.total_files += 1;

        if result.is_sorted() {
            self.sorted_files += 1;
        } else {
            self.unsorted_files += 1;
        }
        if result.is_commande() {
            self.commande_files += 1;
        }
        if result.is_error() {
            self.errors += 1;
        }
        if result.ocr_used {
            self.ocr_processed += 1;
        }
    }

    /// Wall time between start and finish (or now, while running).
    pub fn elapsed(&self) -> Duration {
        let Some(started) = self.started_at else {
            return Duration::ZERO;
        };
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - started).to_std().unwrap_or(Duration::ZERO)
    }

    /// Percentage of files sorted, 0 for an empty run.
    pub fn success_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            self.sorted_files as f64 * 100.0 / self.total_files as f64
        }
    }

    pub fn average_seconds(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            self.elapsed().as_secs_f64() / self.total_files as f64
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub stats: RunStats,
    /// Unsortable and failed files, in completion order.
    pub unsorted: Vec<PathBuf>,
    pub results: Vec<JobResult>,
    pub removed_directories: Vec<PathBuf>,
    pub dry_run: bool,
    pub year_filter: Option<i32>,
}

impl RunReport {
    pub fn new(dry_run: bool, year_filter: Option<i32>) -> Self {
        Self {
            stats: RunStats::start(),
            dry_run,
            year_filter,
            ..Self::default()
        }
    }

    pub fn record(&mut self, result: JobResult) {
        self.stats.record(&result);
        if result.is_unsorted() {
            self.unsorted.push(result.source_path.clone());
        }
        self.results.push(result);
    }

    pub fn finish(&mut self) {
        self.stats.finish();
    }
}
