use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::categorizer::UnsortableReason;
use crate::dates::DateCandidate;

#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub source_path: PathBuf,
}

impl Job {
    pub fn new(source_path: PathBuf) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_path,
        }
    }

    pub fn filename(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Terminal state of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobOutcome {
    /// Flagged as a non-invoice and routed to the commande folder.
    Commande { destination: PathBuf },
    /// Invoice filed under its year and month.
    Sorted {
        #[serde(serialize_with = "serialize_date")]
        date: DateCandidate,
        destination: PathBuf,
    },
    /// Left in place.
    Unsorted {
        #[serde(serialize_with = "serialize_reason")]
        reason: UnsortableReason,
    },
    /// Left in place after an extraction, OCR or filesystem error.
    Failed { error: String },
}

fn serialize_date<S: serde::Serializer>(date: &DateCandidate, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(date)
}

fn serialize_reason<S: serde::Serializer>(
    reason: &UnsortableReason,
    s: S,
) -> Result<S::Ok, S::Error> {
    s.collect_str(reason)
}

impl JobOutcome {
    pub fn destination(&self) -> Option<&Path> {
        match self {
            JobOutcome::Commande { destination } | JobOutcome::Sorted { destination, .. } => {
                Some(destination)
            }
            JobOutcome::Unsorted { .. } | JobOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    pub job_id: String,
    pub source_path: PathBuf,
    pub outcome: JobOutcome,
    /// OCR ran at least once for this file.
    pub ocr_used: bool,
    /// The move was only planned (preview mode).
    pub simulated: bool,
}

impl JobResult {
    pub fn success(job: &Job, outcome: JobOutcome, ocr_used: bool, simulated: bool) -> Self {
        Self {
            job_id: job.id.clone(),
            source_path: job.source_path.clone(),
            outcome,
            ocr_used,
            simulated,
        }
    }

    pub fn failure(job: &Job, error: String, ocr_used: bool) -> Self {
        Self {
            job_id: job.id.clone(),
            source_path: job.source_path.clone(),
            outcome: JobOutcome::Failed { error },
            ocr_used,
            simulated: false,
        }
    }

    /// Commande and dated invoices both count as sorted.
    pub fn is_sorted(&self) -> bool {
        matches!(
            self.outcome,
            JobOutcome::Commande { .. } | JobOutcome::Sorted { .. }
        )
    }

    /// Unsortable and failed files both stay in place.
    pub fn is_unsorted(&self) -> bool {
        !self.is_sorted()
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, JobOutcome::Failed { .. })
    }

    pub fn is_commande(&self) -> bool {
        matches!(self.outcome, JobOutcome::Commande { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            JobOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }
}
