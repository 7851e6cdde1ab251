pub mod categorizer;
pub mod config;
pub mod dates;
pub mod error;
pub mod pipeline;
pub mod processor;
pub mod sanitize;
pub mod sorter;
pub mod stats;
pub mod storage;
pub mod worker;

pub use categorizer::{Categorizer, Classification, KeywordSet, UnsortableReason};
pub use config::{load_config, SorterConfig};
pub use dates::{extract_date, DateCandidate, DateExtractor};
pub use error::{
    ArchiveError, ConfigError, PdfSortError, ProcessError, Result, StorageError, WorkerError,
};
pub use pipeline::{Pipeline, PipelineConfig, PipelineContext, ProgressEvent, ProgressReporter};
pub use sorter::Sorter;
pub use stats::{RunReport, RunStats};
