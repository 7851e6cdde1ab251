pub mod job;
pub mod pool;
pub mod scanner;

pub use job::{Job, JobOutcome, JobResult};
pub use pool::{default_worker_count, WorkerPool};
pub use scanner::{DirectoryScanner, DEFAULT_MAX_DEPTH};
