use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use log::{debug, error, info};

use crate::error::WorkerError;
use crate::pipeline::{Pipeline, PipelineContext, ProgressReporter};
use crate::worker::job::{Job, JobResult};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Two workers per logical CPU, at least one.
pub fn default_worker_count() -> usize {
    (num_cpus::get() * 2).max(1)
}

pub struct WorkerPool {
    job_sender: Sender<Job>,
    result_receiver: Receiver<JobResult>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Starts `worker_count` threads sharing one pipeline. Setting the
    /// shutdown flag makes workers stop after their current file.
    ///
    /// # Panics
    /// Panics if `worker_count` is 0.
    pub fn new(
        pipeline: Arc<Pipeline>,
        worker_count: usize,
        progress: Arc<dyn ProgressReporter>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");
        let (job_sender, job_receiver) = bounded::<Job>(worker_count * 2);
        // results never block a worker, so the collector can lag behind
        let (result_sender, result_receiver) = unbounded::<JobResult>();

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let result_tx = result_sender.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_pipeline = Arc::clone(&pipeline);
            let worker_progress = Arc::clone(&progress);

            let handle = thread::spawn(move || {
                run_worker(
                    worker_id,
                    job_rx,
                    result_tx,
                    shutdown_flag,
                    worker_pipeline,
                    worker_progress,
                );
            });

            workers.push(handle);
        }

        info!("Started {} workers", worker_count);

        Self {
            job_sender,
            result_receiver,
            workers,
            shutdown,
        }
    }

    /// Queues a job, waiting while the queue is full. Fails once shutdown
    /// has been requested.
    pub fn submit(&self, job: Job) -> Result<(), WorkerError> {
        let mut job = job;
        loop {
            if self.is_shutdown() {
                return Err(WorkerError::Interrupted);
            }

            match self.job_sender.send_timeout(job, POLL_INTERVAL) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(returned)) => job = returned,
                Err(SendTimeoutError::Disconnected(_)) => return Err(WorkerError::ChannelClosed),
            }
        }
    }

    pub fn recv_result_timeout(&self, timeout: Duration) -> Result<JobResult, RecvTimeoutError> {
        self.result_receiver.recv_timeout(timeout)
    }

    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    pub fn wait(self) {
        // Drop sender to signal workers to exit
        drop(self.job_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
    }
}

fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<Job>,
    result_sender: Sender<JobResult>,
    shutdown: Arc<AtomicBool>,
    pipeline: Arc<Pipeline>,
    progress: Arc<dyn ProgressReporter>,
) {
    debug!("Worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match job_receiver.recv_timeout(POLL_INTERVAL) {
            Ok(job) => {
                debug!("Worker {} processing job: {:?}", worker_id, job.source_path);

                let result = process_job(&pipeline, job, progress.as_ref());

                if let Err(e) = result_sender.send(result) {
                    error!("Worker {} failed to send result: {}", worker_id, e);
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => {
                debug!("Worker {} job channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}

/// Runs one job; a panic inside the pipeline fails only that file.
fn process_job(pipeline: &Pipeline, job: Job, progress: &dyn ProgressReporter) -> JobResult {
    let fallback = job.clone();
    let ctx = PipelineContext::new(job);

    match panic::catch_unwind(AssertUnwindSafe(|| pipeline.run(ctx, progress))) {
        Ok((result, _ctx)) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!("Processing {} panicked: {}", fallback.filename(), message);
            JobResult::failure(&fallback, format!("processing panicked: {}", message), false)
        }
    }
}
