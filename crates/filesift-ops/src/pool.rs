//! Bounded pool of worker threads draining the work queue.
//!
//! Each worker:
//! - Pulls a directory task from the work queue (bounded wait)
//! - Scans it and pushes its subdirectories back onto the queue
//! - Copies every file it found into its bucket
//! - Acknowledges the task, then repeats until the queue is drained

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tracing::{debug, error, trace, warn};

use filesift_core::{DirectoryTask, MaterializeError, SortError, SortWarning};
use filesift_scan::{DirectoryScanner, WorkQueue};

use crate::materialize::Materializer;
use crate::progress::{SortProgress, SortStats};

/// Everything a worker needs, shared by the whole pool.
pub struct WorkerContext {
    /// Directories waiting to be processed.
    pub queue: WorkQueue,
    /// Lists one directory at a time.
    pub scanner: DirectoryScanner,
    /// Copies files into their buckets.
    pub materializer: Materializer,
    /// Counters and warnings of the run.
    pub stats: Arc<SortStats>,
    /// Receives a snapshot after every processed directory.
    pub progress_tx: broadcast::Sender<SortProgress>,
    /// Bounded wait on an empty queue before re-checking for drain.
    pub poll_interval: Duration,
    /// When the run started.
    pub started: Instant,
}

/// A running worker thread.
struct Worker {
    id: usize,
    /// Yields the number of directories whose processing panicked.
    handle: JoinHandle<u64>,
}

/// Fixed-size set of worker threads.
pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    /// Spawn `count` workers (at least one).
    ///
    /// If the OS refuses a thread after at least one worker is running, the
    /// pool continues with the workers it has.
    pub fn spawn(count: usize, ctx: Arc<WorkerContext>) -> Result<Self, SortError> {
        let count = count.max(1);
        let mut workers = Vec::with_capacity(count);

        for id in 0..count {
            let worker_ctx = Arc::clone(&ctx);
            let spawned = thread::Builder::new()
                .name(format!("sift-worker-{id}"))
                .spawn(move || worker_loop(id, &worker_ctx));

            match spawned {
                Ok(handle) => workers.push(Worker { id, handle }),
                Err(source) if workers.is_empty() => {
                    return Err(SortError::WorkerSpawn { id, source });
                }
                Err(e) => {
                    warn!(worker = id, error = %e, running = workers.len(), "Failed to spawn worker, continuing with fewer");
                    break;
                }
            }
        }

        Ok(Self { workers })
    }

    /// Number of running workers.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Whether the pool has no workers.
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Wait for every worker to exit. Reports the first worker that panicked
    /// while processing a directory.
    pub fn join(self) -> Result<(), SortError> {
        let mut result = Ok(());
        for worker in self.workers {
            let panics = match worker.handle.join() {
                Ok(0) => continue,
                Ok(panics) => panics,
                Err(_) => 1,
            };
            error!(worker = worker.id, panics, "Worker panicked");
            if result.is_ok() {
                result = Err(SortError::WorkerPanicked { id: worker.id });
            }
        }
        result
    }
}

/// Main worker loop. Returns how many directories panicked.
fn worker_loop(id: usize, ctx: &WorkerContext) -> u64 {
    debug!(worker = id, "Worker starting");
    let mut dirs = 0u64;
    let mut panics = 0u64;

    // A momentarily empty queue is not the end: a sibling may still push.
    while !ctx.queue.is_drained() {
        let Some(task) = ctx.queue.pop_timeout(ctx.poll_interval) else {
            continue;
        };

        // Acknowledged on drop, after the children below have been pushed.
        let _guard = ctx.queue.guard();
        // The worker must outlive a bad directory, or the tasks still queued
        // would never be acknowledged.
        let processed = panic::catch_unwind(AssertUnwindSafe(|| process_directory(id, &task, ctx)));
        if let Err(payload) = processed {
            error!(
                worker = id,
                path = %task.path.display(),
                panic = panic_message(payload.as_ref()),
                "Directory processing panicked"
            );
            panics += 1;
        }
        dirs += 1;
    }

    debug!(worker = id, dirs, panics, "Worker exiting");
    panics
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Process a single directory
fn process_directory(id: usize, task: &DirectoryTask, ctx: &WorkerContext) {
    let outcome = ctx.scanner.scan(task);

    if let Some(warning) = outcome.failure {
        if warning.kind.is_permission() {
            warn!(worker = id, path = %task.path.display(), "No access, skipping directory");
        } else {
            error!(worker = id, path = %task.path.display(), error = %warning.message, "Scan failed");
        }
        ctx.stats.record_skipped_dir(warning);
        return;
    }
    ctx.stats.record_dir();

    trace!(
        worker = id,
        path = %task.path.display(),
        files = outcome.files.len(),
        subdirs = outcome.subdirs.len(),
        "Directory listed"
    );

    for dir in outcome.subdirs {
        ctx.queue.push(task.child(dir));
    }

    for file in &outcome.files {
        match ctx.materializer.materialize(file) {
            Ok(done) => {
                trace!(worker = id, bucket = %done.bucket, path = %file.display(), "Copied");
                ctx.stats.record_copy(&done.bucket, done.bytes);
            }
            Err(err) => {
                match &err {
                    MaterializeError::AccessDenied { .. } => {
                        warn!(worker = id, path = %err.path().display(), "No access, skipping file");
                    }
                    MaterializeError::Io { source, .. } => {
                        error!(worker = id, path = %err.path().display(), error = %source, "Copy failed");
                    }
                }
                ctx.stats.record_failed_file(SortWarning::from(&err));
            }
        }
    }

    for link in outcome.skipped_symlinks {
        debug!(worker = id, path = %link.display(), "Symlink not followed");
        ctx.stats.record_symlink(SortWarning::symlink_skipped(link));
    }

    let _ = ctx
        .progress_tx
        .send(ctx.stats.snapshot(task.path.clone(), ctx.started.elapsed()));
}
