//! Orchestration of a sort run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;
use tracing::{error, info, warn};

use filesift_core::{DirectoryTask, EntryKind, Filesystem, LocalFs, SortConfig, SortError};
use filesift_scan::{DirectoryScanner, WorkQueue};

use crate::PROGRESS_CHANNEL_SIZE;
use crate::materialize::Materializer;
use crate::pool::{WorkerContext, WorkerPool};
use crate::progress::{RunInfo, SortProgress, SortStats, SortSummary};

/// Sorts a source tree into per-extension buckets under an output root.
pub struct Sorter {
    config: SortConfig,
    fs: Arc<dyn Filesystem>,
    progress_tx: broadcast::Sender<SortProgress>,
}

impl Sorter {
    /// Create a sorter working on the local disk.
    pub fn new(config: SortConfig) -> Self {
        Self::with_filesystem(config, Arc::new(LocalFs))
    }

    /// Create a sorter working through the given filesystem.
    pub fn with_filesystem(config: SortConfig, fs: Arc<dyn Filesystem>) -> Self {
        let (progress_tx, _) = broadcast::channel(PROGRESS_CHANNEL_SIZE);
        Self {
            config,
            fs,
            progress_tx,
        }
    }

    /// Run configuration.
    pub fn config(&self) -> &SortConfig {
        &self.config
    }

    /// Subscribe to progress snapshots, published after each directory.
    pub fn subscribe(&self) -> broadcast::Receiver<SortProgress> {
        self.progress_tx.subscribe()
    }

    /// Sort the source tree.
    ///
    /// Only configuration problems are errors; unreadable directories and
    /// files that fail to copy are logged and listed in the summary.
    pub fn run(&self) -> Result<SortSummary, SortError> {
        let started = Instant::now();

        let source = self.validate_source().inspect_err(|e| error!(error = %e, "Invalid source"))?;
        let output = self.prepare_output(&source)?;
        let workers = self.config.effective_workers();

        info!(source = %source.display(), "SRC");
        info!(output = %output.display(), "DIST");

        let mut scanner =
            DirectoryScanner::new(Arc::clone(&self.fs)).follow_symlinks(self.config.follow_symlinks);
        if output.starts_with(&source) {
            warn!(output = %output.display(), "Output lies inside source, excluding it from the walk");
            scanner = scanner.exclude(output.clone());
        }

        let queue = WorkQueue::new();
        queue.push(DirectoryTask::root(source.clone()));

        let stats = Arc::new(SortStats::new());
        let ctx = Arc::new(WorkerContext {
            queue: queue.clone(),
            scanner,
            materializer: Materializer::new(Arc::clone(&self.fs), output.clone()),
            stats: Arc::clone(&stats),
            progress_tx: self.progress_tx.clone(),
            poll_interval: self.config.poll_interval,
            started,
        });

        let pool = WorkerPool::spawn(workers, ctx)?;
        let workers = pool.len();
        info!(workers, "Workers started");

        queue.drain();
        pool.join()?;

        let summary = stats.summary(RunInfo {
            source,
            output,
            workers,
            elapsed: started.elapsed(),
        });

        info!(
            files = summary.files_copied,
            buckets = summary.buckets.len(),
            dirs = summary.dirs_scanned,
            skipped = summary.dirs_skipped,
            failed = summary.files_failed,
            elapsed_secs = summary.elapsed.as_secs_f64(),
            "Sorting complete"
        );

        Ok(summary)
    }

    /// Check the source is an existing directory and return its canonical path.
    fn validate_source(&self) -> Result<PathBuf, SortError> {
        let source = &self.config.source;
        match self.fs.resolve(source) {
            Ok(EntryKind::Directory) => Ok(canonical(source)),
            Ok(_) => Err(SortError::SourceNotADirectory {
                path: source.clone(),
            }),
            Err(e) => Err(SortError::source_io(source, e)),
        }
    }

    /// Create the output root and return its canonical path.
    fn prepare_output(&self, source: &Path) -> Result<PathBuf, SortError> {
        let requested = &self.config.output;
        if canonical(requested) == source {
            return Err(SortError::InvalidConfig {
                message: format!("Output must differ from source: {}", requested.display()),
            });
        }

        self.fs
            .create_dir_all(requested)
            .map_err(|source| SortError::OutputUnavailable {
                path: requested.clone(),
                source,
            })?;

        Ok(canonical(requested))
    }
}

/// Canonical form of `path`, or the path itself when it cannot be resolved.
fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
