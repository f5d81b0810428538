//! Run statistics, progress snapshots and the final summary.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use dashmap::DashMap;
use serde::{Serialize, Serializer};

use filesift_core::{Bucket, SortWarning, WarningKind};

/// Counters shared by every worker of a run.
#[derive(Debug, Default)]
pub struct SortStats {
    files_copied: AtomicU64,
    bytes_copied: AtomicU64,
    files_failed: AtomicU64,
    dirs_scanned: AtomicU64,
    dirs_skipped: AtomicU64,
    symlinks_skipped: AtomicU64,
    buckets: DashMap<Bucket, u64>,
    warnings: Mutex<Vec<SortWarning>>,
}

impl SortStats {
    /// Create empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file copied into `bucket`.
    pub fn record_copy(&self, bucket: &Bucket, bytes: u64) {
        self.files_copied.fetch_add(1, Ordering::Relaxed);
        self.bytes_copied.fetch_add(bytes, Ordering::Relaxed);
        *self.buckets.entry(bucket.clone()).or_default() += 1;
    }

    /// Record a file that could not be copied.
    pub fn record_failed_file(&self, warning: SortWarning) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
        self.push_warning(warning);
    }

    /// Record a directory that was listed.
    pub fn record_dir(&self) {
        self.dirs_scanned.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a directory that could not be listed.
    pub fn record_skipped_dir(&self, warning: SortWarning) {
        self.dirs_skipped.fetch_add(1, Ordering::Relaxed);
        self.push_warning(warning);
    }

    /// Record a symbolic link that was not followed.
    pub fn record_symlink(&self, warning: SortWarning) {
        self.symlinks_skipped.fetch_add(1, Ordering::Relaxed);
        self.push_warning(warning);
    }

    /// Files copied so far.
    pub fn files_copied(&self) -> u64 {
        self.files_copied.load(Ordering::Relaxed)
    }

    /// Take a progress snapshot.
    pub fn snapshot(&self, current_dir: PathBuf, elapsed: Duration) -> SortProgress {
        SortProgress {
            files_copied: self.files_copied.load(Ordering::Relaxed),
            bytes_copied: self.bytes_copied.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            dirs_scanned: self.dirs_scanned.load(Ordering::Relaxed),
            dirs_skipped: self.dirs_skipped.load(Ordering::Relaxed),
            current_dir,
            elapsed,
        }
    }

    /// Build the final summary. Call once all workers have stopped.
    pub fn summary(&self, run: RunInfo) -> SortSummary {
        let buckets = self
            .buckets
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        let warnings = std::mem::take(
            &mut *self
                .warnings
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );

        SortSummary {
            source: run.source,
            output: run.output,
            workers: run.workers,
            files_copied: self.files_copied.load(Ordering::Relaxed),
            bytes_copied: self.bytes_copied.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            dirs_scanned: self.dirs_scanned.load(Ordering::Relaxed),
            dirs_skipped: self.dirs_skipped.load(Ordering::Relaxed),
            symlinks_skipped: self.symlinks_skipped.load(Ordering::Relaxed),
            buckets,
            warnings,
            elapsed: run.elapsed,
        }
    }

    fn push_warning(&self, warning: SortWarning) {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(warning);
    }
}

/// Progress information published while a run is in flight.
#[derive(Debug, Clone)]
pub struct SortProgress {
    /// Files copied so far.
    pub files_copied: u64,
    /// Bytes copied so far.
    pub bytes_copied: u64,
    /// Files that failed to copy.
    pub files_failed: u64,
    /// Directories listed so far.
    pub dirs_scanned: u64,
    /// Directories that could not be listed.
    pub dirs_skipped: u64,
    /// Directory whose processing produced this snapshot.
    pub current_dir: PathBuf,
    /// Time elapsed since the run started.
    pub elapsed: Duration,
}

impl SortProgress {
    /// Copy rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_copied as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Facts about a run that the statistics do not track themselves.
#[derive(Debug, Clone)]
pub struct RunInfo {
    /// Canonical source root.
    pub source: PathBuf,
    /// Canonical destination root.
    pub output: PathBuf,
    /// Number of workers actually started.
    pub workers: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct SortSummary {
    /// Source root that was traversed.
    pub source: PathBuf,
    /// Destination root.
    pub output: PathBuf,
    /// Number of workers that ran.
    pub workers: usize,
    /// Files copied into buckets.
    pub files_copied: u64,
    /// Bytes copied into buckets.
    pub bytes_copied: u64,
    /// Files that could not be copied.
    pub files_failed: u64,
    /// Directories listed.
    pub dirs_scanned: u64,
    /// Directories skipped because they could not be listed.
    pub dirs_skipped: u64,
    /// Symbolic links that were not followed.
    pub symlinks_skipped: u64,
    /// Files copied per bucket.
    pub buckets: BTreeMap<Bucket, u64>,
    /// Every non-fatal condition met during the run.
    pub warnings: Vec<SortWarning>,
    /// Wall-clock duration of the run.
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

impl SortSummary {
    /// Whether nothing was skipped or failed.
    pub fn is_clean(&self) -> bool {
        self.files_failed == 0 && self.dirs_skipped == 0
    }

    /// Warnings of one kind.
    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &SortWarning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}

impl fmt::Display for SortSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Copied {} files into {} buckets from {} directories",
            self.files_copied,
            self.buckets.len(),
            self.dirs_scanned
        )?;
        if !self.is_clean() {
            write!(
                f,
                " ({} files failed, {} directories skipped)",
                self.files_failed, self.dirs_skipped
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filesift_core::classify;

    fn run_info() -> RunInfo {
        RunInfo {
            source: PathBuf::from("/src"),
            output: PathBuf::from("/out"),
            workers: 2,
            elapsed: Duration::from_millis(1500),
        }
    }

    #[test]
    fn test_bucket_counts() {
        let stats = SortStats::new();
        stats.record_copy(&classify("a.txt"), 10);
        stats.record_copy(&classify("b.TXT"), 5);
        stats.record_copy(&classify("c.rs"), 1);

        let summary = stats.summary(run_info());
        assert_eq!(summary.files_copied, 3);
        assert_eq!(summary.bytes_copied, 16);
        assert_eq!(summary.buckets[&classify("x.txt")], 2);
        assert_eq!(summary.buckets[&classify("x.rs")], 1);
        assert!(summary.is_clean());
    }

    #[test]
    fn test_failures_make_summary_unclean() {
        let stats = SortStats::new();
        stats.record_dir();
        stats.record_skipped_dir(SortWarning::new(
            "/src/locked",
            "denied",
            WarningKind::SkippedUnreadable,
        ));

        let summary = stats.summary(run_info());
        assert!(!summary.is_clean());
        assert_eq!(summary.dirs_skipped, 1);
        assert_eq!(summary.warnings_of(WarningKind::SkippedUnreadable).count(), 1);
        assert!(summary.to_string().contains("1 directories skipped"));
    }

    #[test]
    fn test_snapshot_and_rate() {
        let stats = SortStats::new();
        stats.record_copy(&classify("a.txt"), 1);
        stats.record_copy(&classify("b.txt"), 1);

        let progress = stats.snapshot(PathBuf::from("/src"), Duration::from_secs(2));
        assert_eq!(progress.files_copied, 2);
        assert!((progress.files_per_second() - 1.0).abs() < f64::EPSILON);

        let idle = stats.snapshot(PathBuf::new(), Duration::ZERO);
        assert_eq!(idle.files_per_second(), 0.0);
    }
}
