//! Sorting engine for filesift.
//!
//! This crate turns a source tree into `<output>/<extension>/<file>` using a
//! bounded pool of worker threads that share one self-feeding
//! [`WorkQueue`](filesift_scan::WorkQueue) of directories.
//!
//! # Example
//!
//! ```rust,no_run
//! use filesift_ops::{SortConfig, Sorter};
//!
//! let config = SortConfig::new("/path/to/source").with_output("/path/to/dist");
//! let summary = Sorter::new(config).run().unwrap();
//!
//! println!("{summary}");
//! ```

mod materialize;
mod pool;
mod progress;
mod sorter;

pub use materialize::{Materialized, Materializer};
pub use pool::{WorkerContext, WorkerPool};
pub use progress::{RunInfo, SortProgress, SortStats, SortSummary};
pub use sorter::Sorter;

// Re-export core types for convenience
pub use filesift_core::{
    Bucket, Filesystem, LocalFs, MaterializeError, SortConfig, SortError, SortWarning, WarningKind,
};

/// Channel buffer size for progress snapshots.
pub const PROGRESS_CHANNEL_SIZE: usize = 100;
