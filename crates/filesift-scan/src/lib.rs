//! Directory scanning and work distribution for filesift.
//!
//! # Overview
//!
//! `filesift-scan` holds the two traversal primitives the worker pool is
//! built on:
//!
//! - [`DirectoryScanner`] lists one directory and partitions its children
//!   into files and subdirectories, turning listing failures into warnings
//! - [`WorkQueue`] is the shared, self-feeding queue of pending directories
//!   with a drain point that marks the end of the traversal
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use filesift_scan::{DirectoryScanner, DirectoryTask, LocalFs, WorkQueue};
//!
//! let scanner = DirectoryScanner::new(Arc::new(LocalFs));
//! let queue = WorkQueue::new();
//! queue.push(DirectoryTask::root("/path/to/sort"));
//!
//! while let Some(task) = queue.pop_timeout(Duration::from_millis(100)) {
//!     let _guard = queue.guard();
//!     let outcome = scanner.scan(&task);
//!     for dir in outcome.subdirs {
//!         queue.push(task.child(dir));
//!     }
//!     println!("{}: {} files", task.path.display(), outcome.files.len());
//! }
//! ```

mod queue;
mod scanner;

pub use queue::{QueueStats, TaskGuard, WorkQueue};
pub use scanner::{DirectoryScanner, ScanOutcome};

// Re-export core types for convenience
pub use filesift_core::{
    DirEntryInfo, DirectoryTask, EntryKind, Filesystem, LocalFs, SortWarning, WarningKind,
};
