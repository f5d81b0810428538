//! Core types and traits for filesift.
//!
//! This crate provides the fundamental pieces shared by the scanning and
//! sorting crates: the extension classifier, directory tasks, run
//! configuration, the error taxonomy, and the filesystem abstraction.

mod classify;
mod config;
mod error;
mod fs;
mod task;

pub use classify::{Bucket, NO_EXTENSION, classify, classify_path};
pub use config::{SortConfig, SortConfigBuilder, SortConfigBuilderError};
pub use error::{MaterializeError, SortError, SortWarning, WarningKind};
pub use fs::{DirEntryInfo, EntryKind, Filesystem, LocalFs};
pub use task::DirectoryTask;
