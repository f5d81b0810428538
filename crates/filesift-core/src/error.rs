//! Error types for sort runs.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

/// Fatal errors that stop a run before or while it starts.
///
/// Everything that goes wrong for a single file or directory during the
/// traversal is reported as a [`SortWarning`] instead.
#[derive(Debug, Error)]
pub enum SortError {
    /// Source path does not exist.
    #[error("Source folder not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Source path exists but is not a directory.
    #[error("Source is not a directory: {path}")]
    SourceNotADirectory { path: PathBuf },

    /// Source path could not be inspected.
    #[error("Cannot access source {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Destination root could not be created.
    #[error("Cannot create output folder {path}: {source}")]
    OutputUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A worker thread could not be started.
    #[error("Failed to spawn worker {id}: {source}")]
    WorkerSpawn {
        id: usize,
        #[source]
        source: io::Error,
    },

    /// A worker thread panicked.
    #[error("Worker {id} panicked")]
    WorkerPanicked { id: usize },
}

impl SortError {
    /// Classify a failure to inspect the source path.
    pub fn source_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::SourceNotFound { path },
            _ => Self::SourceUnreadable { path, source },
        }
    }
}

/// Failure to materialize a single file into its bucket.
#[derive(Debug, Error)]
pub enum MaterializeError {
    /// Reading the source or writing the destination was not permitted.
    #[error("Permission denied: {path}")]
    AccessDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Any other I/O failure.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MaterializeError {
    /// Create an error with path context, classified by its kind.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::PermissionDenied => Self::AccessDenied { path, source },
            _ => Self::Io { path, source },
        }
    }

    /// Path the failure is attached to.
    pub fn path(&self) -> &Path {
        match self {
            Self::AccessDenied { path, .. } | Self::Io { path, .. } => path,
        }
    }

    /// Warning kind used when the failure is recorded.
    pub fn warning_kind(&self) -> WarningKind {
        match self {
            Self::AccessDenied { .. } => WarningKind::AccessDenied,
            Self::Io { .. } => WarningKind::IoFailure,
        }
    }
}

/// Kind of non-fatal condition met during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WarningKind {
    /// A directory could not be listed for lack of permission.
    SkippedUnreadable,
    /// A directory could not be listed for another I/O reason.
    ScanFailure,
    /// A file could not be copied for lack of permission.
    AccessDenied,
    /// A file could not be copied for another I/O reason.
    IoFailure,
    /// A symbolic link was not followed.
    SymlinkSkipped,
}

impl WarningKind {
    /// Whether this kind is a permission problem (logged as a warning)
    /// rather than an I/O error (logged as an error).
    pub fn is_permission(self) -> bool {
        matches!(self, Self::SkippedUnreadable | Self::AccessDenied)
    }
}

/// Non-fatal condition recorded during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl SortWarning {
    /// Create a new warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a warning for a directory whose listing failed.
    pub fn scan(path: impl Into<PathBuf>, error: &io::Error) -> Self {
        let kind = match error.kind() {
            io::ErrorKind::PermissionDenied => WarningKind::SkippedUnreadable,
            _ => WarningKind::ScanFailure,
        };
        Self::new(path, error.to_string(), kind)
    }

    /// Create a warning for a symbolic link that was not followed.
    pub fn symlink_skipped(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Symlink not followed: {}", path.display()),
            path,
            kind: WarningKind::SymlinkSkipped,
        }
    }
}

impl From<&MaterializeError> for SortWarning {
    fn from(err: &MaterializeError) -> Self {
        Self::new(err.path(), err.to_string(), err.warning_kind())
    }
}
