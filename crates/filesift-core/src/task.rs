//! Directory tasks flowing through the work queue.

use std::path::{Path, PathBuf};

/// A directory waiting to be scanned.
///
/// Created for the source root by the orchestrator and for every discovered
/// subdirectory by a worker; consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryTask {
    /// Path of the directory.
    pub path: PathBuf,
    /// Depth below the source root (root = 0).
    pub depth: u32,
}

impl DirectoryTask {
    /// Create the root task.
    pub fn root(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            depth: 0,
        }
    }

    /// Create a task for a subdirectory of this one.
    pub fn child(&self, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            depth: self.depth + 1,
        }
    }

    /// Path of the directory.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
