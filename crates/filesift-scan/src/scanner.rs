//! Single-directory scanner.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};

use filesift_core::{DirectoryTask, EntryKind, Filesystem, SortWarning};

/// Result of scanning one directory.
///
/// A failed listing is not an error: it yields no entries and carries a
/// warning instead, so one unreadable branch never aborts the traversal.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Regular files found directly in the directory.
    pub files: Vec<PathBuf>,
    /// Subdirectories found directly in the directory.
    pub subdirs: Vec<PathBuf>,
    /// Symbolic links that were not followed.
    pub skipped_symlinks: Vec<PathBuf>,
    /// Set when the directory could not be listed.
    pub failure: Option<SortWarning>,
}

impl ScanOutcome {
    fn failed(warning: SortWarning) -> Self {
        Self {
            failure: Some(warning),
            ..Self::default()
        }
    }

    /// Whether the listing succeeded.
    pub fn is_ok(&self) -> bool {
        self.failure.is_none()
    }

    /// Number of files and subdirectories found.
    pub fn entry_count(&self) -> usize {
        self.files.len() + self.subdirs.len()
    }
}

/// Lists directories and partitions their children into files and
/// subdirectories.
#[derive(Clone)]
pub struct DirectoryScanner {
    fs: Arc<dyn Filesystem>,
    follow_symlinks: bool,
    exclude: Option<PathBuf>,
}

impl DirectoryScanner {
    /// Create a scanner over the given filesystem.
    pub fn new(fs: Arc<dyn Filesystem>) -> Self {
        Self {
            fs,
            follow_symlinks: false,
            exclude: None,
        }
    }

    /// Resolve symbolic links instead of skipping them.
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Never report `path` as a subdirectory.
    pub fn exclude(mut self, path: impl Into<PathBuf>) -> Self {
        self.exclude = Some(path.into());
        self
    }

    /// Scan the directory of a task.
    pub fn scan(&self, task: &DirectoryTask) -> ScanOutcome {
        self.scan_dir(task.path())
    }

    /// Scan a directory by path. Enumeration order is unspecified.
    pub fn scan_dir(&self, dir: &Path) -> ScanOutcome {
        let entries = match self.fs.read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => return ScanOutcome::failed(SortWarning::scan(dir, &err)),
        };

        let mut outcome = ScanOutcome::default();
        for entry in entries {
            let kind = match entry.kind {
                EntryKind::Symlink if self.follow_symlinks => match self.fs.resolve(&entry.path) {
                    Ok(kind) => kind,
                    Err(err) => {
                        debug!(path = %entry.path.display(), error = %err, "Dangling symlink");
                        continue;
                    }
                },
                kind => kind,
            };

            match kind {
                EntryKind::File => outcome.files.push(entry.path),
                EntryKind::Directory => {
                    if self.is_excluded(&entry.path) {
                        debug!(path = %entry.path.display(), "Skipping output directory");
                        continue;
                    }
                    outcome.subdirs.push(entry.path);
                }
                EntryKind::Symlink => outcome.skipped_symlinks.push(entry.path),
                EntryKind::Other => {
                    trace!(path = %entry.path.display(), "Ignoring special file");
                }
            }
        }

        outcome
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.exclude.as_deref() == Some(path)
    }
}

impl std::fmt::Debug for DirectoryScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryScanner")
            .field("follow_symlinks", &self.follow_symlinks)
            .field("exclude", &self.exclude)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filesift_core::{LocalFs, WarningKind};
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("dir1")).unwrap();
        fs::create_dir(root.join("dir2")).unwrap();
        fs::create_dir(root.join("dir1/subdir")).unwrap();

        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join("file2.RS"), "fn main() {}").unwrap();
        fs::write(root.join("dir1/file3.txt"), "nested").unwrap();

        temp
    }

    fn scanner() -> DirectoryScanner {
        DirectoryScanner::new(Arc::new(LocalFs))
    }

    #[test]
    fn test_partitions_immediate_children() {
        let temp = create_test_tree();
        let outcome = scanner().scan(&DirectoryTask::root(temp.path()));

        assert!(outcome.is_ok());
        assert_eq!(outcome.files.len(), 2);
        assert_eq!(outcome.subdirs.len(), 2);
        assert_eq!(outcome.entry_count(), 4);
        assert!(outcome.subdirs.contains(&temp.path().join("dir1")));
        assert!(!outcome.files.contains(&temp.path().join("dir1/file3.txt")));
    }

    #[test]
    fn test_missing_directory_is_scan_failure() {
        let temp = TempDir::new().unwrap();
        let outcome = scanner().scan_dir(&temp.path().join("gone"));

        assert_eq!(outcome.entry_count(), 0);
        assert_eq!(outcome.failure.unwrap().kind, WarningKind::ScanFailure);
    }

    #[test]
    fn test_excluded_directory_not_reported() {
        let temp = create_test_tree();
        let outcome = scanner()
            .exclude(temp.path().join("dir2"))
            .scan_dir(temp.path());

        assert_eq!(outcome.subdirs, vec![temp.path().join("dir1")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_skipped_unless_followed() {
        let temp = create_test_tree();
        std::os::unix::fs::symlink(temp.path().join("dir1"), temp.path().join("link_dir")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("file1.txt"), temp.path().join("link.txt"))
            .unwrap();

        let outcome = scanner().scan_dir(temp.path());
        assert_eq!(outcome.skipped_symlinks.len(), 2);
        assert_eq!(outcome.files.len(), 2);

        let outcome = scanner().follow_symlinks(true).scan_dir(temp.path());
        assert!(outcome.skipped_symlinks.is_empty());
        assert_eq!(outcome.files.len(), 3);
        assert_eq!(outcome.subdirs.len(), 3);
    }
}
