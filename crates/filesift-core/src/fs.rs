//! Filesystem abstraction used by the scanner and the materializer.
//!
//! Workers only touch the disk through [`Filesystem`], so the traversal can
//! be driven against a mock that denies or fails selected paths.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tempfile::NamedTempFile;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link (not followed).
    Symlink,
    /// Socket, fifo, device node or anything else.
    Other,
}

impl EntryKind {
    /// Derive the kind from a file type.
    pub fn from_file_type(file_type: fs::FileType) -> Self {
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }
}

/// One immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    /// Full path of the entry.
    pub path: PathBuf,
    /// Kind of the entry, links not followed.
    pub kind: EntryKind,
}

impl DirEntryInfo {
    /// Create a new entry.
    pub fn new(path: impl Into<PathBuf>, kind: EntryKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Operations a sort run performs against the filesystem.
pub trait Filesystem: Send + Sync {
    /// List the immediate children of `dir`.
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntryInfo>>;

    /// Kind of `path` after following symbolic links.
    fn resolve(&self, path: &Path) -> io::Result<EntryKind>;

    /// Create `path` and any missing parents; succeeds if it already exists.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Copy the bytes of `from` to `to`, overwriting, and carry over the
    /// access and modification times. Returns the number of bytes copied.
    ///
    /// `to` must only ever hold the complete contents of one source, even
    /// while another copy to the same path is in flight.
    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64>;
}

/// [`Filesystem`] backed by the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    /// Create a new local filesystem handle.
    pub fn new() -> Self {
        Self
    }
}

impl Filesystem for LocalFs {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntryInfo>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let kind = EntryKind::from_file_type(entry.file_type()?);
            entries.push(DirEntryInfo::new(entry.path(), kind));
        }
        Ok(entries)
    }

    fn resolve(&self, path: &Path) -> io::Result<EntryKind> {
        fs::metadata(path).map(|m| EntryKind::from_file_type(m.file_type()))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64> {
        let dir = match to.parent() {
            Some(dir) if dir.as_os_str().is_empty() => Path::new("."),
            Some(dir) => dir,
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "destination has no parent directory",
                ));
            }
        };

        let mut source = fs::File::open(from)?;
        let metadata = source.metadata()?;

        // Stage next to the destination, then swap it in with a rename.
        let mut staged = NamedTempFile::new_in(dir)?;
        let bytes = io::copy(&mut source, staged.as_file_mut())?;

        let mtime = FileTime::from_last_modification_time(&metadata);
        let atime = FileTime::from_last_access_time(&metadata);
        filetime::set_file_handle_times(staged.as_file(), Some(atime), Some(mtime))?;
        staged.as_file().set_permissions(metadata.permissions())?;

        staged.persist(to)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_dir_kinds() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();

        let mut entries = LocalFs.read_dir(temp.path()).unwrap();
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, EntryKind::File);
        assert_eq!(entries[1].kind, EntryKind::Directory);
    }

    #[test]
    fn test_read_dir_missing() {
        let temp = TempDir::new().unwrap();
        let err = LocalFs.read_dir(&temp.path().join("missing")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_not_followed_by_listing() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("real")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("real"), temp.path().join("link")).unwrap();

        let entries = LocalFs.read_dir(temp.path()).unwrap();
        let link = entries
            .iter()
            .find(|e| e.path.ends_with("link"))
            .unwrap();
        assert_eq!(link.kind, EntryKind::Symlink);
        assert_eq!(LocalFs.resolve(&link.path).unwrap(), EntryKind::Directory);
    }

    #[test]
    fn test_copy_preserves_content_and_mtime() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src.bin");
        let dst = temp.path().join("dst.bin");
        fs::write(&src, b"payload").unwrap();
        let old = FileTime::from_unix_time(1_000_000_000, 0);
        filetime::set_file_mtime(&src, old).unwrap();

        let bytes = LocalFs.copy_file(&src, &dst).unwrap();

        assert_eq!(bytes, 7);
        assert_eq!(fs::read(&dst).unwrap(), b"payload");
        let copied = FileTime::from_last_modification_time(&fs::metadata(&dst).unwrap());
        assert_eq!(copied, old);
    }

    #[test]
    fn test_copy_overwrites() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src.txt");
        let dst = temp.path().join("dst.txt");
        fs::write(&src, "new").unwrap();
        fs::write(&dst, "old contents").unwrap();

        LocalFs.copy_file(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "new");
    }

    #[test]
    fn test_copy_leaves_no_staging_files() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src.txt");
        let out = temp.path().join("out");
        fs::create_dir(&out).unwrap();
        fs::write(&src, "content").unwrap();

        LocalFs.copy_file(&src, &out.join("a.txt")).unwrap();
        LocalFs.copy_file(&src, &out.join("a.txt")).unwrap();

        let names: Vec<_> = fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("a.txt")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_over_read_only_destination() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let src = temp.path().join("ro.txt");
        let dst = temp.path().join("dst.txt");
        fs::write(&src, "first").unwrap();
        fs::set_permissions(&src, fs::Permissions::from_mode(0o444)).unwrap();

        LocalFs.copy_file(&src, &dst).unwrap();
        assert_eq!(fs::metadata(&dst).unwrap().permissions().mode() & 0o777, 0o444);

        fs::set_permissions(&src, fs::Permissions::from_mode(0o644)).unwrap();
        fs::write(&src, "second").unwrap();
        fs::set_permissions(&src, fs::Permissions::from_mode(0o444)).unwrap();

        LocalFs.copy_file(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "second");
    }

    #[test]
    fn test_create_dir_all_idempotent() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a/b/c");
        LocalFs.create_dir_all(&dir).unwrap();
        LocalFs.create_dir_all(&dir).unwrap();
        assert!(dir.is_dir());
    }
}
