//! Copying discovered files into their extension buckets.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use filesift_core::{Bucket, Filesystem, MaterializeError, classify};

/// A file placed at `<output>/<bucket>/<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    /// Bucket the file was sorted into.
    pub bucket: Bucket,
    /// Full destination path.
    pub destination: PathBuf,
    /// Bytes copied.
    pub bytes: u64,
}

/// Copies files into bucket directories under a destination root.
///
/// Bucket directories are created on demand and creation is idempotent, so
/// any number of workers may materialize into the same bucket at once. An
/// existing destination file is overwritten.
#[derive(Clone)]
pub struct Materializer {
    fs: Arc<dyn Filesystem>,
    output: PathBuf,
}

impl Materializer {
    /// Create a materializer writing beneath `output`.
    pub fn new(fs: Arc<dyn Filesystem>, output: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            output: output.into(),
        }
    }

    /// Destination root.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Where `file` would be placed, or `None` if it has no file name.
    pub fn destination_for(&self, file: &Path) -> Option<(Bucket, PathBuf)> {
        let name = file.file_name()?;
        let bucket = classify(&name.to_string_lossy());
        let destination = self.output.join(&bucket).join(name);
        Some((bucket, destination))
    }

    /// Copy `file` with its timestamps into its bucket.
    pub fn materialize(&self, file: &Path) -> Result<Materialized, MaterializeError> {
        let (bucket, destination) = self.destination_for(file).ok_or_else(|| {
            MaterializeError::io(
                file,
                io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
            )
        })?;

        let bucket_dir = self.output.join(&bucket);
        self.fs
            .create_dir_all(&bucket_dir)
            .map_err(|e| MaterializeError::io(&bucket_dir, e))?;

        let bytes = self
            .fs
            .copy_file(file, &destination)
            .map_err(|e| MaterializeError::io(file, e))?;

        Ok(Materialized {
            bucket,
            destination,
            bytes,
        })
    }
}

impl std::fmt::Debug for Materializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Materializer")
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filesift_core::{LocalFs, NO_EXTENSION};
    use filetime::FileTime;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Materializer) {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("src")).unwrap();
        let materializer = Materializer::new(Arc::new(LocalFs), temp.path().join("out"));
        (temp, materializer)
    }

    #[test]
    fn test_copies_into_bucket() {
        let (temp, materializer) = setup();
        let file = temp.path().join("src/Report.PDF");
        fs::write(&file, "pdf bytes").unwrap();

        let done = materializer.materialize(&file).unwrap();

        assert_eq!(done.bucket.as_str(), "pdf");
        assert_eq!(done.destination, temp.path().join("out/pdf/Report.PDF"));
        assert_eq!(done.bytes, 9);
        assert_eq!(fs::read_to_string(&done.destination).unwrap(), "pdf bytes");
    }

    #[test]
    fn test_extensionless_bucket() {
        let (temp, materializer) = setup();
        let file = temp.path().join("src/Makefile");
        fs::write(&file, "all:").unwrap();

        let done = materializer.materialize(&file).unwrap();
        assert_eq!(done.destination, temp.path().join("out").join(NO_EXTENSION).join("Makefile"));
    }

    #[test]
    fn test_preserves_mtime() {
        let (temp, materializer) = setup();
        let file = temp.path().join("src/old.log");
        fs::write(&file, "log").unwrap();
        let stamp = FileTime::from_unix_time(1_500_000_000, 0);
        filetime::set_file_mtime(&file, stamp).unwrap();

        let done = materializer.materialize(&file).unwrap();
        let copied = FileTime::from_last_modification_time(&fs::metadata(done.destination).unwrap());
        assert_eq!(copied, stamp);
    }

    #[test]
    fn test_rematerialize_overwrites() {
        let (temp, materializer) = setup();
        let file = temp.path().join("src/a.txt");
        fs::write(&file, "first").unwrap();
        materializer.materialize(&file).unwrap();

        fs::write(&file, "second").unwrap();
        let done = materializer.materialize(&file).unwrap();
        assert_eq!(fs::read_to_string(done.destination).unwrap(), "second");
    }

    #[test]
    fn test_missing_source_is_io_failure() {
        let (temp, materializer) = setup();
        let err = materializer
            .materialize(&temp.path().join("src/ghost.txt"))
            .unwrap_err();

        assert!(matches!(err, MaterializeError::Io { .. }));
        assert_eq!(err.path(), temp.path().join("src/ghost.txt"));
    }
}
