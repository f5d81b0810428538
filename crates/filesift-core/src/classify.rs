//! Extension classifier.
//!
//! Maps a file name to the bucket (destination subdirectory) it is sorted
//! into: the lower-cased text after the last `.`, or [`NO_EXTENSION`].

use std::fmt;
use std::path::Path;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Bucket name used for files without an extension.
pub const NO_EXTENSION: &str = "no_extension";

/// Name of a destination subdirectory derived from a file extension.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bucket(CompactString);

impl Bucket {
    /// The sentinel bucket for extensionless files.
    pub fn no_extension() -> Self {
        Self(CompactString::new(NO_EXTENSION))
    }

    /// Bucket name as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether this is the extensionless sentinel.
    pub fn is_no_extension(&self) -> bool {
        self.0 == NO_EXTENSION
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<Path> for Bucket {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

/// Classify a file name into its bucket.
///
/// Pure and total: `"archive.tar.gz"` is `gz`, `"README"` and `"archive."`
/// are `no_extension`, and `".gitignore"` is `gitignore`.
pub fn classify(name: &str) -> Bucket {
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Bucket(CompactString::from(ext.to_lowercase())),
        _ => Bucket::no_extension(),
    }
}

/// Classify the final component of a path.
pub fn classify_path(path: &Path) -> Bucket {
    path.file_name()
        .map(|name| classify(&name.to_string_lossy()))
        .unwrap_or_else(Bucket::no_extension)
}
