//! Sort run configuration.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default destination root when none is given.
pub const DEFAULT_OUTPUT: &str = "dist";

/// Default bounded wait of an idle worker before it re-checks for drain.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(300);

/// Configuration for a sort run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SortConfig {
    /// Root directory to sort.
    pub source: PathBuf,

    /// Destination root; buckets are created beneath it.
    #[builder(default = "PathBuf::from(DEFAULT_OUTPUT)")]
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Number of workers (0 = host parallelism).
    #[builder(default = "0")]
    #[serde(default)]
    pub workers: usize,

    /// How long an idle worker waits on the queue before re-checking.
    #[builder(default = "DEFAULT_POLL_INTERVAL")]
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// Resolve symbolic links instead of skipping them.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

impl SortConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.source {
            Some(ref source) if source.as_os_str().is_empty() => {
                return Err("Source path cannot be empty".to_string());
            }
            Some(_) => {}
            None => return Err("Source path is required".to_string()),
        }
        if let Some(ref output) = self.output {
            if output.as_os_str().is_empty() {
                return Err("Output path cannot be empty".to_string());
            }
        }
        if let Some(interval) = self.poll_interval {
            if interval.is_zero() {
                return Err("Poll interval must be greater than zero".to_string());
            }
        }
        Ok(())
    }
}

impl SortConfig {
    /// Create a new config builder.
    pub fn builder() -> SortConfigBuilder {
        SortConfigBuilder::default()
    }

    /// Create a config that sorts `source` into the default output.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            output: default_output(),
            workers: 0,
            poll_interval: DEFAULT_POLL_INTERVAL,
            follow_symlinks: false,
        }
    }

    /// Set the destination root.
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// Set the worker count (0 = host parallelism).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Number of workers to actually launch; never less than one.
    pub fn effective_workers(&self) -> usize {
        match self.workers {
            0 => std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            n => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = SortConfig::builder()
            .source("/home/user/downloads")
            .output("/tmp/sorted")
            .workers(4usize)
            .follow_symlinks(true)
            .build()
            .unwrap();

        assert_eq!(config.source, PathBuf::from("/home/user/downloads"));
        assert_eq!(config.output, PathBuf::from("/tmp/sorted"));
        assert_eq!(config.workers, 4);
        assert!(config.follow_symlinks);
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn test_builder_requires_source() {
        assert!(SortConfig::builder().build().is_err());
        assert!(SortConfig::builder().source("").build().is_err());
    }

    #[test]
    fn test_builder_rejects_zero_poll_interval() {
        let result = SortConfig::builder()
            .source("/src")
            .poll_interval(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_simple() {
        let config = SortConfig::new("/src");
        assert_eq!(config.output, PathBuf::from("dist"));
        assert_eq!(config.workers, 0);
        assert!(!config.follow_symlinks);
    }

    #[test]
    fn test_effective_workers() {
        assert_eq!(SortConfig::new("/src").with_workers(3).effective_workers(), 3);
        assert!(SortConfig::new("/src").effective_workers() >= 1);
    }
}
