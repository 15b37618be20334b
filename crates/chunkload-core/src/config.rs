use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::ChunkError;

/// What to do with rows that do not match the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowPolicy {
    /// Fail the whole chunk on the first malformed row
    Strict,
    /// Drop malformed rows and keep going
    #[default]
    SkipMalformed,
}

/// What to do when a parse task fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Return the first failure (in submission order) as the load error
    #[default]
    Abort,
    /// Record the failure and merge whatever parsed
    Continue,
}

/// What to do with chunk files left in the destination by a previous split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistingChunks {
    /// Delete stale chunks of the same source before writing
    #[default]
    Replace,
    /// Refuse to split into a destination holding chunks of the same source
    Fail,
}

#[derive(Debug, Clone)]
pub struct SplitConfig {
    pub destination: PathBuf,
    pub lines_per_chunk: usize,
    pub on_existing: ExistingChunks,
    pub manifest: bool,
}

impl SplitConfig {
    pub fn new(destination: impl Into<PathBuf>, lines_per_chunk: usize) -> Self {
        Self {
            destination: destination.into(),
            lines_per_chunk,
            on_existing: ExistingChunks::default(),
            manifest: true,
        }
    }

    pub fn with_on_existing(self, on_existing: ExistingChunks) -> Self {
        Self {
            on_existing,
            ..self
        }
    }

    pub fn with_manifest(self, manifest: bool) -> Self {
        Self { manifest, ..self }
    }

    pub(crate) fn validate(&self) -> Result<(), ChunkError> {
        if self.lines_per_chunk == 0 {
            return Err(ChunkError::InvalidChunkSize(self.lines_per_chunk));
        }
        Ok(())
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub workers: usize,
    pub batch_size: usize,
    pub row_policy: RowPolicy,
    pub failure_policy: FailurePolicy,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            workers: 16,
            batch_size: 128 * 1024,
            row_policy: RowPolicy::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl LoaderConfig {
    pub(crate) fn validate(&self) -> Result<(), ChunkError> {
        if self.workers == 0 {
            return Err(ChunkError::InvalidWorkerCount(self.workers));
        }
        Ok(())
    }
}

pub struct LoaderConfigBuilder {
    workers: usize,
    batch_size: usize,
    row_policy: RowPolicy,
    failure_policy: FailurePolicy,
}

impl Default for LoaderConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoaderConfigBuilder {
    /// Create a new [`LoaderConfigBuilder`] seeded with the defaults
    pub fn new() -> Self {
        let config = LoaderConfig::default();
        Self {
            workers: config.workers,
            batch_size: config.batch_size,
            row_policy: config.row_policy,
            failure_policy: config.failure_policy,
        }
    }

    /// Build a [`LoaderConfig`]
    pub fn build(self) -> LoaderConfig {
        LoaderConfig {
            workers: self.workers,
            batch_size: self.batch_size,
            row_policy: self.row_policy,
            failure_policy: self.failure_policy,
        }
    }

    pub fn with_workers(self, workers: usize) -> Self {
        Self { workers, ..self }
    }

    pub fn with_batch_size(self, batch_size: usize) -> Self {
        Self { batch_size, ..self }
    }

    pub fn with_row_policy(self, row_policy: RowPolicy) -> Self {
        Self { row_policy, ..self }
    }

    pub fn with_failure_policy(self, failure_policy: FailurePolicy) -> Self {
        Self {
            failure_policy,
            ..self
        }
    }
}
