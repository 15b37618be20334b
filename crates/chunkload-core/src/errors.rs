use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChunkError {
    /// Missing file or directory, unwritable destination, read failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The Arrow kernel produced an error (inference, cast, concat)
    #[error("Arrow computation error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Row tokenizer error that is not a per-row problem
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid chunk name pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Manifest serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The file has no header line
    #[error("File is empty: '{}'", .0.display())]
    EmptySource(PathBuf),

    #[error("Chunk size must be greater than 0, got {0}")]
    InvalidChunkSize(usize),

    #[error("Worker pool size must be greater than 0, got {0}")]
    InvalidWorkerCount(usize),

    #[error("Destination '{}' already holds {} chunk file(s)", dir.display(), existing.len())]
    DestinationNotEmpty {
        dir: PathBuf,
        existing: Vec<PathBuf>,
    },

    #[error("Malformed row in '{}' at line {line}: {reason}", path.display())]
    MalformedRow {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    /// A parse task failed; wraps the underlying cause
    #[error("Failed to load '{}': {source}", path.display())]
    Task {
        path: PathBuf,
        #[source]
        source: Box<ChunkError>,
    },

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl ChunkError {
    pub(crate) fn task(path: PathBuf, source: ChunkError) -> Self {
        ChunkError::Task {
            path,
            source: Box::new(source),
        }
    }
}
