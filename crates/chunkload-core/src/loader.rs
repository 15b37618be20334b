//! Parallel Loader
//!
//! Discovers the chunk files of a directory, parses each one as an independent
//! task on a fixed-size rayon pool and concatenates the results.
//!
//! Tasks share nothing: each one opens its own file and hands back its
//! [`ParsedTable`] through the return value. The indexed parallel iterator
//! collects results in submission order, whatever order the workers finish in,
//! so the merged table follows directory-listing order.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::config::{FailurePolicy, LoaderConfig};
use crate::discovery::{discover_chunks, ChunkSource};
use crate::errors::ChunkError;
use crate::reader::parse_chunk;
use crate::table::{merge_tables, MergedTable, ParsedTable};
use crate::utils::timed;

/// Per-chunk contribution to the merged table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub skipped_rows: usize,
}

impl From<&ParsedTable> for ChunkSummary {
    fn from(table: &ParsedTable) -> Self {
        Self {
            path: table.path.clone(),
            rows: table.num_rows(),
            skipped_rows: table.skipped_rows,
        }
    }
}

/// A task that failed under [`FailurePolicy::Continue`]
#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub table: MergedTable,
    pub elapsed: Duration,
    /// Successfully parsed chunks, in merge order
    pub chunks: Vec<ChunkSummary>,
    pub failures: Vec<LoadFailure>,
}

impl LoadOutcome {
    pub fn skipped_rows(&self) -> usize {
        self.chunks.iter().map(|c| c.skipped_rows).sum()
    }
}

struct Merged {
    table: MergedTable,
    chunks: Vec<ChunkSummary>,
    failures: Vec<LoadFailure>,
}

/// Load every chunk file of `dir` into one table.
///
/// # Arguments
///
/// * `dir` - Directory holding the chunk files
/// * `config` - Pool size, decode batch size, row and failure policies
///
/// # Returns
///
/// The merged table together with the wall-clock time of the whole load
pub fn load_directory(dir: &Path, config: &LoaderConfig) -> Result<LoadOutcome, ChunkError> {
    config.validate()?;

    let (merged, elapsed) = timed("load_directory", || {
        let sources = discover_chunks(dir)?;
        load_sources(&sources, config)
    });
    let merged = merged?;

    tracing::info!(
        dir = %dir.display(),
        chunks = merged.chunks.len(),
        failed = merged.failures.len(),
        rows = merged.table.num_rows(),
        columns = merged.table.num_columns(),
        "load complete"
    );

    Ok(LoadOutcome {
        table: merged.table,
        elapsed,
        chunks: merged.chunks,
        failures: merged.failures,
    })
}

fn load_sources(sources: &[ChunkSource], config: &LoaderConfig) -> Result<Merged, ChunkError> {
    if sources.is_empty() {
        tracing::debug!("no chunk files found, nothing to schedule");
        return Ok(Merged {
            table: MergedTable::empty(),
            chunks: Vec::new(),
            failures: Vec::new(),
        });
    }

    let results = parse_parallel(sources, config)?;

    let mut parsed = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (source, result) in sources.iter().zip(results) {
        match result {
            Ok(table) => parsed.push(table),
            Err(e) => match config.failure_policy {
                FailurePolicy::Abort => return Err(ChunkError::task(source.path.clone(), e)),
                FailurePolicy::Continue => {
                    tracing::warn!(path = %source.path.display(), error = %e, "chunk failed, continuing");
                    failures.push(LoadFailure {
                        path: source.path.clone(),
                        error: e.to_string(),
                    });
                }
            },
        }
    }

    let chunks = parsed.iter().map(ChunkSummary::from).collect();
    let table = merge_tables(&parsed)?;
    Ok(Merged {
        table,
        chunks,
        failures,
    })
}

/// One parse task per source on a pool of `config.workers` threads.
/// Results come back in the order of `sources`.
fn parse_parallel(
    sources: &[ChunkSource],
    config: &LoaderConfig,
) -> Result<Vec<Result<ParsedTable, ChunkError>>, ChunkError> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .thread_name(|i| format!("chunkload-worker-{}", i))
        .build()?;

    tracing::debug!(
        tasks = sources.len(),
        workers = config.workers,
        "scheduling parse tasks"
    );

    Ok(pool.install(|| {
        sources
            .par_iter()
            .map(|source| {
                tracing::trace!(path = %source.path.display(), "parsing chunk");
                parse_chunk(source, config.row_policy, config.batch_size)
            })
            .collect()
    }))
}
