use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::ChunkError;

/// Delimited text formats the loader recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Tsv,
}

impl FileFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(FileFormat::Csv),
            "tsv" => Some(FileFormat::Tsv),
            _ => None,
        }
    }

    pub fn delimiter(&self) -> u8 {
        match self {
            FileFormat::Csv => b',',
            FileFormat::Tsv => b'\t',
        }
    }
}

/// A file the loader will parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSource {
    pub path: PathBuf,
    pub format: FileFormat,
}

/// List the tabular files of `dir` in directory listing order.
///
/// The order is whatever the filesystem returns; it is not sorted.
/// Subdirectories and files with unrecognized extensions are skipped.
pub fn discover_chunks(dir: &Path) -> Result<Vec<ChunkSource>, ChunkError> {
    let mut sources = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        match FileFormat::from_path(&path) {
            Some(format) => sources.push(ChunkSource { path, format }),
            None => tracing::trace!(path = %path.display(), "ignoring non tabular entry"),
        }
    }
    Ok(sources)
}
