//! Chunk reader
//!
//! Parses one delimited chunk file into a single Arrow [`RecordBatch`].
//!
//! Parsing happens in two passes over the chunk:
//!
//! 1. The `csv` tokenizer walks every record and checks it against the header
//!    width. Rows that do not fit are skipped or rejected according to the
//!    [`RowPolicy`]; rows that fit are re-serialized into an in-memory buffer.
//! 2. Arrow infers the column types from the cleaned buffer and decodes it.
//!    Since inference saw every kept row, decoding cannot hit a bad value.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{self, BufReader, Cursor};
use std::path::Path;
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::csv::ReaderBuilder as CsvReaderBuilder;
use arrow::csv::reader::Format;
use arrow::record_batch::RecordBatch;
use csv::{ErrorKind, StringRecord};

use crate::config::RowPolicy;
use crate::discovery::ChunkSource;
use crate::errors::ChunkError;
use crate::table::ParsedTable;

/// Well-formed rows of a chunk, re-encoded with the chunk's delimiter
struct CleanChunk {
    buffer: Vec<u8>,
    kept: usize,
    skipped: usize,
}

fn reject(path: &Path, policy: RowPolicy, line: u64, reason: String) -> Result<(), ChunkError> {
    match policy {
        RowPolicy::SkipMalformed => {
            tracing::debug!(path = %path.display(), line, %reason, "skipping malformed row");
            Ok(())
        }
        RowPolicy::Strict => Err(ChunkError::MalformedRow {
            path: path.to_path_buf(),
            line,
            reason,
        }),
    }
}

/// Errors the tokenizer reports for one record without losing its position
fn is_row_error(err: &csv::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::Utf8 { .. } | ErrorKind::UnequalLengths { .. }
    )
}

/// Make repeated header names unique: `a,a,b` becomes `a,a.1,b`.
/// A suffix already taken by another column is skipped.
fn unique_names(header: &StringRecord) -> StringRecord {
    let mut seen: HashSet<String> = HashSet::with_capacity(header.len());
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut names = StringRecord::with_capacity(header.as_slice().len(), header.len());

    for name in header.iter() {
        let count = counts.entry(name).or_insert(0);
        let mut unique = name.to_string();
        while seen.contains(&unique) {
            *count += 1;
            unique = format!("{}.{}", name, count);
        }
        names.push_field(&unique);
        seen.insert(unique);
    }
    names
}

fn clean_rows(
    path: &Path,
    delimiter: u8,
    policy: RowPolicy,
) -> Result<CleanChunk, ChunkError> {
    let file = File::open(path)?;
    let mut rows = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let header = rows.headers()?.clone();
    if header.is_empty() {
        return Err(ChunkError::EmptySource(path.to_path_buf()));
    }
    let width = header.len();
    let names = unique_names(&header);
    if names != header {
        tracing::debug!(path = %path.display(), "renamed repeated header names");
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    writer.write_record(&names)?;

    let mut record = StringRecord::new();
    let (mut kept, mut skipped) = (0usize, 0usize);
    loop {
        match rows.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) if record.len() == width => {
                writer.write_record(&record)?;
                kept += 1;
            }
            Ok(true) => {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                let reason = format!("expected {} fields, found {}", width, record.len());
                reject(path, policy, line, reason)?;
                skipped += 1;
            }
            Err(e) if is_row_error(&e) => {
                let line = e.position().map(|p| p.line()).unwrap_or_default();
                reject(path, policy, line, e.to_string())?;
                skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    let buffer = writer
        .into_inner()
        .map_err(|e| io::Error::new(e.error().kind(), e.error().to_string()))?;
    Ok(CleanChunk {
        buffer,
        kept,
        skipped,
    })
}

/// Parse a single chunk file into a [`ParsedTable`]
///
/// # Arguments
///
/// * `source` - Chunk path and its delimited format
/// * `policy` - How to treat rows that do not match the header
/// * `batch_size` - Rows per Arrow decode batch
pub fn parse_chunk(
    source: &ChunkSource,
    policy: RowPolicy,
    batch_size: usize,
) -> Result<ParsedTable, ChunkError> {
    let delimiter = source.format.delimiter();
    let clean = clean_rows(&source.path, delimiter, policy)?;

    let format = Format::default()
        .with_header(true)
        .with_delimiter(delimiter);
    let (schema, _) = format.infer_schema(Cursor::new(&clean.buffer), None)?;
    let schema = Arc::new(schema);

    let reader = CsvReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_delimiter(delimiter)
        .with_batch_size(batch_size.max(1))
        .build(Cursor::new(clean.buffer))?;

    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    let batch: RecordBatch = concat_batches(&schema, &batches)?;
    debug_assert_eq!(batch.num_rows(), clean.kept);

    if clean.skipped > 0 {
        tracing::warn!(
            path = %source.path.display(),
            skipped = clean.skipped,
            "dropped malformed rows"
        );
    }

    Ok(ParsedTable {
        path: source.path.clone(),
        batch,
        skipped_rows: clean.skipped,
    })
}
