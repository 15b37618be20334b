//! Chunk Splitter
//!
//! Partitions a delimited text file into sibling chunk files of at most
//! `lines_per_chunk` data lines each. Every chunk starts with a copy of the
//! source header line. Lines are copied as raw bytes, the splitter never
//! tokenizes fields.
//!
//! Chunks are named `<stem>_<n>.<ext>` with `n` starting at 1. The manifest
//! of a split is also its record of ownership: a later split of the same source
//! only deletes the chunks that manifest lists.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::{ExistingChunks, SplitConfig};
use crate::errors::ChunkError;

const DEFAULT_EXTENSION: &str = "csv";

/// One chunk written by [`split_file`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFile {
    pub path: PathBuf,
    /// Data lines, header excluded
    pub rows: usize,
    /// Size on disk, header included
    pub bytes: u64,
}

#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub header: String,
    pub chunks: Vec<ChunkFile>,
    pub manifest: Option<PathBuf>,
}

impl SplitOutcome {
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.chunks.iter().map(|c| c.path.as_path())
    }

    pub fn total_rows(&self) -> usize {
        self.chunks.iter().map(|c| c.rows).sum()
    }
}

#[derive(Serialize, Deserialize)]
struct Manifest {
    source: String,
    header: String,
    lines_per_chunk: usize,
    chunks: Vec<ManifestEntry>,
}

#[derive(Serialize, Deserialize)]
struct ManifestEntry {
    file_name: String,
    rows: usize,
    bytes: u64,
}

/// Naming scheme shared by the writer and the stale-chunk scan
struct ChunkNaming {
    stem: String,
    extension: String,
}

impl ChunkNaming {
    fn for_source(source: &Path) -> Self {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "chunk".to_string());
        let extension = source
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
        Self { stem, extension }
    }

    fn file_name(&self, index: usize) -> String {
        format!("{}_{}.{}", self.stem, index, self.extension)
    }

    fn manifest_name(&self) -> String {
        format!("{}_manifest.json", self.stem)
    }

    fn pattern(&self) -> Result<Regex, regex::Error> {
        Regex::new(&format!(
            r"^{}_\d+\.{}$",
            regex::escape(&self.stem),
            regex::escape(&self.extension)
        ))
    }
}

/// Split `source` into chunk files under `config.destination`.
///
/// A source with `R` data lines yields `ceil(R / lines_per_chunk)` chunks; a
/// source holding only a header yields none. Files created by this call, the
/// manifest included, are removed again if the split fails half way.
pub fn split_file(source: &Path, config: &SplitConfig) -> Result<SplitOutcome, ChunkError> {
    config.validate()?;
    let reader = BufReader::new(File::open(source)?);
    split_reader(source, reader, config)
}

fn split_reader<R: BufRead>(
    source: &Path,
    mut reader: R,
    config: &SplitConfig,
) -> Result<SplitOutcome, ChunkError> {
    let mut header = Vec::new();
    if reader.read_until(b'\n', &mut header)? == 0 {
        return Err(ChunkError::EmptySource(source.to_path_buf()));
    }

    let destination = config.destination();
    fs::create_dir_all(destination)?;

    let naming = ChunkNaming::for_source(source);
    prepare_destination(destination, &naming, config.on_existing)?;

    let mut created = Vec::new();
    let outcome = match write_outputs(
        source,
        &mut reader,
        &header,
        &naming,
        config,
        &mut created,
    ) {
        Ok(outcome) => outcome,
        Err(e) => {
            for path in &created {
                if let Err(rm) = fs::remove_file(path) {
                    tracing::warn!(path = %path.display(), error = %rm, "failed to remove partial output");
                }
            }
            return Err(e);
        }
    };

    tracing::info!(
        source = %source.display(),
        chunks = outcome.chunks.len(),
        rows = outcome.total_rows(),
        "split complete"
    );
    Ok(outcome)
}

/// Chunks then manifest. Every file created is pushed onto `created`.
fn write_outputs<R: BufRead>(
    source: &Path,
    reader: &mut R,
    header: &[u8],
    naming: &ChunkNaming,
    config: &SplitConfig,
    created: &mut Vec<PathBuf>,
) -> Result<SplitOutcome, ChunkError> {
    let destination = config.destination();
    let chunks = write_chunks(
        reader,
        header,
        destination,
        naming,
        config.lines_per_chunk,
        created,
    )?;

    let header = String::from_utf8_lossy(header)
        .trim_end_matches(['\r', '\n'])
        .to_string();

    let manifest = if config.manifest {
        let manifest = Manifest {
            source: source.display().to_string(),
            header: header.clone(),
            lines_per_chunk: config.lines_per_chunk,
            chunks: chunks.iter().map(ManifestEntry::from).collect(),
        };
        let path = destination.join(naming.manifest_name());
        write_manifest(&path, &manifest, created)?;
        Some(path)
    } else {
        None
    };

    Ok(SplitOutcome {
        header,
        chunks,
        manifest,
    })
}

/// Files in `dir` named like chunks of this source, whoever wrote them
fn find_chunks(dir: &Path, naming: &ChunkNaming) -> Result<Vec<PathBuf>, ChunkError> {
    let pattern = naming.pattern()?;
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if pattern.is_match(&entry.file_name().to_string_lossy()) {
            found.push(entry.path());
        }
    }
    Ok(found)
}

/// Chunks listed in the manifest of a previous split into `dir`.
/// An unreadable manifest records nothing.
fn recorded_chunks(dir: &Path, naming: &ChunkNaming) -> Result<Vec<PathBuf>, ChunkError> {
    let manifest_path = dir.join(naming.manifest_name());
    if !manifest_path.is_file() {
        return Ok(Vec::new());
    }

    let manifest: Manifest = match fs::read_to_string(&manifest_path)
        .map_err(ChunkError::from)
        .and_then(|text| serde_json::from_str(&text).map_err(ChunkError::from))
    {
        Ok(manifest) => manifest,
        Err(e) => {
            tracing::warn!(path = %manifest_path.display(), error = %e, "ignoring unreadable manifest");
            return Ok(Vec::new());
        }
    };

    let pattern = naming.pattern()?;
    Ok(manifest
        .chunks
        .into_iter()
        .filter(|entry| pattern.is_match(&entry.file_name))
        .map(|entry| dir.join(entry.file_name))
        .filter(|path| path.is_file())
        .collect())
}

fn prepare_destination(
    dir: &Path,
    naming: &ChunkNaming,
    policy: ExistingChunks,
) -> Result<(), ChunkError> {
    match policy {
        ExistingChunks::Fail => {
            let existing = find_chunks(dir, naming)?;
            if existing.is_empty() {
                Ok(())
            } else {
                Err(ChunkError::DestinationNotEmpty {
                    dir: dir.to_path_buf(),
                    existing,
                })
            }
        }
        ExistingChunks::Replace => {
            let stale = recorded_chunks(dir, naming)?;
            if !stale.is_empty() {
                tracing::debug!(count = stale.len(), dir = %dir.display(), "removing stale chunks");
            }
            for path in stale {
                fs::remove_file(path)?;
            }
            let manifest_path = dir.join(naming.manifest_name());
            if manifest_path.is_file() {
                fs::remove_file(manifest_path)?;
            }
            Ok(())
        }
    }
}

struct OpenChunk {
    path: PathBuf,
    writer: BufWriter<File>,
    rows: usize,
    bytes: u64,
}

impl OpenChunk {
    fn finish(mut self) -> Result<ChunkFile, ChunkError> {
        self.writer.flush()?;
        tracing::debug!(path = %self.path.display(), rows = self.rows, "chunk written");
        Ok(ChunkFile {
            path: self.path,
            rows: self.rows,
            bytes: self.bytes,
        })
    }
}

fn write_chunks<R: BufRead>(
    reader: &mut R,
    header: &[u8],
    destination: &Path,
    naming: &ChunkNaming,
    lines_per_chunk: usize,
    created: &mut Vec<PathBuf>,
) -> Result<Vec<ChunkFile>, ChunkError> {
    let mut chunks = Vec::new();
    let mut current: Option<OpenChunk> = None;
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }

        let full = current
            .as_ref()
            .is_some_and(|c| c.rows >= lines_per_chunk);
        if full {
            if let Some(chunk) = current.take() {
                chunks.push(chunk.finish()?);
            }
        }

        if current.is_none() {
            let path = destination.join(naming.file_name(chunks.len() + 1));
            let file = File::create(&path)?;
            created.push(path.clone());
            let mut writer = BufWriter::new(file);
            writer.write_all(header)?;
            current = Some(OpenChunk {
                path,
                writer,
                rows: 0,
                bytes: header.len() as u64,
            });
        }

        if let Some(chunk) = current.as_mut() {
            chunk.writer.write_all(&line)?;
            chunk.rows += 1;
            chunk.bytes += line.len() as u64;
        }
    }

    if let Some(chunk) = current.take() {
        chunks.push(chunk.finish()?);
    }
    Ok(chunks)
}

impl From<&ChunkFile> for ManifestEntry {
    fn from(chunk: &ChunkFile) -> Self {
        Self {
            file_name: chunk
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            rows: chunk.rows,
            bytes: chunk.bytes,
        }
    }
}

fn write_manifest(
    path: &Path,
    manifest: &Manifest,
    created: &mut Vec<PathBuf>,
) -> Result<(), ChunkError> {
    let file = File::create(path)?;
    created.push(path.to_path_buf());
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, manifest)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor, Read};
    use tempfile::tempdir;

    /// Reader that fails once the preceding data is consumed
    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("device went away"))
        }
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn write_source(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_chunk_naming() {
        let naming = ChunkNaming::for_source(Path::new("/data/csv_simple.csv"));
        assert_eq!(naming.file_name(1), "csv_simple_1.csv");
        assert_eq!(naming.file_name(12), "csv_simple_12.csv");
        assert_eq!(naming.manifest_name(), "csv_simple_manifest.json");
    }

    #[test]
    fn test_chunk_naming_without_extension() {
        let naming = ChunkNaming::for_source(Path::new("data"));
        assert_eq!(naming.file_name(3), "data_3.csv");
    }

    #[test]
    fn test_chunk_pattern() {
        let naming = ChunkNaming::for_source(Path::new("my.data.csv"));
        let pattern = naming.pattern().unwrap();
        assert!(pattern.is_match("my.data_1.csv"));
        assert!(pattern.is_match("my.data_120.csv"));
        assert!(!pattern.is_match("my.data_manifest.json"));
        assert!(!pattern.is_match("myXdata_1.csv"));
        assert!(!pattern.is_match("my.data_1.csv.bak"));
        assert!(!pattern.is_match("other_1.csv"));
    }

    #[test]
    fn test_split_even_chunks() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path(), "src.csv", "a,b\n1,2\n3,4\n5,6\n7,8\n");
        let config = SplitConfig::new(dir.path().join("out"), 2).with_manifest(false);

        let outcome = split_file(&source, &config).unwrap();
        assert_eq!(outcome.chunks.len(), 2);
        assert_eq!(outcome.header, "a,b");
        assert_eq!(outcome.total_rows(), 4);
        assert!(outcome.manifest.is_none());

        let first = fs::read_to_string(&outcome.chunks[0].path).unwrap();
        let second = fs::read_to_string(&outcome.chunks[1].path).unwrap();
        assert_eq!(first, "a,b\n1,2\n3,4\n");
        assert_eq!(second, "a,b\n5,6\n7,8\n");
        assert_eq!(outcome.chunks[0].bytes, first.len() as u64);
    }

    #[test]
    fn test_split_last_line_without_newline() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path(), "src.csv", "a\n1\n2\n3");
        let config = SplitConfig::new(dir.path().join("out"), 2).with_manifest(false);

        let outcome = split_file(&source, &config).unwrap();
        assert_eq!(outcome.chunks.len(), 2);
        assert_eq!(outcome.chunks[1].rows, 1);
        let last = fs::read_to_string(&outcome.chunks[1].path).unwrap();
        assert_eq!(last, "a\n3");
    }

    #[test]
    fn test_split_header_only() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path(), "src.csv", "a,b\n");
        let config = SplitConfig::new(dir.path().join("out"), 10).with_manifest(false);

        let outcome = split_file(&source, &config).unwrap();
        assert!(outcome.chunks.is_empty());
        assert_eq!(outcome.header, "a,b");
    }

    #[test]
    fn test_split_empty_source() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path(), "src.csv", "");
        let config = SplitConfig::new(dir.path().join("out"), 10);

        let result = split_file(&source, &config);
        assert!(matches!(result, Err(ChunkError::EmptySource(_))));
    }

    #[test]
    fn test_split_missing_source() {
        let dir = tempdir().unwrap();
        let config = SplitConfig::new(dir.path().join("out"), 10);

        let result = split_file(&dir.path().join("nope.csv"), &config);
        match result {
            Err(ChunkError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_split_writes_manifest() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path(), "src.csv", "a\n1\n2\n3\n");
        let config = SplitConfig::new(dir.path().join("out"), 2);

        let outcome = split_file(&source, &config).unwrap();
        let manifest_path = outcome.manifest.unwrap();
        assert_eq!(manifest_path.file_name().unwrap(), "src_manifest.json");

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(manifest_path).unwrap()).unwrap();
        assert_eq!(value["header"], "a");
        assert_eq!(value["lines_per_chunk"], 2);
        assert_eq!(value["chunks"][0]["file_name"], "src_1.csv");
        assert_eq!(value["chunks"][0]["rows"], 2);
        assert_eq!(value["chunks"][1]["rows"], 1);
    }

    #[test]
    fn test_split_removes_chunks_on_read_error() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let reader = BufReader::new(Cursor::new(b"a\n1\n2\n3\n".to_vec()).chain(Broken));
        let config = SplitConfig::new(&out, 2);

        let result = split_reader(Path::new("src.csv"), reader, &config);
        assert!(matches!(result, Err(ChunkError::Io(_))));
        assert!(entries(&out).is_empty());
    }

    #[test]
    fn test_split_removes_chunks_when_manifest_fails() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path(), "src.csv", "a\n1\n2\n3\n");
        let out = dir.path().join("out");
        // a directory squatting on the manifest name makes its creation fail
        fs::create_dir_all(out.join("src_manifest.json")).unwrap();

        let result = split_file(&source, &SplitConfig::new(&out, 2));
        assert!(result.is_err());
        assert!(!out.join("src_1.csv").exists());
        assert!(!out.join("src_2.csv").exists());
        assert_eq!(entries(&out), vec!["src_manifest.json"]);
    }

    #[test]
    fn test_replace_only_removes_recorded_chunks() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path(), "sales.csv", "a\n1\n2\n3\n4\n5\n");
        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("sales_2024.csv"), "a\n9\n").unwrap();

        split_file(&source, &SplitConfig::new(&out, 2)).unwrap();
        assert_eq!(
            entries(&out),
            vec![
                "sales_1.csv",
                "sales_2.csv",
                "sales_2024.csv",
                "sales_3.csv",
                "sales_manifest.json"
            ]
        );

        fs::write(&source, "a\n1\n").unwrap();
        let outcome = split_file(&source, &SplitConfig::new(&out, 2)).unwrap();
        assert_eq!(outcome.chunks.len(), 1);
        assert_eq!(
            entries(&out),
            vec!["sales_1.csv", "sales_2024.csv", "sales_manifest.json"]
        );
        assert_eq!(fs::read_to_string(out.join("sales_2024.csv")).unwrap(), "a\n9\n");
    }

    #[test]
    fn test_replace_ignores_unreadable_manifest() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path(), "src.csv", "a\n1\n");
        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("src_manifest.json"), "not json").unwrap();
        fs::write(out.join("src_7.csv"), "a\n7\n").unwrap();

        split_file(&source, &SplitConfig::new(&out, 2)).unwrap();
        assert!(out.join("src_7.csv").exists());
        assert_eq!(
            entries(&out),
            vec!["src_1.csv", "src_7.csv", "src_manifest.json"]
        );
    }

    #[test]
    fn test_manifest_entries_must_look_like_chunks() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("notes.txt"), "keep").unwrap();
        fs::write(out.join("src_1.csv"), "a\n1\n").unwrap();
        fs::write(
            out.join("src_manifest.json"),
            r#"{"source":"src.csv","header":"a","lines_per_chunk":1,
               "chunks":[{"file_name":"notes.txt","rows":1,"bytes":4},
                         {"file_name":"src_1.csv","rows":1,"bytes":4}]}"#,
        )
        .unwrap();

        let naming = ChunkNaming::for_source(Path::new("src.csv"));
        let recorded = recorded_chunks(&out, &naming).unwrap();
        assert_eq!(recorded, vec![out.join("src_1.csv")]);
    }
}
