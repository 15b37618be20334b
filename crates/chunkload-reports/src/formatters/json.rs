use std::path::Path;

use chrono::Local;
use chunkload_core::{LoadOutcome, MergedTable, SplitOutcome};
use serde::Serialize;
use serde_json::Error;

use crate::{memory::SizeReport, Reporter};

#[derive(Serialize)]
pub struct JsonFormatter {
    version: String,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    split: Option<SplitFormatter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    load: Option<LoadFormatter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    memory: Option<SizeReport>,
}

#[derive(Serialize)]
struct SplitFormatter {
    header: String,
    rows: usize,
    chunks: Vec<ChunkFormatter>,
}

#[derive(Serialize)]
struct ChunkFormatter {
    path: String,
    rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skipped_rows: Option<usize>,
}

#[derive(Serialize)]
struct LoadFormatter {
    rows: usize,
    columns: Vec<String>,
    elapsed_secs: f64,
    chunks: Vec<ChunkFormatter>,
    failures: Vec<FailureFormatter>,
}

#[derive(Serialize)]
struct FailureFormatter {
    path: String,
    error: String,
}

impl JsonFormatter {
    pub fn new(version: String) -> Self {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        Self {
            version,
            timestamp,
            split: None,
            load: None,
            memory: None,
        }
    }

    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Reporter for JsonFormatter {
    fn on_start(&self) {}

    fn on_split(&mut self, outcome: &SplitOutcome) {
        self.split = Some(SplitFormatter {
            header: outcome.header.clone(),
            rows: outcome.total_rows(),
            chunks: outcome
                .chunks
                .iter()
                .map(|c| ChunkFormatter {
                    path: c.path.display().to_string(),
                    rows: c.rows,
                    bytes: Some(c.bytes),
                    skipped_rows: None,
                })
                .collect(),
        });
    }

    fn on_loading(&self, _dir: &Path) {}

    fn on_load_complete(&mut self, outcome: &LoadOutcome) {
        self.load = Some(LoadFormatter {
            rows: outcome.table.num_rows(),
            columns: outcome.table.column_names(),
            elapsed_secs: outcome.elapsed.as_secs_f64(),
            chunks: outcome
                .chunks
                .iter()
                .map(|c| ChunkFormatter {
                    path: c.path.display().to_string(),
                    rows: c.rows,
                    bytes: None,
                    skipped_rows: Some(c.skipped_rows),
                })
                .collect(),
            failures: outcome
                .failures
                .iter()
                .map(|f| FailureFormatter {
                    path: f.path.display().to_string(),
                    error: f.error.clone(),
                })
                .collect(),
        });
    }

    fn on_memory(&mut self, table: &MergedTable) {
        self.memory = Some(SizeReport::of(table));
    }

    fn on_summary(&self) {}
}
