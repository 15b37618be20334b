use std::path::Path;

use chunkload_core::{LoadOutcome, MergedTable, SplitOutcome};

use crate::{memory::describe_size, utils::numbers::format_numbers, Reporter};

pub struct StdOutFormatter {
    intro: String,
    intro_len: usize,
    failed_chunks: usize,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl StdOutFormatter {
    pub fn new(version: String) -> Self {
        let s = format!("chunkload v{} - Load Report", version);
        let n = s.len();
        Self {
            intro: s,
            intro_len: n,
            failed_chunks: 0,
        }
    }

    pub fn print_split(&self, outcome: &SplitOutcome) {
        println!(
            "Split into {} chunk(s), {} rows",
            outcome.chunks.len(),
            format_numbers(outcome.total_rows())
        );
        for chunk in &outcome.chunks {
            println!(
                "  {} ({} rows)",
                file_name(&chunk.path),
                format_numbers(chunk.rows)
            );
        }
    }

    pub fn print_loading_start(&self, dir: &Path) {
        println!("\nLoading {}...", dir.display());
    }

    pub fn print_load_result(&self, outcome: &LoadOutcome) {
        let total = outcome.chunks.len() + outcome.failures.len();
        for (i, chunk) in outcome.chunks.iter().enumerate() {
            let skipped = if chunk.skipped_rows > 0 {
                format!(", {} skipped", format_numbers(chunk.skipped_rows))
            } else {
                String::new()
            };
            println!(
                "  [{}/{}] {} ({} rows{})",
                i + 1,
                total,
                file_name(&chunk.path),
                format_numbers(chunk.rows),
                skipped
            );
        }
        for failure in &outcome.failures {
            println!("  FAILED {}: {}", file_name(&failure.path), failure.error);
        }

        println!(
            "\n{} rows x {} columns loaded in {:.3}s",
            format_numbers(outcome.table.num_rows()),
            outcome.table.num_columns(),
            outcome.elapsed.as_secs_f64()
        );
    }

    pub fn print_memory(&self, table: &MergedTable) {
        println!("\nMemory usage:");
        describe_size(table);
    }

    pub fn print_summary(&self) {
        println!("\n===================================");
        if self.failed_chunks == 0 {
            println!("Result: all chunks loaded");
        } else {
            println!("Result: {} chunk(s) failed", self.failed_chunks);
        }
    }
}

impl Reporter for StdOutFormatter {
    fn on_start(&self) {
        let i = "=".repeat(self.intro_len);

        println!("{}", self.intro);
        println!("{}", i);
    }

    fn on_split(&mut self, outcome: &SplitOutcome) {
        self.print_split(outcome);
    }

    fn on_loading(&self, dir: &Path) {
        self.print_loading_start(dir);
    }

    fn on_load_complete(&mut self, outcome: &LoadOutcome) {
        self.failed_chunks = outcome.failures.len();
        self.print_load_result(outcome);
    }

    fn on_memory(&mut self, table: &MergedTable) {
        self.print_memory(table);
    }

    fn on_summary(&self) {
        self.print_summary();
    }
}
