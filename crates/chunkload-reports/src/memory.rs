use chunkload_core::MergedTable;
use serde::Serialize;

use crate::utils::bytes::format_bytes;

/// Deep memory footprint of a table and of each of its columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeReport {
    pub total_bytes: usize,
    pub columns: Vec<ColumnSize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSize {
    pub name: String,
    pub bytes: usize,
}

impl SizeReport {
    pub fn of(table: &MergedTable) -> Self {
        let columns: Vec<ColumnSize> = table
            .column_memory_sizes()
            .into_iter()
            .map(|(name, bytes)| ColumnSize { name, bytes })
            .collect();
        Self {
            total_bytes: columns.iter().map(|c| c.bytes).sum(),
            columns,
        }
    }

    /// Summary line first, then `<column> <size>` per column
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.columns.len() + 1);
        lines.push(format_bytes(self.total_bytes as u64));
        for column in &self.columns {
            lines.push(format!("{} {}", column.name, format_bytes(column.bytes as u64)));
        }
        lines
    }
}

/// Print the memory report of `table` to stdout and return the same text
pub fn describe_size(table: &MergedTable) -> String {
    let mut output = String::new();
    for line in SizeReport::of(table).lines() {
        println!("{}", line);
        output.push_str(&line);
        output.push('\n');
    }
    output
}
