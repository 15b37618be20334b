pub mod formatters;
pub mod memory;
pub mod utils;

use chunkload_core::{LoadOutcome, MergedTable, SplitOutcome};
pub use formatters::{json::JsonFormatter, stdout::StdOutFormatter};
pub use memory::{describe_size, SizeReport};

pub trait Reporter {
    fn on_start(&self);
    fn on_split(&mut self, outcome: &SplitOutcome);
    fn on_loading(&self, dir: &std::path::Path);
    fn on_load_complete(&mut self, outcome: &LoadOutcome);
    fn on_memory(&mut self, table: &MergedTable);
    fn on_summary(&self);
}
