pub mod config;
pub mod discovery;
pub mod errors;
pub mod loader;
pub mod reader;
pub mod splitter;
pub mod table;
pub mod utils;

pub use config::{
    ExistingChunks, FailurePolicy, LoaderConfig, LoaderConfigBuilder, RowPolicy, SplitConfig,
};
pub use discovery::{discover_chunks, ChunkSource, FileFormat};
pub use errors::ChunkError;
pub use loader::{load_directory, ChunkSummary, LoadFailure, LoadOutcome};
pub use reader::parse_chunk;
pub use splitter::{split_file, ChunkFile, SplitOutcome};
pub use table::{merge_tables, MergedTable, ParsedTable};
