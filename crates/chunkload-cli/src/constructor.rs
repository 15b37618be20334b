use std::path::PathBuf;

use chunkload_core::{
    ExistingChunks, FailurePolicy, LoaderConfig, LoaderConfigBuilder, RowPolicy, SplitConfig,
};

use crate::errors::ConfigError;
use crate::parser::Config;
use crate::{LoadArgs, OnExisting, SplitArgs};

const DEFAULT_LINES_PER_CHUNK: usize = 1_000_000;

/// Source path and splitter settings, flags over config file over defaults
pub fn construct_split(
    config: &Config,
    args: &SplitArgs,
) -> Result<(PathBuf, SplitConfig), ConfigError> {
    let section = &config.split;
    let source = args
        .source
        .clone()
        .or_else(|| section.source.clone())
        .ok_or(ConfigError::MissingSetting {
            setting: "split.source",
            flag: "--source",
        })?;
    let destination = args
        .dest
        .clone()
        .or_else(|| section.destination.clone())
        .ok_or(ConfigError::MissingSetting {
            setting: "split.destination",
            flag: "--dest",
        })?;
    let lines = args
        .lines
        .or(section.lines_per_chunk)
        .unwrap_or(DEFAULT_LINES_PER_CHUNK);
    if lines == 0 {
        return Err(ConfigError::NotPositive {
            setting: "lines_per_chunk",
        });
    }

    let on_existing = match args.on_existing {
        Some(OnExisting::Replace) => ExistingChunks::Replace,
        Some(OnExisting::Fail) => ExistingChunks::Fail,
        None => section.on_existing.unwrap_or_default(),
    };
    let manifest = !args.no_manifest && section.manifest.unwrap_or(true);

    let split = SplitConfig::new(destination, lines)
        .with_on_existing(on_existing)
        .with_manifest(manifest);
    Ok((PathBuf::from(source), split))
}

/// Chunk directory and loader settings. `fallback_dir` is used when neither
/// the flags nor the config name a directory (the split destination in `run`).
pub fn construct_load(
    config: &Config,
    args: &LoadArgs,
    fallback_dir: Option<PathBuf>,
) -> Result<(PathBuf, LoaderConfig), ConfigError> {
    let section = &config.load;
    let dir = args
        .dir
        .clone()
        .or_else(|| section.directory.clone())
        .map(PathBuf::from)
        .or(fallback_dir)
        .ok_or(ConfigError::MissingSetting {
            setting: "load.directory",
            flag: "--dir",
        })?;

    let mut builder = LoaderConfigBuilder::new();
    if let Some(workers) = args.workers.or(section.workers) {
        if workers == 0 {
            return Err(ConfigError::NotPositive { setting: "workers" });
        }
        builder = builder.with_workers(workers);
    }
    if let Some(batch_size) = args.batch_size.or(section.batch_size) {
        if batch_size == 0 {
            return Err(ConfigError::NotPositive {
                setting: "batch_size",
            });
        }
        builder = builder.with_batch_size(batch_size);
    }

    let row_policy = if args.strict {
        RowPolicy::Strict
    } else {
        section.row_policy.unwrap_or_default()
    };
    let failure_policy = if args.keep_going {
        FailurePolicy::Continue
    } else {
        section.failure_policy.unwrap_or_default()
    };

    let loader = builder
        .with_row_policy(row_policy)
        .with_failure_policy(failure_policy)
        .build();
    Ok((dir, loader))
}
