use std::path::Path;

use anyhow::{Context, Result};
use chunkload_core::{ExistingChunks, FailurePolicy, RowPolicy};
use serde::Deserialize;

use crate::errors::ConfigError;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub split: SplitSection,
    #[serde(default)]
    pub load: LoadSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplitSection {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub lines_per_chunk: Option<usize>,
    pub on_existing: Option<ExistingChunks>,
    pub manifest: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadSection {
    pub directory: Option<String>,
    pub workers: Option<usize>,
    pub batch_size: Option<usize>,
    pub row_policy: Option<RowPolicy>,
    pub failure_policy: Option<FailurePolicy>,
}

pub fn parse_config(path: Option<&str>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let config_path = Path::new(path);
    if !config_path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_string(),
        }
        .into());
    }
    let config_str = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let config: Config = toml::from_str(config_str.as_str())
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
    Ok(config)
}
