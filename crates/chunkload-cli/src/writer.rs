use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))
}

/// Where the JSON report of `command` is written.
///
/// With no target, an existing directory, or a path ending in a separator
/// (created on demand), the report is named `<command>_<timestamp>.json`.
/// Any other target is the report file itself; its parent is created if
/// missing.
pub fn report_path(target: Option<&Path>, command: &str, timestamp: &str) -> Result<PathBuf> {
    let file_name = format!("{}_{}.json", command, timestamp);
    let Some(target) = target else {
        return Ok(Path::new(".").join(file_name));
    };

    if target.is_dir() {
        return Ok(target.join(file_name));
    }
    if target.as_os_str().to_string_lossy().ends_with(['/', '\\']) {
        ensure_dir(target)?;
        return Ok(target.join(file_name));
    }
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    Ok(target.to_path_buf())
}
