//! Statistics model dump
//!
//! The aggregate is written as one JSON document into the output directory;
//! report generators read it from there.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::collector::{CollectError, CollectResult, CollectedStatistics};

pub const STATISTICS_FILE: &str = "statistics.json";

/// Create `path` if needed and make sure it is a directory
pub fn prepare_output_dir(path: &Path) -> CollectResult<PathBuf> {
    if !path.exists() {
        fs::create_dir_all(path)
            .map_err(|e| CollectError::output_path(path, e.to_string()))?;
    }
    if !path.is_dir() {
        return Err(CollectError::output_path(path, "not a directory"));
    }
    path.canonicalize()
        .map_err(|e| CollectError::output_path(path, e.to_string()))
}

/// Write `statistics.json` into `output_dir`
pub fn write_statistics(output_dir: &Path, collected: &CollectedStatistics) -> Result<PathBuf> {
    let path = output_dir.join(STATISTICS_FILE);
    let file = fs::File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, collected)
        .with_context(|| format!("Failed to serialize statistics to {}", path.display()))?;
    writer.flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Statistics written to {}", path.display());
    Ok(path)
}
