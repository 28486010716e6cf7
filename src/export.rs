//! CSV export of a result
//!
//! The header line is the column names joined with commas; every data cell
//! is wrapped in double quotes. Embedded double quotes are written as-is, so
//! cells containing `"` do not survive a re-parse.

use crate::error::Result;
use crate::result::TabularResult;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::info;

pub fn to_csv(result: &TabularResult) -> String {
    let mut lines = Vec::with_capacity(result.rows.len() + 1);
    lines.push(result.headers.join(","));
    for row in &result.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| format!("\"{}\"", cell.to_plain_string()))
            .collect();
        lines.push(cells.join(","));
    }
    lines.join("\n")
}

/// `query_results_<unix millis>.csv`
pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("query_results_{}.csv", at.timestamp_millis())
}

/// Write the export into `dir` under a timestamped name and return its path.
pub fn write_csv(result: &TabularResult, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(Utc::now()));
    std::fs::write(&path, to_csv(result))?;
    info!(path = %path.display(), rows = result.row_count(), "Exported result");
    Ok(path)
}
