//! Date-partitioned JSON-lines reader

use super::RecordedRow;
use crate::error::{BacktestError, Result};
use chrono::NaiveDate;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// A missing day-file noticed while loading; recoverable, reported in the
/// run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataGap {
    pub source: String,
    pub day: NaiveDate,
}

impl std::fmt::Display for DataGap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.source, self.day)
    }
}

/// Read-only view over the recorded data directory
#[derive(Debug, Clone)]
pub struct DayStore {
    data_dir: PathBuf,
}

impl DayStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn day_path(&self, source: &str, day: NaiveDate) -> PathBuf {
        self.data_dir
            .join(source)
            .join(format!("{}.jsonl", day.format("%Y-%m-%d")))
    }

    /// Load one source's rows for one day.
    ///
    /// Returns `Ok(None)` when the file does not exist (a gap, the caller
    /// logs and continues). A row that fails to parse or validate aborts the
    /// load: a silently dropped row is indistinguishable from a leakage bug.
    pub fn read_day<R: RecordedRow>(&self, day: NaiveDate) -> Result<Option<Vec<R>>> {
        let path = self.day_path(R::SOURCE, day);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BacktestError::Io {
                    path,
                    source: e,
                })
            }
        };

        let reader = BufReader::new(file);
        let mut rows = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| BacktestError::Io {
                path: path.clone(),
                source: e,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let row: R = serde_json::from_str(&line).map_err(|e| BacktestError::Schema {
                path: path.clone(),
                line: idx + 1,
                reason: e.to_string(),
            })?;
            row.validate().map_err(|reason| BacktestError::Schema {
                path: path.clone(),
                line: idx + 1,
                reason,
            })?;
            rows.push(row);
        }
        Ok(Some(rows))
    }
}
