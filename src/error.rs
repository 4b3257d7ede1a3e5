//! Error taxonomy for the replay engine
//!
//! Data gaps are deliberately absent: a missing day-file is recoverable and
//! tracked in the run's gap report, not raised as an error. A malformed row
//! is fatal because silently dropping one is indistinguishable from a
//! leakage bug.

use crate::events::EventKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BacktestError {
    /// Rejected before a run starts
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Malformed recorded row; aborts timeline construction
    #[error("schema violation in {path} line {line}: {reason}")]
    Schema {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// A subscriber raised while handling a dispatched event; aborts the run
    #[error("handler failed on {kind:?} event: {source}")]
    Handler {
        kind: EventKind,
        #[source]
        source: anyhow::Error,
    },

    #[error("i/o error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, BacktestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display_names_file_and_line() {
        let err = BacktestError::Schema {
            path: PathBuf::from("weather/2026-02-20.jsonl"),
            line: 7,
            reason: "missing field `station`".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("2026-02-20.jsonl"));
        assert!(msg.contains("line 7"));
    }

    #[test]
    fn test_handler_error_carries_kind() {
        let err = BacktestError::Handler {
            kind: EventKind::OrderIntent,
            source: anyhow::anyhow!("strategy state corrupt"),
        };
        assert!(err.to_string().contains("OrderIntent"));
    }
}
