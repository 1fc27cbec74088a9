use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Reasons a toggle request falls outside the editable span of days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EditWindowViolation {
    #[error("{date} has not happened yet")]
    Future { date: NaiveDate },
    #[error("{date} is more than {window_days} days before {today}")]
    TooOld {
        date: NaiveDate,
        today: NaiveDate,
        window_days: u32,
    },
    #[error("{date} is before the habit was created on {created}")]
    BeforeCreation { date: NaiveDate, created: NaiveDate },
}

/// Failures raised by a [`crate::storage::SnapshotStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected snapshot layout: {0}")]
    Layout(String),
    #[error("invalid storage key `{0}`")]
    InvalidKey(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
