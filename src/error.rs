use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VideoStoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot read storage directory {path:?}: {source}")]
    StorageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No video data in storage")]
    NoData,

    #[error("Invalid range: from {from} is not before to {to}")]
    InvalidRange { from: DateTime<Utc>, to: DateTime<Utc> },

    #[error("Range {from} — {to} not available (stored data covers {earliest} — {latest})")]
    RangeNotAvailable {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        earliest: DateTime<Utc>,
        latest: DateTime<Utc>,
    },

    #[error("No matching video data in range {from} — {to}")]
    NoMatch { from: DateTime<Utc>, to: DateTime<Utc> },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to concat segment files{}", detail_suffix(.detail))]
    ConcatFailed { detail: Option<String> },
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_ref().map(|d| format!(": {d}")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, VideoStoreError>;
