// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Segment catalog — time-ordered view of the segment files on disk.
//!
//! The segment writer names every file after the instant its recording
//! started:
//!
//! ```text
//! <storage>/2026-03-01_12-00-00.mp4
//! <storage>/2026-03-01_12-00-30.mp4
//! <storage>/1772366460.mp4          (unix seconds, also accepted)
//! ```
//!
//! so ordering never requires opening a file. The directory is mutated
//! concurrently by the writer and by retention; a listing is a snapshot that
//! is only valid for the request that took it.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Result, VideoStoreError};

/// Calendar form of a segment file stem.
pub const SEGMENT_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// One stored fixed-duration video file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub path: PathBuf,
    pub start: DateTime<Utc>,
    #[serde(skip)]
    pub duration: Duration,
}

impl Segment {
    /// Exclusive end of the segment's nominal interval.
    pub fn end(&self) -> DateTime<Utc> {
        self.start + self.duration
    }
}

/// Parse a timestamp in segment-stamp form or as unix seconds.
pub fn parse_segment_stamp(stamp: &str) -> Option<DateTime<Utc>> {
    if !stamp.is_empty() && stamp.bytes().all(|b| b.is_ascii_digit()) {
        return stamp.parse::<i64>().ok().and_then(|s| DateTime::from_timestamp(s, 0));
    }
    NaiveDateTime::parse_from_str(stamp, SEGMENT_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Canonical file name for a segment starting at `start`.
pub fn segment_file_name(start: DateTime<Utc>, extension: &str) -> String {
    format!("{}.{}", start.format(SEGMENT_TIME_FORMAT), extension)
}

fn parse_segment_path(path: &Path, extension: &str) -> Option<DateTime<Utc>> {
    if path.extension()?.to_str()? != extension {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.starts_with('.') {
        return None;
    }
    parse_segment_stamp(stem)
}

/// List the segments in `storage_dir`, sorted ascending by start time.
///
/// Files that are not segments (wrong extension, unparseable or out-of-range
/// name, hidden, directories) are skipped. Entries that disappear while the directory is
/// being read are skipped as well.
pub fn list_segments(
    storage_dir: &Path,
    segment_duration: Duration,
    extension: &str,
) -> Result<Vec<Segment>> {
    let read_dir = std::fs::read_dir(storage_dir).map_err(|e| VideoStoreError::StorageRead {
        path: storage_dir.to_path_buf(),
        source: e,
    })?;

    let mut segments = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| VideoStoreError::StorageRead {
            path: storage_dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();

        // Evicted between readdir and stat.
        let Ok(file_type) = entry.file_type() else {
            debug!(path = ?path, "Segment vanished during listing");
            continue;
        };
        if !file_type.is_file() {
            continue;
        }

        // The whole interval must be representable, not just the start.
        match parse_segment_path(&path, extension)
            .filter(|start| start.checked_add_signed(segment_duration).is_some())
        {
            Some(start) => segments.push(Segment { path, start, duration: segment_duration }),
            None => debug!(path = ?path, "Skipping non-segment file"),
        }
    }

    segments.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.path.cmp(&b.path)));
    segments.dedup_by(|later, kept| {
        let dup = later.start == kept.start;
        if dup {
            warn!(
                kept = ?kept.path,
                skipped = ?later.path,
                start = %kept.start,
                "Duplicate segment start time"
            );
        }
        dup
    });

    debug!(dir = ?storage_dir, segments = segments.len(), "Storage listed");
    Ok(segments)
}
