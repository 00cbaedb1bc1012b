// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Range validation and matching: turns a `[from, to)` request and a catalog
//! snapshot into the ordered list of segments to concatenate.
//!
//! Only the first and last matched segments are ever trimmed. Gaps between
//! segments (writer outage, early eviction) are carried through; the output
//! simply jumps across them.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::error::{Result, VideoStoreError};
use crate::storage::catalog::Segment;

/// One segment's participation in a concat plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatEntry {
    pub path: PathBuf,
    /// Offset from the segment start where output begins.
    pub inpoint: Option<Duration>,
    /// Offset from the segment start where output ends.
    pub outpoint: Option<Duration>,
}

/// Reject requests that cannot be served by `segments`.
///
/// `from` may precede the earliest segment by up to one segment duration;
/// the matcher clamps it.
pub fn validate_range(segments: &[Segment], from: DateTime<Utc>, to: DateTime<Utc>) -> Result<()> {
    let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
        return Err(VideoStoreError::NoData);
    };
    if from >= to {
        return Err(VideoStoreError::InvalidRange { from, to });
    }

    let unavailable = || VideoStoreError::RangeNotAvailable {
        from,
        to,
        earliest: first.start,
        latest: last.end(),
    };
    let tolerated = first.start.checked_sub_signed(first.duration).unwrap_or(first.start);
    if from < tolerated {
        return Err(unavailable());
    }
    if from >= last.end() || to <= first.start {
        return Err(unavailable());
    }
    Ok(())
}

/// Select the segments covering `[from, to)` in chronological order.
///
/// `segments` must be sorted ascending by start, as returned by
/// [`list_segments`](crate::storage::catalog::list_segments).
pub fn match_range(segments: &[Segment], from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<ConcatEntry>> {
    let from = match segments.first() {
        Some(first) if from < first.start => first.start,
        _ => from,
    };

    // Segments share one duration, so ends are sorted like starts.
    let first_idx = segments.partition_point(|s| s.end() <= from);
    let matched: Vec<&Segment> = segments[first_idx..]
        .iter()
        .take_while(|s| s.start < to)
        .collect();

    if matched.is_empty() {
        return Err(VideoStoreError::NoMatch { from, to });
    }

    for pair in matched.windows(2) {
        let gap = pair[1].start - pair[0].end();
        if gap > Duration::zero() {
            debug!(
                after = ?pair[0].path,
                before = ?pair[1].path,
                gap_secs = gap.num_seconds(),
                "Gap between matched segments"
            );
        }
    }

    let last_idx = matched.len() - 1;
    let entries = matched
        .iter()
        .enumerate()
        .map(|(i, seg)| ConcatEntry {
            path: seg.path.clone(),
            inpoint: (i == 0 && from > seg.start).then(|| from - seg.start),
            outpoint: (i == last_idx && to < seg.end()).then(|| to - seg.start),
        })
        .collect();

    Ok(entries)
}
