//! Concat plan files — the transient list handed to the native routine.
//!
//! ## Layout
//!
//! ```text
//! <plan_dir>/concat_<uuid-v4>.txt
//!
//! file '/data/segments/2026-03-01_12-00-00.mp4'
//! inpoint 5
//! file '/data/segments/2026-03-01_12-00-10.mp4'
//! file '/data/segments/2026-03-01_12-00-20.mp4'
//! outpoint 5
//! ```
//!
//! One `file` line per segment; trim directives follow the segment they
//! apply to, in seconds from that segment's start. The syntax is the ffmpeg
//! concat-demuxer list format.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::range::ConcatEntry;

pub const PLAN_FILE_PREFIX: &str = "concat_";
pub const PLAN_FILE_SUFFIX: &str = ".txt";

/// True if `file_name` follows the plan naming pattern.
pub fn is_plan_file_name(file_name: &str) -> bool {
    file_name.len() > PLAN_FILE_PREFIX.len() + PLAN_FILE_SUFFIX.len()
        && file_name.starts_with(PLAN_FILE_PREFIX)
        && file_name.ends_with(PLAN_FILE_SUFFIX)
}

/// An exclusively owned plan file. Dropping it deletes the file.
#[derive(Debug)]
pub struct PlanFile {
    path: PathBuf,
    file: Option<File>,
}

impl PlanFile {
    /// Create a new, empty plan file with a fresh random name in `dir`.
    pub fn create(dir: &Path) -> Result<Self> {
        let path = dir.join(format!("{PLAN_FILE_PREFIX}{}{PLAN_FILE_SUFFIX}", Uuid::new_v4()));
        let file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        debug!(path = ?path, "Plan file created");
        Ok(Self { path, file: Some(file) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write every entry and close the file. May be called once.
    pub fn write_entries(&mut self, entries: &[ConcatEntry]) -> Result<()> {
        let Some(file) = self.file.take() else {
            return Err(std::io::Error::other("plan file already written").into());
        };
        let mut out = BufWriter::new(file);
        for entry in entries {
            write_entry(&mut out, entry)?;
        }
        out.flush()?;
        out.get_ref().sync_all()?;
        Ok(())
    }
}

impl Drop for PlanFile {
    fn drop(&mut self) {
        // Close before unlinking.
        self.file.take();
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = ?self.path, "Plan file removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = ?self.path, error = %e, "Failed to remove plan file"),
        }
    }
}

fn write_entry(out: &mut impl Write, entry: &ConcatEntry) -> std::io::Result<()> {
    let path = entry.path.to_string_lossy().replace('\'', r"'\''");
    writeln!(out, "file '{path}'")?;
    if let Some(inpoint) = entry.inpoint {
        writeln!(out, "inpoint {}", format_seconds(inpoint))?;
    }
    if let Some(outpoint) = entry.outpoint {
        writeln!(out, "outpoint {}", format_seconds(outpoint))?;
    }
    Ok(())
}

/// Seconds with millisecond resolution and no trailing zeros: `5`, `2.5`.
pub fn format_seconds(offset: Duration) -> String {
    let ms = offset.num_milliseconds();
    let (secs, frac) = (ms / 1000, ms % 1000);
    if frac == 0 {
        return secs.to_string();
    }
    let text = format!("{secs}.{frac:03}");
    text.trim_end_matches('0').to_string()
}
