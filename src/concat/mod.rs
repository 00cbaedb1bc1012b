// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Concat executor: export stored video for a time range into one file.
//!
//! ```text
//!  concat(from, to, output)
//!     │
//!     ├─ list_segments   (storage dir snapshot)
//!     ├─ validate_range  ── NoData / InvalidRange / RangeNotAvailable
//!     ├─ match_range     ── NoMatch
//!     ├─ PlanFile        <plan_dir>/concat_<uuid>.txt
//!     ├─ NativeConcat    ── ConcatFailed
//!     └─ drop(PlanFile)  plan removed on every path
//! ```
//!
//! A [`Concater`] holds no mutable state; any number of calls may run at once
//! from different threads or tasks, each with its own plan file.

pub mod native;
pub mod plan;
pub mod sweep;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, info_span};

use crate::config::Config;
use crate::error::{Result, VideoStoreError};
use crate::range::{match_range, validate_range};
use crate::storage::catalog::{list_segments, Segment};

use native::{DiagnosticTable, FfmpegConcat, NativeConcat, NativeStatus};
use plan::PlanFile;

/// Everything a [`Concater`] needs, injected at construction.
#[derive(Debug, Clone)]
pub struct ConcatSettings {
    pub storage_dir: PathBuf,
    pub segment_duration: Duration,
    pub extension: String,
    pub plan_dir: PathBuf,
    pub diagnostics: DiagnosticTable,
}

impl ConcatSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            storage_dir: config.storage.path.clone(),
            segment_duration: config.storage.segment_duration(),
            extension: config.storage.extension.clone(),
            plan_dir: config.concat.plan_dir.clone(),
            diagnostics: config.concat.diagnostic_table()?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Validating,
    Matching,
    PlanWriting,
    Invoking,
    Cleanup,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::Matching => "matching",
            Stage::PlanWriting => "plan_writing",
            Stage::Invoking => "invoking",
            Stage::Cleanup => "cleanup",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

pub struct Concater {
    settings: ConcatSettings,
    native: Arc<dyn NativeConcat>,
}

impl Concater {
    /// Create the executor and sweep plan files left by an earlier process.
    pub fn new(settings: ConcatSettings, native: Arc<dyn NativeConcat>) -> Self {
        if let Err(e) = sweep::sweep_plan_files(&settings.plan_dir) {
            error!(dir = ?settings.plan_dir, error = %e, "Failed to sweep stale plan files");
        }
        Self { settings, native }
    }

    /// Executor backed by the configured ffmpeg binary.
    pub fn from_config(config: &Config) -> Result<Self> {
        let settings = ConcatSettings::from_config(config)?;
        let native = Arc::new(FfmpegConcat::new(config.concat.ffmpeg_path.clone()));
        Ok(Self::new(settings, native))
    }

    /// Current snapshot of the storage directory.
    pub fn segments(&self) -> Result<Vec<Segment>> {
        list_segments(
            &self.settings.storage_dir,
            self.settings.segment_duration,
            &self.settings.extension,
        )
    }

    /// Concatenate the stored video covering `[from, to)` into `output`.
    ///
    /// Blocks until the native routine returns.
    pub fn concat(&self, from: DateTime<Utc>, to: DateTime<Utc>, output: &Path) -> Result<()> {
        let span = info_span!("concat", %from, %to, output = ?output);
        let _guard = span.enter();

        let result = self.run(from, to, output);
        match &result {
            Ok(segments) => info!(stage = %Stage::Done, segments, "Concat complete"),
            Err(e) => error!(stage = %Stage::Failed, error = %e, "Concat failed"),
        }
        result.map(|_| ())
    }

    /// Run [`concat`](Self::concat) on tokio's blocking pool.
    pub async fn concat_in_background(
        self: Arc<Self>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        output: PathBuf,
    ) -> Result<()> {
        tokio::task::spawn_blocking(move || self.concat(from, to, &output))
            .await
            .map_err(|e| VideoStoreError::ConcatFailed {
                detail: Some(format!("concat worker did not complete: {e}")),
            })?
    }

    fn run(&self, from: DateTime<Utc>, to: DateTime<Utc>, output: &Path) -> Result<usize> {
        let segments = self.segments()?;

        debug!(stage = %Stage::Validating, segments = segments.len());
        validate_range(&segments, from, to)?;

        debug!(stage = %Stage::Matching);
        let entries = match_range(&segments, from, to)?;

        debug!(stage = %Stage::PlanWriting, entries = entries.len());
        let mut plan = PlanFile::create(&self.settings.plan_dir)?;
        plan.write_entries(&entries)?;

        debug!(stage = %Stage::Invoking, plan = ?plan.path());
        let status = self.native.concat(plan.path(), output);

        debug!(stage = %Stage::Cleanup, plan = ?plan.path());
        drop(plan);
        self.map_status(status)?;

        Ok(entries.len())
    }

    fn map_status(&self, status: NativeStatus) -> Result<()> {
        match status {
            NativeStatus::Ok => Ok(()),
            NativeStatus::GenericFailure => Err(VideoStoreError::ConcatFailed { detail: None }),
            NativeStatus::DiagnosticFailure(code) => Err(VideoStoreError::ConcatFailed {
                detail: Some(self.settings.diagnostics.describe(code)),
            }),
        }
    }
}
