//! Shared fixtures: a segment directory builder and an in-process
//! `NativeConcat` that concatenates file contents instead of video.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use videostore::concat::native::{DiagnosticTable, NativeConcat, NativeStatus};
use videostore::concat::{ConcatSettings, Concater};
use videostore::storage::catalog::segment_file_name;

pub const SEGMENT_SECS: i64 = 10;

pub fn tmp_dir() -> TempDir {
    tempfile::tempdir().expect("create tempdir")
}

/// `secs` seconds after a fixed base instant.
pub fn t(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid base time")
        + Duration::seconds(secs)
}

/// Write a segment starting at `t(secs)` whose content is `seg<secs>;`.
pub fn write_segment(dir: &Path, secs: i64) -> PathBuf {
    let path = dir.join(segment_file_name(t(secs), "mp4"));
    std::fs::write(&path, format!("seg{secs};")).expect("write segment");
    path
}

pub fn settings(storage: &Path, plans: &Path, diagnostics: DiagnosticTable) -> ConcatSettings {
    ConcatSettings {
        storage_dir: storage.to_path_buf(),
        segment_duration: Duration::seconds(SEGMENT_SECS),
        extension: "mp4".into(),
        plan_dir: plans.to_path_buf(),
        diagnostics,
    }
}

pub fn concater(storage: &Path, plans: &Path, native: Arc<dyn NativeConcat>) -> Concater {
    Concater::new(settings(storage, plans, DiagnosticTable::default()), native)
}

pub fn dir_entries(dir: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.expect("dir entry").path())
        .collect();
    entries.sort();
    entries
}

/// Concatenates the listed files' bytes, rendering trim directives as
/// `[in N]` / `[out N]` markers. Missing segments report `-2` (ENOENT).
#[derive(Default)]
pub struct FakeConcat {
    pub plans_seen: Mutex<Vec<PathBuf>>,
    pub plan_texts: Mutex<Vec<String>>,
}

impl NativeConcat for FakeConcat {
    fn concat(&self, plan: &Path, output: &Path) -> NativeStatus {
        let Ok(text) = std::fs::read_to_string(plan) else {
            return NativeStatus::GenericFailure;
        };
        self.plans_seen.lock().expect("lock").push(plan.to_path_buf());
        self.plan_texts.lock().expect("lock").push(text.clone());

        let mut out = String::new();
        for line in text.lines() {
            if let Some(quoted) = line.strip_prefix("file '").and_then(|l| l.strip_suffix('\'')) {
                let path = quoted.replace(r"'\''", "'");
                match std::fs::read_to_string(&path) {
                    Ok(data) => out.push_str(&data),
                    Err(_) => return NativeStatus::DiagnosticFailure(-2),
                }
            } else if let Some(secs) = line.strip_prefix("inpoint ") {
                out.push_str(&format!("[in {secs}]"));
            } else if let Some(secs) = line.strip_prefix("outpoint ") {
                out.push_str(&format!("[out {secs}]"));
            } else {
                return NativeStatus::GenericFailure;
            }
        }

        match std::fs::write(output, out) {
            Ok(()) => NativeStatus::Ok,
            Err(_) => NativeStatus::GenericFailure,
        }
    }
}

/// Always returns the same status without touching the output.
pub struct FixedStatus(pub NativeStatus);

impl NativeConcat for FixedStatus {
    fn concat(&self, _plan: &Path, _output: &Path) -> NativeStatus {
        self.0
    }
}

/// Deletes `victim` (as retention would) before delegating to `inner`.
pub struct EvictBeforeConcat {
    pub victim: PathBuf,
    pub inner: FakeConcat,
}

impl NativeConcat for EvictBeforeConcat {
    fn concat(&self, plan: &Path, output: &Path) -> NativeStatus {
        std::fs::remove_file(&self.victim).expect("evict segment");
        self.inner.concat(plan, output)
    }
}
