//! Native concatenation routine — the opaque collaborator that turns a plan
//! file into one output video.
//!
//! The routine reports a closed [`NativeStatus`]; diagnostic codes are turned
//! into text through a [`DiagnosticTable`] rather than inline matching.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, warn};
use uuid::Uuid;

/// Result of one native concat invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeStatus {
    Ok,
    GenericFailure,
    DiagnosticFailure(i32),
}

/// Anything that can concatenate the segments listed in a plan file.
///
/// Implementations must leave either a complete file at `output` or nothing.
/// Calls block until the output is finished.
pub trait NativeConcat: Send + Sync {
    fn concat(&self, plan: &Path, output: &Path) -> NativeStatus;
}

/// Maps native diagnostic codes to readable text.
#[derive(Debug, Clone)]
pub struct DiagnosticTable {
    messages: BTreeMap<i32, String>,
}

/// Codes ffmpeg reports through its exit status, sign-extended.
///
/// ffmpeg 6.1+ exits with the failing `AVERROR` truncated to its low byte, so
/// `AVERROR(errno)` values survive as `-errno`. Tag-based codes such as
/// `AVERROR_INVALIDDATA` or `AVERROR_EOF` collapse onto bytes that clash with
/// errno values, so they are not listed. Older ffmpeg exits with 1 for every
/// failure.
const BUILTIN_DIAGNOSTICS: &[(i32, &str)] = &[
    (1, "ffmpeg exited with an error"),
    (-1, "Operation not permitted"),
    (-2, "No such file or directory"),
    (-5, "I/O error"),
    (-12, "Cannot allocate memory"),
    (-13, "Permission denied"),
    (-22, "Invalid argument"),
    (-24, "Too many open files"),
    (-28, "No space left on device"),
    (-30, "Read-only file system"),
];

/// Sign-extend an 8-bit process exit status.
pub fn exit_status_code(status: i32) -> i32 {
    status as u8 as i8 as i32
}

impl Default for DiagnosticTable {
    fn default() -> Self {
        Self {
            messages: BUILTIN_DIAGNOSTICS
                .iter()
                .map(|(code, text)| (*code, text.to_string()))
                .collect(),
        }
    }
}

impl DiagnosticTable {
    /// A table with no entries; every code describes itself generically.
    pub fn empty() -> Self {
        Self { messages: BTreeMap::new() }
    }

    /// Add or replace the text for `code`.
    pub fn insert(&mut self, code: i32, text: impl Into<String>) {
        self.messages.insert(code, text.into());
    }

    pub fn describe(&self, code: i32) -> String {
        match self.messages.get(&code) {
            Some(text) => format!("{text} (code {code})"),
            None => format!("unknown native error code {code}"),
        }
    }
}

/// [`NativeConcat`] backed by the `ffmpeg` executable's concat demuxer.
///
/// Streams are copied, never re-encoded. Output goes to a hidden sibling file
/// first and is renamed into place only once ffmpeg succeeds.
#[derive(Debug, Clone)]
pub struct FfmpegConcat {
    binary: PathBuf,
}

impl FfmpegConcat {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }

    fn partial_path(output: &Path) -> PathBuf {
        let stem = output.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
        // Keep the real extension last; ffmpeg picks the muxer from it.
        let name = match output.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!(".{stem}.partial-{}.{ext}", Uuid::new_v4()),
            None => format!(".{stem}.partial-{}", Uuid::new_v4()),
        };
        output.with_file_name(name)
    }
}

impl NativeConcat for FfmpegConcat {
    fn concat(&self, plan: &Path, output: &Path) -> NativeStatus {
        let partial = Self::partial_path(output);
        let result = Command::new(&self.binary)
            .args(["-hide_banner", "-loglevel", "error", "-nostdin", "-y"])
            .args(["-f", "concat", "-safe", "0", "-i"])
            .arg(plan)
            .args(["-c", "copy"])
            .arg(&partial)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();

        let status = match result {
            Err(e) => {
                warn!(binary = ?self.binary, error = %e, "Failed to spawn ffmpeg");
                NativeStatus::GenericFailure
            }
            Ok(out) if out.status.success() => match std::fs::rename(&partial, output) {
                Ok(()) => {
                    debug!(output = ?output, "ffmpeg concat finished");
                    return NativeStatus::Ok;
                }
                Err(e) => {
                    warn!(from = ?partial, to = ?output, error = %e, "Failed to move concat output into place");
                    NativeStatus::GenericFailure
                }
            },
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                warn!(status = %out.status, stderr = %stderr.trim(), "ffmpeg concat failed");
                match out.status.code() {
                    Some(code) => NativeStatus::DiagnosticFailure(exit_status_code(code)),
                    None => NativeStatus::GenericFailure,
                }
            }
        };

        if let Err(e) = std::fs::remove_file(&partial) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = ?partial, error = %e, "Failed to remove partial concat output");
            }
        }
        status
    }
}
