use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::concat::native::DiagnosticTable;
use crate::error::{Result, VideoStoreError};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Where segments live and how they are named.
    pub storage: StorageConfig,
    /// Plan files and the native concat routine.
    #[serde(default)]
    pub concat: ConcatConfig,
}

/// Segment storage parameters. The directory is owned by the external
/// segment writer; it is only ever read here.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory containing the segment files.
    pub path: PathBuf,
    /// Nominal duration of every segment in seconds.
    #[serde(default = "default_segment_duration")]
    pub segment_duration_secs: u64,
    /// Segment file extension, without the leading dot.
    #[serde(default = "default_extension")]
    pub extension: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConcatConfig {
    /// Directory for transient `concat_<token>.txt` plan files.
    #[serde(default = "default_plan_dir")]
    pub plan_dir: PathBuf,
    /// ffmpeg executable used by the default native backend.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
    /// Extra or overriding diagnostic texts, keyed by native error code.
    #[serde(default)]
    pub diagnostics: BTreeMap<String, String>,
}

impl Default for ConcatConfig {
    fn default() -> Self {
        Self {
            plan_dir: default_plan_dir(),
            ffmpeg_path: default_ffmpeg_path(),
            diagnostics: BTreeMap::new(),
        }
    }
}

/// Upper bound for `segment_duration_secs` (one day).
pub const MAX_SEGMENT_DURATION_SECS: u64 = 86_400;

fn default_segment_duration() -> u64 { 30 }
fn default_extension() -> String { "mp4".into() }
fn default_plan_dir() -> PathBuf { std::env::temp_dir() }
fn default_ffmpeg_path() -> PathBuf { PathBuf::from("ffmpeg") }

impl Config {
    /// Load configuration from a TOML file at `path`.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VideoStoreError::Config(format!("Cannot read config file: {e}")))?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| VideoStoreError::Config(format!("Invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.storage.segment_duration_secs == 0 {
            return Err(VideoStoreError::Config("segment_duration_secs must be > 0".into()));
        }
        if self.storage.segment_duration_secs > MAX_SEGMENT_DURATION_SECS {
            return Err(VideoStoreError::Config(format!(
                "segment_duration_secs must be <= {MAX_SEGMENT_DURATION_SECS}"
            )));
        }
        if self.storage.extension.is_empty() || self.storage.extension.starts_with('.') {
            return Err(VideoStoreError::Config(
                "extension must be non-empty and given without the leading dot".into(),
            ));
        }
        self.concat.diagnostic_table()?;
        Ok(())
    }
}

impl StorageConfig {
    /// Nominal segment duration, clamped to [`MAX_SEGMENT_DURATION_SECS`].
    pub fn segment_duration(&self) -> chrono::Duration {
        let secs = self.segment_duration_secs.min(MAX_SEGMENT_DURATION_SECS);
        chrono::Duration::seconds(secs as i64)
    }
}

impl ConcatConfig {
    /// Built-in diagnostic table with the configured overrides applied.
    pub fn diagnostic_table(&self) -> Result<DiagnosticTable> {
        let mut table = DiagnosticTable::default();
        for (code, text) in &self.diagnostics {
            let code: i32 = code.trim().parse().map_err(|_| {
                VideoStoreError::Config(format!("diagnostic code '{code}' is not an integer"))
            })?;
            table.insert(code, text.clone());
        }
        Ok(table)
    }
}
