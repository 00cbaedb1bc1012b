//! Removes plan files left behind when a previous process died mid-concat.

use std::path::Path;

use tracing::{info, warn};

use crate::concat::plan::is_plan_file_name;
use crate::error::Result;

/// Delete every `concat_*.txt` file in `dir`. Returns how many were removed.
///
/// Individual deletion failures are logged and skipped.
pub fn sweep_plan_files(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let Ok(entry) = entry else { continue };
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !is_plan_file_name(name) || !entry.file_type().is_ok_and(|t| t.is_file()) {
            continue;
        }

        let path = entry.path();
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = ?path, error = %e, "Failed to remove stale plan file"),
        }
    }

    if removed > 0 {
        info!(dir = ?dir, removed, "Stale plan files removed");
    }
    Ok(removed)
}
