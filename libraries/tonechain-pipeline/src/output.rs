//! Saving the rendered output to a user-chosen location

use crate::error::{PipelineError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tonechain_core::WAV_EXTENSION;

/// `path` with `.wav` appended unless its name already ends in `.wav`
///
/// The check is a case-sensitive suffix match on the whole name, so
/// `song.WAV` becomes `song.WAV.wav`.
pub fn normalize_save_path(path: &Path) -> PathBuf {
    if path.as_os_str().to_string_lossy().ends_with(WAV_EXTENSION) {
        return path.to_path_buf();
    }
    let mut name = OsString::from(path.as_os_str());
    name.push(WAV_EXTENSION);
    PathBuf::from(name)
}

/// Copy the run's output to `destination`, normalising the extension
///
/// Returns the path actually written.
pub fn save_output(output: &Path, destination: &Path) -> Result<PathBuf> {
    let target = normalize_save_path(destination);
    std::fs::copy(output, &target).map_err(|source| PipelineError::Save {
        path: target.clone(),
        source,
    })?;
    tracing::info!("Saved {} to {}", output.display(), target.display());
    Ok(target)
}
