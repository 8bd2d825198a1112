//! Relocating finished reports to a shared destination.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ReportError;

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ReportError + '_ {
    move |source| ReportError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Moves `source` into `dir` as `file_name`, replacing any previous file.
///
/// Tries a rename first and falls back to copy + remove when the two paths
/// are on different filesystems.
///
/// # Errors
///
/// Returns [`ReportError::Io`] if the destination directory cannot be created
/// or the file cannot be moved.
pub fn publish(source: &Path, dir: &Path, file_name: &str) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(dir).map_err(io_err(dir))?;
    let destination = dir.join(file_name);

    if let Err(rename_err) = fs::rename(source, &destination) {
        tracing::debug!(error = %rename_err, "rename failed, copying instead");
        fs::copy(source, &destination).map_err(io_err(source))?;
        fs::remove_file(source).map_err(io_err(source))?;
    }

    tracing::info!(
        from = %source.display(),
        to = %destination.display(),
        "published report"
    );
    Ok(destination)
}
