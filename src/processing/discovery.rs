//! Input file discovery

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{FastConvertError, Result};
use crate::processing::formats::is_supported_input_format;

/// Discover image files under `root`.
///
/// Accepts a single file or a directory. Directory scans honor `recursive`
/// and filter by supported input extension. The returned list is sorted so
/// batch runs process files in a deterministic order; the batch scheduler's
/// index-fidelity guarantee is anchored to this ordering.
pub fn discover_files(root: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(FastConvertError::validation(
            format!("Input path does not exist: {}", root.display()),
            Some(root.to_path_buf()),
        ));
    }

    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let max_depth = if recursive { usize::MAX } else { 1 };

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(is_supported_input_format)
                .unwrap_or(false)
        })
        .collect();

    files.sort();
    debug!("discovered {} files under {}", files.len(), root.display());

    Ok(files)
}
