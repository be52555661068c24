use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Finds video files in `dir`.
///
/// Extensions are matched case-insensitively and without the leading dot.
/// Subfolders are only visited when `recursive` is set. The result is sorted
/// so videos are dispatched in a stable order.
pub fn discover_videos(dir: &Path, extensions: &[String], recursive: bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::not_found(dir));
    }

    let wanted: Vec<String> = extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut videos = Vec::new();

    for entry in WalkDir::new(dir).max_depth(max_depth) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(target: "scheduler::batch", error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        if wanted.contains(&ext.to_lowercase()) {
            videos.push(path.to_path_buf());
        }
    }

    if videos.is_empty() {
        return Err(Error::NoVideos(dir.to_path_buf()));
    }

    videos.sort();
    tracing::info!(target: "scheduler::batch", dir = %dir.display(), count = videos.len(), "Discovered videos");
    Ok(videos)
}
