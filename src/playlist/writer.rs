//! Playlist output sink.
//!
//! One CSV per video: a `Title,Artist` header, then one row per unique song
//! in first-matched order. Files are written to `<target>.tmp` and renamed
//! into place, so a playlist is either complete on disk or absent.

use std::path::{Path, PathBuf};

use super::PlaylistResult;

/// Playlist output errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Failed to create output directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to write playlist {0}: {1}")]
    Write(PathBuf, csv::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),

    #[error("Video path has no file name: {0}")]
    NoFileName(PathBuf),

    #[error("Playlist {0} would overwrite another video's playlist")]
    Collision(PathBuf),
}

/// Destination for finalized playlists.
pub trait PlaylistSink: Send + Sync {
    /// Where the playlist for `video` goes.
    fn target_for(&self, video: &Path) -> Result<PathBuf, OutputError>;

    /// Alternative target used when two videos share a base name.
    fn fallback_target_for(&self, video: &Path) -> Result<PathBuf, OutputError>;

    /// Write `playlist` to `target`.
    fn write(&self, target: &Path, playlist: &PlaylistResult) -> Result<(), OutputError>;
}

/// Writes playlists as CSV files.
#[derive(Debug, Clone)]
pub struct CsvPlaylistWriter {
    /// Output directory; `None` writes next to each video
    dir: Option<PathBuf>,
    extension: String,
}

impl CsvPlaylistWriter {
    pub fn new(dir: Option<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir,
            extension: extension.into(),
        }
    }

    fn directory_for<'a>(&'a self, video: &'a Path) -> &'a Path {
        self.dir
            .as_deref()
            .or_else(|| video.parent())
            .unwrap_or_else(|| Path::new("."))
    }
}

impl Default for CsvPlaylistWriter {
    fn default() -> Self {
        Self::new(None, "csv")
    }
}

impl PlaylistSink for CsvPlaylistWriter {
    /// Same base name as the video, playlist extension
    fn target_for(&self, video: &Path) -> Result<PathBuf, OutputError> {
        let stem = video
            .file_stem()
            .ok_or_else(|| OutputError::NoFileName(video.to_path_buf()))?;
        let mut name = stem.to_os_string();
        name.push(".");
        name.push(&self.extension);
        Ok(self.directory_for(video).join(name))
    }

    /// Full file name (with the video's extension) plus playlist extension
    fn fallback_target_for(&self, video: &Path) -> Result<PathBuf, OutputError> {
        let file_name = video
            .file_name()
            .ok_or_else(|| OutputError::NoFileName(video.to_path_buf()))?;
        let mut name = file_name.to_os_string();
        name.push(".");
        name.push(&self.extension);
        Ok(self.directory_for(video).join(name))
    }

    fn write(&self, target: &Path, playlist: &PlaylistResult) -> Result<(), OutputError> {
        if let Some(dir) = target.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir).map_err(|e| OutputError::CreateDir(dir.to_path_buf(), e))?;
        }

        let mut temp_name = target.as_os_str().to_os_string();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        if let Err(e) = write_csv(&temp_path, playlist) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(OutputError::Write(target.to_path_buf(), e));
        }

        std::fs::rename(&temp_path, target).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            OutputError::Rename(temp_path.clone(), target.to_path_buf(), e)
        })?;

        tracing::debug!(target: "playlist::writer", path = %target.display(), songs = playlist.songs().len(), "Wrote playlist");
        Ok(())
    }
}

fn write_csv(path: &Path, playlist: &PlaylistResult) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Title", "Artist"])?;
    for song in playlist.songs() {
        writer.write_record([song.title.as_str(), song.artist.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}
