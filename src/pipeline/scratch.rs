//! Per-video scratch directories.
//!
//! Each video gets its own directory named after the video's stem plus a
//! random suffix, so concurrent pipelines never share a temp path even for
//! videos with the same name. The directory and everything in it is removed
//! when the [`ScratchDir`] is dropped, on success and failure alike.

use std::path::Path;

use tempfile::TempDir;

pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a scratch directory for `video` under `root` (OS temp dir if `None`).
    pub fn create(root: Option<&Path>, video: &Path) -> std::io::Result<Self> {
        let stem: String = video
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .take(48)
            .collect();
        let prefix = format!("setlist-{}-", stem);

        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);
        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory now, logging rather than failing on error.
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            tracing::warn!(target: "pipeline::video", path = %path.display(), error = %e, "Failed to remove scratch directory");
        }
    }
}
