//! Application-wide error types.
//!
//! Subsystems keep their own `thiserror` enums; this module aggregates the
//! ones that can fail a video ([`DecodeError`], [`OutputError`]) into
//! per-video results. Startup errors (`ConfigError`, client setup) go
//! straight to `anyhow` in the CLI.
//!
//! Recognition errors never fail a video: they are folded into the playlist
//! as skipped segments.
//!
//! [`DecodeError`]: crate::audio::DecodeError
//! [`OutputError`]: crate::playlist::OutputError

use std::path::PathBuf;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Audio could not be extracted from a video
    #[error("Decode error: {0}")]
    Decode(#[from] crate::audio::DecodeError),

    /// Playlist could not be written
    #[error("Output error: {0}")]
    Output(#[from] crate::playlist::OutputError),

    /// File or directory not found
    #[error("Not found: {0}")]
    NotFound(PathBuf),

    /// Input directory holds no videos
    #[error("No video files found in {0}")]
    NoVideos(PathBuf),

    /// Batch was cancelled before this video started
    #[error("Cancelled before processing started")]
    Cancelled,

    /// The worker processing a video panicked
    #[error("Worker panicked: {0}")]
    TaskPanicked(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a not found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }

    /// Short label for summaries and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Decode(_) => "decode",
            Self::Output(_) => "output",
            Self::NotFound(_) => "not_found",
            Self::NoVideos(_) => "no_videos",
            Self::Cancelled => "cancelled",
            Self::TaskPanicked(_) => "panicked",
            Self::WithContext { source, .. } => source.kind(),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        if e.is_panic() {
            Self::from_panic(e.into_panic())
        } else {
            Self::TaskPanicked(e.to_string())
        }
    }
}

impl Error {
    /// Build a `TaskPanicked` from a caught panic payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        Self::TaskPanicked(message)
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, crate::audio::DecodeError> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Decode(e).context(ctx))
    }
}
