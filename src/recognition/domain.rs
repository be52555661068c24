//! Internal models for segment recognition.
//!
//! These types don't change when the recognition service's API changes.
//! Service responses get converted into these via the adapter.

use crate::model::SongIdentity;

/// Result of recognizing one segment. Exactly one per segment.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionOutcome {
    /// The service's top-ranked candidate
    Matched(SongIdentity),
    /// The service answered and found nothing
    NoMatch,
    /// The request or its response was unusable; isolated to this segment
    Failed(RecognitionError),
}

impl RecognitionOutcome {
    pub fn identity(&self) -> Option<&SongIdentity> {
        match self {
            RecognitionOutcome::Matched(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RecognitionOutcome::Failed(_))
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            RecognitionOutcome::Matched(_) => "matched",
            RecognitionOutcome::NoMatch => "no_match",
            RecognitionOutcome::Failed(_) => "failed",
        }
    }
}

impl From<Result<Option<SongIdentity>, RecognitionError>> for RecognitionOutcome {
    fn from(result: Result<Option<SongIdentity>, RecognitionError>) -> Self {
        match result {
            Ok(Some(identity)) => RecognitionOutcome::Matched(identity),
            Ok(None) => RecognitionOutcome::NoMatch,
            Err(e) => RecognitionOutcome::Failed(e),
        }
    }
}

/// Errors that can occur while recognizing a segment.
///
/// All of these are recoverable: they fail one segment, never the video.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecognitionError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Authentication rejected (code {code}): {message}")]
    Auth { code: i64, message: String },

    #[error("Rate limited (code {code}): {message}")]
    RateLimited { code: i64, message: String },

    #[error("Service error (code {code}): {message}")]
    Service { code: i64, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to encode segment: {0}")]
    Encode(String),

    #[error("Failed to sign request: {0}")]
    Signing(String),
}

impl RecognitionError {
    /// Credentials were rejected; every further request will fail the same way.
    pub fn is_auth(&self) -> bool {
        matches!(self, RecognitionError::Auth { .. })
    }
}

impl From<reqwest::Error> for RecognitionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RecognitionError::Timeout
        } else {
            RecognitionError::Transport(e.to_string())
        }
    }
}
