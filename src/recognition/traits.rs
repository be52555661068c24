//! Trait definitions for the recognition boundary.
//!
//! The pipeline depends on [`Recognizer`] only. Production code uses
//! [`AcrCloudClient`](super::AcrCloudClient); tests substitute scripted
//! implementations from [`mocks`].

use async_trait::async_trait;

use super::domain::RecognitionOutcome;
use crate::model::AudioSegment;

/// Recognizes one segment at a time.
///
/// Implementations never fail the caller: every error is reported as
/// [`RecognitionOutcome::Failed`].
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn identify(&self, segment: &AudioSegment<'_>) -> RecognitionOutcome;
}

#[async_trait]
impl Recognizer for super::acrcloud::AcrCloudClient {
    async fn identify(&self, segment: &AudioSegment<'_>) -> RecognitionOutcome {
        self.identify(segment).await.into()
    }
}
