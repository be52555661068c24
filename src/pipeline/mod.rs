//! Per-video pipeline: decode -> segment -> recognize -> deduplicate -> write.
//!
//! One [`VideoPipeline`] is shared by every worker in a batch. A call to
//! [`VideoPipeline::process`] owns all per-video state (scratch directory,
//! decoded stream, playlist builder); nothing is shared between videos
//! except the immutable collaborators.
//!
//! Failure handling:
//! - decode failure fails the video, no playlist is written
//! - a failed segment is logged and skipped, the video continues
//! - cancellation stops new segment requests; what was recognized so far is
//!   written as a partial playlist

pub mod scratch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::audio::{AudioDecoder, Segmenter};
use crate::error::{Error, Result, ResultExt};
use crate::model::AudioSegment;
use crate::playlist::{PlaylistBuilder, PlaylistResult, PlaylistSink};
use crate::recognition::{RecognitionOutcome, Recognizer};

pub use scratch::ScratchDir;

/// Tunables for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Recognition requests in flight per video
    pub concurrency: usize,
    /// Write a header-only playlist when nothing was recognized
    pub write_empty: bool,
    /// Root for scratch directories (OS temp dir if `None`)
    pub scratch_root: Option<PathBuf>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            write_empty: false,
            scratch_root: None,
        }
    }
}

/// Turns one video into one playlist.
pub struct VideoPipeline {
    decoder: Arc<dyn AudioDecoder>,
    recognizer: Arc<dyn Recognizer>,
    sink: Arc<dyn PlaylistSink>,
    segmenter: Segmenter,
    options: PipelineOptions,
}

impl VideoPipeline {
    pub fn new(
        decoder: Arc<dyn AudioDecoder>,
        recognizer: Arc<dyn Recognizer>,
        sink: Arc<dyn PlaylistSink>,
        segmenter: Segmenter,
        options: PipelineOptions,
    ) -> Self {
        Self {
            decoder,
            recognizer,
            sink,
            segmenter,
            options,
        }
    }

    pub fn sink(&self) -> &dyn PlaylistSink {
        self.sink.as_ref()
    }

    /// Process one video and write its playlist to `target`.
    ///
    /// Segment outcomes are folded in segment order even when several
    /// requests are in flight and complete out of order.
    pub async fn process(
        &self,
        video: &Path,
        target: &Path,
        cancel: &CancellationToken,
    ) -> Result<PlaylistResult> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let started = Instant::now();

        let scratch = ScratchDir::create(self.options.scratch_root.as_deref(), video)
            .with_context("creating scratch directory")?;
        tracing::debug!(
            target: "pipeline::video",
            video = %video.display(),
            scratch = %scratch.path().display(),
            "Created scratch directory"
        );

        // Decoding is blocking (subprocess or CPU-bound demux)
        let stream = {
            let decoder = Arc::clone(&self.decoder);
            let video = video.to_path_buf();
            let scratch_path = scratch.path().to_path_buf();
            tokio::task::spawn_blocking(move || decoder.decode(&video, &scratch_path))
                .await?
                .with_context("extracting audio")?
        };

        let total = self.segmenter.count(&stream);
        tracing::info!(
            target: "pipeline::video",
            video = %video.display(),
            decoder = self.decoder.name(),
            duration_ms = stream.duration_ms(),
            segment_ms = self.segmenter.duration_ms(),
            partial = ?self.segmenter.partial_policy(),
            segments = total,
            "Decoded audio"
        );

        let mut builder = PlaylistBuilder::new(video, total);
        let segments: Vec<AudioSegment<'_>> = self.segmenter.segments(&stream).collect();
        let segments = &segments;
        let recognizer = &self.recognizer;
        let mut outcomes = futures::stream::iter(0..segments.len())
            .take_while(|_: &usize| futures::future::ready(!cancel.is_cancelled()))
            .map(|i: usize| async move {
                let segment = segments[i];
                (segment, recognizer.identify(&segment).await)
            })
            .buffer_unordered(self.options.concurrency.max(1));

        while let Some((segment, outcome)) = outcomes.next().await {
            log_outcome(video, &segment, &outcome);
            for song in builder.record(segment.index, outcome) {
                tracing::info!(target: "pipeline::video", video = %video.display(), %song, "New song");
            }
        }
        drop(outcomes);

        let mut result = builder.finish();
        if result.is_cancelled() {
            tracing::warn!(
                target: "pipeline::video",
                video = %video.display(),
                processed = result.segments_processed(),
                total,
                "Cancelled, keeping partial playlist"
            );
        }

        if let Some(path) = self.write(target, &result).await? {
            result = result.with_output(path);
        }
        scratch.close();

        tracing::info!(
            target: "pipeline::video",
            video = %video.display(),
            songs = result.songs().len(),
            skipped = result.segments_skipped(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Video complete"
        );
        Ok(result)
    }

    /// Hand the playlist to the sink; returns the path written, if any.
    async fn write(&self, target: &Path, result: &PlaylistResult) -> Result<Option<PathBuf>> {
        if result.is_empty() && !self.options.write_empty {
            tracing::info!(
                target: "pipeline::video",
                video = %result.video().display(),
                "No songs identified, no playlist written"
            );
            return Ok(None);
        }

        let sink = Arc::clone(&self.sink);
        let path = target.to_path_buf();
        let playlist = result.clone();
        tokio::task::spawn_blocking(move || sink.write(&path, &playlist)).await??;

        tracing::info!(target: "pipeline::video", path = %target.display(), "Wrote playlist");
        Ok(Some(target.to_path_buf()))
    }
}

fn log_outcome(video: &Path, segment: &AudioSegment<'_>, outcome: &RecognitionOutcome) {
    if let RecognitionOutcome::Failed(e) = outcome {
        if e.is_auth() {
            tracing::error!(
                target: "pipeline::segment",
                video = %video.display(),
                segment = segment.index,
                error = %e,
                "Credentials rejected, skipping segment"
            );
            return;
        }
        tracing::warn!(
            target: "pipeline::segment",
            video = %video.display(),
            segment = segment.index,
            start_ms = segment.start_ms,
            error = %e,
            "Recognition failed, skipping segment"
        );
        return;
    }
    tracing::debug!(
        target: "pipeline::segment",
        video = %video.display(),
        segment = segment.index,
        start_ms = segment.start_ms,
        end_ms = segment.end_ms(),
        outcome = outcome.label(),
        song = outcome.identity().map(tracing::field::display),
        "Segment recognized"
    );
}
