//! Batch scheduler - runs one pipeline per video on a bounded worker pool.
//!
//! Concurrency is limited by a semaphore: a video is dispatched only once a
//! permit is free, so at most `workers` pipelines are active at any moment.
//! Each pipeline runs in its own task; a failure or panic in one video is
//! recorded against that video and never affects the others.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::pipeline::VideoPipeline;
use crate::playlist::{OutputError, PlaylistResult, PlaylistSink};

/// Outcome of a batch run, keyed by video path.
#[derive(Debug)]
pub struct BatchReport {
    pub results: BTreeMap<PathBuf, Result<PlaylistResult>>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            videos: self.results.len(),
            elapsed: self.elapsed,
            ..Default::default()
        };
        for result in self.results.values() {
            match result {
                Ok(playlist) => {
                    if playlist.is_cancelled() {
                        summary.cancelled += 1;
                    } else {
                        summary.succeeded += 1;
                    }
                    summary.songs += playlist.songs().len();
                    summary.segments_processed += playlist.segments_processed();
                    summary.segments_unmatched += playlist.segments_unmatched();
                    summary.segments_failed += playlist.segments_failed();
                }
                Err(Error::Cancelled) => summary.cancelled += 1,
                Err(_) => summary.failed += 1,
            }
        }
        summary
    }
}

/// Aggregate counts for the end-of-run report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub videos: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Partial playlists plus videos that never started
    pub cancelled: usize,
    pub songs: usize,
    pub segments_processed: usize,
    pub segments_unmatched: usize,
    pub segments_failed: usize,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Batch Summary ===")?;
        writeln!(f, "Videos:      {}", self.videos)?;
        writeln!(f, "  Succeeded: {}", self.succeeded)?;
        writeln!(f, "  Failed:    {}", self.failed)?;
        writeln!(f, "  Cancelled: {}", self.cancelled)?;
        writeln!(f, "Songs found: {}", self.songs)?;
        writeln!(
            f,
            "Segments:    {} processed, {} unmatched, {} failed",
            self.segments_processed, self.segments_unmatched, self.segments_failed
        )?;
        write!(f, "Elapsed:     {:.1}s", self.elapsed.as_secs_f64())
    }
}

/// Runs videos through a shared pipeline with bounded parallelism.
pub struct BatchScheduler {
    pipeline: Arc<VideoPipeline>,
    workers: usize,
    cancel: CancellationToken,
}

impl BatchScheduler {
    /// `workers` is clamped to at least 1.
    pub fn new(pipeline: Arc<VideoPipeline>, workers: usize, cancel: CancellationToken) -> Self {
        Self {
            pipeline,
            workers: workers.max(1),
            cancel,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Process every video; returns exactly one result per input path.
    pub async fn run(&self, videos: Vec<PathBuf>) -> BatchReport {
        let started = Instant::now();
        let mut results = BTreeMap::new();
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        tracing::info!(
            target: "scheduler::batch",
            videos = videos.len(),
            workers = self.workers,
            "Starting batch"
        );

        for (video, target) in plan_targets(videos, self.pipeline.sink()) {
            let target = match target {
                Ok(target) => target,
                Err(e) => {
                    tracing::error!(target: "scheduler::batch", video = %video.display(), error = %e, "Cannot place playlist");
                    results.insert(video, Err(e.into()));
                    continue;
                }
            };

            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                tracing::debug!(target: "scheduler::batch", video = %video.display(), "Not started, batch cancelled");
                results.insert(video, Err(Error::Cancelled));
                continue;
            };

            let pipeline = Arc::clone(&self.pipeline);
            let cancel = self.cancel.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let result = AssertUnwindSafe(pipeline.process(&video, &target, &cancel))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| Err(Error::from_panic(payload)));
                (video, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((video, result)) => {
                    log_result(&video, &result);
                    results.insert(video, result);
                }
                Err(e) => {
                    tracing::error!(target: "scheduler::batch", error = %e, "Worker task lost");
                }
            }
        }

        BatchReport {
            results,
            elapsed: started.elapsed(),
        }
    }
}

/// Assign each video its playlist path.
///
/// The first video keeps the plain name; later videos with the same base
/// name (e.g. `set.mp4` and `set.mkv`) get the fallback name instead.
fn plan_targets(
    videos: Vec<PathBuf>,
    sink: &dyn PlaylistSink,
) -> Vec<(PathBuf, std::result::Result<PathBuf, OutputError>)> {
    let mut taken = HashSet::new();
    videos
        .into_iter()
        .map(|video| {
            let target = resolve_target(&video, sink, &mut taken);
            (video, target)
        })
        .collect()
}

fn resolve_target(
    video: &Path,
    sink: &dyn PlaylistSink,
    taken: &mut HashSet<PathBuf>,
) -> std::result::Result<PathBuf, OutputError> {
    let primary = sink.target_for(video)?;
    if taken.insert(primary.clone()) {
        return Ok(primary);
    }
    let fallback = sink.fallback_target_for(video)?;
    if taken.insert(fallback.clone()) {
        tracing::warn!(
            target: "scheduler::batch",
            video = %video.display(),
            path = %fallback.display(),
            "Playlist name already used by another video, using full file name"
        );
        return Ok(fallback);
    }
    Err(OutputError::Collision(primary))
}

fn log_result(video: &Path, result: &Result<PlaylistResult>) {
    match result {
        Ok(playlist) => tracing::debug!(
            target: "scheduler::batch",
            video = %video.display(),
            songs = playlist.songs().len(),
            cancelled = playlist.is_cancelled(),
            "Worker finished"
        ),
        Err(Error::Cancelled) => tracing::debug!(
            target: "scheduler::batch",
            video = %video.display(),
            "Cancelled"
        ),
        Err(e) => tracing::error!(
            target: "scheduler::batch",
            video = %video.display(),
            kind = e.kind(),
            error = %e,
            "Video failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decoder::mocks::SyntheticDecoder;
    use crate::audio::{PartialSegmentPolicy, Segmenter};
    use crate::pipeline::PipelineOptions;
    use crate::playlist::writer::mocks::RecordingSink;
    use crate::recognition::RecognitionError;
    use crate::recognition::traits::mocks::ScriptedRecognizer;

    struct Setup {
        decoder: Arc<SyntheticDecoder>,
        sink: Arc<RecordingSink>,
        pipeline: Arc<VideoPipeline>,
        _scratch: tempfile::TempDir,
    }

    fn setup(decoder: SyntheticDecoder, recognizer: ScriptedRecognizer) -> Setup {
        let scratch = tempfile::tempdir().unwrap();
        let decoder = Arc::new(decoder);
        let sink = Arc::new(RecordingSink::new());
        let pipeline = Arc::new(VideoPipeline::new(
            decoder.clone(),
            Arc::new(recognizer),
            sink.clone(),
            Segmenter::new(20_000, PartialSegmentPolicy::Drop).unwrap(),
            PipelineOptions {
                scratch_root: Some(scratch.path().to_path_buf()),
                ..Default::default()
            },
        ));
        Setup {
            decoder,
            sink,
            pipeline,
            _scratch: scratch,
        }
    }

    fn videos(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from("/videos").join(n)).collect()
    }

    #[tokio::test]
    async fn test_failing_video_does_not_affect_others() {
        let setup = setup(
            SyntheticDecoder::new(40_000).failing_on("x.mp4"),
            ScriptedRecognizer::new().matched(0, "Song", "Band"),
        );
        let scheduler = BatchScheduler::new(setup.pipeline.clone(), 2, CancellationToken::new());

        let report = scheduler.run(videos(&["a.mp4", "x.mp4", "z.mp4"])).await;

        assert_eq!(report.results.len(), 3);
        assert!(report.results[Path::new("/videos/a.mp4")].is_ok());
        assert!(matches!(
            report.results[Path::new("/videos/x.mp4")].as_ref().map_err(Error::kind),
            Err("decode")
        ));
        assert!(report.results[Path::new("/videos/z.mp4")].is_ok());
        assert_eq!(setup.sink.written().len(), 2);

        let summary = report.summary();
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.songs, 2);
        assert!(summary.has_failures());
    }

    #[tokio::test]
    async fn test_rejected_credentials_do_not_cancel_siblings() {
        let setup = setup(
            SyntheticDecoder::new(60_000),
            ScriptedRecognizer::new()
                .failing(
                    0,
                    RecognitionError::Auth {
                        code: 3001,
                        message: "invalid access key".to_string(),
                    },
                )
                .matched(1, "Song", "Band"),
        );
        let cancel = CancellationToken::new();
        let scheduler = BatchScheduler::new(setup.pipeline.clone(), 1, cancel.clone());

        let report = scheduler.run(videos(&["a.mp4", "b.mp4", "c.mp4"])).await;

        assert!(!cancel.is_cancelled());
        for result in report.results.values() {
            let playlist = result.as_ref().unwrap();
            assert!(!playlist.is_cancelled());
            assert_eq!(playlist.segments_processed(), 3);
            assert_eq!(playlist.segments_failed(), 1);
            assert_eq!(playlist.songs().len(), 1);
        }
        let summary = report.summary();
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.cancelled, 0);
        assert!(!summary.has_failures());
    }

    #[tokio::test]
    async fn test_workers_bound_concurrency() {
        let setup = setup(
            SyntheticDecoder::new(20_000).with_delay(Duration::from_millis(50)),
            ScriptedRecognizer::new(),
        );
        let scheduler = BatchScheduler::new(setup.pipeline.clone(), 2, CancellationToken::new());

        let report = scheduler
            .run(videos(&["1.mp4", "2.mp4", "3.mp4", "4.mp4", "5.mp4", "6.mp4"]))
            .await;

        assert_eq!(report.results.len(), 6);
        assert!(report.results.values().all(|r| r.is_ok()));
        assert!(setup.decoder.max_active() <= 2);
    }

    #[tokio::test]
    async fn test_single_worker_is_sequential() {
        let setup = setup(
            SyntheticDecoder::new(20_000).with_delay(Duration::from_millis(10)),
            ScriptedRecognizer::new(),
        );
        let scheduler = BatchScheduler::new(setup.pipeline.clone(), 0, CancellationToken::new());
        assert_eq!(scheduler.workers(), 1);

        scheduler.run(videos(&["1.mp4", "2.mp4", "3.mp4"])).await;
        assert_eq!(setup.decoder.max_active(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_batch_starts_nothing() {
        let setup = setup(SyntheticDecoder::new(20_000), ScriptedRecognizer::new());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let scheduler = BatchScheduler::new(setup.pipeline.clone(), 2, cancel);

        let report = scheduler.run(videos(&["a.mp4", "b.mp4"])).await;

        assert!(report.results.values().all(|r| matches!(r, Err(Error::Cancelled))));
        assert!(setup.decoder.scratch_dirs().is_empty());
        let summary = report.summary();
        assert_eq!(summary.cancelled, 2);
        assert!(!summary.has_failures());
    }

    #[tokio::test]
    async fn test_panicking_video_is_isolated() {
        let setup = setup(
            SyntheticDecoder::new(20_000).panicking_on("boom.mp4"),
            ScriptedRecognizer::new().matched(0, "Song", "Band"),
        );
        let scheduler = BatchScheduler::new(setup.pipeline.clone(), 2, CancellationToken::new());

        let report = scheduler.run(videos(&["boom.mp4", "fine.mp4"])).await;

        assert!(matches!(
            report.results[Path::new("/videos/boom.mp4")],
            Err(Error::TaskPanicked(_))
        ));
        assert!(report.results[Path::new("/videos/fine.mp4")].is_ok());
    }

    #[tokio::test]
    async fn test_same_base_name_gets_distinct_playlists() {
        let setup = setup(
            SyntheticDecoder::new(20_000),
            ScriptedRecognizer::new().matched(0, "Song", "Band"),
        );
        let scheduler = BatchScheduler::new(setup.pipeline.clone(), 2, CancellationToken::new());

        let report = scheduler.run(videos(&["set.mkv", "set.mp4"])).await;

        assert_eq!(
            report.results[Path::new("/videos/set.mkv")].as_ref().unwrap().output(),
            Some(Path::new("out/set.csv"))
        );
        assert_eq!(
            report.results[Path::new("/videos/set.mp4")].as_ref().unwrap().output(),
            Some(Path::new("out/set.mp4.csv"))
        );
    }

    #[test]
    fn test_unresolvable_collision() {
        let sink = RecordingSink::new();
        let planned = plan_targets(
            vec![
                PathBuf::from("/a/set.mp4"),
                PathBuf::from("/b/set.mp4"),
                PathBuf::from("/c/set.mp4"),
            ],
            &sink,
        );

        assert_eq!(planned[0].1.as_ref().unwrap(), Path::new("out/set.csv"));
        assert_eq!(planned[1].1.as_ref().unwrap(), Path::new("out/set.mp4.csv"));
        assert!(matches!(planned[2].1, Err(OutputError::Collision(_))));
    }

    #[test]
    fn test_summary_display() {
        let summary = BatchSummary {
            videos: 3,
            succeeded: 2,
            failed: 1,
            songs: 7,
            ..Default::default()
        };
        let text = summary.to_string();
        assert!(text.contains("Succeeded: 2"));
        assert!(text.contains("Songs found: 7"));
    }
}
