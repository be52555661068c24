//! Playlist accumulation - folds segment outcomes into unique song lists.
//!
//! [`PlaylistBuilder`] owns the ordering invariant: outcomes may be recorded
//! in any completion order, but they are folded strictly by segment index,
//! so a song's position is where it was *first* matched in the video.

pub mod writer;

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::model::SongIdentity;
use crate::recognition::RecognitionOutcome;

pub use writer::{CsvPlaylistWriter, OutputError, PlaylistSink};

/// Finalized playlist for one video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistResult {
    video: PathBuf,
    songs: Vec<SongIdentity>,
    segments_total: usize,
    segments_processed: usize,
    segments_unmatched: usize,
    segments_failed: usize,
    cancelled: bool,
    /// Playlist file, once written
    output: Option<PathBuf>,
}

impl PlaylistResult {
    pub fn video(&self) -> &Path {
        &self.video
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    pub(crate) fn with_output(mut self, path: PathBuf) -> Self {
        self.output = Some(path);
        self
    }

    /// Unique songs in first-matched order.
    pub fn songs(&self) -> &[SongIdentity] {
        &self.songs
    }

    /// Segments the video was split into.
    pub fn segments_total(&self) -> usize {
        self.segments_total
    }

    /// Segments that produced an outcome.
    pub fn segments_processed(&self) -> usize {
        self.segments_processed
    }

    /// Segments the service answered with no match.
    pub fn segments_unmatched(&self) -> usize {
        self.segments_unmatched
    }

    /// Segments whose recognition failed.
    pub fn segments_failed(&self) -> usize {
        self.segments_failed
    }

    /// Segments that contributed no song (no match or failure).
    pub fn segments_skipped(&self) -> usize {
        self.segments_unmatched + self.segments_failed
    }

    /// Processing stopped before every segment was recognized.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}

/// Accumulates outcomes for one video.
#[derive(Debug)]
pub struct PlaylistBuilder {
    video: PathBuf,
    segments_total: usize,
    songs: Vec<SongIdentity>,
    seen: HashSet<SongIdentity>,
    /// Outcomes that arrived ahead of a lower index still in flight
    pending: BTreeMap<usize, RecognitionOutcome>,
    next_index: usize,
    processed: usize,
    unmatched: usize,
    failed: usize,
}

impl PlaylistBuilder {
    pub fn new(video: impl Into<PathBuf>, segments_total: usize) -> Self {
        Self {
            video: video.into(),
            segments_total,
            songs: Vec::new(),
            seen: HashSet::new(),
            pending: BTreeMap::new(),
            next_index: 0,
            processed: 0,
            unmatched: 0,
            failed: 0,
        }
    }

    /// Record the outcome for segment `index`.
    ///
    /// Returns the songs this call appended to the playlist (several when a
    /// gap in the segment order closes). A repeated or out-of-range index is
    /// ignored.
    pub fn record(&mut self, index: usize, outcome: RecognitionOutcome) -> Vec<SongIdentity> {
        if index >= self.segments_total {
            tracing::debug!(target: "playlist", index, total = self.segments_total, "Ignoring out-of-range outcome");
            return Vec::new();
        }
        if index < self.next_index || self.pending.contains_key(&index) {
            tracing::debug!(target: "playlist", index, "Ignoring duplicate outcome");
            return Vec::new();
        }
        self.pending.insert(index, outcome);

        let mut added = Vec::new();
        while let Some(outcome) = self.pending.remove(&self.next_index) {
            self.next_index += 1;
            if let Some(song) = self.fold(outcome) {
                added.push(song);
            }
        }
        added
    }

    fn fold(&mut self, outcome: RecognitionOutcome) -> Option<SongIdentity> {
        self.processed += 1;
        match outcome {
            RecognitionOutcome::Matched(identity) => {
                if self.seen.contains(&identity) {
                    return None;
                }
                self.seen.insert(identity.clone());
                self.songs.push(identity.clone());
                Some(identity)
            }
            RecognitionOutcome::NoMatch => {
                self.unmatched += 1;
                None
            }
            RecognitionOutcome::Failed(_) => {
                self.failed += 1;
                None
            }
        }
    }

    /// Freeze the playlist.
    ///
    /// Outcomes still waiting behind a gap (only possible when processing
    /// was cut short) are folded in index order.
    pub fn finish(mut self) -> PlaylistResult {
        for (_, outcome) in std::mem::take(&mut self.pending) {
            self.fold(outcome);
        }
        PlaylistResult {
            cancelled: self.processed < self.segments_total,
            video: self.video,
            songs: self.songs,
            segments_total: self.segments_total,
            segments_processed: self.processed,
            segments_unmatched: self.unmatched,
            segments_failed: self.failed,
            output: None,
        }
    }
}

/// Fold outcomes given in segment order.
#[cfg(test)]
pub fn fold(
    video: impl Into<PathBuf>,
    outcomes: impl IntoIterator<Item = RecognitionOutcome>,
) -> PlaylistResult {
    let outcomes: Vec<_> = outcomes.into_iter().collect();
    let mut builder = PlaylistBuilder::new(video, outcomes.len());
    for (index, outcome) in outcomes.into_iter().enumerate() {
        builder.record(index, outcome);
    }
    builder.finish()
}
