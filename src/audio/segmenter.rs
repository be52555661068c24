//! Fixed-duration segmentation of a decoded audio stream.
//!
//! Segments cover `[0, D), [D, 2D), ...` with no gaps or overlaps. Window
//! boundaries are computed in frames as `floor(i * D * rate / 1000)`, so every
//! frame belongs to exactly one window even when `D * rate` is not a multiple
//! of 1000.
//!
//! What happens to the trailing remainder shorter than `D` is decided by
//! [`PartialSegmentPolicy`]:
//! - `Drop`: only full windows are produced; a stream shorter than `D`
//!   yields no segments at all.
//! - `Include`: the remainder is produced as one short final segment; a
//!   stream shorter than `D` yields exactly one segment. A remainder under
//!   one millisecond is never produced.

use serde::{Deserialize, Serialize};

use crate::model::{AudioSegment, AudioStream};

/// What to do with a trailing window shorter than the configured duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartialSegmentPolicy {
    /// Discard the remainder
    #[default]
    Drop,
    /// Recognize the remainder as a short final segment
    Include,
}

/// Slices streams into fixed-duration windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segmenter {
    duration_ms: u64,
    partial: PartialSegmentPolicy,
}

impl Segmenter {
    /// Returns `None` for a zero duration.
    pub fn new(duration_ms: u64, partial: PartialSegmentPolicy) -> Option<Self> {
        (duration_ms > 0).then_some(Self {
            duration_ms,
            partial,
        })
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn partial_policy(&self) -> PartialSegmentPolicy {
        self.partial
    }

    /// Number of segments `segments()` will yield for this stream.
    pub fn count(&self, stream: &AudioStream) -> usize {
        let (full, has_partial) = self.layout(stream);
        full + usize::from(has_partial && self.partial == PartialSegmentPolicy::Include)
    }

    /// Ordered segments of the stream.
    ///
    /// The iterator is `Clone`, so a sequence can be replayed from the start.
    pub fn segments<'a>(&self, stream: &'a AudioStream) -> Segments<'a> {
        Segments {
            stream,
            duration_ms: self.duration_ms,
            next: 0,
            total: self.count(stream),
        }
    }

    /// Full-window count and whether a remainder of at least 1 ms exists.
    fn layout(&self, stream: &AudioStream) -> (usize, bool) {
        let frames = stream.frames();
        if frames == 0 || stream.sample_rate == 0 {
            return (0, false);
        }
        // (i + 1) * D * rate <= frames * 1000  <=>  window i is complete
        let per_window = self.duration_ms as u128 * stream.sample_rate as u128;
        let full = (frames as u128 * 1000 / per_window) as usize;
        (full, stream.duration_ms() > full as u64 * self.duration_ms)
    }
}

/// Frame index at a millisecond offset, rounded down.
fn frame_at(ms: u64, sample_rate: u32) -> u64 {
    (ms as u128 * sample_rate as u128 / 1000) as u64
}

/// Iterator over the windows of one stream.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    stream: &'a AudioStream,
    duration_ms: u64,
    next: usize,
    total: usize,
}

impl<'a> Iterator for Segments<'a> {
    type Item = AudioSegment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        let index = self.next;
        self.next += 1;

        let rate = self.stream.sample_rate;
        let channels = self.stream.channels as usize;
        let frames = self.stream.frames();

        let start_ms = index as u64 * self.duration_ms;
        let start_frame = frame_at(start_ms, rate);
        let end_frame = frame_at(start_ms + self.duration_ms, rate).min(frames);

        // A trailing partial is shorter than the configured window
        let duration_ms = if end_frame == frame_at(start_ms + self.duration_ms, rate) {
            self.duration_ms
        } else {
            self.stream.duration_ms().saturating_sub(start_ms)
        };

        let samples =
            &self.stream.samples[start_frame as usize * channels..end_frame as usize * channels];

        Some(AudioSegment {
            index,
            start_ms,
            duration_ms,
            sample_rate: rate,
            channels: self.stream.channels,
            samples,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Segments<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::silent_stream;

    fn windows(segmenter: &Segmenter, stream: &AudioStream) -> Vec<(u64, u64)> {
        segmenter
            .segments(stream)
            .map(|s| (s.start_ms, s.end_ms()))
            .collect()
    }

    #[test]
    fn test_zero_duration_is_rejected() {
        assert!(Segmenter::new(0, PartialSegmentPolicy::Drop).is_none());
    }

    #[test]
    fn test_65s_stream_drops_trailing_partial() {
        let stream = silent_stream(65_000, 8000, 1);
        let segmenter = Segmenter::new(20_000, PartialSegmentPolicy::Drop).unwrap();

        assert_eq!(
            windows(&segmenter, &stream),
            vec![(0, 20_000), (20_000, 40_000), (40_000, 60_000)]
        );
        assert_eq!(segmenter.count(&stream), 3);
    }

    #[test]
    fn test_65s_stream_includes_trailing_partial() {
        let stream = silent_stream(65_000, 8000, 1);
        let segmenter = Segmenter::new(20_000, PartialSegmentPolicy::Include).unwrap();

        let segments: Vec<_> = segmenter.segments(&stream).collect();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[3].start_ms, 60_000);
        assert_eq!(segments[3].duration_ms, 5_000);
        assert_eq!(segments[3].samples.len(), 5 * 8000);
    }

    #[test]
    fn test_stream_shorter_than_window_drop_is_empty() {
        let stream = silent_stream(4_000, 8000, 1);
        let segmenter = Segmenter::new(20_000, PartialSegmentPolicy::Drop).unwrap();
        assert_eq!(segmenter.segments(&stream).count(), 0);
    }

    #[test]
    fn test_stream_shorter_than_window_include_is_single_short_segment() {
        let stream = silent_stream(4_000, 8000, 2);
        let segmenter = Segmenter::new(20_000, PartialSegmentPolicy::Include).unwrap();

        let segments: Vec<_> = segmenter.segments(&stream).collect();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start_ms, 0);
        assert_eq!(segments[0].duration_ms, 4_000);
        assert_eq!(segments[0].samples.len(), 4 * 8000 * 2);
    }

    #[test]
    fn test_exact_multiple_has_no_partial() {
        let stream = silent_stream(60_000, 8000, 1);
        for policy in [PartialSegmentPolicy::Drop, PartialSegmentPolicy::Include] {
            let segmenter = Segmenter::new(20_000, policy).unwrap();
            assert_eq!(segmenter.count(&stream), 3);
        }
    }

    #[test]
    fn test_empty_stream_has_no_segments() {
        let stream = AudioStream::new(8000, 1, vec![]);
        let segmenter = Segmenter::new(1_000, PartialSegmentPolicy::Include).unwrap();
        assert_eq!(segmenter.segments(&stream).count(), 0);
    }

    #[test]
    fn test_segments_are_restartable() {
        let stream = silent_stream(50_000, 8000, 1);
        let segmenter = Segmenter::new(20_000, PartialSegmentPolicy::Include).unwrap();

        let iter = segmenter.segments(&stream);
        let first: Vec<_> = iter.clone().map(|s| s.start_ms).collect();
        let second: Vec<_> = iter.map(|s| s.start_ms).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_sub_millisecond_remainder_is_not_a_segment() {
        // One second plus 10 frames at 44.1 kHz
        let stream = AudioStream::new(44_100, 1, vec![0; 44_110]);
        let segmenter = Segmenter::new(1_000, PartialSegmentPolicy::Include).unwrap();

        let segments: Vec<_> = segmenter.segments(&stream).collect();
        assert_eq!(segmenter.count(&stream), 1);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].duration_ms, 1_000);
        assert_eq!(segments[0].samples.len(), 44_100);
    }

    #[test]
    fn test_fractional_frame_boundaries_leave_no_gaps() {
        // 1 ms at 44.1 kHz is 44.1 frames
        let stream = silent_stream(10, 44_100, 1);
        let segmenter = Segmenter::new(1, PartialSegmentPolicy::Include).unwrap();

        let total: usize = segmenter.segments(&stream).map(|s| s.samples.len()).sum();
        assert_eq!(total as u64, stream.frames());
    }
}
