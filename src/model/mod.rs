//! Core value types shared by the decoder, segmenter and recognition layers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A recognized song, used as the deduplication key for playlists.
///
/// Equality is exact and case-sensitive on both fields, as returned by the
/// recognition service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SongIdentity {
    pub title: String,
    pub artist: String,
}

impl SongIdentity {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
        }
    }
}

impl fmt::Display for SongIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// A fully decoded audio track as interleaved signed 16-bit PCM.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioStream {
    /// Samples per second, per channel
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
    /// Interleaved samples (`frames * channels` values)
    pub samples: Vec<i16>,
}

impl AudioStream {
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<i16>) -> Self {
        Self {
            sample_rate,
            channels,
            samples,
        }
    }

    /// Number of frames (one sample per channel).
    pub fn frames(&self) -> u64 {
        if self.channels == 0 {
            return 0;
        }
        (self.samples.len() / self.channels as usize) as u64
    }

    /// Total length in whole milliseconds.
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.frames() * 1000 / self.sample_rate as u64
    }
}

/// A bounded, non-overlapping time window of an [`AudioStream`].
///
/// Borrows the stream's samples; a segment lives only as long as the pipeline
/// step that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioSegment<'a> {
    /// Zero-based position in the segment sequence
    pub index: usize,
    /// Offset from the start of the stream
    pub start_ms: u64,
    /// Length of this window (shorter than configured for a trailing partial)
    pub duration_ms: u64,
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved samples covering exactly this window
    pub samples: &'a [i16],
}

impl AudioSegment<'_> {
    pub fn end_ms(&self) -> u64 {
        self.start_ms + self.duration_ms
    }
}
