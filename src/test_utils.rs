//! Test utilities and fixtures for setlist-minder tests.
//!
//! Synthetic audio so segmenter, decoder and pipeline tests don't need real
//! video files. Mock implementations of the seams live next to their traits
//! (`recognition::traits::mocks`, `audio::decoder::mocks`,
//! `playlist::writer::mocks`).

use std::path::Path;

use crate::model::AudioStream;

/// Creates an all-zero stream of `ms` milliseconds.
pub fn silent_stream(ms: u64, sample_rate: u32, channels: u16) -> AudioStream {
    let frames = (ms as u128 * sample_rate as u128 / 1000) as usize;
    AudioStream::new(sample_rate, channels, vec![0; frames * channels as usize])
}

/// Writes a 440 Hz 16-bit PCM WAV file.
///
/// Panics on I/O errors; only for use in tests.
pub fn write_tone_wav(path: &Path, sample_rate: u32, channels: u16, ms: u64) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create WAV file");

    let frames = ms * sample_rate as u64 / 1000;
    for n in 0..frames {
        let t = n as f64 / sample_rate as f64;
        let value = ((t * 440.0 * std::f64::consts::TAU).sin() * 8000.0) as i16;
        for _ in 0..channels {
            writer.write_sample(value).expect("Failed to write sample");
        }
    }
    writer.finalize().expect("Failed to finalize WAV file");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_stream_length() {
        let stream = silent_stream(1500, 8000, 2);
        assert_eq!(stream.frames(), 12_000);
        assert_eq!(stream.samples.len(), 24_000);
        assert_eq!(stream.duration_ms(), 1500);
    }

    #[test]
    fn test_tone_wav_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_tone_wav(&path, 16_000, 1, 250);

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 16_000);
        assert_eq!(reader.len(), 4000);
    }
}
