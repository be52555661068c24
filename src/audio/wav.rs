//! In-memory WAV encoding of segments for upload.

use std::io::Cursor;

use crate::model::AudioSegment;

/// Encode a segment as a 16-bit PCM WAV body.
///
/// `max_ms` keeps only the leading part of the segment, matching the
/// recognizer's preference for short samples.
pub fn encode_segment(
    segment: &AudioSegment<'_>,
    max_ms: Option<u64>,
) -> Result<Vec<u8>, hound::Error> {
    let channels = segment.channels.max(1) as usize;
    let samples = match max_ms {
        Some(ms) => {
            let frames = (ms as u128 * segment.sample_rate as u128 / 1000) as usize;
            &segment.samples[..segment.samples.len().min(frames * channels)]
        }
        None => segment.samples,
    };

    let spec = hound::WavSpec {
        channels: channels as u16,
        sample_rate: segment.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(samples: &[i16], channels: u16) -> AudioSegment<'_> {
        AudioSegment {
            index: 0,
            start_ms: 0,
            duration_ms: 1000,
            sample_rate: 8000,
            channels,
            samples,
        }
    }

    #[test]
    fn test_encoded_segment_reads_back() {
        let samples: Vec<i16> = (0..8000).map(|i| (i % 200) as i16 - 100).collect();
        let bytes = encode_segment(&segment(&samples, 1), None).unwrap();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, 8000);
        assert_eq!(reader.spec().channels, 1);
        let decoded: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn test_max_ms_trims_to_whole_frames() {
        let samples = vec![7i16; 8000 * 2];
        let bytes = encode_segment(&segment(&samples, 2), Some(250)).unwrap();

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.duration(), 2000);
        assert_eq!(reader.len(), 4000);
    }
}
