//! Audio acquisition and preparation for recognition.
//!
//! - [`decoder`]: video file -> decoded PCM stream (ffmpeg or symphonia)
//! - [`segmenter`]: stream -> ordered fixed-duration windows
//! - [`wav`]: window -> WAV bytes for upload

pub mod decoder;
pub mod segmenter;
pub mod wav;

use std::sync::Arc;

use crate::config::{DecoderBackend, DecoderConfig};

pub use decoder::{AudioDecoder, DecodeError, FfmpegDecoder, NativeDecoder};
pub use segmenter::{PartialSegmentPolicy, Segmenter};

/// Build the decoder selected in config.
///
/// Falls back to the native decoder when ffmpeg is selected but cannot be run.
pub fn build_decoder(config: &DecoderConfig) -> Arc<dyn AudioDecoder> {
    match config.backend {
        DecoderBackend::Native => Arc::new(NativeDecoder),
        DecoderBackend::Ffmpeg => {
            let ffmpeg = FfmpegDecoder::new(&config.ffmpeg_path, config.sample_rate, config.mono);
            match ffmpeg.version() {
                Some(version) => {
                    tracing::info!(target: "decoder::ffmpeg", %version, "Using ffmpeg");
                    Arc::new(ffmpeg)
                }
                None => {
                    tracing::warn!(
                        target: "decoder::ffmpeg",
                        path = %config.ffmpeg_path.display(),
                        "ffmpeg not available, falling back to native decoding"
                    );
                    Arc::new(NativeDecoder)
                }
            }
        }
    }
}
