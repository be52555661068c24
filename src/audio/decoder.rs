//! Audio track extraction from video containers.
//!
//! Two backends implement [`AudioDecoder`]:
//! - [`FfmpegDecoder`] shells out to `ffmpeg` to write a PCM WAV into the
//!   video's scratch directory, then reads it back. Handles every container
//!   ffmpeg knows.
//! - [`NativeDecoder`] demuxes and decodes in-process with symphonia
//!   (MP4/MKV with AAC, MP3, FLAC, Vorbis or PCM audio).
//!
//! Both return interleaved 16-bit PCM.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::model::AudioStream;

/// Name of the extracted track inside a video's scratch directory.
const EXTRACTED_TRACK: &str = "audio.wav";

/// Errors from the decoder boundary. Always fatal for the video being decoded.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} not found. Install ffmpeg or set decoder.backend = \"native\"")]
    ToolNotFound(String),

    #[error("ffmpeg failed ({status}): {stderr}")]
    Tool { status: String, stderr: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("No audio track found")]
    NoAudioTrack,

    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("Audio track is empty")]
    EmptyStream,
}

/// Turns a video file into a decoded audio stream.
///
/// Implementations are blocking; callers run them off the async executor.
pub trait AudioDecoder: Send + Sync {
    /// Decode the first audio track of `video`.
    ///
    /// `scratch` is a directory owned by this video for the duration of the
    /// call; anything written there is removed by the caller.
    fn decode(&self, video: &Path, scratch: &Path) -> Result<AudioStream, DecodeError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// In-process decoding with symphonia.
#[derive(Debug, Clone, Default)]
pub struct NativeDecoder;

impl AudioDecoder for NativeDecoder {
    fn decode(&self, video: &Path, _scratch: &Path) -> Result<AudioStream, DecodeError> {
        read_pcm(video)
    }

    fn name(&self) -> &'static str {
        "native"
    }
}

/// Extraction through the `ffmpeg` command-line tool.
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    program: PathBuf,
    sample_rate: u32,
    mono: bool,
}

impl FfmpegDecoder {
    pub fn new(program: impl Into<PathBuf>, sample_rate: u32, mono: bool) -> Self {
        Self {
            program: program.into(),
            sample_rate,
            mono,
        }
    }

    /// Get the ffmpeg version line (for diagnostics)
    pub fn version(&self) -> Option<String> {
        Command::new(&self.program)
            .arg("-version")
            .output()
            .ok()
            .filter(|o| o.status.success())
            .and_then(|o| {
                String::from_utf8_lossy(&o.stdout)
                    .lines()
                    .next()
                    .map(|l| l.trim().to_string())
            })
    }

    fn command(&self, video: &Path, target: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-nostdin", "-hide_banner", "-loglevel", "error", "-y", "-i"])
            .arg(video)
            .args(["-vn", "-acodec", "pcm_s16le", "-ar"])
            .arg(self.sample_rate.to_string());
        if self.mono {
            cmd.args(["-ac", "1"]);
        }
        cmd.arg(target);
        cmd
    }
}

impl AudioDecoder for FfmpegDecoder {
    fn decode(&self, video: &Path, scratch: &Path) -> Result<AudioStream, DecodeError> {
        let target = scratch.join(EXTRACTED_TRACK);

        let output = self.command(video, &target).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DecodeError::ToolNotFound(self.program.display().to_string())
            } else {
                DecodeError::Open {
                    path: self.program.clone(),
                    source: e,
                }
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DecodeError::Tool {
                status: output.status.to_string(),
                stderr: stderr.trim().chars().take(500).collect(),
            });
        }

        tracing::debug!(
            target: "decoder::ffmpeg",
            video = %video.display(),
            track = %target.display(),
            "Extracted audio track"
        );

        let stream = read_pcm(&target);
        // The scratch directory goes away with the video; free the space early
        if let Err(e) = std::fs::remove_file(&target) {
            tracing::debug!(target: "decoder::ffmpeg", error = %e, "Could not remove extracted track");
        }
        stream
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}

/// Decode the first audio track of a media file to interleaved i16 PCM.
pub fn read_pcm(path: &Path) -> Result<AudioStream, DecodeError> {
    let file = File::open(path).map_err(|e| DecodeError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension() {
        hint.with_extension(&ext.to_string_lossy());
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::UnsupportedFormat(e.to_string()))?;
    let mut reader = probed.format;

    // Video tracks carry a null codec or no sample rate
    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL && t.codec_params.sample_rate.is_some())
        .ok_or(DecodeError::NoAudioTrack)?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::UnsupportedFormat(e.to_string()))?;

    let mut sample_rate = codec_params.sample_rate.unwrap_or(0);
    let mut channels = codec_params.channels.map(|c| c.count() as u16).unwrap_or(1);
    let mut samples: Vec<i16> = Vec::new();
    let mut buffer: Option<SampleBuffer<i16>> = None;
    let mut skipped = 0usize;

    loop {
        let packet = match reader.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(DecodeError::Decode(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(_)) => {
                skipped += 1;
                continue;
            }
            Err(e) => return Err(DecodeError::Decode(e.to_string())),
        };

        let spec = *decoded.spec();
        let needed = decoded.capacity() * spec.channels.count();
        if buffer.as_ref().is_none_or(|b| b.capacity() < needed) {
            buffer = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }
        if let Some(buf) = buffer.as_mut() {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }

        sample_rate = spec.rate;
        channels = spec.channels.count() as u16;
    }

    if skipped > 0 {
        tracing::debug!(target: "decoder", path = %path.display(), skipped, "Skipped corrupt packets");
    }
    if samples.is_empty() {
        return Err(DecodeError::EmptyStream);
    }

    Ok(AudioStream::new(sample_rate, channels, samples))
}
