//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

use crate::audio::PartialSegmentPolicy;
use crate::config::{Config, DecoderBackend};

/// Build a setlist for every video in a folder
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Folder containing the videos (default: batch.input_dir, "videos")
    pub folder: Option<PathBuf>,

    /// Config file (default: ./config.toml, then the user config directory)
    #[arg(short, long, env = "SETLIST_MINDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Recognition service access key
    #[arg(long, env = "ACR_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    /// Recognition service access secret
    #[arg(long, env = "ACR_ACCESS_SECRET", hide_env_values = true)]
    pub access_secret: Option<String>,

    /// Recognition host, e.g. identify-us-west-2.acrcloud.com
    #[arg(long)]
    pub host: Option<String>,

    /// Videos processed at once (0 = number of CPUs)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Segment length in milliseconds
    #[arg(long)]
    pub segment_ms: Option<u64>,

    /// Also recognize the trailing part shorter than one segment
    #[arg(long)]
    pub include_partial: bool,

    /// Recognition requests in flight per video
    #[arg(long)]
    pub segment_concurrency: Option<usize>,

    /// Write playlists here instead of next to each video
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Write a header-only playlist for videos with no recognized songs
    #[arg(long)]
    pub write_empty: bool,

    /// Stop starting new work after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Scan subfolders too
    #[arg(short, long)]
    pub recursive: bool,

    /// Audio extraction backend
    #[arg(long, value_enum)]
    pub decoder: Option<DecoderBackend>,

    /// Show debug logs
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Apply command-line overrides on top of file configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(folder) = &self.folder {
            config.batch.input_dir = folder.clone();
        }
        if let Some(key) = &self.access_key {
            config.credentials.access_key = key.clone();
        }
        if let Some(secret) = &self.access_secret {
            config.credentials.access_secret = secret.clone();
        }
        if let Some(host) = &self.host {
            config.recognition.host = host.clone();
        }
        if let Some(workers) = self.workers {
            config.batch.workers = workers;
        }
        if let Some(ms) = self.segment_ms {
            config.segments.duration_ms = ms;
        }
        if self.include_partial {
            config.segments.partial = PartialSegmentPolicy::Include;
        }
        if let Some(n) = self.segment_concurrency {
            config.segments.concurrency = n;
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = Some(dir.clone());
        }
        if self.write_empty {
            config.output.write_empty = true;
        }
        if let Some(secs) = self.timeout_secs {
            config.batch.timeout_secs = Some(secs);
        }
        if self.recursive {
            config.batch.recursive = true;
        }
        if let Some(backend) = self.decoder {
            config.decoder.backend = backend;
        }
    }
}
