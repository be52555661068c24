//! Configuration system using TOML files.
//!
//! The config file is looked up in order:
//! 1. the path given with `--config`
//! 2. `./config.toml`
//! 3. the OS-standard config directory:
//!    - Windows: %APPDATA%\setlist-minder\config.toml
//!    - macOS: ~/Library/Application Support/setlist-minder/config.toml
//!    - Linux: ~/.config/setlist-minder/config.toml
//!
//! Every section is optional and falls back to defaults. Command-line flags
//! are applied on top by the CLI, then [`Config::validate`] runs once before
//! any video is touched.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::audio::{PartialSegmentPolicy, Segmenter};
use crate::recognition::AcrCloudConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Recognition service credentials
    pub credentials: Credentials,

    /// Recognition service endpoint and request settings
    pub recognition: RecognitionConfig,

    /// Segmentation settings
    pub segments: SegmentsConfig,

    /// Batch discovery and worker settings
    pub batch: BatchConfig,

    /// Audio extraction settings
    pub decoder: DecoderConfig,

    /// Playlist output settings
    pub output: OutputConfig,
}

/// Recognition service credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub access_key: String,
    pub access_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Regional identify host
    pub host: String,

    /// Per-request timeout
    pub timeout_secs: u64,

    /// Send at most this much of each segment
    pub max_sample_ms: Option<u64>,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            host: "identify-eu-west-1.acrcloud.com".to_string(),
            timeout_secs: 10,
            max_sample_ms: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentsConfig {
    /// Window length in milliseconds
    pub duration_ms: u64,

    /// Trailing remainder handling: "drop" or "include"
    pub partial: PartialSegmentPolicy,

    /// Recognition requests in flight per video
    pub concurrency: usize,
}

impl Default for SegmentsConfig {
    fn default() -> Self {
        Self {
            duration_ms: 20_000,
            partial: PartialSegmentPolicy::Drop,
            concurrency: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Folder scanned for videos
    pub input_dir: PathBuf,

    /// Video file extensions (case-insensitive, without the dot)
    pub extensions: Vec<String>,

    /// Descend into subfolders
    pub recursive: bool,

    /// Videos processed at once (0 = number of CPUs)
    pub workers: usize,

    /// Cancel the batch after this many seconds
    pub timeout_secs: Option<u64>,

    /// Root for per-video scratch directories (default: OS temp dir)
    pub scratch_dir: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("videos"),
            extensions: ["mp4", "mkv", "mov", "avi", "webm", "m4v"]
                .into_iter()
                .map(String::from)
                .collect(),
            recursive: false,
            workers: 0,
            timeout_secs: None,
            scratch_dir: None,
        }
    }
}

/// Audio extraction backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DecoderBackend {
    #[default]
    Ffmpeg,
    Native,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub backend: DecoderBackend,

    /// ffmpeg executable (looked up on PATH when not absolute)
    pub ffmpeg_path: PathBuf,

    /// Resample target for the ffmpeg backend
    pub sample_rate: u32,

    /// Downmix to one channel (ffmpeg backend)
    pub mono: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            backend: DecoderBackend::Ffmpeg,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            sample_rate: 16_000,
            mono: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Playlist folder (default: next to each video)
    pub dir: Option<PathBuf>,

    /// Playlist file extension
    pub extension: String,

    /// Write a header-only playlist when nothing was recognized
    pub write_empty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            extension: "csv".to_string(),
            write_empty: false,
        }
    }
}

impl Config {
    /// Check credentials and numeric ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.credentials.access_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential("access_key"));
        }
        if self.credentials.access_secret.trim().is_empty() {
            return Err(ConfigError::MissingCredential("access_secret"));
        }
        if self.recognition.host.trim().is_empty() {
            return Err(ConfigError::invalid("recognition.host", "must not be empty"));
        }
        if self.recognition.timeout_secs == 0 {
            return Err(ConfigError::invalid("recognition.timeout_secs", "must be greater than 0"));
        }
        if self.recognition.max_sample_ms == Some(0) {
            return Err(ConfigError::invalid("recognition.max_sample_ms", "must be greater than 0"));
        }
        if self.segments.duration_ms == 0 {
            return Err(ConfigError::invalid("segments.duration_ms", "must be greater than 0"));
        }
        if self.segments.concurrency == 0 {
            return Err(ConfigError::invalid("segments.concurrency", "must be greater than 0"));
        }
        if self.batch.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(ConfigError::invalid("batch.extensions", "must list at least one extension"));
        }
        if self.batch.timeout_secs == Some(0) {
            return Err(ConfigError::invalid("batch.timeout_secs", "must be greater than 0"));
        }
        if self.decoder.sample_rate == 0 {
            return Err(ConfigError::invalid("decoder.sample_rate", "must be greater than 0"));
        }
        if self.output.extension.trim().is_empty() || self.output.extension.contains(['/', '\\']) {
            return Err(ConfigError::invalid("output.extension", "must be a plain file extension"));
        }
        Ok(())
    }

    /// Recognition client settings.
    pub fn acrcloud(&self) -> AcrCloudConfig {
        AcrCloudConfig {
            host: self.recognition.host.clone(),
            access_key: self.credentials.access_key.clone(),
            access_secret: self.credentials.access_secret.clone(),
            timeout: Duration::from_secs(self.recognition.timeout_secs),
            max_sample_ms: self.recognition.max_sample_ms,
        }
    }

    pub fn segmenter(&self) -> Result<Segmenter, ConfigError> {
        Segmenter::new(self.segments.duration_ms, self.segments.partial)
            .ok_or_else(|| ConfigError::invalid("segments.duration_ms", "must be greater than 0"))
    }

    /// Worker count with 0 resolved to the available parallelism.
    pub fn workers(&self) -> usize {
        match self.batch.workers {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        }
    }

    pub fn batch_timeout(&self) -> Option<Duration> {
        self.batch.timeout_secs.map(Duration::from_secs)
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("setlist-minder"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Resolve which config file to read.
///
/// An explicit path is returned as-is (even if missing, so loading reports
/// it); otherwise the first existing default location wins.
pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("config.toml");
    if local.is_file() {
        return Some(local);
    }
    config_path().filter(|p| p.is_file())
}

/// Read and parse one config file.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    let config =
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
    tracing::info!(target: "config", path = %path.display(), "Loaded config");
    Ok(config)
}

/// Load configuration from the first location found.
///
/// No file at all yields defaults; credentials may still arrive from flags
/// or the environment, and [`Config::validate`] catches them if not.
pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    match locate(explicit) {
        Some(path) => load_from(&path),
        None => {
            tracing::info!(target: "config", "No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),

    #[error("Missing credential `{0}` (set it in [credentials] or via the command line/environment)")]
    MissingCredential(&'static str),

    #[error("Invalid value for `{field}`: {message}")]
    Invalid { field: &'static str, message: String },
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.credentials.access_key = "key".to_string();
        config.credentials.access_secret = "secret".to_string();
        config
    }

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[credentials]"));
        assert!(toml.contains("[recognition]"));
        assert!(toml.contains("[segments]"));
        assert!(toml.contains("[batch]"));
        assert!(toml.contains("[decoder]"));
        assert!(toml.contains("[output]"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[credentials]
access_key = "my-key"
access_secret = "my-secret"

[segments]
partial = "include"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.credentials.access_key, "my-key");
        assert_eq!(config.segments.partial, PartialSegmentPolicy::Include);

        // Other fields use defaults
        assert_eq!(config.segments.duration_ms, 20_000);
        assert_eq!(config.segments.concurrency, 1);
        assert_eq!(config.recognition.host, "identify-eu-west-1.acrcloud.com");
        assert_eq!(config.batch.input_dir, PathBuf::from("videos"));
        assert_eq!(config.decoder.backend, DecoderBackend::Ffmpeg);
        assert_eq!(config.output.extension, "csv");
        assert!(!config.output.write_empty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_partial_policy_is_rejected() {
        let toml = r#"
[segments]
partial = "pad"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_missing_credentials_fail_validation() {
        let config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingCredential("access_key"))
        ));

        let mut config = valid_config();
        config.credentials.access_secret = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingCredential("access_secret"))
        ));
    }

    #[test]
    fn test_zero_values_fail_validation() {
        let mut config = valid_config();
        config.segments.duration_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "segments.duration_ms", .. })
        ));
        assert!(config.segmenter().is_err());

        let mut config = valid_config();
        config.segments.concurrency = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "segments.concurrency", .. })
        ));

        let mut config = valid_config();
        config.recognition.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_workers_zero_uses_available_parallelism() {
        let mut config = valid_config();
        assert!(config.workers() >= 1);
        config.batch.workers = 3;
        assert_eq!(config.workers(), 3);
    }

    #[test]
    fn test_acrcloud_settings() {
        let mut config = valid_config();
        config.recognition.timeout_secs = 7;
        config.recognition.max_sample_ms = Some(10_000);

        let acr = config.acrcloud();
        assert_eq!(acr.access_key, "key");
        assert_eq!(acr.timeout, Duration::from_secs(7));
        assert_eq!(acr.max_sample_ms, Some(10_000));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[batch]\nworkers = 2\nrecursive = true\n\n[output]\nwrite_empty = true\n",
        )
        .unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.batch.workers, 2);
        assert!(config.batch.recursive);
        assert!(config.output.write_empty);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(load(Some(&path)), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[segments\nduration_ms = ").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::Parse(..))));
    }
}
