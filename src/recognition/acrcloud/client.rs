//! ACRCloud identify HTTP client
//!
//! Sends one segment per request as a signed multipart POST to
//! `https://<host>/v1/identify`. The form carries the WAV sample and the
//! authentication block (`access_key`, `timestamp`, `signature`), see
//! [`super::signature`].
//!
//! The sample is encoded in memory and dropped when the call returns; no
//! file is written for a request.

use std::time::Duration;

use reqwest::multipart::{Form, Part};

use super::{adapter, dto, signature};
use crate::audio::wav;
use crate::model::{AudioSegment, SongIdentity};
use crate::recognition::domain::RecognitionError;

/// Explicit client configuration; there is no process-wide client state.
#[derive(Debug, Clone)]
pub struct AcrCloudConfig {
    /// Regional identify host, e.g. `identify-eu-west-1.acrcloud.com`.
    /// A value with an `http://` or `https://` scheme is used as-is.
    pub host: String,
    pub access_key: String,
    pub access_secret: String,
    /// Whole-request timeout
    pub timeout: Duration,
    /// Send only the leading part of each segment
    pub max_sample_ms: Option<u64>,
}

impl AcrCloudConfig {
    fn endpoint(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}{}", host, signature::HTTP_URI)
        } else {
            format!("https://{}{}", host, signature::HTTP_URI)
        }
    }
}

/// ACRCloud identify client
pub struct AcrCloudClient {
    config: AcrCloudConfig,
    http_client: reqwest::Client,
    endpoint: String,
}

impl AcrCloudClient {
    /// Create a new client
    ///
    /// The client is configured to:
    /// - Abort requests after the configured timeout
    /// - Accept gzip-compressed responses
    /// - Send User-Agent header identifying the application
    pub fn new(config: AcrCloudConfig) -> Result<Self, RecognitionError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            endpoint: config.endpoint(),
            config,
            http_client,
        })
    }

    /// Create a client for testing against a local server
    #[cfg(test)]
    pub fn with_base_url(config: AcrCloudConfig, base_url: &str) -> Self {
        Self {
            endpoint: format!("{}{}", base_url, signature::HTTP_URI),
            http_client: reqwest::Client::builder()
                .timeout(config.timeout)
                .no_proxy()
                .build()
                .unwrap(),
            config,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Recognize one segment.
    ///
    /// `Ok(None)` is an explicit no-match from the service.
    pub async fn identify(
        &self,
        segment: &AudioSegment<'_>,
    ) -> Result<Option<SongIdentity>, RecognitionError> {
        let sample = wav::encode_segment(segment, self.config.max_sample_ms)
            .map_err(|e| RecognitionError::Encode(e.to_string()))?;
        tracing::debug!(
            target: "recognition::acrcloud",
            segment = segment.index,
            bytes = sample.len(),
            "Sending sample"
        );
        let response = self.send_identify_request(sample).await?;
        tracing::debug!(
            target: "recognition::acrcloud",
            segment = segment.index,
            code = response.status.code,
            candidates = response.metadata.as_ref().map_or(0, |m| m.music.len()),
            "Identify response"
        );
        adapter::to_identity(response)
    }

    /// Build the signed form, send it and parse the response
    async fn send_identify_request(
        &self,
        sample: Vec<u8>,
    ) -> Result<dto::IdentifyResponse, RecognitionError> {
        let timestamp = chrono::Utc::now().timestamp();
        let signature = signature::sign(
            &self.config.access_key,
            &self.config.access_secret,
            timestamp,
        )
        .map_err(|e| RecognitionError::Signing(e.to_string()))?;

        let sample_bytes = sample.len();
        let part = Part::bytes(sample)
            .file_name("sample.wav")
            .mime_str("audio/wav")?;

        let form = Form::new()
            .part("sample", part)
            .text("sample_bytes", sample_bytes.to_string())
            .text("access_key", self.config.access_key.clone())
            .text("data_type", signature::DATA_TYPE)
            .text("signature_version", signature::SIGNATURE_VERSION)
            .text("signature", signature)
            .text("timestamp", timestamp.to_string());

        let response = self
            .http_client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RecognitionError::Http {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<dto::IdentifyResponse>(&body).map_err(|e| {
            let snippet: String = body.chars().take(120).collect();
            RecognitionError::Parse(format!("{} (body: {})", e, snippet))
        })
    }
}
