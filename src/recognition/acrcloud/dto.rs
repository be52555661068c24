//! ACRCloud identify API Data Transfer Objects
//!
//! These types match what the identify endpoint returns.
//! DO NOT use these types outside the acrcloud module - convert to domain types.
//!
//! Example response:
//! ```json
//! {
//!   "status": {"msg": "Success", "code": 0, "version": "1.0"},
//!   "metadata": {
//!     "music": [{
//!       "title": "Song Title",
//!       "artists": [{"name": "Artist Name"}],
//!       "album": {"name": "Album"},
//!       "acrid": "6049f11da7095e8bb8266871d4a70873",
//!       "score": 100,
//!       "play_offset_ms": 9000
//!     }],
//!     "timestamp_utc": "2024-01-01 00:00:00"
//!   },
//!   "result_type": 0,
//!   "cost_time": 0.7
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Top-level identify response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IdentifyResponse {
    pub status: Status,
    /// Present only when the service found something
    pub metadata: Option<Metadata>,
    pub result_type: Option<i64>,
    pub cost_time: Option<f64>,
}

/// Status block; `code == 0` means success
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Status {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Metadata {
    /// Ranked candidates, best first
    #[serde(default)]
    pub music: Vec<Music>,
    pub timestamp_utc: Option<String>,
}

/// One candidate recording
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Music {
    pub title: Option<String>,
    /// Credited artists, primary first
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub album: Option<Album>,
    pub acrid: Option<String>,
    /// Match confidence (0 to 100)
    pub score: Option<f64>,
    pub play_offset_ms: Option<i64>,
    pub duration_ms: Option<i64>,
    pub release_date: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Album {
    pub name: Option<String>,
}

// ============================================================================
// CONTRACT TESTS
// These verify our DTOs match what the real API returns.
// ============================================================================
