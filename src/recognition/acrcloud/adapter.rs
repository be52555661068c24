//! Adapter layer: Convert identify DTOs to domain results
//!
//! This is the ONLY place where DTO types are converted to domain types.

use super::dto;
use crate::model::SongIdentity;
use crate::recognition::domain::RecognitionError;

/// Status codes the service uses on the identify endpoint.
pub mod codes {
    pub const SUCCESS: i64 = 0;
    pub const NO_RESULT: i64 = 1001;
    pub const INVALID_ACCESS_KEY: i64 = 3001;
    pub const LIMIT_EXCEEDED: i64 = 3003;
    pub const INVALID_SIGNATURE: i64 = 3014;
    pub const QPS_LIMIT: i64 = 3015;
}

/// Interpret an identify response.
///
/// `Ok(Some)` carries the first (best ranked) candidate; lower-ranked ones
/// are discarded. `Ok(None)` is an explicit no-match.
pub fn to_identity(
    response: dto::IdentifyResponse,
) -> Result<Option<SongIdentity>, RecognitionError> {
    let dto::Status { code, msg, .. } = response.status;

    match code {
        codes::SUCCESS => {}
        codes::NO_RESULT => return Ok(None),
        codes::INVALID_ACCESS_KEY | codes::INVALID_SIGNATURE => {
            return Err(RecognitionError::Auth { code, message: msg });
        }
        codes::LIMIT_EXCEEDED | codes::QPS_LIMIT => {
            return Err(RecognitionError::RateLimited { code, message: msg });
        }
        _ => return Err(RecognitionError::Service { code, message: msg }),
    }

    let Some(best) = response
        .metadata
        .and_then(|m| m.music.into_iter().next())
    else {
        return Ok(None);
    };

    let title = best
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| RecognitionError::InvalidResponse("candidate has no title".to_string()))?;

    // Primary artist only; an uncredited recording keeps an empty artist
    let artist = best
        .artists
        .into_iter()
        .next()
        .map(|a| a.name)
        .unwrap_or_default();

    Ok(Some(SongIdentity { title, artist }))
}
