//! Request signing for the identify endpoint.
//!
//! `signature = base64(HMAC-SHA1(access_secret, string_to_sign))` where the
//! string to sign is the newline-joined method, URI, access key, data type,
//! signature version and timestamp.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

pub const HTTP_METHOD: &str = "POST";
pub const HTTP_URI: &str = "/v1/identify";
pub const DATA_TYPE: &str = "audio";
pub const SIGNATURE_VERSION: &str = "1";

pub fn string_to_sign(access_key: &str, timestamp: i64) -> String {
    format!(
        "{HTTP_METHOD}\n{HTTP_URI}\n{access_key}\n{DATA_TYPE}\n{SIGNATURE_VERSION}\n{timestamp}"
    )
}

pub fn sign(
    access_key: &str,
    access_secret: &str,
    timestamp: i64,
) -> Result<String, hmac::digest::InvalidLength> {
    let mut mac = HmacSha1::new_from_slice(access_secret.as_bytes())?;
    mac.update(string_to_sign(access_key, timestamp).as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
