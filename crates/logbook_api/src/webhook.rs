//! Verification of signed identity-provider webhooks.
//!
//! The provider signs `"{svix-id}.{svix-timestamp}.{body}"` with
//! HMAC-SHA256 and sends `svix-signature: v1,<base64>` (several
//! space-separated signatures during secret rotation).

use axum::http::HeaderMap;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

const SECRET_PREFIX: &str = "whsec_";
const TOLERANCE_SECS: i64 = 5 * 60;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WebhookError {
    #[error("Invalid webhook secret: {0}")]
    InvalidSecret(String),

    #[error("Missing header: {0}")]
    MissingHeader(&'static str),

    #[error("Invalid timestamp header")]
    InvalidTimestamp,

    #[error("Timestamp outside the {}s tolerance", TOLERANCE_SECS)]
    StaleTimestamp,

    #[error("No matching signature")]
    SignatureMismatch,
}

pub struct WebhookVerifier {
    keyed: HmacSha256,
}

impl WebhookVerifier {
    /// Accepts `whsec_<base64>` (the prefix is optional).
    pub fn from_secret(secret: &str) -> Result<Self, WebhookError> {
        let encoded = secret.trim();
        let encoded = encoded.strip_prefix(SECRET_PREFIX).unwrap_or(encoded);
        let key = STANDARD
            .decode(encoded)
            .map_err(|e| WebhookError::InvalidSecret(e.to_string()))?;
        if key.is_empty() {
            return Err(WebhookError::InvalidSecret("empty key".to_string()));
        }
        let keyed = HmacSha256::new_from_slice(&key)
            .map_err(|e| WebhookError::InvalidSecret(e.to_string()))?;
        Ok(Self { keyed })
    }

    fn mac(&self, id: &str, timestamp: i64, body: &[u8]) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);
        mac
    }

    /// `v1,<base64>` signature for the given message.
    pub fn sign(&self, id: &str, timestamp: i64, body: &[u8]) -> String {
        let digest = self.mac(id, timestamp, body).finalize().into_bytes();
        format!("v1,{}", STANDARD.encode(digest))
    }

    pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), WebhookError> {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        self.verify_at(headers, body, now)
    }

    pub fn verify_at(&self, headers: &HeaderMap, body: &[u8], now: i64) -> Result<(), WebhookError> {
        let id = header(headers, HEADER_ID)?;
        let timestamp: i64 = header(headers, HEADER_TIMESTAMP)?
            .trim()
            .parse()
            .map_err(|_| WebhookError::InvalidTimestamp)?;
        let signatures = header(headers, HEADER_SIGNATURE)?;

        if now.abs_diff(timestamp) > TOLERANCE_SECS.unsigned_abs() {
            return Err(WebhookError::StaleTimestamp);
        }

        let expected = self.mac(id, timestamp, body);
        let matched = signatures
            .split_whitespace()
            .filter_map(|candidate| candidate.split_once(','))
            .filter(|(version, _)| *version == "v1")
            .filter_map(|(_, sig)| STANDARD.decode(sig).ok())
            .any(|sig| expected.clone().verify_slice(&sig).is_ok());

        if matched {
            Ok(())
        } else {
            Err(WebhookError::SignatureMismatch)
        }
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::MissingHeader(name))
}
