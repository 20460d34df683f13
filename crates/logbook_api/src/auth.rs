//! Session tokens and the per-request identity extractor.
//!
//! Tokens are HS256 JWTs. Only the verified claims decide who the caller
//! is and which role they hold.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use logbook_core::models::Role;
use logbook_core::{LogbookError, RequestContext, Result};

use crate::error::ApiError;
use crate::AppState;

/// Cookie the identity provider's front-end SDK stores the session in.
pub const SESSION_COOKIE: &str = "__session";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<Uuid>,
    #[serde(default)]
    pub banned: bool,
}

pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
}

impl SessionKeys {
    /// `issuers` lists every accepted `iss`; the first one is used when
    /// minting tokens.
    pub fn new(secret: &str, issuers: &[String]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 60; // clock skew
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        if !issuers.is_empty() {
            validation.set_issuer(issuers);
        }

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer: issuers
                .first()
                .cloned()
                .unwrap_or_else(|| "residency-logbook".to_string()),
        }
    }

    pub fn issue_session_token(
        &self,
        user_id: &str,
        role: Role,
        batch_id: Option<Uuid>,
        ttl: Duration,
    ) -> Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            iss: self.issuer.clone(),
            exp: (now + ttl).unix_timestamp(),
            iat: now.unix_timestamp(),
            role,
            batch_id,
            banned: false,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| LogbookError::Internal(format!("failed to sign session token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "rejected session token");
                LogbookError::Unauthorized
            })
    }
}

/// Bearer header first, then the session cookie.
fn session_token(parts: &Parts) -> Option<&str> {
    if let Some(value) = parts.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Some(token.trim());
        }
    }

    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

/// The verified caller. Extracting it fails with 401 when no valid
/// session is present and 403 when the account is banned.
#[derive(Debug, Clone)]
pub struct Session(pub RequestContext);

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        let token = session_token(parts).ok_or(LogbookError::Unauthorized)?;
        let claims = state.sessions.verify(token)?;

        if claims.banned {
            return Err(LogbookError::forbidden("account is banned").into());
        }

        Ok(Session(RequestContext::new(claims.sub, claims.role)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> SessionKeys {
        SessionKeys::new("test-secret", &["residency-logbook".to_string()])
    }

    #[test]
    fn test_issued_token_verifies() {
        let keys = keys();
        let token = keys
            .issue_session_token("user_1", Role::Faculty, None, Duration::hours(1))
            .unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "user_1");
        assert_eq!(claims.role, Role::Faculty);
        assert!(!claims.banned);
    }

    #[test]
    fn test_foreign_issuer_and_secret_are_rejected() {
        let token = SessionKeys::new("test-secret", &["someone-else".to_string()])
            .issue_session_token("user_1", Role::Hod, None, Duration::hours(1))
            .unwrap();
        assert!(matches!(keys().verify(&token), Err(LogbookError::Unauthorized)));

        let token = SessionKeys::new("other-secret", &["residency-logbook".to_string()])
            .issue_session_token("user_1", Role::Hod, None, Duration::hours(1))
            .unwrap();
        assert!(matches!(keys().verify(&token), Err(LogbookError::Unauthorized)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let keys = keys();
        let token = keys
            .issue_session_token("user_1", Role::Student, None, Duration::hours(-2))
            .unwrap();
        assert!(matches!(keys.verify(&token), Err(LogbookError::Unauthorized)));
    }
}
