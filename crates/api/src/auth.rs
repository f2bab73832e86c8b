//! Editor passphrase gate.
//!
//! Editors trade the passphrase for a short-lived signed token on
//! `/v1/unlock`; write routes then require that token as a bearer
//! credential. Without a configured passphrase hash the gate stays open.

use std::time::Duration;

use argon2::password_hash::{PasswordHash, PasswordVerifier};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::error::ApiError;
use crate::state::AppState;

const EDITOR_SUBJECT: &str = "editor";

#[derive(Debug, Serialize, Deserialize)]
struct EditClaims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// A freshly issued edit token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct EditorAuth {
    password_hash: Option<String>,
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl EditorAuth {
    pub fn new(
        password_hash: Option<String>,
        jwt_secret: &str,
        ttl: Duration,
    ) -> Result<Self, ConfigError> {
        if let Some(hash) = &password_hash {
            PasswordHash::new(hash).map_err(|e| ConfigError::Invalid {
                name: "EDITOR_PASSWORD_HASH",
                value: hash.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(Self {
            password_hash,
            encoding: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(jwt_secret.as_bytes()),
            ttl,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Check the passphrase and issue an edit token.
    pub fn unlock(&self, password: &str) -> Result<EditToken, ApiError> {
        let Some(hash) = &self.password_hash else {
            return Err(ApiError::NotFound("editor gate is not configured".into()));
        };
        let parsed = PasswordHash::new(hash).map_err(|e| ApiError::Internal(e.to_string()))?;
        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_err()
        {
            tracing::warn!("unlock rejected: wrong passphrase");
            return Err(ApiError::Unauthorized("Incorrect password".into()));
        }

        let issued = Utc::now();
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| ApiError::Internal(format!("token ttl out of range: {e}")))?;
        let expires_at = issued + ttl;
        let claims = EditClaims {
            sub: EDITOR_SUBJECT.to_string(),
            iat: issued.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("failed to sign edit token: {e}")))?;

        tracing::info!(%expires_at, "edit token issued");
        Ok(EditToken { token, expires_at })
    }

    /// Validate a bearer token issued by [`EditorAuth::unlock`].
    pub fn verify(&self, token: &str) -> Result<(), ApiError> {
        let mut validation = Validation::default();
        validation.set_required_spec_claims(&["exp", "sub"]);
        let data = decode::<EditClaims>(token, &self.decoding, &validation)
            .map_err(|e| ApiError::Unauthorized(format!("invalid edit token: {e}")))?;
        if data.claims.sub != EDITOR_SUBJECT {
            return Err(ApiError::Unauthorized("invalid edit token subject".into()));
        }
        Ok(())
    }
}

/// Proof that the caller may write. Extracting it enforces the gate.
#[derive(Debug, Clone, Copy)]
pub struct EditorAccess;

impl FromRequestParts<AppState> for EditorAccess {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth = state.auth();
        if !auth.is_enabled() {
            return Ok(EditorAccess);
        }

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::Unauthorized("edit token required".into()))?;
        auth.verify(bearer.token())?;
        Ok(EditorAccess)
    }
}
