//! Verification of the bearer tokens issued by the hosted auth platform.

use std::{env, sync::Arc};

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

const SECRET_ENV: &str = "AUTH_JWT_SECRET";
const AUDIENCE_ENV: &str = "AUTH_JWT_AUDIENCE";

/// Failures while loading the auth settings or verifying a token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing environment variable `{0}`")]
    MissingEnvVar(&'static str),
    #[error("invalid token")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("token subject `{0}` is not a user id")]
    InvalidSubject(String),
}

/// Key material and claims expectations used to verify caller tokens.
#[derive(Clone)]
pub struct AuthConfig {
    key: Arc<DecodingKey>,
    validation: Validation,
}

impl AuthConfig {
    /// HS256 verification with the shared `secret`, no audience check.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        Self {
            key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation,
        }
    }

    /// Require the `aud` claim to contain `audience`.
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.validation.set_audience(&[audience]);
        self
    }

    /// Read `AUTH_JWT_SECRET` and the optional `AUTH_JWT_AUDIENCE`.
    pub fn from_env() -> Result<Self, AuthError> {
        let secret = env::var(SECRET_ENV)
            .ok()
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::MissingEnvVar(SECRET_ENV))?;
        let config = Self::new(&secret);

        Ok(match env::var(AUDIENCE_ENV) {
            Ok(audience) if !audience.is_empty() => config.with_audience(&audience),
            _ => config,
        })
    }

    /// Check signature and expiry, then resolve the caller from the `sub` claim.
    pub fn verify(&self, token: &str) -> Result<Caller, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        let id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AuthError::InvalidSubject(data.claims.sub.clone()))?;
        Ok(Caller { id })
    }
}

/// Claims carried by the platform access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated user id.
    pub sub: String,
    /// Expiry as a unix timestamp.
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// Verified identity of the user issuing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    /// User id taken from the verified token.
    pub id: Uuid,
}
