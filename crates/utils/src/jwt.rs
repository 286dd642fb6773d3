//! Validation of session bearer tokens.
//!
//! Token issuance lives with the identity provider; this module only turns a
//! presented token into the acting user + tenant, or rejects it.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token")]
    InvalidToken,
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Claims embedded in a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID the session belongs to
    pub sub: Uuid,
    /// Tenant the user acts within
    pub tenant_id: Uuid,
    /// Expiration timestamp
    pub exp: i64,
}

/// The acting identity behind a validated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
}

/// Validate a session token and return the acting identity.
pub fn validate_session(token: &str, secret: &str) -> Result<AuthContext, TokenError> {
    if token.trim().is_empty() {
        return Err(TokenError::InvalidToken);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 30; // clock skew

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let data = decode::<SessionClaims>(token, &decoding_key, &validation)?;

    Ok(AuthContext {
        user_id: data.claims.sub,
        tenant_id: data.claims.tenant_id,
    })
}
