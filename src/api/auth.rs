//! Bearer-token identity.
//!
//! Tokens are issued by the platform's identity service and signed with a
//! shared HS256 key. This module only verifies them; `sub` carries the
//! numeric user id, `email` and `name` are optional profile claims.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::domain::{DonorIdentity, UserId};
use crate::error::PlatformError;

/// Claims expected in a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a decimal string.
    pub sub: String,
    /// Expiry, seconds since the epoch.
    pub exp: u64,
    /// Account email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Account display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Verifies HS256 bearer tokens.
#[derive(Debug)]
pub struct TokenVerifier {
    secret: SecretString,
}

impl TokenVerifier {
    /// Creates a verifier for tokens signed with `secret`.
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Decodes and validates a token, returning the donor it names.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Unauthorized`] if the signature, expiry or
    /// subject is invalid.
    pub fn verify(&self, token: &str) -> Result<DonorIdentity, PlatformError> {
        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let data = decode::<Claims>(token, &key, &Validation::new(Algorithm::HS256))
            .map_err(|e| PlatformError::Unauthorized(format!("invalid token: {e}")))?;

        let user_id = data
            .claims
            .sub
            .parse::<i64>()
            .map(UserId::new)
            .map_err(|_| PlatformError::Unauthorized("token subject is not a user id".to_string()))?;

        Ok(DonorIdentity {
            user_id,
            email: data.claims.email,
            name: data.claims.name,
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// The caller's identity when a valid bearer token is present.
///
/// A missing or invalid token is not an error; the request proceeds
/// unauthenticated.
#[derive(Debug, Clone)]
pub struct MaybeDonor(pub Option<DonorIdentity>);

impl FromRequestParts<AppState> for MaybeDonor {
    type Rejection = PlatformError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Self(None));
        };
        match state.tokens.verify(token) {
            Ok(identity) => Ok(Self(Some(identity))),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring invalid bearer token");
                Ok(Self(None))
            }
        }
    }
}

/// An authenticated caller. Rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct Donor(pub DonorIdentity);

impl FromRequestParts<AppState> for Donor {
    type Rejection = PlatformError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| PlatformError::Unauthorized("bearer token required".to_string()))?;
        state.tokens.verify(token).map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::test_support::{JWT_SECRET, issue_token};

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(SecretString::new(JWT_SECRET.into()))
    }

    #[test]
    fn valid_token_yields_identity() {
        let token = issue_token(UserId::new(17), Some("lin@example.org"));
        let Ok(identity) = verifier().verify(&token) else {
            panic!("token should verify");
        };
        assert_eq!(identity.user_id, UserId::new(17));
        assert_eq!(identity.email.as_deref(), Some("lin@example.org"));
    }

    #[test]
    fn token_signed_with_another_key_is_rejected() {
        let token = issue_token(UserId::new(17), None);
        let other = TokenVerifier::new(SecretString::new("another-secret".into()));
        assert!(matches!(other.verify(&token), Err(PlatformError::Unauthorized(_))));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            verifier().verify("not.a.token"),
            Err(PlatformError::Unauthorized(_))
        ));
    }
}
