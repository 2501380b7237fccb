//! # Authentication
//!
//! JWT issuance/validation and Argon2 password hashing.
//!
//! ## Token Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/auth/login                                                   │
//! │     │  verify Argon2 hash, check is_active                              │
//! │     ▼                                                                   │
//! │  JWT { sub: user_id, iat, exp }  ← signed HS256                         │
//! │     │                                                                   │
//! │     ▼  every later request                                              │
//! │  AuthUser extractor: validate signature/expiry, then load the           │
//! │  Principal (role + grants) FRESH from the database                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The token carries only the user id. Role and permission grants are
//! re-read per request, so deactivating a user or revoking a grant takes
//! effect immediately instead of at token expiry.

use std::time::Duration;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use zargar_core::Principal;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// =============================================================================
// Passwords
// =============================================================================

/// Hashes a plaintext password with a fresh random salt.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

/// Verifies a plaintext password against a stored Argon2 hash.
pub fn verify_password(password: &str, stored_hash: &str) -> ApiResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ApiError::Internal(format!("stored hash is malformed: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

// =============================================================================
// JWT
// =============================================================================

/// Claims stored in the access token. Deliberately minimal: authority
/// lives in the database, not the token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    /// Expiry (unix seconds).
    pub exp: i64,
    /// Issued at (unix seconds).
    pub iat: i64,
}

/// Signs and validates access tokens.
#[derive(Clone)]
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl JwtManager {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: ttl.as_secs() as i64,
        }
    }

    /// Issues a token for a user id.
    pub fn issue(&self, user_id: &str) -> ApiResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: now + self.ttl_secs,
            iat: now,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("token generation failed: {e}")))
    }

    /// Validates signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::Unauthorized("token expired".to_string())
                }
                _ => ApiError::Unauthorized("invalid token".to_string()),
            })
    }
}

// =============================================================================
// Extractor
// =============================================================================

/// The authenticated caller. Handlers take this as an argument; a
/// missing or bad token rejects the request with 401 before the handler
/// body runs.
pub struct AuthUser(pub Principal);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing authorization header".to_string()))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("malformed authorization header".to_string()))?;

        let claims = state.jwt.verify(token)?;

        // Role and grants come from the database, not the token, so
        // revocation is immediate.
        let principal = state
            .db
            .users()
            .load_principal(&claims.sub)
            .await
            .map_err(|_| ApiError::Unauthorized("account unknown or deactivated".to_string()))?;

        Ok(AuthUser(principal))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("s3cret").unwrap();
        assert!(verify_password("s3cret", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_jwt_round_trip() {
        let jwt = JwtManager::new("test-secret-key", Duration::from_secs(60));
        let token = jwt.issue("user-1").unwrap();
        let claims = jwt.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
    }

    #[test]
    fn test_jwt_rejects_garbage() {
        let jwt = JwtManager::new("test-secret-key", Duration::from_secs(60));
        assert!(jwt.verify("not-a-token").is_err());
    }
}
