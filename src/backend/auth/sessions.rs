/**
 * Session Token Validation
 *
 * This module validates the JWT bearer tokens minted by the external
 * identity provider and resolves them to the current user. Token issuance
 * lives outside this core; `create_token` exists so tests and local tooling
 * can mint tokens compatible with validation.
 */
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::backend::error::ApiError;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Display name (optional decoration)
    #[serde(default)]
    pub username: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

/// The authenticated caller of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: Option<String>,
}

/// Get JWT secret from environment
fn get_jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!("[Auth] JWT_SECRET not set, using development default");
        "dev-secret-change-in-production".to_string()
    })
}

/// Create a JWT token for a user
///
/// Issuance belongs to the identity provider; this helper mints tokens the
/// validator accepts, for tests and local development.
pub fn create_token(
    user_id: Uuid,
    username: Option<String>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    // Token expires in 30 days
    let claims = Claims {
        sub: user_id.to_string(),
        username,
        exp: now + (30 * 24 * 60 * 60),
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_jwt_secret().as_bytes()),
    )
}

/// Verify a JWT token and return its claims
pub fn verify_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_jwt_secret().as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Resolve the current user from request headers
///
/// Every messaging operation requires an authenticated caller. Absence of
/// the `Authorization` header, a malformed bearer token, or a rejected
/// signature all surface as `ApiError::Authentication` (401).
pub fn extract_current_user(headers: &axum::http::HeaderMap) -> Result<CurrentUser, ApiError> {
    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::authentication("missing Authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::authentication("expected bearer token"))?;

    let claims =
        verify_token(token).map_err(|e| ApiError::authentication(format!("invalid token: {}", e)))?;

    let id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::authentication("token subject is not a user id"))?;

    Ok(CurrentUser {
        id,
        username: claims.username,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn test_token_roundtrip() {
        let user_id = Uuid::new_v4();
        let token = create_token(user_id, Some("alice".to_string())).unwrap();
        let claims = verify_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_extract_current_user() {
        let user_id = Uuid::new_v4();
        let token = create_token(user_id, None).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );

        let user = extract_current_user(&headers).unwrap();
        assert_eq!(user.id, user_id);
    }

    #[test]
    fn test_missing_header_is_authentication_error() {
        let headers = HeaderMap::new();
        let err = extract_current_user(&headers).unwrap_err();
        match err {
            ApiError::Authentication { .. } => {}
            other => panic!("Expected Authentication error, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_token_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_static("Bearer not-a-real-token"),
        );
        assert!(extract_current_user(&headers).is_err());
    }
}
