use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

/// JWT claims embedded in session tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user ID as a UUID string.
    pub sub: String,
    /// User role: `"user"`, `"admin"`, or `"super_admin"`.
    pub role: String,
    /// Token type: always `"session"`.
    pub token_type: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued-at time (Unix timestamp).
    pub iat: i64,
    /// Unique JWT identifier.
    pub jti: String,
}

/// Generate a stateless session token for the given user.
///
/// # Errors
///
/// Returns an error if JWT encoding fails.
pub fn generate_session_token(user_id: Uuid, role: &str, config: &Config) -> anyhow::Result<String> {
    let now = Utc::now();

    #[allow(clippy::cast_possible_wrap)]
    let exp = now.timestamp() + config.jwt_session_expiration_secs as i64;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        token_type: "session".to_string(),
        exp,
        iat: now.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    encode(&Header::default(), &claims, &key)
        .map_err(|e| anyhow::anyhow!("Failed to encode session token: {e}"))
}

/// Validate a session token and return its claims.
///
/// # Errors
///
/// Returns an error if the token is invalid, expired, or not a session token.
pub fn validate_session_token(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &key, &validation)
        .map_err(|e| anyhow::anyhow!("Invalid session token: {e}"))?;

    if token_data.claims.token_type != "session" {
        return Err(anyhow::anyhow!("Token is not a session token"));
    }

    Ok(token_data.claims)
}

/// Generate a short-lived JWT for OAuth CSRF state (30 minutes).
///
/// # Errors
///
/// Returns an error if JWT encoding fails.
pub fn generate_oauth_state(secret: &str, redirect_uri: Option<&str>) -> anyhow::Result<String> {
    let now = Utc::now();
    let csrf = Uuid::new_v4().to_string();

    let claims = OAuthStateClaims {
        csrf,
        redirect_uri: redirect_uri.map(String::from),
        exp: now.timestamp() + 1800, // 30 minutes
        iat: now.timestamp(),
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key)
        .map_err(|e| anyhow::anyhow!("Failed to encode OAuth state: {e}"))
}

/// Validate an OAuth CSRF state token.
///
/// # Errors
///
/// Returns an error if the state token is invalid or expired.
pub fn validate_oauth_state(state: &str, secret: &str) -> anyhow::Result<OAuthStateClaims> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<OAuthStateClaims>(state, &key, &validation)
        .map_err(|e| anyhow::anyhow!("Invalid OAuth state: {e}"))?;

    Ok(token_data.claims)
}

/// Claims for OAuth CSRF state tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct OAuthStateClaims {
    pub csrf: String,
    pub redirect_uri: Option<String>,
    pub exp: i64,
    pub iat: i64,
}
