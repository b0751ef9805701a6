//! Credential codec: issuance and validation of signed, expiring tokens.
//!
//! Both token kinds are RS256-signed JWTs (asymmetric: issued with the
//! private key, verified with the public key). Access tokens carry only
//! the subject; refresh tokens additionally carry a unique `jti` session
//! id that binds them to a device row. The codec never checks the kind
//! tag itself -- callers do, via [`Claims::require_kind`].

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use keygate_core::error::AuthError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token kind tag embedded in the `type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT claims embedded in every token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's id.
    pub sub: Uuid,
    /// Token kind tag (`"access"` or `"refresh"`).
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Session id. Present on refresh tokens only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<Uuid>,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// Enforce the expected kind tag, which the codec itself leaves to
    /// the caller (the access guard requires `access`, the session
    /// engine requires `refresh`).
    pub fn require_kind(&self, expected: TokenKind) -> Result<(), AuthError> {
        if self.kind != expected {
            return Err(AuthError::InvalidTokenType {
                found: self.kind.as_str().to_string(),
                expected: expected.as_str().to_string(),
            });
        }
        Ok(())
    }

    /// Seconds until this token expires; zero if already expired.
    pub fn remaining_secs(&self) -> u64 {
        let now = chrono::Utc::now().timestamp();
        (self.exp - now).max(0) as u64
    }
}

/// Configuration for token generation and validation.
#[derive(Clone)]
pub struct JwtConfig {
    /// PEM-encoded RSA private key used to sign tokens.
    pub private_key_pem: String,
    /// PEM-encoded RSA public key used to verify tokens.
    pub public_key_pem: String,
    /// Signing algorithm (default: RS256).
    pub algorithm: Algorithm,
    /// Access token lifetime in minutes (default: 3).
    pub access_expiry_mins: i64,
    /// Refresh token lifetime in minutes (default: 43200 = 30 days).
    pub refresh_expiry_mins: i64,
}

impl std::fmt::Debug for JwtConfig {
    // Keys stay out of logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &self.algorithm)
            .field("access_expiry_mins", &self.access_expiry_mins)
            .field("refresh_expiry_mins", &self.refresh_expiry_mins)
            .finish_non_exhaustive()
    }
}

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 3;
/// Default refresh token expiry in minutes (30 days).
const DEFAULT_REFRESH_EXPIRY_MINS: i64 = 30 * 24 * 60;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                    | Required | Default |
    /// |----------------------------|----------|---------|
    /// | `JWT_PRIVATE_KEY`          | **yes**  | --      |
    /// | `JWT_PUBLIC_KEY`           | **yes**  | --      |
    /// | `JWT_ALGORITHM`            | no       | `RS256` |
    /// | `JWT_ACCESS_EXPIRY_MINS`   | no       | `3`     |
    /// | `JWT_REFRESH_EXPIRY_MINS`  | no       | `43200` |
    ///
    /// # Panics
    ///
    /// Panics if a required key is missing or a value fails to parse.
    pub fn from_env() -> Self {
        let private_key_pem =
            std::env::var("JWT_PRIVATE_KEY").expect("JWT_PRIVATE_KEY must be set (PEM text)");
        let public_key_pem =
            std::env::var("JWT_PUBLIC_KEY").expect("JWT_PUBLIC_KEY must be set (PEM text)");

        let algorithm: Algorithm = std::env::var("JWT_ALGORITHM")
            .unwrap_or_else(|_| "RS256".into())
            .parse()
            .expect("JWT_ALGORITHM must be a valid JWT algorithm identifier");

        let access_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");

        let refresh_expiry_mins: i64 = std::env::var("JWT_REFRESH_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_REFRESH_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_REFRESH_EXPIRY_MINS must be a valid i64");

        Self {
            private_key_pem,
            public_key_pem,
            algorithm,
            access_expiry_mins,
            refresh_expiry_mins,
        }
    }
}

/// Issue a short-lived access token for the given user. Never carries a jti.
pub fn issue_access_token(user_id: Uuid, config: &JwtConfig) -> Result<String, AuthError> {
    issue_token(user_id, TokenKind::Access, None, config.access_expiry_mins, config)
}

/// Issue a refresh token with a freshly generated session id, returning
/// the token together with the embedded jti.
pub fn issue_refresh_token(
    user_id: Uuid,
    config: &JwtConfig,
) -> Result<(String, Uuid), AuthError> {
    let jti = Uuid::new_v4();
    let token = issue_token(
        user_id,
        TokenKind::Refresh,
        Some(jti),
        config.refresh_expiry_mins,
        config,
    )?;
    Ok((token, jti))
}

fn issue_token(
    user_id: Uuid,
    kind: TokenKind,
    jti: Option<Uuid>,
    expire_minutes: i64,
    config: &JwtConfig,
) -> Result<String, AuthError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        kind,
        jti,
        iat: now,
        exp: now + expire_minutes * 60,
    };

    let key = EncodingKey::from_rsa_pem(config.private_key_pem.as_bytes())
        .map_err(|e| AuthError::Internal(format!("Invalid signing key: {e}")))?;

    encode(&Header::new(config.algorithm), &claims, &key)
        .map_err(|e| AuthError::Internal(format!("Token encoding error: {e}")))
}

/// Verify signature, structure, and expiry, returning the embedded
/// [`Claims`]. Any failure collapses into [`AuthError::InvalidToken`];
/// the kind tag is deliberately NOT checked here.
pub fn decode_token(token: &str, config: &JwtConfig) -> Result<Claims, AuthError> {
    let key = DecodingKey::from_rsa_pem(config.public_key_pem.as_bytes())
        .map_err(|e| AuthError::Internal(format!("Invalid verification key: {e}")))?;

    let mut validation = Validation::new(config.algorithm);
    // No clock-skew grace: an expired token is expired.
    validation.leeway = 0;

    let token_data =
        decode::<Claims>(token, &key, &validation).map_err(|_| AuthError::InvalidToken)?;
    Ok(token_data.claims)
}
