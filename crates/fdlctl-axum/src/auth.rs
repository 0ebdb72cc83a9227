//! Bearer-token auth gate.
//!
//! Stateless: a credential is either a valid, unexpired HS256 token
//! signed with the panel's key, or it is rejected. Tokens are issued
//! by exchanging the shared panel password at the login endpoint.
//! Every protected handler consults this gate before touching any job
//! state.

use axum::http::HeaderMap;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Auth settings, assembled from the environment by the CLI.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// HS256 signing key for issued tokens.
    pub signing_key: String,
    /// Shared secret exchanged for a token at login.
    pub panel_password: String,
    /// Token lifetime in seconds.
    pub token_ttl_seconds: u64,
}

/// Claims carried by an issued panel token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
    #[serde(default)]
    pub jti: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing credential")]
    MissingCredential,
    #[error("invalid authorization scheme")]
    InvalidScheme,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
    #[error("wrong password")]
    WrongPassword,
    #[error("token signing failed")]
    Signing,
}

/// Issues and verifies panel tokens.
pub struct AuthGate {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    panel_password: String,
    token_ttl_seconds: u64,
}

impl AuthGate {
    pub fn from_config(config: AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(config.signing_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.signing_key.as_bytes()),
            validation,
            panel_password: config.panel_password,
            token_ttl_seconds: config.token_ttl_seconds.max(1),
        }
    }

    /// Exchange the shared panel password for a signed, time-limited
    /// bearer token.
    pub fn login(&self, password: &str) -> Result<String, AuthError> {
        if password != self.panel_password {
            return Err(AuthError::WrongPassword);
        }
        let now = usize::try_from(chrono::Utc::now().timestamp().max(0)).unwrap_or(0);
        let claims = TokenClaims {
            sub: "panel".to_string(),
            iat: now,
            exp: now + self.token_ttl_seconds as usize,
            jti: Uuid::new_v4().to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| AuthError::Signing)
    }

    /// Validate a presented token. Malformed, unsigned, tampered or
    /// expired input yields a typed error, never a panic.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }

    /// Header-or-query authentication in one step.
    pub fn require(&self, headers: &HeaderMap, query_token: Option<&str>) -> Result<(), AuthError> {
        let token = credential(headers, query_token)?;
        self.verify(token).map(|_| ())
    }
}

/// Pull the credential from the `Authorization: Bearer` header or,
/// when the header is absent, from the connection's `token` query
/// parameter. The fallback exists solely because the streaming
/// transport cannot carry custom headers.
pub fn credential<'a>(
    headers: &'a HeaderMap,
    query_token: Option<&'a str>,
) -> Result<&'a str, AuthError> {
    match headers.get(axum::http::header::AUTHORIZATION) {
        Some(value) => {
            let raw = value.to_str().map_err(|_| AuthError::InvalidScheme)?;
            extract_bearer_token(Some(raw))
        }
        None => match query_token.map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(AuthError::MissingCredential),
        },
    }
}

pub fn extract_bearer_token(header_value: Option<&str>) -> Result<&str, AuthError> {
    let raw = header_value.ok_or(AuthError::MissingCredential)?;
    let trimmed = raw.trim();
    let Some(token) = trimmed.strip_prefix("Bearer ") else {
        return Err(AuthError::InvalidScheme);
    };
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidScheme);
    }
    Ok(token)
}

fn map_decode_error(error: jsonwebtoken::errors::Error) -> AuthError {
    match error.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    }
}
