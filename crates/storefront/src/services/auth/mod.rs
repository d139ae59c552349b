//! Client token service.
//!
//! The frontend exchanges its client ID and secret for an HS256 JWT. Issued
//! tokens are cached per client for a shorter window than their own expiry,
//! so repeated exchanges within that window hand back the same token.

mod error;

pub use error::AuthError;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use moka::future::Cache;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

/// Claims carried by a client token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Client the token was issued to.
    pub client_id: String,
    /// Always true for issued tokens.
    pub authorized: bool,
    /// Buyer email, when the issuer attached one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
    /// Expiry (seconds since epoch).
    pub exp: i64,
}

/// A token handed to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Encoded JWT.
    pub token: String,
    /// Human-readable cache window (e.g., `12h`).
    pub expires_in: String,
    /// Whether the token came from the cache.
    pub cached: bool,
}

/// Issues, caches, invalidates and verifies client tokens.
#[derive(Clone)]
pub struct TokenService {
    inner: Arc<TokenServiceInner>,
}

struct TokenServiceInner {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    cache: Cache<String, String>,
}

impl TokenService {
    /// Create a token service with an empty cache.
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        let secret = config.jwt_secret.expose_secret().as_bytes();
        let encoding_key = EncodingKey::from_secret(secret);
        let decoding_key = DecodingKey::from_secret(secret);

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.token_cache_ttl)
            .build();

        Self {
            inner: Arc::new(TokenServiceInner {
                config,
                encoding_key,
                decoding_key,
                cache,
            }),
        }
    }

    /// Check a client ID and secret against the configured pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if either value differs.
    pub fn verify_credentials(&self, client_id: &str, client_secret: &str) -> Result<(), AuthError> {
        let config = &self.inner.config;
        let id_ok = constant_time_eq(client_id.as_bytes(), config.client_id.as_bytes());
        let secret_ok = constant_time_eq(
            client_secret.as_bytes(),
            config.client_secret.expose_secret().as_bytes(),
        );

        if id_ok && secret_ok {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Return the cached token for a client, or sign and cache a new one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if the token cannot be encoded.
    pub async fn issue(&self, client_id: &str) -> Result<IssuedToken, AuthError> {
        let expires_in = format_duration(self.inner.config.token_cache_ttl);

        if let Some(token) = self.inner.cache.get(client_id).await {
            tracing::debug!(client_id = %client_id, "Returning cached client token");
            return Ok(IssuedToken {
                token,
                expires_in,
                cached: true,
            });
        }

        let token = self.sign(client_id, None)?;
        self.inner
            .cache
            .insert(client_id.to_string(), token.clone())
            .await;

        tracing::info!(client_id = %client_id, "New client token generated");
        Ok(IssuedToken {
            token,
            expires_in,
            cached: false,
        })
    }

    /// Sign a token for a client without touching the cache.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if encoding fails.
    pub fn sign(&self, client_id: &str, email: Option<String>) -> Result<String, AuthError> {
        let iat = Utc::now().timestamp();
        let lifetime = i64::try_from(self.inner.config.token_lifetime.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            client_id: client_id.to_string(),
            authorized: true,
            email,
            iat,
            exp: iat.saturating_add(lifetime),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.inner.encoding_key,
        )?)
    }

    /// Drop a client's cached token. Returns false if none was cached.
    ///
    /// The token itself stays valid until its `exp`; only reuse stops.
    pub async fn invalidate(&self, client_id: &str) -> bool {
        let removed = self.inner.cache.remove(client_id).await.is_some();
        if removed {
            tracing::info!(client_id = %client_id, "Client token invalidated");
        }
        removed
    }

    /// Verify a bearer token's signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if verification fails.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.inner.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

/// Render a duration the way clients expect it (`12h`, `30m`, `45s`).
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs > 0 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs > 0 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{secs}s")
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
