//! Client token error types.

use thiserror::Error;

/// Errors that can occur while issuing or verifying client tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The client ID or secret did not match.
    #[error("invalid client credentials")]
    InvalidCredentials,

    /// No bearer token was presented.
    #[error("no token provided")]
    MissingToken,

    /// The token failed signature or expiry checks.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Signing the token failed.
    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}
