//! Bearer-token authentication extractor.
//!
//! Cart routes require a token issued by `POST /auth/token`, presented as
//! `Authorization: Bearer <token>`.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AppError;
use crate::services::auth::{AuthError, Claims};
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// Rejects with 401 when the header is missing or the token fails
/// verification.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireBearer(claims): RequireBearer,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", claims.client_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireBearer(pub Claims);

impl FromRequestParts<AppState> for RequireBearer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;

        let claims = state.tokens().verify(token).inspect_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
        })?;

        sentry::configure_scope(|scope| {
            scope.set_tag("client_id", &claims.client_id);
        });

        Ok(Self(claims))
    }
}

/// The token from an `Authorization: Bearer` header, if present and non-empty.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
