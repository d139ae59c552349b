//! Client token route handlers.
//!
//! The frontend trades its client credentials for a bearer token here.

use axum::{extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::routes::envelope::{ApiJson, ApiResponse};
use crate::state::AppState;

/// `POST /auth/token` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// `POST /auth/logout` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub client_id: Option<String>,
}

/// Issued token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub success: bool,
    pub token: String,
    pub expires_in: String,
    pub cached: bool,
    pub message: &'static str,
}

impl IntoResponse for TokenResponse {
    fn into_response(self) -> axum::response::Response {
        axum::Json(self).into_response()
    }
}

/// Issue or reuse a client token (POST /auth/token).
#[instrument(skip(state, body))]
pub async fn token(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TokenRequest>,
) -> Result<TokenResponse> {
    let tokens = state.tokens();
    let client_id = body.client_id.unwrap_or_default();

    tokens.verify_credentials(&client_id, body.client_secret.as_deref().unwrap_or_default())?;
    let issued = tokens.issue(&client_id).await?;

    Ok(TokenResponse {
        success: true,
        token: issued.token,
        expires_in: issued.expires_in,
        cached: issued.cached,
        message: if issued.cached {
            "Returning existing valid token"
        } else {
            "New token generated"
        },
    })
}

/// Invalidate a client's cached token (POST /auth/logout).
#[instrument(skip(state, body))]
pub async fn logout(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LogoutRequest>,
) -> Result<ApiResponse<()>> {
    let client_id = body
        .client_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("clientId is required".to_string()))?;

    if state.tokens().invalidate(&client_id).await {
        Ok(ApiResponse::message("Token invalidated successfully"))
    } else {
        Err(AppError::NotFound(
            "No active token found for this client".to_string(),
        ))
    }
}
