//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Every error renders as the
//! JSON envelope `{success: false, message, error?}`; server-side failures
//! are captured to Sentry before responding.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::shopify::ShopifyError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// A cart operation failed; `context` is the client-facing summary.
    #[error("{context}: {source}")]
    Cart {
        context: &'static str,
        #[source]
        source: CartError,
    },

    /// Token issuance or verification failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<CartError> for AppError {
    fn from(source: CartError) -> Self {
        Self::Cart {
            context: "Cart operation failed",
            source,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Attach a client-facing summary to a failed cart operation.
pub trait CartResultExt<T> {
    /// Wrap the error as `AppError::Cart` with the given summary.
    ///
    /// # Errors
    ///
    /// Returns the wrapped error if `self` is `Err`.
    fn context(self, context: &'static str) -> std::result::Result<T, AppError>;
}

impl<T> CartResultExt<T> for std::result::Result<T, CartError> {
    fn context(self, context: &'static str) -> std::result::Result<T, AppError> {
        self.map_err(|source| AppError::Cart { context, source })
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Cart { source, .. } => match source {
                CartError::Invalid(_) => StatusCode::BAD_REQUEST,
                CartError::NotFound(_) => StatusCode::NOT_FOUND,
                CartError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CartError::Upstream(ShopifyError::RateLimited(_)) => StatusCode::TOO_MANY_REQUESTS,
                CartError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials
                | AuthError::MissingToken
                | AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn body(&self) -> ErrorBody {
        let (message, error) = match self {
            Self::Cart { context, source } => match source {
                // Validation and lookup failures are the whole story.
                CartError::Invalid(msg) | CartError::NotFound(msg) => (msg.clone(), None),
                CartError::Rejected(msg) => ((*context).to_string(), Some(msg.clone())),
                CartError::Upstream(err) => ((*context).to_string(), Some(err.to_string())),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => ("Invalid client credentials".to_string(), None),
                AuthError::MissingToken => ("Access denied. No token provided.".to_string(), None),
                AuthError::InvalidToken(_) => ("Invalid or expired token".to_string(), None),
                AuthError::Signing(_) => ("Failed to generate token".to_string(), None),
            },
            Self::NotFound(msg) | Self::BadRequest(msg) => (msg.clone(), None),
        };

        ErrorBody {
            success: false,
            message,
            error,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        (status, Json(self.body())).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for a cart action.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Cart not found".to_string());
        assert_eq!(err.to_string(), "Not found: Cart not found");

        let err = CartError::Rejected("bad line".to_string());
        let err: AppError = Err::<(), _>(err).context("Failed to add items to cart").unwrap_err();
        assert_eq!(err.to_string(), "Failed to add items to cart: bad line");
    }

    #[tokio::test]
    async fn test_validation_error_envelope() {
        let (status, body) =
            render(CartError::Invalid("userId is required".to_string()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "userId is required");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_rejected_error_envelope() {
        let err = Err::<(), _>(CartError::Rejected("Variant does not exist".to_string()))
            .context("Failed to add items to cart")
            .unwrap_err();
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "Failed to add items to cart");
        assert_eq!(body["error"], "Variant does not exist");
    }

    #[tokio::test]
    async fn test_upstream_error_envelope() {
        let err = Err::<(), _>(CartError::Upstream(ShopifyError::Status {
            status: 503,
            body: "down".to_string(),
        }))
        .context("Failed to get cart")
        .unwrap_err();
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Failed to get cart");
        assert_eq!(body["error"], "HTTP 503: down");
    }

    #[tokio::test]
    async fn test_auth_error_envelope() {
        let (status, body) = render(AuthError::InvalidCredentials.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid client credentials");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::NotFound("test".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::BadRequest("test".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(AuthError::Signing(
                jsonwebtoken::errors::ErrorKind::InvalidKeyFormat.into()
            ))
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(CartError::Upstream(ShopifyError::RateLimited(3))).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::from(CartError::NotFound("Cart not found".to_string())).status(),
            StatusCode::NOT_FOUND
        );
    }
}
