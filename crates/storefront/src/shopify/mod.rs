//! Shopify Storefront and Admin API clients.
//!
//! # Architecture
//!
//! - Carts live in Shopify; the BFF keeps no local copy
//! - The Storefront API (GraphQL) creates and mutates carts
//! - The Admin API (REST) stores each customer's cart ID in a metafield
//!
//! Both APIs sit behind a trait ([`CartApi`], [`CustomerMetafieldStore`]) so
//! the cart session manager can be driven by in-memory fakes in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use headless_bff::shopify::{CartApi, StorefrontClient};
//!
//! let client = StorefrontClient::new(&config.shopify, http);
//! let cart = client.create_cart(None).await?;
//! let cart = client.add_lines(&cart.id, vec![CartLineInput {
//!     merchandise_id: "gid://shopify/ProductVariant/1".to_string(),
//!     quantity: 2,
//! }]).await?;
//! ```

mod admin;
mod storefront;
pub mod types;

pub use admin::AdminClient;
pub use storefront::StorefrontClient;
pub use types::*;

use async_trait::async_trait;
use headless_bff_core::CustomerId;
use thiserror::Error;

/// Errors that can occur when interacting with Shopify APIs.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Shopify answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Response status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A response field could not be interpreted.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// User error from mutation (e.g., invalid input).
    #[error("User error: {0}")]
    UserError(String),
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

impl GraphQLError {
    /// An error carrying only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
        }
    }
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Service Seams
// =============================================================================

/// Cart operations backed by the Storefront API.
///
/// Every mutation returns the full updated cart. Mutations rejected by Shopify
/// surface as [`ShopifyError::UserError`] carrying the first reported message.
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Create an empty cart, optionally tied to a buyer.
    async fn create_cart(
        &self,
        buyer_identity: Option<BuyerIdentityInput>,
    ) -> Result<Cart, ShopifyError>;

    /// Fetch a cart. Unknown or expired carts yield [`ShopifyError::NotFound`].
    async fn get_cart(&self, cart_id: &str) -> Result<Cart, ShopifyError>;

    /// Add merchandise lines.
    async fn add_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError>;

    /// Set quantities on existing lines (zero removes the line).
    async fn update_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError>;

    /// Remove lines by ID.
    async fn remove_lines(&self, cart_id: &str, line_ids: Vec<String>)
    -> Result<Cart, ShopifyError>;

    /// Attach a customer access token to the cart.
    async fn update_buyer_identity(
        &self,
        cart_id: &str,
        customer_access_token: &str,
    ) -> Result<CartIdentity, ShopifyError>;
}

/// Customer metafield storage backed by the Admin API.
#[async_trait]
pub trait CustomerMetafieldStore: Send + Sync {
    /// Look up one metafield by namespace and key.
    async fn find_metafield(
        &self,
        customer: CustomerId,
        namespace: &str,
        key: &str,
    ) -> Result<Option<Metafield>, ShopifyError>;

    /// Create the metafield, or overwrite its value if it already exists.
    async fn upsert_metafield(
        &self,
        customer: CustomerId,
        input: &MetafieldInput,
    ) -> Result<Metafield, ShopifyError>;
}
