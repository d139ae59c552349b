//! Shopify Storefront API client implementation.
//!
//! Uses `graphql_client` for the request/response envelope with `reqwest`
//! 0.13 for HTTP. Carts are never cached: every read goes to Shopify.

mod conversions;
pub mod queries;

use std::sync::Arc;

use async_trait::async_trait;
use graphql_client::{GraphQLQuery, Response};
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use crate::config::ShopifyConfig;
use crate::shopify::types::{
    BuyerIdentityInput, Cart, CartIdentity, CartLineInput, CartLineUpdateInput, CartUserError,
};
use crate::shopify::{CartApi, GraphQLError, GraphQLErrorLocation, ShopifyError};

use conversions::{convert_buyer_identity, convert_cart, first_user_error};
use queries::{
    AddToCart, CartMutationPayload, CreateCart, GetCart, RemoveFromCart, UpdateBuyerIdentity,
    UpdateCartLines, add_to_cart, create_cart, get_cart, remove_from_cart, update_buyer_identity,
    update_cart_lines,
};

/// Header carrying the Storefront API access token.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
}

impl StorefrontClient {
    /// Create a new Storefront API client sharing the given HTTP client.
    #[must_use]
    pub fn new(config: &ShopifyConfig, client: reqwest::Client) -> Self {
        let endpoint = format!(
            "https://{}/api/{}/graphql.json",
            config.store, config.api_version
        );

        Self {
            inner: Arc::new(StorefrontClientInner {
                client,
                endpoint,
                access_token: config.storefront_token.clone(),
            }),
        }
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header(ACCESS_TOKEN_HEADER, self.inner.access_token.expose_secret())
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ShopifyError::RateLimited(retry_after(&response)));
        }

        // Body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %truncate(&response_text, 500),
                "Shopify Storefront API returned non-success status"
            );
            return Err(ShopifyError::Status {
                status: status.as_u16(),
                body: truncate(&response_text, 200),
            });
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %truncate(&response_text, 500),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            tracing::debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(convert_graphql_error).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                body = %truncate(&response_text, 500),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::GraphQL(vec![GraphQLError::message("No data in response")])
        })
    }
}

/// Read `Retry-After` in whole seconds, defaulting to one.
pub(crate) fn retry_after(response: &reqwest::Response) -> u64 {
    response
        .headers()
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map_or(1, |s| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let secs = s.ceil() as u64;
            secs.max(1)
        })
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn convert_graphql_error(e: graphql_client::Error) -> GraphQLError {
    GraphQLError {
        message: e.message,
        locations: e.locations.map_or_else(Vec::new, |locs| {
            locs.into_iter()
                .map(|l| GraphQLErrorLocation {
                    line: i64::from(l.line),
                    column: i64::from(l.column),
                })
                .collect()
        }),
        path: e.path.map_or_else(Vec::new, |p| {
            p.into_iter()
                .map(|fragment| match fragment {
                    graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                    graphql_client::PathFragment::Index(i) => serde_json::Value::Number(i.into()),
                })
                .collect()
        }),
    }
}

/// Log a mutation user error and surface it as `UserError`.
fn rejected(error: CartUserError) -> ShopifyError {
    tracing::warn!(
        field = ?error.field,
        message = %error.message,
        "Shopify rejected cart mutation"
    );
    ShopifyError::UserError(error.message)
}

/// Unwrap a cart mutation payload, surfacing the first user error.
fn cart_from_payload(
    payload: Option<CartMutationPayload>,
    failure: &str,
) -> Result<Cart, ShopifyError> {
    if let Some(result) = payload {
        if let Some(error) = first_user_error(result.user_errors) {
            return Err(rejected(error));
        }

        if let Some(cart) = result.cart {
            return convert_cart(cart);
        }
    }

    Err(ShopifyError::GraphQL(vec![GraphQLError::message(failure)]))
}

// =========================================================================
// Cart Methods
// =========================================================================

#[async_trait]
impl CartApi for StorefrontClient {
    #[instrument(skip(self, buyer_identity))]
    async fn create_cart(
        &self,
        buyer_identity: Option<BuyerIdentityInput>,
    ) -> Result<Cart, ShopifyError> {
        let variables = create_cart::Variables {
            input: create_cart::CartInput {
                buyer_identity: buyer_identity.map(|b| queries::CartBuyerIdentityInput {
                    email: b.email,
                    customer_access_token: b.customer_access_token,
                }),
            },
        };

        let data = self.execute::<CreateCart>(variables).await?;
        cart_from_payload(data.cart_create, "Failed to create cart")
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn get_cart(&self, cart_id: &str) -> Result<Cart, ShopifyError> {
        let variables = get_cart::Variables {
            cart_id: cart_id.to_string(),
        };

        let data = self.execute::<GetCart>(variables).await?;

        match data.cart {
            Some(cart) => convert_cart(cart),
            None => Err(ShopifyError::NotFound(format!("Cart not found: {cart_id}"))),
        }
    }

    #[instrument(skip(self, lines), fields(cart_id = %cart_id, lines = lines.len()))]
    async fn add_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let variables = add_to_cart::Variables {
            cart_id: cart_id.to_string(),
            lines: lines
                .into_iter()
                .map(|line| queries::CartLineInput {
                    merchandise_id: line.merchandise_id,
                    quantity: line.quantity,
                })
                .collect(),
        };

        let data = self.execute::<AddToCart>(variables).await?;
        cart_from_payload(data.cart_lines_add, "Failed to add to cart")
    }

    #[instrument(skip(self, lines), fields(cart_id = %cart_id, lines = lines.len()))]
    async fn update_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let variables = update_cart_lines::Variables {
            cart_id: cart_id.to_string(),
            lines: lines
                .into_iter()
                .map(|line| queries::CartLineUpdateInput {
                    id: line.id,
                    quantity: line.quantity,
                })
                .collect(),
        };

        let data = self.execute::<UpdateCartLines>(variables).await?;
        cart_from_payload(data.cart_lines_update, "Failed to update cart")
    }

    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id, lines = line_ids.len()))]
    async fn remove_lines(
        &self,
        cart_id: &str,
        line_ids: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let variables = remove_from_cart::Variables {
            cart_id: cart_id.to_string(),
            line_ids,
        };

        let data = self.execute::<RemoveFromCart>(variables).await?;
        cart_from_payload(data.cart_lines_remove, "Failed to remove from cart")
    }

    #[instrument(skip(self, customer_access_token), fields(cart_id = %cart_id))]
    async fn update_buyer_identity(
        &self,
        cart_id: &str,
        customer_access_token: &str,
    ) -> Result<CartIdentity, ShopifyError> {
        let variables = update_buyer_identity::Variables {
            cart_id: cart_id.to_string(),
            buyer_identity: queries::CartBuyerIdentityInput {
                email: None,
                customer_access_token: Some(customer_access_token.to_string()),
            },
        };

        let data = self.execute::<UpdateBuyerIdentity>(variables).await?;

        if let Some(result) = data.cart_buyer_identity_update {
            if let Some(error) = first_user_error(result.user_errors) {
                return Err(rejected(error));
            }

            if let Some(cart) = result.cart {
                return Ok(CartIdentity {
                    id: cart.id,
                    checkout_url: cart.checkout_url,
                    buyer_identity: convert_buyer_identity(cart.buyer_identity),
                });
            }
        }

        Err(ShopifyError::GraphQL(vec![GraphQLError::message(
            "Failed to update buyer identity",
        )]))
    }
}
