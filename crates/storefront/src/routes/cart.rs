//! Cart route handlers.
//!
//! Guest routes address a cart by ID; the client keeps that ID. User routes
//! address a customer by numeric ID and require a bearer token; the
//! customer's cart is resolved (or created) through the session manager.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use headless_bff_core::{CustomerId, Email};

use crate::error::{AppError, CartResultExt, Result, add_breadcrumb};
use crate::middleware::RequireBearer;
use crate::routes::envelope::{ApiJson, ApiResponse};
use crate::services::auth::Claims;
use crate::services::cart::{CartError, CartView, LineItemUpdate, NewLineItem};
use crate::shopify::{BuyerIdentityInput, CartBuyerIdentity};
use crate::state::AppState;

// =============================================================================
// Request Bodies
// =============================================================================

/// `POST /cart` body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCartRequest {
    pub email: Option<String>,
    pub customer_access_token: Option<String>,
}

/// One requested line in an add.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItem {
    pub variant_id: Option<String>,
    pub quantity: Option<i64>,
}

/// Add-lines body.
#[derive(Debug, Deserialize)]
pub struct AddItemsRequest {
    pub items: Option<Vec<AddItem>>,
}

/// One requested quantity change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItem {
    pub line_id: Option<String>,
    pub quantity: Option<i64>,
}

/// Update-lines body.
#[derive(Debug, Deserialize)]
pub struct UpdateItemsRequest {
    pub items: Option<Vec<UpdateItem>>,
}

/// Remove-lines body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemsRequest {
    pub line_ids: Option<Vec<String>>,
}

/// A customer ID sent as either a JSON number or a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UserIdField {
    Number(i64),
    Text(String),
}

impl UserIdField {
    fn parse(&self) -> Option<CustomerId> {
        match self {
            Self::Number(n) if *n > 0 => Some(CustomerId::new(*n)),
            Self::Number(_) => None,
            Self::Text(s) => CustomerId::parse(s).ok(),
        }
    }
}

/// `POST /cart/merge` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    pub user_id: Option<UserIdField>,
    pub guest_cart_id: Option<String>,
}

/// `POST /cart/checkout` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub cart_id: Option<String>,
    pub customer_access_token: Option<String>,
}

// =============================================================================
// Responses
// =============================================================================

/// Merge result with its flags at the top level.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResponse {
    pub success: bool,
    pub message: String,
    pub merged: bool,
    pub items_merged: usize,
    pub data: CartView,
}

/// Checkout URL with the attached buyer, if any.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    pub message: String,
    pub checkout_url: String,
    pub buyer_identity: Option<CartBuyerIdentity>,
}

// =============================================================================
// Input Helpers
// =============================================================================

fn invalid(message: &str) -> AppError {
    CartError::Invalid(message.to_string()).into()
}

/// Decode and check a cart ID taken from the path or a body.
fn cart_id_param(raw: &str, missing: &str) -> Result<String> {
    let decoded = urlencoding::decode(raw)
        .map_err(|_| AppError::BadRequest("Cart ID is not valid UTF-8".to_string()))?;
    let cart_id = decoded.trim();
    if cart_id.is_empty() {
        return Err(invalid(missing));
    }
    Ok(cart_id.to_string())
}

fn user_id_param(raw: &str) -> Result<CustomerId> {
    CustomerId::parse(raw).map_err(|_| invalid("Invalid user ID provided"))
}

/// Email hint carried by the bearer token, when it parses.
fn claims_email(claims: &Claims) -> Option<Email> {
    claims.email.as_deref().and_then(|e| Email::parse(e).ok())
}

fn new_line_items(items: Option<Vec<AddItem>>) -> Result<Vec<NewLineItem>> {
    let items = items
        .filter(|items| !items.is_empty())
        .ok_or_else(|| invalid("Items array is required and must not be empty"))?;

    items
        .into_iter()
        .map(|item| NewLineItem::new(item.variant_id, item.quantity))
        .collect::<std::result::Result<_, _>>()
        .map_err(AppError::from)
}

fn line_item_updates(items: Option<Vec<UpdateItem>>) -> Result<Vec<LineItemUpdate>> {
    let items = items
        .filter(|items| !items.is_empty())
        .ok_or_else(|| invalid("Items array is required and must not be empty"))?;

    items
        .into_iter()
        .map(|item| LineItemUpdate::new(item.line_id, item.quantity))
        .collect::<std::result::Result<_, _>>()
        .map_err(AppError::from)
}

fn line_ids(ids: Option<Vec<String>>) -> Result<Vec<String>> {
    ids.filter(|ids| !ids.is_empty() && ids.iter().all(|id| !id.trim().is_empty()))
        .ok_or_else(|| invalid("lineIds array is required and must not be empty"))
}

// =============================================================================
// Guest Routes
// =============================================================================

/// Create a cart (POST /cart).
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    body: Option<ApiJson<CreateCartRequest>>,
) -> Result<impl IntoResponse> {
    let body = body.map(|ApiJson(b)| b).unwrap_or_default();

    let email = body
        .email
        .filter(|e| !e.trim().is_empty())
        .map(|e| Email::parse(&e))
        .transpose()
        .map_err(|_| AppError::BadRequest("Invalid email address".to_string()))?;
    let token = body.customer_access_token.filter(|t| !t.trim().is_empty());

    let buyer_identity = (email.is_some() || token.is_some()).then(|| BuyerIdentityInput {
        email: email.map(Email::into_inner),
        customer_access_token: token,
    });

    let cart = state
        .carts()
        .create_cart(buyer_identity)
        .await
        .context("Failed to create cart")?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Cart created successfully", cart),
    ))
}

/// Fetch a cart (GET /cart/{cart_id}).
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(cart_id): Path<String>,
) -> Result<ApiResponse<CartView>> {
    let cart_id = cart_id_param(&cart_id, "Cart ID is required")?;
    let cart = state
        .carts()
        .get_cart(&cart_id)
        .await
        .context("Failed to get cart")?;
    Ok(ApiResponse::data(cart))
}

/// Add lines to a cart (POST /cart/{cart_id}/items).
#[instrument(skip(state, body))]
pub async fn add_items(
    State(state): State<AppState>,
    Path(cart_id): Path<String>,
    ApiJson(body): ApiJson<AddItemsRequest>,
) -> Result<ApiResponse<CartView>> {
    let cart_id = cart_id_param(&cart_id, "Cart ID is required")?;
    let items = new_line_items(body.items)?;

    add_breadcrumb("cart", "Adding items", &[("cart_id", &cart_id)]);

    let cart = state
        .carts()
        .add_line_items(&cart_id, items)
        .await
        .context("Failed to add items to cart")?;
    Ok(ApiResponse::with_message("Items added to cart successfully", cart))
}

/// Change line quantities (PUT /cart/{cart_id}/items).
#[instrument(skip(state, body))]
pub async fn update_items(
    State(state): State<AppState>,
    Path(cart_id): Path<String>,
    ApiJson(body): ApiJson<UpdateItemsRequest>,
) -> Result<ApiResponse<CartView>> {
    let cart_id = cart_id_param(&cart_id, "Cart ID is required")?;
    let items = line_item_updates(body.items)?;

    let cart = state
        .carts()
        .update_line_items(&cart_id, items)
        .await
        .context("Failed to update cart items")?;
    Ok(ApiResponse::with_message("Cart items updated successfully", cart))
}

/// Remove lines (DELETE /cart/{cart_id}/items).
#[instrument(skip(state, body))]
pub async fn remove_items(
    State(state): State<AppState>,
    Path(cart_id): Path<String>,
    ApiJson(body): ApiJson<RemoveItemsRequest>,
) -> Result<ApiResponse<CartView>> {
    let cart_id = cart_id_param(&cart_id, "Cart ID is required")?;
    let ids = line_ids(body.line_ids)?;

    let cart = state
        .carts()
        .remove_line_items(&cart_id, ids)
        .await
        .context("Failed to remove items from cart")?;
    Ok(ApiResponse::with_message("Items removed from cart successfully", cart))
}

/// Checkout URL, attaching the customer when a token is sent (POST /cart/checkout).
#[instrument(skip(state, body))]
pub async fn checkout(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CheckoutRequest>,
) -> Result<CheckoutResponse> {
    let cart_id = cart_id_param(body.cart_id.as_deref().unwrap_or_default(), "cartId is required")?;

    let checkout = state
        .carts()
        .checkout(&cart_id, body.customer_access_token.as_deref())
        .await
        .context("Failed to generate checkout URL")?;

    Ok(CheckoutResponse {
        success: true,
        message: "Checkout URL generated successfully".to_string(),
        checkout_url: checkout.checkout_url,
        buyer_identity: checkout.buyer_identity,
    })
}

// =============================================================================
// User Routes
// =============================================================================

/// Resolve the customer's cart (GET /cart/user/{user_id}).
#[instrument(skip(state, claims))]
pub async fn show_user_cart(
    State(state): State<AppState>,
    RequireBearer(claims): RequireBearer,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<CartView>> {
    let customer = user_id_param(&user_id)?;
    let email = claims_email(&claims);

    let cart = state
        .carts()
        .resolve_user_cart(customer, email.as_ref())
        .await
        .context("Failed to get user cart")?;
    Ok(ApiResponse::data(cart))
}

/// Add lines to the customer's cart (POST /cart/user/{user_id}/items).
#[instrument(skip(state, claims, body))]
pub async fn add_user_items(
    State(state): State<AppState>,
    RequireBearer(claims): RequireBearer,
    Path(user_id): Path<String>,
    ApiJson(body): ApiJson<AddItemsRequest>,
) -> Result<ApiResponse<CartView>> {
    let customer = user_id_param(&user_id)?;
    let items = new_line_items(body.items)?;
    let email = claims_email(&claims);

    let carts = state.carts();
    let cart = carts
        .resolve_user_cart(customer, email.as_ref())
        .await
        .context("Failed to add items to cart")?;

    add_breadcrumb(
        "cart",
        "Adding items to user cart",
        &[("customer", &customer.to_string()), ("cart_id", &cart.cart_id)],
    );

    let cart = carts
        .add_line_items(&cart.cart_id, items)
        .await
        .context("Failed to add items to cart")?;
    Ok(ApiResponse::with_message("Items added to cart successfully", cart))
}

/// Change line quantities on the customer's cart (PUT /cart/user/{user_id}/items).
#[instrument(skip(state, claims, body))]
pub async fn update_user_items(
    State(state): State<AppState>,
    RequireBearer(claims): RequireBearer,
    Path(user_id): Path<String>,
    ApiJson(body): ApiJson<UpdateItemsRequest>,
) -> Result<ApiResponse<CartView>> {
    let customer = user_id_param(&user_id)?;
    let items = line_item_updates(body.items)?;
    let email = claims_email(&claims);

    let carts = state.carts();
    let cart = carts
        .resolve_user_cart(customer, email.as_ref())
        .await
        .context("Failed to update cart items")?;
    let cart = carts
        .update_line_items(&cart.cart_id, items)
        .await
        .context("Failed to update cart items")?;
    Ok(ApiResponse::with_message("Cart items updated successfully", cart))
}

/// Remove lines from the customer's cart (DELETE /cart/user/{user_id}/items).
#[instrument(skip(state, claims, body))]
pub async fn remove_user_items(
    State(state): State<AppState>,
    RequireBearer(claims): RequireBearer,
    Path(user_id): Path<String>,
    ApiJson(body): ApiJson<RemoveItemsRequest>,
) -> Result<ApiResponse<CartView>> {
    let customer = user_id_param(&user_id)?;
    let ids = line_ids(body.line_ids)?;
    let email = claims_email(&claims);

    let carts = state.carts();
    let cart = carts
        .resolve_user_cart(customer, email.as_ref())
        .await
        .context("Failed to remove items from cart")?;
    let cart = carts
        .remove_line_items(&cart.cart_id, ids)
        .await
        .context("Failed to remove items from cart")?;
    Ok(ApiResponse::with_message("Items removed from cart successfully", cart))
}

/// Forget the customer's cart (DELETE /cart/user/{user_id}).
///
/// Idempotent: clearing a customer with no recorded cart succeeds.
#[instrument(skip(state, _claims))]
pub async fn clear_user_cart(
    State(state): State<AppState>,
    RequireBearer(_claims): RequireBearer,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<()>> {
    let customer = user_id_param(&user_id)?;

    state
        .carts()
        .clear_user_cart(customer)
        .await
        .context("Failed to clear user cart")?;

    Ok(ApiResponse::message("User cart cleared successfully"))
}

/// Fold a guest cart into the customer's cart (POST /cart/merge).
#[instrument(skip(state, claims, body))]
pub async fn merge(
    State(state): State<AppState>,
    RequireBearer(claims): RequireBearer,
    ApiJson(body): ApiJson<MergeRequest>,
) -> Result<MergeResponse> {
    let customer = body
        .user_id
        .as_ref()
        .and_then(UserIdField::parse)
        .ok_or_else(|| invalid("userId is required"))?;
    let email = claims_email(&claims);

    let outcome = state
        .carts()
        .merge_carts_on_login(customer, body.guest_cart_id.as_deref(), email.as_ref())
        .await
        .context("Failed to merge carts")?;

    Ok(MergeResponse {
        success: true,
        message: outcome.message,
        merged: outcome.merged,
        items_merged: outcome.items_merged,
        data: outcome.cart,
    })
}

impl IntoResponse for MergeResponse {
    fn into_response(self) -> axum::response::Response {
        axum::Json(self).into_response()
    }
}

impl IntoResponse for CheckoutResponse {
    fn into_response(self) -> axum::response::Response {
        axum::Json(self).into_response()
    }
}
