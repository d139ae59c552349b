//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness check
//!
//! # Client tokens (rate limited)
//! POST   /auth/token                - Issue or reuse a client token
//! POST   /auth/logout               - Invalidate a cached client token
//!
//! # Guest carts
//! POST   /cart                      - Create cart
//! GET    /cart/{cart_id}            - Fetch cart
//! POST   /cart/{cart_id}/items      - Add lines
//! PUT    /cart/{cart_id}/items      - Update lines
//! DELETE /cart/{cart_id}/items      - Remove lines
//! POST   /cart/checkout             - Checkout URL (optionally attach buyer)
//!
//! # Customer carts (bearer token)
//! GET    /cart/user/{user_id}       - Resolve or create the customer's cart
//! DELETE /cart/user/{user_id}       - Forget the customer's cart
//! POST   /cart/user/{user_id}/items - Add lines
//! PUT    /cart/user/{user_id}/items - Update lines
//! DELETE /cart/user/{user_id}/items - Remove lines
//! POST   /cart/merge                - Fold a guest cart in at login
//! ```

pub mod auth;
pub mod cart;
pub mod envelope;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the client token routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/token", post(auth::token))
        .route("/logout", post(auth::logout))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(cart::create))
        .route("/merge", post(cart::merge))
        .route("/checkout", post(cart::checkout))
        .route(
            "/user/{user_id}",
            get(cart::show_user_cart).delete(cart::clear_user_cart),
        )
        .route(
            "/user/{user_id}/items",
            post(cart::add_user_items)
                .put(cart::update_user_items)
                .delete(cart::remove_user_items),
        )
        .route("/{cart_id}", get(cart::show))
        .route(
            "/{cart_id}/items",
            post(cart::add_items)
                .put(cart::update_items)
                .delete(cart::remove_items),
        )
}

fn routes_with_auth(auth: Router<AppState>) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/cart", cart_routes())
        .nest("/auth", auth)
}

/// Create all routes without rate limiting.
pub fn routes() -> Router<AppState> {
    routes_with_auth(auth_routes())
}

/// Create all routes with the token endpoints rate limited per client IP.
pub fn rate_limited_routes() -> Router<AppState> {
    routes_with_auth(auth_routes().layer(auth_rate_limiter()))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check Shopify.
async fn health() -> &'static str {
    "ok"
}
