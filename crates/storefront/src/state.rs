//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::BffConfig;
use crate::services::auth::TokenService;
use crate::services::cart::CartSessionManager;
use crate::shopify::{AdminClient, StorefrontClient};

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: BffConfig,
    carts: CartSessionManager,
    tokens: TokenService,
}

impl AppState {
    /// Create application state backed by the live Shopify APIs.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: BffConfig) -> Result<Self, StateError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let storefront = StorefrontClient::new(&config.shopify, http.clone());
        let admin = AdminClient::new(&config.shopify, http);
        let carts = CartSessionManager::new(Arc::new(storefront), Arc::new(admin));
        let tokens = TokenService::new(config.auth.clone());

        Ok(Self::from_parts(config, carts, tokens))
    }

    /// Assemble state from already-built services.
    #[must_use]
    pub fn from_parts(config: BffConfig, carts: CartSessionManager, tokens: TokenService) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                carts,
                tokens,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &BffConfig {
        &self.inner.config
    }

    /// Get a reference to the cart session manager.
    #[must_use]
    pub fn carts(&self) -> &CartSessionManager {
        &self.inner.carts
    }

    /// Get a reference to the client token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }
}
