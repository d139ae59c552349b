//! Cart session manager.
//!
//! Binds Shopify carts to customers. A customer's active cart ID lives in a
//! customer metafield (`custom.cart_id`); guests hold their cart ID
//! client-side. The manager resolves (or lazily creates) a customer's cart,
//! forwards line edits, and folds a guest cart into the customer's cart at
//! login.
//!
//! The association read-then-write is not atomic. Two concurrent first
//! resolves for the same customer can each create a cart, and the last
//! metafield write wins.

mod view;

pub use view::{CartCostView, CartItemView, CartView, ImageView, ProductView, VariantView};

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use headless_bff_core::{CustomerId, Email};

use crate::shopify::{
    BuyerIdentityInput, Cart, CartApi, CartBuyerIdentity, CartLineInput, CartLineUpdateInput,
    CustomerMetafieldStore, MetafieldInput, ShopifyError,
};

/// Metafield namespace holding the customer's cart ID.
pub const CART_ID_NAMESPACE: &str = "custom";
/// Metafield key holding the customer's cart ID.
pub const CART_ID_KEY: &str = "cart_id";
/// Metafield type of the cart ID.
pub const CART_ID_TYPE: &str = "single_line_text_field";

/// Errors returned by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Caller input failed validation.
    #[error("{0}")]
    Invalid(String),

    /// The cart or customer does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Shopify rejected the mutation (first user error).
    #[error("{0}")]
    Rejected(String),

    /// Shopify could not be reached or answered unexpectedly.
    #[error(transparent)]
    Upstream(ShopifyError),
}

impl From<ShopifyError> for CartError {
    fn from(err: ShopifyError) -> Self {
        match err {
            ShopifyError::NotFound(what) => Self::NotFound(what),
            ShopifyError::UserError(message) => Self::Rejected(message),
            other => Self::Upstream(other),
        }
    }
}

// =============================================================================
// Validated Inputs
// =============================================================================

/// A line to add: a variant and a positive quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLineItem {
    variant_id: String,
    quantity: i64,
}

impl NewLineItem {
    /// Validate a requested line. A missing quantity means one.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Invalid` if the variant is missing or the quantity
    /// is not positive.
    pub fn new(variant_id: Option<String>, quantity: Option<i64>) -> Result<Self, CartError> {
        let variant_id = variant_id
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| CartError::Invalid("Each item must have a variantId".to_string()))?;

        let quantity = quantity.unwrap_or(1);
        if quantity < 1 {
            return Err(CartError::Invalid(
                "Quantity must be a positive number".to_string(),
            ));
        }

        Ok(Self {
            variant_id,
            quantity,
        })
    }

    #[must_use]
    pub fn variant_id(&self) -> &str {
        &self.variant_id
    }

    #[must_use]
    pub const fn quantity(&self) -> i64 {
        self.quantity
    }
}

impl From<NewLineItem> for CartLineInput {
    fn from(item: NewLineItem) -> Self {
        Self {
            merchandise_id: item.variant_id,
            quantity: item.quantity,
        }
    }
}

/// A quantity change on an existing line. Zero removes the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemUpdate {
    line_id: String,
    quantity: i64,
}

impl LineItemUpdate {
    /// Validate a requested update.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Invalid` if the line ID is missing or the quantity
    /// is missing or negative.
    pub fn new(line_id: Option<String>, quantity: Option<i64>) -> Result<Self, CartError> {
        let line_id = line_id
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| CartError::Invalid("Each item must have a lineId".to_string()))?;

        let quantity = quantity.filter(|q| *q >= 0).ok_or_else(|| {
            CartError::Invalid("Quantity is required and must be a non-negative number".to_string())
        })?;

        Ok(Self { line_id, quantity })
    }
}

impl From<LineItemUpdate> for CartLineUpdateInput {
    fn from(item: LineItemUpdate) -> Self {
        Self {
            id: item.line_id,
            quantity: item.quantity,
        }
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Result of folding a guest cart into a customer's cart.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// The customer's cart after the merge.
    pub cart: CartView,
    /// Whether any guest lines were added.
    pub merged: bool,
    /// Number of guest lines added.
    pub items_merged: usize,
    /// Human-readable summary.
    pub message: String,
}

/// Checkout details for a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    /// Cart ID.
    pub cart_id: String,
    /// Shopify checkout URL.
    pub checkout_url: String,
    /// Buyer identity, present when a customer token was attached.
    pub buyer_identity: Option<CartBuyerIdentity>,
}

// =============================================================================
// CartSessionManager
// =============================================================================

/// Cart operations on behalf of guests and customers.
#[derive(Clone)]
pub struct CartSessionManager {
    carts: Arc<dyn CartApi>,
    metafields: Arc<dyn CustomerMetafieldStore>,
}

impl CartSessionManager {
    /// Create a manager over a cart backend and a metafield store.
    #[must_use]
    pub fn new(carts: Arc<dyn CartApi>, metafields: Arc<dyn CustomerMetafieldStore>) -> Self {
        Self { carts, metafields }
    }

    /// Create a cart, optionally tied to a buyer.
    ///
    /// # Errors
    ///
    /// Returns an error if Shopify rejects or fails the creation.
    #[instrument(skip(self, buyer_identity))]
    pub async fn create_cart(
        &self,
        buyer_identity: Option<BuyerIdentityInput>,
    ) -> Result<CartView, CartError> {
        let cart = self.carts.create_cart(buyer_identity).await?;
        tracing::info!(cart_id = %cart.id, "Cart created");
        Ok(cart.into())
    }

    /// Fetch a cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotFound` if the cart does not exist.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, cart_id: &str) -> Result<CartView, CartError> {
        match self.carts.get_cart(cart_id).await {
            Ok(cart) => Ok(cart.into()),
            Err(ShopifyError::NotFound(_)) => Err(CartError::NotFound("Cart not found".to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the customer's stored cart ID. Read failures count as no cart.
    async fn stored_cart_id(&self, customer: CustomerId) -> Option<String> {
        match self
            .metafields
            .find_metafield(customer, CART_ID_NAMESPACE, CART_ID_KEY)
            .await
        {
            Ok(metafield) => metafield
                .map(|m| m.value)
                .filter(|value| !value.trim().is_empty()),
            Err(e) => {
                tracing::warn!(
                    customer = %customer,
                    error = %e,
                    "Failed to read cart association, treating as absent"
                );
                None
            }
        }
    }

    async fn write_cart_id(&self, customer: CustomerId, value: &str) -> Result<(), ShopifyError> {
        let input = MetafieldInput {
            namespace: CART_ID_NAMESPACE.to_string(),
            key: CART_ID_KEY.to_string(),
            value: value.to_string(),
            kind: CART_ID_TYPE.to_string(),
        };
        self.metafields.upsert_metafield(customer, &input).await?;
        Ok(())
    }

    /// Store the customer's cart ID. Write failures are logged and dropped.
    async fn store_cart_id(&self, customer: CustomerId, cart_id: &str) {
        if let Err(e) = self.write_cart_id(customer, cart_id).await {
            tracing::error!(
                customer = %customer,
                cart_id = %cart_id,
                error = %e,
                "Failed to persist cart association"
            );
        }
    }

    async fn resolve_cart(
        &self,
        customer: CustomerId,
        email: Option<&Email>,
    ) -> Result<Cart, CartError> {
        if let Some(cart_id) = self.stored_cart_id(customer).await {
            match self.carts.get_cart(&cart_id).await {
                Ok(cart) => return Ok(cart),
                Err(ShopifyError::NotFound(_)) => {
                    tracing::info!(
                        customer = %customer,
                        cart_id = %cart_id,
                        "Stored cart no longer exists, creating a new one"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        let buyer_identity = email.map(|email| BuyerIdentityInput {
            email: Some(email.as_str().to_string()),
            customer_access_token: None,
        });
        let cart = self.carts.create_cart(buyer_identity).await?;
        tracing::info!(customer = %customer, cart_id = %cart.id, "Created cart for customer");

        self.store_cart_id(customer, &cart.id).await;
        Ok(cart)
    }

    /// Return the customer's cart, creating and recording one if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if fetching an existing cart fails for a reason other
    /// than "not found", or if creating a new cart fails.
    #[instrument(skip(self, email), fields(customer = %customer))]
    pub async fn resolve_user_cart(
        &self,
        customer: CustomerId,
        email: Option<&Email>,
    ) -> Result<CartView, CartError> {
        Ok(self.resolve_cart(customer, email).await?.into())
    }

    /// Add lines to a cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Invalid` for an empty list, `CartError::Rejected`
    /// when Shopify refuses the lines.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn add_line_items(
        &self,
        cart_id: &str,
        items: Vec<NewLineItem>,
    ) -> Result<CartView, CartError> {
        if items.is_empty() {
            return Err(CartError::Invalid(
                "Items array is required and must not be empty".to_string(),
            ));
        }

        let lines = items.into_iter().map(CartLineInput::from).collect();
        Ok(self.carts.add_lines(cart_id, lines).await?.into())
    }

    /// Change line quantities.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Invalid` for an empty list, `CartError::Rejected`
    /// when Shopify refuses the update.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn update_line_items(
        &self,
        cart_id: &str,
        items: Vec<LineItemUpdate>,
    ) -> Result<CartView, CartError> {
        if items.is_empty() {
            return Err(CartError::Invalid(
                "Items array is required and must not be empty".to_string(),
            ));
        }

        let lines = items.into_iter().map(CartLineUpdateInput::from).collect();
        Ok(self.carts.update_lines(cart_id, lines).await?.into())
    }

    /// Remove lines by ID.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Invalid` for an empty list or a blank ID.
    #[instrument(skip(self, line_ids), fields(lines = line_ids.len()))]
    pub async fn remove_line_items(
        &self,
        cart_id: &str,
        line_ids: Vec<String>,
    ) -> Result<CartView, CartError> {
        if line_ids.is_empty() || line_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(CartError::Invalid(
                "lineIds array is required and must not be empty".to_string(),
            ));
        }

        Ok(self.carts.remove_lines(cart_id, line_ids).await?.into())
    }

    /// Fold a guest cart into the customer's cart.
    ///
    /// Guest lines are added as-is (no de-duplication against existing lines)
    /// and the guest cart is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if resolving the customer's cart or adding the guest
    /// lines fails. A missing guest cart is not an error.
    #[instrument(skip(self, email), fields(customer = %customer))]
    pub async fn merge_carts_on_login(
        &self,
        customer: CustomerId,
        guest_cart_id: Option<&str>,
        email: Option<&Email>,
    ) -> Result<MergeOutcome, CartError> {
        let guest = match guest_cart_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => match self.carts.get_cart(id).await {
                Ok(cart) => Some(cart),
                Err(ShopifyError::NotFound(_)) => {
                    tracing::info!(guest_cart_id = %id, "Guest cart not found, nothing to merge");
                    None
                }
                Err(e) => return Err(e.into()),
            },
            None => None,
        };

        let user_cart = self.resolve_cart(customer, email).await?;

        let Some(guest) = guest.filter(|g| !g.lines.is_empty()) else {
            return Ok(MergeOutcome {
                cart: user_cart.into(),
                merged: false,
                items_merged: 0,
                message: "No guest cart items to merge".to_string(),
            });
        };

        if guest.id == user_cart.id {
            return Ok(MergeOutcome {
                cart: user_cart.into(),
                merged: false,
                items_merged: 0,
                message: "Guest cart is already the user's cart".to_string(),
            });
        }

        let items: Vec<NewLineItem> = guest
            .lines
            .into_iter()
            .map(|line| NewLineItem {
                variant_id: line.merchandise.id,
                quantity: line.quantity,
            })
            .collect();
        let count = items.len();

        let cart = self.add_line_items(&user_cart.id, items).await?;
        tracing::info!(
            customer = %customer,
            guest_cart_id = %guest.id,
            cart_id = %cart.cart_id,
            items = count,
            "Merged guest cart"
        );

        Ok(MergeOutcome {
            cart,
            merged: true,
            items_merged: count,
            message: format!("Successfully merged {count} item(s) from guest cart"),
        })
    }

    /// Attach a customer access token to a cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Rejected` if Shopify refuses the token.
    #[instrument(skip(self, customer_access_token))]
    pub async fn update_buyer_identity(
        &self,
        cart_id: &str,
        customer_access_token: &str,
    ) -> Result<Checkout, CartError> {
        let identity = self
            .carts
            .update_buyer_identity(cart_id, customer_access_token)
            .await?;

        Ok(Checkout {
            cart_id: identity.id,
            checkout_url: identity.checkout_url,
            buyer_identity: Some(identity.buyer_identity),
        })
    }

    /// Checkout details, attaching the customer first when a token is given.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotFound` if the cart does not exist.
    pub async fn checkout(
        &self,
        cart_id: &str,
        customer_access_token: Option<&str>,
    ) -> Result<Checkout, CartError> {
        if let Some(token) = customer_access_token.filter(|t| !t.trim().is_empty()) {
            return self.update_buyer_identity(cart_id, token).await;
        }

        let cart = self.get_cart(cart_id).await?;
        Ok(Checkout {
            cart_id: cart.cart_id,
            checkout_url: cart.checkout_url,
            buyer_identity: None,
        })
    }

    /// Forget the customer's cart by blanking the stored cart ID.
    ///
    /// The Shopify cart itself is left to expire. A blank value reads as no
    /// cart, so the next resolve creates a fresh one.
    ///
    /// # Errors
    ///
    /// Returns an error if the metafield cannot be written.
    #[instrument(skip(self), fields(customer = %customer))]
    pub async fn clear_user_cart(&self, customer: CustomerId) -> Result<(), CartError> {
        self.write_cart_id(customer, "").await?;
        tracing::info!(customer = %customer, "Cleared cart association");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{MemoryCartApi, MemoryMetafields, VARIANT_A, VARIANT_B, VARIANT_C};

    fn manager() -> (CartSessionManager, Arc<MemoryCartApi>, Arc<MemoryMetafields>) {
        let carts = Arc::new(MemoryCartApi::default());
        let metafields = Arc::new(MemoryMetafields::default());
        let manager = CartSessionManager::new(carts.clone(), metafields.clone());
        (manager, carts, metafields)
    }

    fn item(variant: &str, quantity: i64) -> NewLineItem {
        NewLineItem::new(Some(variant.to_string()), Some(quantity)).unwrap()
    }

    const CUSTOMER: CustomerId = CustomerId::new(42);

    #[test]
    fn test_new_line_item_validation() {
        assert_eq!(NewLineItem::new(Some("v".into()), None).unwrap().quantity(), 1);
        assert!(matches!(
            NewLineItem::new(None, Some(1)),
            Err(CartError::Invalid(ref m)) if m == "Each item must have a variantId"
        ));
        assert!(matches!(
            NewLineItem::new(Some("  ".into()), Some(1)),
            Err(CartError::Invalid(_))
        ));
        assert!(matches!(
            NewLineItem::new(Some("v".into()), Some(0)),
            Err(CartError::Invalid(ref m)) if m == "Quantity must be a positive number"
        ));
    }

    #[test]
    fn test_line_item_update_validation() {
        assert!(LineItemUpdate::new(Some("l".into()), Some(0)).is_ok());
        assert!(matches!(
            LineItemUpdate::new(None, Some(1)),
            Err(CartError::Invalid(ref m)) if m == "Each item must have a lineId"
        ));
        assert!(matches!(
            LineItemUpdate::new(Some("l".into()), None),
            Err(CartError::Invalid(ref m))
                if m == "Quantity is required and must be a non-negative number"
        ));
        assert!(LineItemUpdate::new(Some("l".into()), Some(-1)).is_err());
    }

    #[test]
    fn test_shopify_error_classification() {
        assert!(matches!(
            CartError::from(ShopifyError::UserError("bad".into())),
            CartError::Rejected(_)
        ));
        assert!(matches!(
            CartError::from(ShopifyError::NotFound("x".into())),
            CartError::NotFound(_)
        ));
        assert!(matches!(
            CartError::from(ShopifyError::RateLimited(1)),
            CartError::Upstream(ShopifyError::RateLimited(1))
        ));
    }

    #[tokio::test]
    async fn test_add_line_items_totals() {
        let (manager, _, _) = manager();
        let cart = manager.create_cart(None).await.unwrap();

        let cart = manager
            .add_line_items(&cart.cart_id, vec![item(VARIANT_A, 2), item(VARIANT_B, 3)])
            .await
            .unwrap();

        assert_eq!(cart.items.len(), 2);
        assert_eq!(
            cart.total_quantity,
            cart.items.iter().map(|i| i.quantity).sum::<i64>()
        );
        for line in &cart.items {
            #[allow(clippy::cast_precision_loss)]
            let expected = line.variant.price.amount * line.quantity as f64;
            assert!((line.line_cost.amount - expected).abs() < 1e-9);
            assert!(line.line_cost.same_currency(&line.variant.price));
        }
    }

    #[tokio::test]
    async fn test_add_line_items_rejects_empty() {
        let (manager, _, _) = manager();
        let cart = manager.create_cart(None).await.unwrap();
        assert!(matches!(
            manager.add_line_items(&cart.cart_id, vec![]).await,
            Err(CartError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_add_unknown_variant_is_rejected() {
        let (manager, _, _) = manager();
        let cart = manager.create_cart(None).await.unwrap();
        let err = manager
            .add_line_items(&cart.cart_id, vec![item("gid://shopify/ProductVariant/404", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::Rejected(ref m) if m.contains("does not exist")));
    }

    #[tokio::test]
    async fn test_get_cart_not_found() {
        let (manager, _, _) = manager();
        assert!(matches!(
            manager.get_cart("gid://shopify/Cart/missing").await,
            Err(CartError::NotFound(ref m)) if m == "Cart not found"
        ));
    }

    #[tokio::test]
    async fn test_update_and_remove_lines() {
        let (manager, _, _) = manager();
        let cart = manager.create_cart(None).await.unwrap();
        let cart = manager
            .add_line_items(&cart.cart_id, vec![item(VARIANT_A, 1), item(VARIANT_B, 1)])
            .await
            .unwrap();

        let first = cart.items[0].line_id.clone();
        let second = cart.items[1].line_id.clone();

        let cart = manager
            .update_line_items(
                &cart.cart_id,
                vec![LineItemUpdate::new(Some(first.clone()), Some(5)).unwrap()],
            )
            .await
            .unwrap();
        assert_eq!(cart.total_quantity, 6);

        let cart = manager
            .update_line_items(
                &cart.cart_id,
                vec![LineItemUpdate::new(Some(second.clone()), Some(0)).unwrap()],
            )
            .await
            .unwrap();
        assert_eq!(cart.items.len(), 1);

        let cart = manager
            .remove_line_items(&cart.cart_id, vec![first])
            .await
            .unwrap();
        assert!(cart.items.is_empty());
        assert_eq!(cart.total_quantity, 0);
    }

    #[tokio::test]
    async fn test_remove_line_items_rejects_empty() {
        let (manager, _, _) = manager();
        assert!(matches!(
            manager.remove_line_items("gid://shopify/Cart/1", vec![]).await,
            Err(CartError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_user_cart_is_stable() {
        let (manager, carts, metafields) = manager();

        let first = manager.resolve_user_cart(CUSTOMER, None).await.unwrap();
        let second = manager.resolve_user_cart(CUSTOMER, None).await.unwrap();

        assert_eq!(first.cart_id, second.cart_id);
        assert_eq!(carts.created(), 1);
        assert_eq!(metafields.value(CUSTOMER).as_deref(), Some(first.cart_id.as_str()));
    }

    #[tokio::test]
    async fn test_resolve_user_cart_seeds_email() {
        let (manager, carts, _) = manager();
        let email = Email::parse("buyer@example.com").unwrap();

        let cart = manager
            .resolve_user_cart(CUSTOMER, Some(&email))
            .await
            .unwrap();

        assert_eq!(
            carts.buyer_email(&cart.cart_id).as_deref(),
            Some("buyer@example.com")
        );
    }

    #[tokio::test]
    async fn test_resolve_user_cart_replaces_expired_cart() {
        let (manager, carts, metafields) = manager();
        metafields.set(CUSTOMER, "gid://shopify/Cart/expired");

        let cart = manager.resolve_user_cart(CUSTOMER, None).await.unwrap();

        assert_ne!(cart.cart_id, "gid://shopify/Cart/expired");
        assert_eq!(carts.created(), 1);
        assert_eq!(metafields.value(CUSTOMER).as_deref(), Some(cart.cart_id.as_str()));
    }

    #[tokio::test]
    async fn test_resolve_user_cart_treats_empty_value_as_absent() {
        let (manager, carts, metafields) = manager();
        metafields.set(CUSTOMER, "  ");

        let cart = manager.resolve_user_cart(CUSTOMER, None).await.unwrap();

        assert_eq!(carts.fetches(), 0);
        assert_eq!(carts.created(), 1);
        assert_eq!(metafields.value(CUSTOMER).as_deref(), Some(cart.cart_id.as_str()));
    }

    #[tokio::test]
    async fn test_resolve_user_cart_survives_metafield_failures() {
        let (manager, carts, metafields) = manager();
        metafields.fail_reads(true);
        metafields.fail_writes(true);

        let first = manager.resolve_user_cart(CUSTOMER, None).await.unwrap();
        assert!(!first.cart_id.is_empty());
        assert!(metafields.value(CUSTOMER).is_none());

        // Without a stored association every resolve creates a fresh cart.
        let second = manager.resolve_user_cart(CUSTOMER, None).await.unwrap();
        assert_ne!(first.cart_id, second.cart_id);
        assert_eq!(carts.created(), 2);
    }

    #[tokio::test]
    async fn test_resolve_user_cart_propagates_create_failure() {
        let (manager, carts, _) = manager();
        carts.fail_creates(true);

        assert!(matches!(
            manager.resolve_user_cart(CUSTOMER, None).await,
            Err(CartError::Upstream(_))
        ));
    }

    #[tokio::test]
    async fn test_merge_without_guest_cart() {
        let (manager, _, _) = manager();
        let user = manager.resolve_user_cart(CUSTOMER, None).await.unwrap();
        let user = manager
            .add_line_items(&user.cart_id, vec![item(VARIANT_A, 1)])
            .await
            .unwrap();

        let outcome = manager
            .merge_carts_on_login(CUSTOMER, None, None)
            .await
            .unwrap();

        assert!(!outcome.merged);
        assert_eq!(outcome.items_merged, 0);
        assert_eq!(outcome.message, "No guest cart items to merge");
        assert_eq!(outcome.cart, user);
    }

    #[tokio::test]
    async fn test_merge_with_empty_or_missing_guest_cart() {
        let (manager, _, _) = manager();
        let guest = manager.create_cart(None).await.unwrap();

        let outcome = manager
            .merge_carts_on_login(CUSTOMER, Some(&guest.cart_id), None)
            .await
            .unwrap();
        assert!(!outcome.merged);
        assert_eq!(outcome.message, "No guest cart items to merge");

        let outcome = manager
            .merge_carts_on_login(CUSTOMER, Some("gid://shopify/Cart/gone"), None)
            .await
            .unwrap();
        assert!(!outcome.merged);
    }

    #[tokio::test]
    async fn test_merge_with_own_cart() {
        let (manager, _, _) = manager();
        let user = manager.resolve_user_cart(CUSTOMER, None).await.unwrap();
        let user = manager
            .add_line_items(&user.cart_id, vec![item(VARIANT_A, 2)])
            .await
            .unwrap();

        let outcome = manager
            .merge_carts_on_login(CUSTOMER, Some(&user.cart_id), None)
            .await
            .unwrap();

        assert!(!outcome.merged);
        assert_eq!(outcome.message, "Guest cart is already the user's cart");
        assert_eq!(outcome.cart.total_quantity, 2);
    }

    #[tokio::test]
    async fn test_merge_adds_guest_lines() {
        let (manager, _, _) = manager();

        let user = manager.resolve_user_cart(CUSTOMER, None).await.unwrap();
        manager
            .add_line_items(&user.cart_id, vec![item(VARIANT_A, 1)])
            .await
            .unwrap();

        let guest = manager.create_cart(None).await.unwrap();
        manager
            .add_line_items(&guest.cart_id, vec![item(VARIANT_B, 2), item(VARIANT_C, 1)])
            .await
            .unwrap();

        let outcome = manager
            .merge_carts_on_login(CUSTOMER, Some(&guest.cart_id), None)
            .await
            .unwrap();

        assert!(outcome.merged);
        assert_eq!(outcome.items_merged, 2);
        assert_eq!(outcome.message, "Successfully merged 2 item(s) from guest cart");
        assert_eq!(outcome.cart.cart_id, user.cart_id);
        assert_eq!(outcome.cart.items.len(), 3);
        assert_eq!(outcome.cart.total_quantity, 4);

        // The guest cart is left as it was.
        let guest = manager.get_cart(&guest.cart_id).await.unwrap();
        assert_eq!(guest.items.len(), 2);
    }

    #[tokio::test]
    async fn test_merge_trims_guest_cart_id() {
        let (manager, _, _) = manager();

        let guest = manager.create_cart(None).await.unwrap();
        manager
            .add_line_items(&guest.cart_id, vec![item(VARIANT_B, 3)])
            .await
            .unwrap();

        let padded = format!("  {}\n", guest.cart_id);
        let outcome = manager
            .merge_carts_on_login(CUSTOMER, Some(&padded), None)
            .await
            .unwrap();
        assert!(outcome.merged);
        assert_eq!(outcome.cart.total_quantity, 3);

        let own = format!(" {} ", outcome.cart.cart_id);
        let outcome = manager
            .merge_carts_on_login(CUSTOMER, Some(&own), None)
            .await
            .unwrap();
        assert!(!outcome.merged);
        assert_eq!(outcome.message, "Guest cart is already the user's cart");
        assert_eq!(outcome.cart.total_quantity, 3);
    }

    #[tokio::test]
    async fn test_update_buyer_identity_and_checkout() {
        let (manager, _, _) = manager();
        let cart = manager.create_cart(None).await.unwrap();

        let plain = manager.checkout(&cart.cart_id, None).await.unwrap();
        assert_eq!(plain.checkout_url, cart.checkout_url);
        assert!(plain.buyer_identity.is_none());

        let attached = manager
            .checkout(&cart.cart_id, Some("customer-token"))
            .await
            .unwrap();
        assert_eq!(attached.cart_id, cart.cart_id);
        assert!(attached.buyer_identity.is_some());

        assert!(matches!(
            manager.update_buyer_identity(&cart.cart_id, "expired").await,
            Err(CartError::Rejected(_))
        ));
        assert!(matches!(
            manager.checkout("gid://shopify/Cart/none", None).await,
            Err(CartError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_user_cart() {
        let (manager, _, metafields) = manager();
        let first = manager.resolve_user_cart(CUSTOMER, None).await.unwrap();

        manager.clear_user_cart(CUSTOMER).await.unwrap();
        assert_eq!(metafields.value(CUSTOMER).as_deref(), Some(""));
        manager.clear_user_cart(CUSTOMER).await.unwrap();
        assert_eq!(metafields.value(CUSTOMER).as_deref(), Some(""));

        let next = manager.resolve_user_cart(CUSTOMER, None).await.unwrap();
        assert_ne!(first.cart_id, next.cart_id);
    }
}
