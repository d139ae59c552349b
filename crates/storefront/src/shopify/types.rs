//! Domain types for the Shopify Storefront and Admin APIs.
//!
//! These types are separate from the raw wire shapes in `storefront::queries`
//! and `admin`. Amounts are already parsed into [`Money`].

pub use headless_bff_core::Money;

use serde::{Deserialize, Serialize};

// =============================================================================
// Image Types
// =============================================================================

/// Variant or product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    pub alt_text: Option<String>,
}

// =============================================================================
// Cart Types
// =============================================================================

/// Parent product of a cart line's variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartMerchandiseProduct {
    /// Product ID.
    pub id: String,
    /// Product title.
    pub title: String,
    /// Product handle.
    pub handle: String,
    /// Featured image.
    pub featured_image: Option<Image>,
}

/// Product variant referenced by a cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartMerchandise {
    /// Variant ID.
    pub id: String,
    /// Variant title.
    pub title: String,
    /// Unit price.
    pub price: Money,
    /// Variant image.
    pub image: Option<Image>,
    /// Parent product.
    pub product: CartMerchandiseProduct,
}

/// A line item in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Cart line ID.
    pub id: String,
    /// Quantity.
    pub quantity: i64,
    /// Line total.
    pub total: Money,
    /// Product variant.
    pub merchandise: CartMerchandise,
}

/// Cart cost summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartCost {
    /// Subtotal before tax/shipping.
    pub subtotal: Money,
    /// Total amount.
    pub total: Money,
    /// Total tax amount, when Shopify has estimated it.
    pub total_tax: Option<Money>,
}

/// Buyer identity attached to a cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartBuyerIdentity {
    /// Email address.
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
}

/// A shopping cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart ID.
    pub id: String,
    /// Checkout URL.
    pub checkout_url: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
    /// Total item quantity.
    pub total_quantity: i64,
    /// Buyer identity.
    pub buyer_identity: Option<CartBuyerIdentity>,
    /// Cart cost summary.
    pub cost: CartCost,
    /// Cart lines.
    pub lines: Vec<CartLine>,
}

/// The slice of a cart returned by a buyer identity update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartIdentity {
    /// Cart ID.
    pub id: String,
    /// Checkout URL.
    pub checkout_url: String,
    /// Buyer identity after the update.
    pub buyer_identity: CartBuyerIdentity,
}

/// Buyer identity supplied when creating a cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerIdentityInput {
    /// Email address.
    pub email: Option<String>,
    /// Customer access token.
    pub customer_access_token: Option<String>,
}

/// Input for adding a line to cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineInput {
    /// Product variant ID.
    pub merchandise_id: String,
    /// Quantity to add.
    pub quantity: i64,
}

/// Input for updating a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineUpdateInput {
    /// Cart line ID.
    pub id: String,
    /// New quantity.
    pub quantity: i64,
}

/// User error from cart mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartUserError {
    /// Field path that caused the error.
    pub field: Option<Vec<String>>,
    /// Human-readable error message.
    pub message: String,
}

// =============================================================================
// Metafield Types
// =============================================================================

/// A customer metafield.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metafield {
    /// Admin API metafield ID.
    pub id: i64,
    /// Namespace.
    pub namespace: String,
    /// Key within the namespace.
    pub key: String,
    /// Stored value.
    pub value: String,
    /// Metafield type (e.g., `single_line_text_field`).
    pub kind: String,
}

/// Input for writing a customer metafield.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetafieldInput {
    /// Namespace.
    pub namespace: String,
    /// Key within the namespace.
    pub key: String,
    /// Value to store.
    pub value: String,
    /// Metafield type.
    pub kind: String,
}
