//! Client-facing cart shape.
//!
//! Every cart the BFF returns is flattened into [`CartView`]: lines become
//! `items` with the variant and product split apart, and costs keep their
//! currency code next to a numeric amount.

use serde::Serialize;

use crate::shopify::types::{Cart, CartLine, Image, Money};

/// Image as rendered to clients (`{url, altText}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageView {
    pub url: String,
    pub alt_text: Option<String>,
}

impl From<Image> for ImageView {
    fn from(image: Image) -> Self {
        Self {
            url: image.url,
            alt_text: image.alt_text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantView {
    pub id: String,
    pub title: String,
    pub price: Money,
    pub image: Option<ImageView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    pub title: String,
    pub handle: String,
    pub featured_image: Option<ImageView>,
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub line_id: String,
    pub quantity: i64,
    pub variant: VariantView,
    pub product: ProductView,
    pub line_cost: Money,
}

impl From<CartLine> for CartItemView {
    fn from(line: CartLine) -> Self {
        let merchandise = line.merchandise;
        Self {
            line_id: line.id,
            quantity: line.quantity,
            variant: VariantView {
                id: merchandise.id,
                title: merchandise.title,
                price: merchandise.price,
                image: merchandise.image.map(ImageView::from),
            },
            product: ProductView {
                id: merchandise.product.id,
                title: merchandise.product.title,
                handle: merchandise.product.handle,
                featured_image: merchandise.product.featured_image.map(ImageView::from),
            },
            line_cost: line.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCostView {
    pub subtotal: Money,
    pub total: Money,
    pub total_tax: Option<Money>,
}

/// A cart as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub cart_id: String,
    pub checkout_url: String,
    pub created_at: String,
    pub updated_at: String,
    pub total_quantity: i64,
    pub items: Vec<CartItemView>,
    pub cost: CartCostView,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        Self {
            cart_id: cart.id,
            checkout_url: cart.checkout_url,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
            total_quantity: cart.total_quantity,
            items: cart.lines.into_iter().map(CartItemView::from).collect(),
            cost: CartCostView {
                subtotal: cart.cost.subtotal,
                total: cart.cost.total,
                total_tax: cart.cost.total_tax,
            },
        }
    }
}
