//! Cart type conversion functions.

use crate::shopify::ShopifyError;
use crate::shopify::types::{
    Cart, CartBuyerIdentity, CartCost, CartLine, CartMerchandise, CartMerchandiseProduct,
    CartUserError, Image, Money,
};

use super::super::queries::{
    BuyerIdentityFields, CartFields, CartLineFields, CartUserErrorFields, ImageFields,
    MerchandiseFields, MoneyFields,
};

fn convert_money(money: MoneyFields) -> Result<Money, ShopifyError> {
    Money::parse(&money.amount, money.currency_code)
        .map_err(|e| ShopifyError::InvalidResponse(e.to_string()))
}

fn convert_image(image: ImageFields) -> Image {
    Image {
        url: image.url,
        alt_text: image.alt_text,
    }
}

/// Convert buyer identity fields. A missing identity converts to an empty one.
pub fn convert_buyer_identity(identity: Option<BuyerIdentityFields>) -> CartBuyerIdentity {
    identity.map_or_else(CartBuyerIdentity::default, |b| CartBuyerIdentity {
        email: b.email,
        phone: b.phone,
    })
}

fn convert_line(line: CartLineFields) -> Result<CartLine, ShopifyError> {
    let MerchandiseFields::ProductVariant(variant) = line.merchandise;

    Ok(CartLine {
        id: line.id,
        quantity: line.quantity,
        total: convert_money(line.cost.total_amount)?,
        merchandise: CartMerchandise {
            id: variant.id,
            title: variant.title,
            price: convert_money(variant.price)?,
            image: variant.image.map(convert_image),
            product: CartMerchandiseProduct {
                id: variant.product.id,
                title: variant.product.title,
                handle: variant.product.handle,
                featured_image: variant.product.featured_image.map(convert_image),
            },
        },
    })
}

/// Convert the `CartFields` fragment into a domain [`Cart`].
///
/// # Errors
///
/// Returns `ShopifyError::InvalidResponse` if an amount is not a decimal.
pub fn convert_cart(cart: CartFields) -> Result<Cart, ShopifyError> {
    let lines = cart
        .lines
        .edges
        .into_iter()
        .map(|edge| convert_line(edge.node))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Cart {
        id: cart.id,
        checkout_url: cart.checkout_url,
        created_at: cart.created_at,
        updated_at: cart.updated_at,
        total_quantity: cart.total_quantity,
        buyer_identity: cart.buyer_identity.map(|b| convert_buyer_identity(Some(b))),
        cost: CartCost {
            subtotal: convert_money(cart.cost.subtotal_amount)?,
            total: convert_money(cart.cost.total_amount)?,
            total_tax: cart.cost.total_tax_amount.map(convert_money).transpose()?,
        },
        lines,
    })
}

/// The first user error of a mutation, if any.
///
/// Shopify may report several; only the first is surfaced to callers.
pub fn first_user_error(errors: Vec<CartUserErrorFields>) -> Option<CartUserError> {
    errors.into_iter().next().map(|e| CartUserError {
        field: e.field,
        message: e.message,
    })
}
