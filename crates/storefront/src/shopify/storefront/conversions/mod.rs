//! Type conversion functions for Shopify Storefront API responses.

pub mod cart;

pub use cart::{convert_buyer_identity, convert_cart, first_user_error};
