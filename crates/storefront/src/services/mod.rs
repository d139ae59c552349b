//! Business logic services.
//!
//! # Services
//!
//! - `cart` - Cart session manager (user-cart association, line edits, merge)
//! - `auth` - Client token issuance and verification

pub mod auth;
pub mod cart;
