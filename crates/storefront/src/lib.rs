//! Headless cart backend-for-frontend library.
//!
//! Exposes Shopify carts to headless storefront clients: guest carts
//! addressed by ID, customer carts bound through a customer metafield, and
//! the guest-to-customer merge at login. Split out of the binary so the
//! router and services can be tested in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;

#[cfg(test)]
mod testing;
