//! Headless BFF Core - Shared types library.
//!
//! This crate provides the domain types used by the backend-for-frontend:
//! - [`CustomerId`] - numeric Shopify customer identifier, validated at the edge
//! - [`Email`] - email address used as a buyer identity hint
//! - [`Money`] - monetary amount paired with an ISO 4217 currency code
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and lets the server and its tests share one vocabulary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
