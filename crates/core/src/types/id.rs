//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.

/// Errors that can occur when parsing a numeric ID from user input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input string is empty.
    #[error("id cannot be empty")]
    Empty,
    /// The input is not an integer.
    #[error("id must be numeric (got '{0}')")]
    NotNumeric(String),
    /// The input is zero or negative.
    #[error("id must be a positive integer")]
    NotPositive,
}

/// Macro to define a type-safe numeric ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_i64()`, `parse()`
/// - `From<i64>` and `Into<i64>` implementations
/// - `shopify_gid()` rendering the Shopify global ID for the given resource
///
/// # Example
///
/// ```rust
/// # use headless_bff_core::define_id;
/// define_id!(ProductId, "Product");
/// define_id!(OrderId, "Order");
///
/// let product_id = ProductId::new(1);
/// let order_id = OrderId::new(1);
/// assert_eq!(product_id.shopify_gid(), "gid://shopify/Product/1");
///
/// // These are different types, so this won't compile:
/// // let _: ProductId = order_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $resource:literal) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }

            /// Parse an ID from untrusted input (path segment or body field).
            ///
            /// Surrounding whitespace is ignored; the remainder must be a
            /// positive integer.
            ///
            /// # Errors
            ///
            /// Returns an error if the input is empty, not an integer, or not positive.
            pub fn parse(s: &str) -> ::core::result::Result<Self, $crate::types::id::IdError> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err($crate::types::id::IdError::Empty);
                }
                let value = trimmed
                    .parse::<i64>()
                    .map_err(|_| $crate::types::id::IdError::NotNumeric(trimmed.to_owned()))?;
                if value <= 0 {
                    return Err($crate::types::id::IdError::NotPositive);
                }
                Ok(Self(value))
            }

            /// Shopify global ID (`gid://shopify/<Resource>/<id>`).
            #[must_use]
            pub fn shopify_gid(&self) -> String {
                format!("gid://shopify/{}/{}", $resource, self.0)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Shopify customers are the only numeric identity the BFF accepts from callers.
define_id!(CustomerId, "Customer");
