//! Monetary amounts as exposed to storefront clients.
//!
//! Shopify returns amounts as decimal strings (`"19.99"`). The BFF hands them
//! to clients as JSON numbers paired with the currency code, so the string is
//! parsed once here.

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Money`] amount.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is not a decimal number.
    #[error("invalid decimal amount '{0}'")]
    InvalidAmount(String),
}

/// An amount paired with its ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: f64,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub fn new(amount: f64, currency_code: impl Into<String>) -> Self {
        Self {
            amount,
            currency_code: currency_code.into(),
        }
    }

    /// Parse a decimal string amount (as returned by Shopify).
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not a finite decimal number.
    pub fn parse(amount: &str, currency_code: impl Into<String>) -> Result<Self, MoneyError> {
        let value = amount
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| MoneyError::InvalidAmount(amount.to_owned()))?;
        Ok(Self::new(value, currency_code))
    }

    /// Returns true if both amounts share a currency.
    #[must_use]
    pub fn same_currency(&self, other: &Self) -> bool {
        self.currency_code == other.currency_code
    }
}
