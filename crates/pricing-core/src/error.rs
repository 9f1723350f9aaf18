//! # Error Types
//!
//! Domain-specific error types for pricing-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  MoneyError   - arithmetic collaborator failures                        │
//! │  ├── CurrencyMismatch, DivisionByZero                                  │
//! │  └── RoundingNecessary, Overflow, UnknownCurrency                      │
//! │                                                                         │
//! │  PriceError   - construction / validation failures                      │
//! │  ├── InvalidModifier, InvalidSerializedPrice, UnsupportedFactoryCall   │
//! │  ├── InvalidNumber, NegativeUnits, NegativeVatRate                     │
//! │  └── Money(MoneyError), Json(serde_json::Error)                        │
//! │                                                                         │
//! │  ConfigError  - config file / environment problems                     │
//! │                                                                         │
//! │  Flow: MoneyError → PriceError → caller                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every failure is synchronous and surfaced immediately. Nothing retries.

use std::path::PathBuf;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::Currency;

// =============================================================================
// Money Error
// =============================================================================

/// Failures raised by [`crate::money::Money`] and [`crate::decimal`] math.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Two operands of one computation carry different currencies.
    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: Currency, actual: Currency },

    /// Divisor was zero.
    #[error("Division by zero")]
    DivisionByZero,

    /// The value needs rounding but the rounding mode forbids it.
    #[error("Rounding necessary to represent {value} at scale {scale}")]
    RoundingNecessary { value: Decimal, scale: u32 },

    /// Result does not fit the decimal or integer representation.
    #[error("Arithmetic overflow")]
    Overflow,

    /// Currency code is not three ASCII letters.
    #[error("Unknown currency code: {0:?}")]
    UnknownCurrency(String),
}

// =============================================================================
// Price Error
// =============================================================================

/// Errors surfaced by the price aggregate and its construction helpers.
#[derive(Debug, Error)]
pub enum PriceError {
    /// A modifier source could not be turned into a modifier.
    ///
    /// ## When This Occurs
    /// - Unknown named amendment
    /// - Named amendment called with the wrong arguments
    /// - Fixed amount with more digits than the currency allows
    #[error("Invalid modifier: {0}")]
    InvalidModifier(String),

    /// Deserialization input is not a usable price record.
    #[error("Invalid serialized price: {0}")]
    InvalidSerializedPrice(String),

    /// A static factory name resolves to neither a currency nor a Money factory.
    #[error("Unsupported factory call: {0}")]
    UnsupportedFactoryCall(String),

    /// Loose numeric input could not be normalized.
    #[error("Invalid number {value:?}: {reason}")]
    InvalidNumber { value: String, reason: String },

    #[error("Units must not be negative, got {0}")]
    NegativeUnits(Decimal),

    #[error("VAT rate must not be negative, got {0}%")]
    NegativeVatRate(Decimal),

    /// Propagated money arithmetic failure.
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    /// Writing the serialized record failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Config Error
// =============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with MoneyError.
pub type MoneyResult<T> = Result<T, MoneyError>;

/// Convenience type alias for Results with PriceError.
pub type PriceResult<T> = Result<T, PriceError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MoneyError::CurrencyMismatch {
            expected: Currency::USD,
            actual: Currency::EUR,
        };
        assert_eq!(err.to_string(), "Currency mismatch: expected USD, got EUR");

        let err = PriceError::InvalidModifier("unknown amendment 'bogus'".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid modifier: unknown amendment 'bogus'"
        );
    }

    #[test]
    fn test_money_error_converts_to_price_error() {
        let price_err: PriceError = MoneyError::DivisionByZero.into();
        assert!(matches!(
            price_err,
            PriceError::Money(MoneyError::DivisionByZero)
        ));
    }
}
