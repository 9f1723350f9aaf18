//! # Validation Module
//!
//! Construction-time normalizers for the inputs a [`crate::price::Price`]
//! accepts from callers.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Where Inputs Are Checked                           │
//! │                                                                         │
//! │  Caller value ("2,5", 21.0, "21 %", "")                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Scalar::to_decimal()       separator tolerant parsing                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  THIS MODULE                range checks, key normalization            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Price state                only ever holds validated values           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;

use crate::decimal::Scalar;
use crate::error::{PriceError, PriceResult};

/// Normalizes and validates a unit count.
///
/// ## Rules
/// - Decimal separator tolerant (`"2,5"` is 2.5)
/// - Must be non-negative (zero is allowed)
///
/// ## Example
/// ```rust
/// use pricing_core::validation::validate_units;
///
/// assert_eq!(validate_units("2,5".into()).unwrap().to_string(), "2.5");
/// assert!(validate_units((-1).into()).is_err());
/// ```
pub fn validate_units(units: Scalar) -> PriceResult<Decimal> {
    let units = units.to_decimal()?;
    if units.is_sign_negative() && !units.is_zero() {
        return Err(PriceError::NegativeUnits(units));
    }
    Ok(units)
}

/// Normalizes and validates a VAT percentage (`21` means 21%).
///
/// Surrounding `%` and whitespace are ignored. Negative rates are rejected.
pub fn validate_vat_rate(rate: Scalar) -> PriceResult<Decimal> {
    let rate = rate.to_decimal()?;
    if rate.is_sign_negative() && !rate.is_zero() {
        return Err(PriceError::NegativeVatRate(rate));
    }
    Ok(rate)
}

/// Normalizes a modifier key: blank keys become `None`.
///
/// ## Example
/// ```rust
/// use pricing_core::validation::normalize_key;
///
/// assert_eq!(normalize_key(Some(" promo ")), Some("promo".to_string()));
/// assert_eq!(normalize_key(Some("")), None);
/// assert_eq!(normalize_key(None), None);
/// ```
pub fn normalize_key(key: Option<&str>) -> Option<String> {
    key.map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_units() {
        assert_eq!(validate_units(Scalar::from(3)).unwrap(), dec!(3));
        assert_eq!(validate_units(Scalar::from("0")).unwrap(), dec!(0));
        assert_eq!(validate_units(Scalar::from(" 1,5 ")).unwrap(), dec!(1.5));
        assert!(matches!(
            validate_units(Scalar::from(-2)),
            Err(PriceError::NegativeUnits(_))
        ));
        assert!(matches!(
            validate_units(Scalar::from("two")),
            Err(PriceError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_validate_vat_rate() {
        assert_eq!(validate_vat_rate(Scalar::from("21%")).unwrap(), dec!(21));
        assert_eq!(validate_vat_rate(Scalar::from(0)).unwrap(), dec!(0));
        assert!(matches!(
            validate_vat_rate(Scalar::from("-5")),
            Err(PriceError::NegativeVatRate(_))
        ));
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key(Some("vat-exempt")), Some("vat-exempt".to_string()));
        assert_eq!(normalize_key(Some("   ")), None);
    }
}
