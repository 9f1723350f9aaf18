//! # Money Module
//!
//! Provides the `Money` type: an immutable decimal amount tagged with a
//! currency.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Decimal at the currency's scale                          │
//! │    USD amounts always carry 2 digits, JPY 0, KWD 3                      │
//! │    Every multiplication names its rounding mode explicitly             │
//! │    Adding EUR to USD is an error, never a silent coercion              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pricing_core::money::Money;
//! use pricing_core::decimal::RoundingMode;
//! use pricing_core::types::Currency;
//! use rust_decimal::Decimal;
//!
//! let price = Money::of_minor(1099, Currency::USD); // $10.99
//! let total = price.plus(&Money::of_minor(500, Currency::USD)).unwrap();
//! assert_eq!(total.minor_amount().unwrap(), 1599);
//!
//! let doubled = price.multiplied_by(Decimal::TWO, RoundingMode::HalfUp).unwrap();
//! assert_eq!(doubled.to_string(), "21.98 USD");
//! ```

use std::cmp::Ordering;
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::decimal::{round_to, RoundingMode};
use crate::error::{MoneyError, MoneyResult};
use crate::types::Currency;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in a specific currency.
///
/// ## Design Decisions
/// - **Decimal amount**: arbitrary precision, signed (discounts are negative)
/// - **Scale pinned to the currency**: `amount.scale()` always equals
///   `currency.fraction_digits()`, so the minor amount is exact
/// - **Immutable**: every operation returns a new value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates Money from a decimal amount that fits the currency scale.
    ///
    /// ## Example
    /// ```rust
    /// use pricing_core::money::Money;
    /// use pricing_core::types::Currency;
    /// use rust_decimal::Decimal;
    ///
    /// let ok = Money::of(Decimal::new(1050, 2), Currency::USD).unwrap();
    /// assert_eq!(ok.minor_amount().unwrap(), 1050);
    ///
    /// // 10.505 USD cannot be represented without rounding
    /// assert!(Money::of(Decimal::new(10505, 3), Currency::USD).is_err());
    /// ```
    pub fn of(amount: Decimal, currency: Currency) -> MoneyResult<Self> {
        Money::of_rounded(amount, currency, RoundingMode::Unnecessary)
    }

    /// Creates Money, rounding the amount to the currency scale.
    pub fn of_rounded(amount: Decimal, currency: Currency, mode: RoundingMode) -> MoneyResult<Self> {
        let amount = round_to(amount, currency.fraction_digits(), mode)?;
        Ok(Money { amount, currency })
    }

    /// Creates Money from an integer count of minor units (cents for USD).
    ///
    /// ## Example
    /// ```rust
    /// use pricing_core::money::Money;
    /// use pricing_core::types::Currency;
    ///
    /// let price = Money::of_minor(1099, Currency::USD);
    /// assert_eq!(price.to_string(), "10.99 USD");
    ///
    /// let yen = Money::of_minor(1099, Currency::JPY);
    /// assert_eq!(yen.to_string(), "1099 JPY");
    /// ```
    pub fn of_minor(minor: i64, currency: Currency) -> Self {
        Money {
            amount: Decimal::new(minor, currency.fraction_digits()),
            currency,
        }
    }

    /// Returns a zero amount in `currency`.
    pub fn zero(currency: Currency) -> Self {
        Money::of_minor(0, currency)
    }

    /// The decimal amount, at the currency scale.
    #[inline]
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    #[inline]
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns the amount as an integer count of minor units.
    pub fn minor_amount(&self) -> MoneyResult<i64> {
        let mut scaled = self.amount;
        scaled.rescale(self.currency.fraction_digits());
        i64::try_from(scaled.mantissa()).map_err(|_| MoneyError::Overflow)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Returns the negated amount.
    pub fn negated(&self) -> Self {
        Money {
            amount: -self.amount,
            currency: self.currency,
        }
    }

    /// Adds two amounts of the same currency.
    ///
    /// Both sides share the currency scale, so the sum is exact.
    pub fn plus(&self, other: &Money) -> MoneyResult<Money> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(MoneyError::Overflow)?;
        Ok(Money {
            amount,
            currency: self.currency,
        })
    }

    /// Subtracts `other` from `self`.
    pub fn minus(&self, other: &Money) -> MoneyResult<Money> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or(MoneyError::Overflow)?;
        Ok(Money {
            amount,
            currency: self.currency,
        })
    }

    /// Multiplies by a decimal factor, rounding back to the currency scale.
    ///
    /// ## Example
    /// ```rust
    /// use pricing_core::money::Money;
    /// use pricing_core::decimal::RoundingMode;
    /// use pricing_core::types::Currency;
    /// use rust_decimal::Decimal;
    ///
    /// let price = Money::of_minor(1000, Currency::USD); // $10.00
    /// let rate = Decimal::new(825, 4);                  // 0.0825
    ///
    /// // $10.00 × 8.25% = $0.825
    /// let up = price.multiplied_by(rate, RoundingMode::HalfUp).unwrap();
    /// let even = price.multiplied_by(rate, RoundingMode::HalfEven).unwrap();
    /// assert_eq!(up.minor_amount().unwrap(), 83);
    /// assert_eq!(even.minor_amount().unwrap(), 82);
    /// ```
    pub fn multiplied_by(&self, factor: Decimal, mode: RoundingMode) -> MoneyResult<Money> {
        let product = self
            .amount
            .checked_mul(factor)
            .ok_or(MoneyError::Overflow)?;
        Money::of_rounded(product, self.currency, mode)
    }

    /// Compares two amounts of the same currency.
    pub fn compare(&self, other: &Money) -> MoneyResult<Ordering> {
        self.ensure_same_currency(other)?;
        Ok(self.amount.cmp(&other.amount))
    }

    fn ensure_same_currency(&self, other: &Money) -> MoneyResult<()> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch {
                expected: self.currency,
                actual: other.currency,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the plain amount followed by the code (`10.99 USD`).
///
/// ## Note
/// This is for logs and debugging. Locale-aware formatting belongs to
/// whoever renders the price.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn usd(minor: i64) -> Money {
        Money::of_minor(minor, Currency::USD)
    }

    #[test]
    fn test_of_minor() {
        let money = usd(1099);
        assert_eq!(money.amount(), dec!(10.99));
        assert_eq!(money.minor_amount().unwrap(), 1099);
        assert_eq!(money.currency(), Currency::USD);
    }

    #[test]
    fn test_of_pads_and_rejects() {
        let money = Money::of(dec!(10), Currency::USD).unwrap();
        assert_eq!(money.to_string(), "10.00 USD");
        assert!(matches!(
            Money::of(dec!(0.001), Currency::USD),
            Err(MoneyError::RoundingNecessary { .. })
        ));
        let rounded = Money::of_rounded(dec!(0.005), Currency::USD, RoundingMode::HalfUp).unwrap();
        assert_eq!(rounded.minor_amount().unwrap(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(usd(1099).to_string(), "10.99 USD");
        assert_eq!(usd(-550).to_string(), "-5.50 USD");
        assert_eq!(Money::zero(Currency::EUR).to_string(), "0.00 EUR");
    }

    #[test]
    fn test_arithmetic() {
        let a = usd(1000);
        let b = usd(500);

        assert_eq!(a.plus(&b).unwrap(), usd(1500));
        assert_eq!(a.minus(&b).unwrap(), usd(500));
        assert_eq!(b.minus(&a).unwrap(), usd(-500));
        assert_eq!(a.multiplied_by(dec!(3), RoundingMode::HalfUp).unwrap(), usd(3000));
    }

    #[test]
    fn test_currency_mismatch_fails_fast() {
        let eur = Money::of_minor(100, Currency::EUR);
        let err = usd(100).plus(&eur).unwrap_err();
        assert_eq!(
            err,
            MoneyError::CurrencyMismatch {
                expected: Currency::USD,
                actual: Currency::EUR
            }
        );
        assert!(usd(100).minus(&eur).is_err());
        assert!(usd(100).compare(&eur).is_err());
    }

    #[test]
    fn test_multiplication_rounding_modes() {
        // $10.00 × 8.25% = $0.825
        let price = usd(1000);
        let rate = dec!(0.0825);
        assert_eq!(price.multiplied_by(rate, RoundingMode::HalfUp).unwrap(), usd(83));
        assert_eq!(price.multiplied_by(rate, RoundingMode::HalfDown).unwrap(), usd(82));
        assert_eq!(price.multiplied_by(rate, RoundingMode::Floor).unwrap(), usd(82));
        assert!(price
            .multiplied_by(rate, RoundingMode::Unnecessary)
            .is_err());
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::zero(Currency::USD).is_zero());
        assert!(!Money::zero(Currency::USD).is_positive());
        assert!(!Money::zero(Currency::USD).is_negative());
        assert!(usd(100).is_positive());
        assert!(usd(-100).is_negative());
        assert_eq!(usd(-100).negated(), usd(100));
    }

    #[test]
    fn test_minor_amount_respects_currency_scale() {
        let yen = Money::of(dec!(1500), Currency::JPY).unwrap();
        assert_eq!(yen.minor_amount().unwrap(), 1500);
        let dinar = Money::of(dec!(1.5), Currency::new("KWD").unwrap()).unwrap();
        assert_eq!(dinar.minor_amount().unwrap(), 1500);
    }

    /// $10.00 split three ways and reassembled loses a cent under HalfUp.
    #[test]
    fn test_division_precision_loss_documented() {
        let ten = usd(1000);
        let third = ten
            .multiplied_by(dec!(1) / dec!(3), RoundingMode::HalfUp)
            .unwrap();
        assert_eq!(third, usd(333));
        let reconstructed = third.multiplied_by(dec!(3), RoundingMode::HalfUp).unwrap();
        assert_eq!(ten.minus(&reconstructed).unwrap(), usd(1));
    }
}
