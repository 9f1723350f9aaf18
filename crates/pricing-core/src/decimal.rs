//! # Decimal Module
//!
//! Thin layer over [`rust_decimal::Decimal`]: rounding modes, division at a
//! fixed scale, and normalization of loosely-typed numeric input.
//!
//! ## Rounding Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Value  │ Up │ Down │ Ceiling │ Floor │ HalfUp │ HalfDown │ HalfEven   │
//! │  ───────┼────┼──────┼─────────┼───────┼────────┼──────────┼──────────  │
//! │   2.5   │  3 │   2  │    3    │   2   │   3    │    2     │    2       │
//! │  -2.5   │ -3 │  -2  │   -2    │  -3   │  -3    │   -2     │   -2       │
//! │   1.6   │  2 │   1  │    2    │   1   │   2    │    2     │    2       │
//! │                                                                         │
//! │  HalfCeiling / HalfFloor break ties toward +∞ / -∞.                     │
//! │  Unnecessary fails instead of dropping digits.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{MoneyError, MoneyResult, PriceError, PriceResult};

// =============================================================================
// Rounding Mode
// =============================================================================

/// Tie-breaking policy applied to every inexact operation of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RoundingMode {
    /// Away from zero.
    Up,
    /// Toward zero.
    Down,
    /// Toward positive infinity.
    Ceiling,
    /// Toward negative infinity.
    Floor,
    /// Nearest neighbour, ties away from zero.
    #[default]
    HalfUp,
    /// Nearest neighbour, ties toward zero.
    HalfDown,
    /// Nearest neighbour, ties to the even neighbour.
    HalfEven,
    /// Nearest neighbour, ties toward positive infinity.
    HalfCeiling,
    /// Nearest neighbour, ties toward negative infinity.
    HalfFloor,
    /// Exact results only.
    Unnecessary,
}

impl RoundingMode {
    fn strategy(self, value: Decimal) -> RoundingStrategy {
        match self {
            RoundingMode::Up => RoundingStrategy::AwayFromZero,
            RoundingMode::Down | RoundingMode::Unnecessary => RoundingStrategy::ToZero,
            RoundingMode::Ceiling => RoundingStrategy::ToPositiveInfinity,
            RoundingMode::Floor => RoundingStrategy::ToNegativeInfinity,
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfDown => RoundingStrategy::MidpointTowardZero,
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
            RoundingMode::HalfCeiling if value.is_sign_negative() => {
                RoundingStrategy::MidpointTowardZero
            }
            RoundingMode::HalfCeiling => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfFloor if value.is_sign_negative() => {
                RoundingStrategy::MidpointAwayFromZero
            }
            RoundingMode::HalfFloor => RoundingStrategy::MidpointTowardZero,
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoundingMode::Up => "up",
            RoundingMode::Down => "down",
            RoundingMode::Ceiling => "ceiling",
            RoundingMode::Floor => "floor",
            RoundingMode::HalfUp => "half_up",
            RoundingMode::HalfDown => "half_down",
            RoundingMode::HalfEven => "half_even",
            RoundingMode::HalfCeiling => "half_ceiling",
            RoundingMode::HalfFloor => "half_floor",
            RoundingMode::Unnecessary => "unnecessary",
        };
        f.write_str(name)
    }
}

impl FromStr for RoundingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "up" => Ok(RoundingMode::Up),
            "down" => Ok(RoundingMode::Down),
            "ceiling" => Ok(RoundingMode::Ceiling),
            "floor" => Ok(RoundingMode::Floor),
            "half_up" => Ok(RoundingMode::HalfUp),
            "half_down" => Ok(RoundingMode::HalfDown),
            "half_even" | "bankers" => Ok(RoundingMode::HalfEven),
            "half_ceiling" => Ok(RoundingMode::HalfCeiling),
            "half_floor" => Ok(RoundingMode::HalfFloor),
            "unnecessary" => Ok(RoundingMode::Unnecessary),
            other => Err(format!("Unknown rounding mode: '{}'", other)),
        }
    }
}

impl TryFrom<String> for RoundingMode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RoundingMode> for String {
    fn from(mode: RoundingMode) -> Self {
        mode.to_string()
    }
}

// =============================================================================
// Arithmetic
// =============================================================================

/// Rounds `value` to exactly `scale` fraction digits.
///
/// The result always carries `scale` digits, so `1.5` at scale 2 is `1.50`.
///
/// ## Example
/// ```rust
/// use pricing_core::decimal::{round_to, RoundingMode};
/// use rust_decimal::Decimal;
///
/// let v: Decimal = "2.345".parse().unwrap();
/// assert_eq!(round_to(v, 2, RoundingMode::HalfUp).unwrap().to_string(), "2.35");
/// assert_eq!(round_to(v, 2, RoundingMode::HalfEven).unwrap().to_string(), "2.34");
/// ```
pub fn round_to(value: Decimal, scale: u32, mode: RoundingMode) -> MoneyResult<Decimal> {
    let mut rounded = value.round_dp_with_strategy(scale, mode.strategy(value));
    if mode == RoundingMode::Unnecessary && rounded != value {
        return Err(MoneyError::RoundingNecessary { value, scale });
    }
    rounded.rescale(scale);
    Ok(rounded)
}

/// Divides `dividend` by `divisor`, rounding the quotient to `scale` digits.
pub fn divided_by(
    dividend: Decimal,
    divisor: Decimal,
    scale: u32,
    mode: RoundingMode,
) -> MoneyResult<Decimal> {
    if divisor.is_zero() {
        return Err(MoneyError::DivisionByZero);
    }
    let quotient = dividend
        .checked_div(divisor)
        .ok_or(MoneyError::Overflow)?;
    round_to(quotient, scale, mode)
}

// =============================================================================
// Loose Numeric Input
// =============================================================================

/// A number as it arrives from callers or serialized records.
///
/// Deserializes from JSON numbers and strings, so `2`, `2.5` and `"2,5"`
/// are all accepted. Non-integral numbers are read from their literal text
/// into [`Scalar::Decimal`] and never pass through `f64`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    return Ok(Scalar::Int(int));
                }
                let text = number.to_string();
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .map(Scalar::Decimal)
                    .map_err(|e| D::Error::custom(format!("number {} out of range: {}", text, e)))
            }
            serde_json::Value::String(text) => Ok(Scalar::Text(text)),
            other => Err(D::Error::custom(format!(
                "expected a number or a string, got {}",
                other
            ))),
        }
    }
}

impl Scalar {
    /// Normalizes the input into a [`Decimal`].
    ///
    /// ## Text Rules
    /// - Surrounding whitespace and `%` signs are trimmed
    /// - When both `,` and `.` appear, the last one is the decimal
    ///   separator and the other is a thousands separator
    /// - A single `,` with no `.` is the decimal separator (`"2,5"`)
    /// - A repeated separator with no other one groups thousands
    ///   (`"1,234,567"`, `"1.234.567"`)
    ///
    /// ## Example
    /// ```rust
    /// use pricing_core::decimal::Scalar;
    ///
    /// assert_eq!(Scalar::from(" 21 % ").to_decimal().unwrap().to_string(), "21");
    /// assert_eq!(Scalar::from("2,5").to_decimal().unwrap().to_string(), "2.5");
    /// assert_eq!(Scalar::from("1.234,50").to_decimal().unwrap().to_string(), "1234.50");
    /// assert_eq!(Scalar::from("1,234,567").to_decimal().unwrap().to_string(), "1234567");
    /// ```
    pub fn to_decimal(&self) -> PriceResult<Decimal> {
        match self {
            Scalar::Int(value) => Ok(Decimal::from(*value)),
            Scalar::Decimal(value) => Ok(*value),
            Scalar::Float(value) => Decimal::from_f64(*value)
                .map(|d| d.normalize())
                .ok_or_else(|| PriceError::InvalidNumber {
                    value: value.to_string(),
                    reason: "not a finite number".to_string(),
                }),
            Scalar::Text(text) => parse_decimal(text),
        }
    }
}

/// Parses a decimal-separator tolerant numeric string.
pub fn parse_decimal(text: &str) -> PriceResult<Decimal> {
    let invalid = |reason: &str| PriceError::InvalidNumber {
        value: text.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = text.trim().trim_matches('%').trim();
    if trimmed.is_empty() {
        return Err(invalid("empty"));
    }

    let commas = trimmed.matches(',').count();
    let dots = trimmed.matches('.').count();
    let normalized = match (trimmed.rfind(','), trimmed.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => trimmed.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => trimmed.replace(',', ""),
        (Some(_), None) if commas > 1 => trimmed.replace(',', ""),
        (Some(_), None) => trimmed.replace(',', "."),
        (None, Some(_)) if dots > 1 => trimmed.replace('.', ""),
        _ => trimmed.to_string(),
    };

    Decimal::from_str(&normalized).map_err(|e| invalid(&e.to_string()))
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(i64::from(value))
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<Decimal> for Scalar {
    fn from(value: Decimal) -> Self {
        Scalar::Decimal(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rounding_modes_on_ties() {
        let cases = [
            (RoundingMode::Up, dec!(2.5), dec!(3)),
            (RoundingMode::Down, dec!(2.5), dec!(2)),
            (RoundingMode::Ceiling, dec!(-2.5), dec!(-2)),
            (RoundingMode::Floor, dec!(-2.5), dec!(-3)),
            (RoundingMode::HalfUp, dec!(-2.5), dec!(-3)),
            (RoundingMode::HalfDown, dec!(2.5), dec!(2)),
            (RoundingMode::HalfEven, dec!(3.5), dec!(4)),
            (RoundingMode::HalfCeiling, dec!(-2.5), dec!(-2)),
            (RoundingMode::HalfCeiling, dec!(2.5), dec!(3)),
            (RoundingMode::HalfFloor, dec!(2.5), dec!(2)),
            (RoundingMode::HalfFloor, dec!(-2.5), dec!(-3)),
        ];
        for (mode, input, expected) in cases {
            assert_eq!(round_to(input, 0, mode).unwrap(), expected, "{mode} on {input}");
        }
    }

    #[test]
    fn test_round_to_pads_scale() {
        let rounded = round_to(dec!(1.5), 2, RoundingMode::HalfUp).unwrap();
        assert_eq!(rounded.scale(), 2);
        assert_eq!(rounded.to_string(), "1.50");
    }

    #[test]
    fn test_unnecessary_rejects_inexact() {
        assert_eq!(
            round_to(dec!(1.50), 1, RoundingMode::Unnecessary).unwrap(),
            dec!(1.5)
        );
        assert!(matches!(
            round_to(dec!(1.55), 1, RoundingMode::Unnecessary),
            Err(MoneyError::RoundingNecessary { .. })
        ));
    }

    #[test]
    fn test_divided_by() {
        let q = divided_by(dec!(21), dec!(100), 4, RoundingMode::HalfUp).unwrap();
        assert_eq!(q.to_string(), "0.2100");
        let q = divided_by(dec!(2), dec!(3), 4, RoundingMode::HalfUp).unwrap();
        assert_eq!(q, dec!(0.6667));
        assert_eq!(
            divided_by(dec!(1), Decimal::ZERO, 2, RoundingMode::HalfUp),
            Err(MoneyError::DivisionByZero)
        );
    }

    #[test]
    fn test_parse_decimal_variants() {
        assert_eq!(parse_decimal("21%").unwrap(), dec!(21));
        assert_eq!(parse_decimal("  %7,5% ").unwrap(), dec!(7.5));
        assert_eq!(parse_decimal("1,234.50").unwrap(), dec!(1234.50));
        assert_eq!(parse_decimal("1.234,50").unwrap(), dec!(1234.50));
        assert_eq!(parse_decimal("1,234,567").unwrap(), dec!(1234567));
        assert_eq!(parse_decimal("1.234.567,25").unwrap(), dec!(1234567.25));
        assert_eq!(parse_decimal("1.234.567").unwrap(), dec!(1234567));
        assert_eq!(parse_decimal("1,5").unwrap(), dec!(1.5));
        assert!(parse_decimal("1,2,3.4,5").is_err());
        assert!(matches!(
            parse_decimal("abc"),
            Err(PriceError::InvalidNumber { .. })
        ));
        assert!(parse_decimal(" % ").is_err());
    }

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(Scalar::from(3).to_decimal().unwrap(), dec!(3));
        assert_eq!(Scalar::from(2.5).to_decimal().unwrap(), dec!(2.5));
        assert!(Scalar::from(f64::NAN).to_decimal().is_err());
        assert_eq!(Scalar::from(dec!(0.1)).to_decimal().unwrap(), dec!(0.1));
    }

    #[test]
    fn test_scalar_deserializes_untagged() {
        let values: Vec<Scalar> =
            serde_json::from_str(r#"[2, 2.5, "2,5", 1.000000000000000001]"#).unwrap();
        assert_eq!(values[0], Scalar::Int(2));
        assert_eq!(values[1], Scalar::Decimal(dec!(2.5)));
        assert_eq!(values[2], Scalar::Text("2,5".to_string()));
        assert_eq!(
            values[3].to_decimal().unwrap(),
            dec!(1.000000000000000001)
        );
        assert!(serde_json::from_str::<Scalar>("true").is_err());
        assert!(serde_json::from_str::<Scalar>("null").is_err());
    }

    #[test]
    fn test_rounding_mode_parse() {
        assert_eq!("HALF_UP".parse::<RoundingMode>().unwrap(), RoundingMode::HalfUp);
        assert_eq!("half-even".parse::<RoundingMode>().unwrap(), RoundingMode::HalfEven);
        assert!("sideways".parse::<RoundingMode>().is_err());
        assert_eq!(RoundingMode::default(), RoundingMode::HalfUp);
    }
}
