//! # Serialization Boundary
//!
//! The wire shape of a [`Price`] and the ways to build one from loosely
//! typed input.
//!
//! ## Record Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Output (PriceSnapshot)                                                 │
//! │    { "base": 1000, "currency": "USD", "units": 2.5, "vat": 21,          │
//! │      "total": { "exclusive": 1800, "inclusive": 2220 } }                │
//! │                                                                         │
//! │  Input (SerializedPrice)                                                │
//! │    { "base": 1000, "currency": "USD", "units": "2", "vat": "21%" }      │
//! │        │                                                                │
//! │        ▼                                                                │
//! │    Money::of_minor(base, currency) ─► set_units(units) ─► set_vat(vat)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts are integer minor units. Units and VAT are written as JSON
//! numbers carrying every decimal digit, so a round trip reproduces them
//! exactly. Modifiers are not part of either record, so a round trip keeps
//! base, units and VAT but drops the ledger.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use ts_rs::TS;

use crate::decimal::Scalar;
use crate::error::{PriceError, PriceResult};
use crate::money::Money;
use crate::price::Price;
use crate::types::Currency;

// =============================================================================
// Records
// =============================================================================

/// Totals for all units, in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Totals {
    pub exclusive: i64,
    pub inclusive: i64,
}

/// Serialized output of a [`Price`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceSnapshot {
    /// Base unit price in minor units.
    pub base: i64,

    /// ISO 4217 code.
    pub currency: String,

    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    #[ts(as = "f64")]
    pub units: Decimal,

    /// VAT percentage, `null` when no VAT is set.
    #[serde(with = "rust_decimal::serde::arbitrary_precision_option")]
    #[ts(as = "Option<f64>")]
    pub vat: Option<Decimal>,

    pub total: Totals,
}

/// Input record accepted by [`Price::from_serialized`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedPrice {
    /// Base unit price in minor units. Must be integral.
    pub base: Scalar,

    pub currency: String,

    #[serde(default = "default_units")]
    pub units: Scalar,

    #[serde(default)]
    pub vat: Option<Scalar>,
}

fn default_units() -> Scalar {
    Scalar::Int(1)
}

impl From<PriceSnapshot> for SerializedPrice {
    fn from(snapshot: PriceSnapshot) -> Self {
        SerializedPrice {
            base: Scalar::Int(snapshot.base),
            currency: snapshot.currency,
            units: Scalar::Decimal(snapshot.units),
            vat: snapshot.vat.map(Scalar::Decimal),
        }
    }
}

// =============================================================================
// Loose Money Parsing
// =============================================================================

/// Collaborator that extracts `(minor amount, currency)` from loose input
/// such as `"$10.99"` or `"10,99 €"`.
///
/// No heuristics ship with this crate. Any `Fn(&Scalar, Option<Currency>)`
/// with the right return type is a parser.
pub trait LooseMoneyParser {
    /// `currency` overrides whatever the parser would detect.
    fn parse(&self, value: &Scalar, currency: Option<Currency>) -> PriceResult<(i64, Currency)>;
}

impl<F> LooseMoneyParser for F
where
    F: Fn(&Scalar, Option<Currency>) -> PriceResult<(i64, Currency)>,
{
    fn parse(&self, value: &Scalar, currency: Option<Currency>) -> PriceResult<(i64, Currency)> {
        self(value, currency)
    }
}

// =============================================================================
// Price <-> Records
// =============================================================================

impl Price {
    /// Builds the output record. Totals cover all units.
    pub fn snapshot(&self) -> PriceResult<PriceSnapshot> {
        Ok(PriceSnapshot {
            base: self.base().minor_amount()?,
            currency: self.currency().code().to_string(),
            units: self.units(),
            vat: self.vat_percentage(),
            total: Totals {
                exclusive: self.exclusive(false)?.minor_amount()?,
                inclusive: self.inclusive(false)?.minor_amount()?,
            },
        })
    }

    /// Serializes [`Price::snapshot`] to a JSON string.
    pub fn to_json(&self) -> PriceResult<String> {
        Ok(serde_json::to_string(&self.snapshot()?)?)
    }

    /// Rebuilds a price from an input record.
    ///
    /// ## Errors
    /// - [`PriceError::InvalidSerializedPrice`] for a non-integral base or
    ///   an unknown currency
    /// - Unit and VAT validation errors as from the setters
    pub fn from_serialized(record: SerializedPrice) -> PriceResult<Price> {
        let base = integral_minor(&record.base).ok_or_else(|| {
            invalid(format!(
                "base must be an integer minor amount, got {:?}",
                record.base
            ))
        })?;
        let currency = Currency::new(&record.currency).map_err(|e| invalid(e.to_string()))?;

        let mut price = Price::new(Money::of_minor(base, currency), record.units)?;
        price.set_vat(record.vat)?;
        Ok(price)
    }

    /// Parses a JSON document into a price.
    ///
    /// ## Example
    /// ```rust
    /// use pricing_core::price::Price;
    ///
    /// let price = Price::from_json(r#"{"base": 1000, "currency": "USD", "units": 2, "vat": "21%"}"#).unwrap();
    /// assert_eq!(price.inclusive(false).unwrap().minor_amount().unwrap(), 2420);
    /// assert!(Price::from_json("[1, 2]").is_err());
    /// ```
    pub fn from_json(json: &str) -> PriceResult<Price> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;
        Price::try_from(value)
    }

    /// Convenience static construction.
    ///
    /// ## Forms
    /// | Name                  | Arguments                            |
    /// |-----------------------|--------------------------------------|
    /// | `of`                  | amount, currency, \[units\]          |
    /// | `of_minor`, `ofMinor` | minor amount, currency, \[units\]    |
    /// | `zero`                | currency, \[units\]                  |
    /// | a currency code       | minor amount, \[units\]              |
    ///
    /// ## Example
    /// ```rust
    /// use pricing_core::decimal::Scalar;
    /// use pricing_core::price::Price;
    ///
    /// let price = Price::from_factory("EUR", &[Scalar::Int(1999), Scalar::Int(3)]).unwrap();
    /// assert_eq!(price.exclusive(false).unwrap().to_string(), "59.97 EUR");
    /// assert!(Price::from_factory("teleport", &[]).is_err());
    /// ```
    pub fn from_factory(name: &str, args: &[Scalar]) -> PriceResult<Price> {
        let unsupported = || {
            PriceError::UnsupportedFactoryCall(format!("{}({} arguments)", name, args.len()))
        };

        let (base, units) = match (name.trim(), args) {
            ("of", [amount, currency, rest @ ..]) => {
                let money = Money::of(amount.to_decimal()?, factory_currency(currency)?)?;
                (money, rest)
            }
            ("of_minor" | "ofMinor", [minor, currency, rest @ ..]) => {
                let minor = integral_minor(minor).ok_or_else(unsupported)?;
                (Money::of_minor(minor, factory_currency(currency)?), rest)
            }
            ("zero", [currency, rest @ ..]) => (Money::zero(factory_currency(currency)?), rest),
            (code, [minor, rest @ ..]) => {
                let currency = Currency::new(code).map_err(|_| unsupported())?;
                let minor = integral_minor(minor).ok_or_else(unsupported)?;
                (Money::of_minor(minor, currency), rest)
            }
            _ => return Err(unsupported()),
        };

        match units {
            [] => Price::new(base, 1),
            [units] => Price::new(base, units.clone()),
            _ => Err(unsupported()),
        }
    }

    /// Builds a price from loose money input via `parser`.
    pub fn from_loose<P>(
        parser: &P,
        value: &Scalar,
        currency: Option<Currency>,
        units: impl Into<Scalar>,
    ) -> PriceResult<Price>
    where
        P: LooseMoneyParser + ?Sized,
    {
        let (minor, currency) = parser.parse(value, currency)?;
        Price::new(Money::of_minor(minor, currency), units)
    }
}

impl TryFrom<serde_json::Value> for Price {
    type Error = PriceError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        if !value.is_object() {
            return Err(invalid(format!("expected an object, got {}", value)));
        }
        let record: SerializedPrice =
            serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
        Price::from_serialized(record)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

fn invalid(reason: String) -> PriceError {
    PriceError::InvalidSerializedPrice(reason)
}

/// Minor amounts must be whole numbers that fit an `i64`.
fn integral_minor(value: &Scalar) -> Option<i64> {
    let value = value.to_decimal().ok()?;
    if !value.fract().is_zero() {
        return None;
    }
    value.to_i64()
}

fn factory_currency(value: &Scalar) -> PriceResult<Currency> {
    match value {
        Scalar::Text(code) => Ok(Currency::new(code)?),
        other => Err(PriceError::UnsupportedFactoryCall(format!(
            "expected a currency code, got {:?}",
            other
        ))),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
