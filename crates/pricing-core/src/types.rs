//! # Domain Types
//!
//! Small value types shared by the money, modifier and price modules.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐          ┌─────────────────────┐              │
//! │  │      Currency       │          │    ModifierKind     │              │
//! │  │  ─────────────────  │          │  ─────────────────  │              │
//! │  │  ISO 4217 code      │          │  Tax                │              │
//! │  │  fraction digits    │          │  Discount           │              │
//! │  │  USD → 2, JPY → 0   │          │  Custom             │              │
//! │  └─────────────────────┘          └─────────────────────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::MoneyError;

// =============================================================================
// Currency
// =============================================================================

/// An ISO 4217 currency code.
///
/// Stored as three uppercase ASCII bytes so the type stays `Copy`.
/// Every [`crate::money::Money`] carries one, and arithmetic between
/// different currencies fails fast.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency([u8; 3]);

/// Currencies without a minor unit.
const ZERO_DIGIT_CURRENCIES: &[&str] = &[
    "BIF", "CLP", "DJF", "GNF", "ISK", "JPY", "KMF", "KRW", "PYG", "RWF", "UGX", "UYI", "VND",
    "VUV", "XAF", "XOF", "XPF",
];

/// Currencies with three fraction digits.
const THREE_DIGIT_CURRENCIES: &[&str] = &["BHD", "IQD", "JOD", "KWD", "LYD", "OMR", "TND"];

impl Currency {
    pub const USD: Currency = Currency(*b"USD");
    pub const EUR: Currency = Currency(*b"EUR");
    pub const GBP: Currency = Currency(*b"GBP");
    pub const JPY: Currency = Currency(*b"JPY");

    /// Parses a currency code, accepting lowercase input.
    ///
    /// ## Example
    /// ```rust
    /// use pricing_core::types::Currency;
    ///
    /// assert_eq!(Currency::new("eur").unwrap(), Currency::EUR);
    /// assert!(Currency::new("EURO").is_err());
    /// ```
    pub fn new(code: &str) -> Result<Self, MoneyError> {
        let code = code.trim();
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(MoneyError::UnknownCurrency(code.to_string()));
        }
        let mut upper = [0u8; 3];
        for (slot, b) in upper.iter_mut().zip(bytes) {
            *slot = b.to_ascii_uppercase();
        }
        Ok(Currency(upper))
    }

    /// Returns the three-letter code.
    pub fn code(&self) -> &str {
        // Constructed only from ASCII letters.
        std::str::from_utf8(&self.0).unwrap_or("XXX")
    }

    /// Default number of fraction digits (the scale of the minor unit).
    ///
    /// ## Example
    /// ```rust
    /// use pricing_core::types::Currency;
    ///
    /// assert_eq!(Currency::USD.fraction_digits(), 2);
    /// assert_eq!(Currency::JPY.fraction_digits(), 0);
    /// ```
    pub fn fraction_digits(&self) -> u32 {
        let code = self.code();
        if ZERO_DIGIT_CURRENCIES.contains(&code) {
            0
        } else if THREE_DIGIT_CURRENCIES.contains(&code) {
            3
        } else {
            2
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({})", self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Currency::new(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code().to_string()
    }
}

// =============================================================================
// Modifier Kind
// =============================================================================

/// Classification of a modifier, recorded on every ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    /// Adds a levy to the running price.
    Tax,
    /// Reduces the running price.
    Discount,
    /// Anything else, including unclassified callables.
    #[default]
    Custom,
}

impl fmt::Display for ModifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModifierKind::Tax => write!(f, "tax"),
            ModifierKind::Discount => write!(f, "discount"),
            ModifierKind::Custom => write!(f, "custom"),
        }
    }
}

impl FromStr for ModifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tax" => Ok(ModifierKind::Tax),
            "discount" => Ok(ModifierKind::Discount),
            "custom" => Ok(ModifierKind::Custom),
            other => Err(format!(
                "Unknown modifier kind: '{}'. Valid options: tax, discount, custom",
                other
            )),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_parsing() {
        assert_eq!(Currency::new("usd").unwrap(), Currency::USD);
        assert_eq!(" GBP ".parse::<Currency>().unwrap(), Currency::GBP);
        assert!(matches!(
            Currency::new("U$D"),
            Err(MoneyError::UnknownCurrency(_))
        ));
        assert!(Currency::new("").is_err());
    }

    #[test]
    fn test_fraction_digits() {
        assert_eq!(Currency::EUR.fraction_digits(), 2);
        assert_eq!(Currency::JPY.fraction_digits(), 0);
        assert_eq!(Currency::new("KWD").unwrap().fraction_digits(), 3);
    }

    #[test]
    fn test_currency_serde_as_string() {
        let json = serde_json::to_string(&Currency::EUR).unwrap();
        assert_eq!(json, "\"EUR\"");
        let back: Currency = serde_json::from_str("\"eur\"").unwrap();
        assert_eq!(back, Currency::EUR);
        assert!(serde_json::from_str::<Currency>("\"EURO\"").is_err());
    }

    #[test]
    fn test_modifier_kind_default_and_parse() {
        assert_eq!(ModifierKind::default(), ModifierKind::Custom);
        assert_eq!("TAX".parse::<ModifierKind>().unwrap(), ModifierKind::Tax);
        assert!("rebate".parse::<ModifierKind>().is_err());
    }
}
