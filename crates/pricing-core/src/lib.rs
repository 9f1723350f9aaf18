//! # pricing-core: Price Aggregation Engine
//!
//! Turns a base unit price into exclusive and inclusive totals by running
//! an ordered set of modifiers around a VAT computation, and keeps a ledger
//! of what every modifier did.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pricing Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    pricing-cli / host application               │   │
//! │  │    JSON record ──► Price ──► totals + ledger                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pricing-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  decimal  │  │   money   │  │ modifier  │  │   price   │  │   │
//! │  │   │ Rounding  │  │   Money   │  │ Amendment │  │   Price   │  │   │
//! │  │   │  Scalar   │  │ Currency  │  │ pipeline  │  │   memo    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO NETWORK • NO GLOBAL STATE • DECIMAL MATH ONLY             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Currency and modifier classification
//! - [`decimal`] - Rounding modes and loose numeric input
//! - [`money`] - Money type with currency-scaled decimal arithmetic
//! - [`modifier`] - Modifier sources, amendments and the named registry
//! - [`pipeline`] - Phase partitioning and the modification ledger
//! - [`price`] - The price aggregate and its queries
//! - [`serialization`] - Serialized records and construction helpers
//! - [`config`] - Rounding and scale policy
//! - [`validation`] - Input range checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use pricing_core::{Currency, Money, Price};
//!
//! let mut price = Price::new(Money::of_minor(1000, Currency::USD), 2).unwrap();
//! price.set_vat("21%").unwrap();
//!
//! // 10.00 × 2 = 20.00, plus 21% VAT
//! assert_eq!(price.exclusive(false).unwrap().minor_amount().unwrap(), 2000);
//! assert_eq!(price.inclusive(false).unwrap().minor_amount().unwrap(), 2420);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod decimal;
pub mod error;
pub mod modifier;
pub mod money;
pub mod pipeline;
pub mod price;
pub mod serialization;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use config::PricingConfig;
pub use decimal::{RoundingMode, Scalar};
pub use error::{ConfigError, MoneyError, PriceError, PriceResult};
pub use modifier::{Amendment, AmendmentRegistry, ModifierMeta, ModifierSource};
pub use money::Money;
pub use pipeline::Modification;
pub use price::{Price, VatInput};
pub use serialization::{LooseMoneyParser, PriceSnapshot, SerializedPrice};
pub use types::{Currency, ModifierKind};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Fraction digits kept when turning a VAT percentage into a factor
/// (21% → 0.2100).
pub const DEFAULT_VAT_SCALE: u32 = 4;

/// Fraction digits kept when a VAT rate is derived from a VAT amount.
pub const DEFAULT_VAT_RATE_SCALE: u32 = 2;
