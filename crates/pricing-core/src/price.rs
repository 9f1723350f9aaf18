//! # Price Aggregate
//!
//! [`Price`] owns a base unit price, a unit count, an optional VAT rate and
//! an ordered list of modifiers, and answers exclusive / inclusive / VAT
//! queries from them.
//!
//! ## Query Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Price Queries                                   │
//! │                                                                         │
//! │  modified_base()  ── memo hit? ──► cached per-unit exclusive            │
//! │        │ miss                                                           │
//! │        ▼                                                                │
//! │  ledger = []                                                           │
//! │  base ──► before-VAT phase (logged) ──► after-VAT phase (logged)       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  memo = (exclusive per unit, ledger)                                   │
//! │                                                                         │
//! │  exclusive(per_unit) = modified_base × (1 | units)                      │
//! │  vat(per_unit)       = before-VAT phase (not logged) × rate/100         │
//! │                        × (1 | units)                                    │
//! │  inclusive(per_unit) = exclusive + vat                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Memo Contract
//! - `add_modifier` and `set_config` invalidate the memo (and the ledger)
//! - `set_units` and `set_vat` do not: the memo is per unit and VAT-free
//! - The first query fills the memo under a lock, so `&self` queries may
//!   run from several threads at once
//!
//! ## Example
//! ```rust
//! use pricing_core::money::Money;
//! use pricing_core::price::Price;
//! use pricing_core::types::{Currency, ModifierKind};
//!
//! let mut price = Price::new(Money::of_minor(1000, Currency::USD), 2).unwrap();
//! price
//!     .add_discount(Money::of_minor(-100, Currency::USD), Some("promo"), false)
//!     .unwrap()
//!     .set_vat("21%")
//!     .unwrap();
//!
//! assert_eq!(price.exclusive(false).unwrap().minor_amount().unwrap(), 1800);
//! assert_eq!(price.vat(false).unwrap().unwrap().minor_amount().unwrap(), 420);
//! assert_eq!(price.inclusive(false).unwrap().minor_amount().unwrap(), 2220);
//!
//! let ledger = price.modifications(Some(ModifierKind::Discount)).unwrap();
//! assert_eq!(ledger[0].amount, Money::of_minor(-100, Currency::USD));
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::PricingConfig;
use crate::decimal::{divided_by, Scalar};
use crate::error::{MoneyError, PriceError, PriceResult};
use crate::modifier::{AmendmentRegistry, Modifier, ModifierMeta, ModifierSource};
use crate::money::Money;
use crate::pipeline::{apply_phase, phase_modifiers, Modification, Phase};
use crate::types::{Currency, ModifierKind};
use crate::validation::{validate_units, validate_vat_rate};

// =============================================================================
// VAT Input
// =============================================================================

/// Everything [`Price::set_vat`] accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum VatInput {
    /// No VAT (distinct from a 0% rate).
    Clear,
    /// The VAT amount for the current base; the rate is derived from it.
    Amount(Money),
    /// A percentage, e.g. `21`, `"21%"`, `"7,5"`.
    Rate(Scalar),
}

impl From<Money> for VatInput {
    fn from(value: Money) -> Self {
        VatInput::Amount(value)
    }
}

impl From<Scalar> for VatInput {
    fn from(value: Scalar) -> Self {
        VatInput::Rate(value)
    }
}

impl From<Decimal> for VatInput {
    fn from(value: Decimal) -> Self {
        VatInput::Rate(Scalar::Decimal(value))
    }
}

impl From<i64> for VatInput {
    fn from(value: i64) -> Self {
        VatInput::Rate(Scalar::Int(value))
    }
}

impl From<i32> for VatInput {
    fn from(value: i32) -> Self {
        VatInput::Rate(Scalar::from(value))
    }
}

impl From<f64> for VatInput {
    fn from(value: f64) -> Self {
        VatInput::Rate(Scalar::Float(value))
    }
}

impl From<&str> for VatInput {
    fn from(value: &str) -> Self {
        VatInput::Rate(Scalar::from(value))
    }
}

impl From<String> for VatInput {
    fn from(value: String) -> Self {
        VatInput::Rate(Scalar::Text(value))
    }
}

impl<T: Into<VatInput>> From<Option<T>> for VatInput {
    fn from(value: Option<T>) -> Self {
        value.map_or(VatInput::Clear, Into::into)
    }
}

// =============================================================================
// Memo
// =============================================================================

/// Result of one full pipeline run.
#[derive(Debug, Clone)]
struct ModifiedBase {
    exclusive_unit: Money,
    modifications: Vec<Modification>,
}

/// Memoization cell for [`ModifiedBase`], filled once under its lock.
#[derive(Debug, Default)]
struct Memo {
    cell: Mutex<Option<Arc<ModifiedBase>>>,
}

impl Memo {
    fn get_or_try_fill<F>(&self, fill: F) -> PriceResult<Arc<ModifiedBase>>
    where
        F: FnOnce() -> PriceResult<ModifiedBase>,
    {
        let mut guard = self.cell.lock();
        if let Some(hit) = guard.as_ref() {
            return Ok(Arc::clone(hit));
        }
        let computed = Arc::new(fill()?);
        *guard = Some(Arc::clone(&computed));
        Ok(computed)
    }

    fn invalidate(&mut self) {
        *self.cell.get_mut() = None;
    }

    fn is_filled(&self) -> bool {
        self.cell.lock().is_some()
    }
}

impl Clone for Memo {
    fn clone(&self) -> Self {
        Memo {
            cell: Mutex::new(self.cell.lock().clone()),
        }
    }
}

// =============================================================================
// Price
// =============================================================================

/// A base unit price plus everything that turns it into totals.
#[derive(Clone)]
pub struct Price {
    base: Money,
    units: Decimal,
    vat: Option<Decimal>,
    modifiers: Vec<Modifier>,
    config: PricingConfig,
    registry: Arc<AmendmentRegistry>,
    memo: Memo,
}

impl Price {
    /// Creates a price with the default [`PricingConfig`].
    pub fn new(base: Money, units: impl Into<Scalar>) -> PriceResult<Self> {
        Price::with_config(base, units, PricingConfig::default())
    }

    /// Creates a price computing under `config`.
    pub fn with_config(
        base: Money,
        units: impl Into<Scalar>,
        config: PricingConfig,
    ) -> PriceResult<Self> {
        Ok(Price {
            base,
            units: validate_units(units.into())?,
            vat: None,
            modifiers: Vec::new(),
            config,
            registry: Arc::new(AmendmentRegistry::default()),
            memo: Memo::default(),
        })
    }

    /// Replaces the registry used to resolve named amendments.
    pub fn with_registry(mut self, registry: Arc<AmendmentRegistry>) -> Self {
        self.registry = registry;
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// The base unit price, before modifiers and VAT.
    pub fn base(&self) -> Money {
        self.base
    }

    pub fn units(&self) -> Decimal {
        self.units
    }

    pub fn currency(&self) -> Currency {
        self.base.currency()
    }

    pub fn config(&self) -> PricingConfig {
        self.config
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    /// The VAT rate as a percentage, or `None` when no VAT is set.
    pub fn vat_percentage(&self) -> Option<Decimal> {
        self.vat
    }

    // -------------------------------------------------------------------------
    // Mutators
    // -------------------------------------------------------------------------

    /// Sets the unit count. Decimal-separator tolerant, must not be negative.
    pub fn set_units(&mut self, units: impl Into<Scalar>) -> PriceResult<&mut Self> {
        self.units = validate_units(units.into())?;
        Ok(self)
    }

    /// Swaps the arithmetic policy; the memo is recomputed on the next query.
    pub fn set_config(&mut self, config: PricingConfig) -> &mut Self {
        if config != self.config {
            self.config = config;
            self.memo.invalidate();
        }
        self
    }

    /// Sets, derives or clears the VAT rate.
    ///
    /// ## Behavior
    /// - [`VatInput::Clear`]: no VAT
    /// - [`VatInput::Rate`]: stored as a percentage (`"21%"` → 21)
    /// - [`VatInput::Amount`]: the amount is the VAT owed on the current
    ///   base; the rate is `100 × amount / base` at `vat_rate_scale` digits
    ///
    /// ## Example
    /// ```rust
    /// use pricing_core::money::Money;
    /// use pricing_core::price::Price;
    /// use pricing_core::types::Currency;
    ///
    /// let mut price = Price::new(Money::of_minor(1000, Currency::USD), 1).unwrap();
    /// price.set_vat(Money::of_minor(210, Currency::USD)).unwrap();
    /// assert_eq!(price.vat_percentage().unwrap().to_string(), "21.00");
    /// ```
    pub fn set_vat(&mut self, vat: impl Into<VatInput>) -> PriceResult<&mut Self> {
        self.vat = match vat.into() {
            VatInput::Clear => None,
            VatInput::Rate(rate) => Some(validate_vat_rate(rate)?),
            VatInput::Amount(amount) => Some(self.derive_vat_rate(&amount)?),
        };
        Ok(self)
    }

    /// Removes the VAT rate.
    pub fn clear_vat(&mut self) -> &mut Self {
        self.vat = None;
        self
    }

    /// Appends a modifier and invalidates the memo.
    ///
    /// ## Errors
    /// [`PriceError::InvalidModifier`] if the source cannot be resolved.
    pub fn add_modifier(
        &mut self,
        source: impl Into<ModifierSource>,
        meta: ModifierMeta,
    ) -> PriceResult<&mut Self> {
        let modifier = Modifier::resolve(source.into(), meta, self.currency(), &self.registry)?;
        debug!(
            kind = %modifier.kind(),
            key = ?modifier.key(),
            before_vat = modifier.is_before_vat(),
            had_memo = self.memo.is_filled(),
            "Modifier added, invalidating modified base"
        );
        self.modifiers.push(modifier);
        self.memo.invalidate();
        Ok(self)
    }

    /// Appends a modifier classified as a tax.
    pub fn add_tax(
        &mut self,
        source: impl Into<ModifierSource>,
        key: Option<&str>,
        before_vat: bool,
    ) -> PriceResult<&mut Self> {
        let meta = classified(ModifierKind::Tax, key, before_vat);
        self.add_modifier(source, meta)
    }

    /// Appends a modifier classified as a discount.
    ///
    /// The source is applied as given: a fixed discount is a negative amount.
    pub fn add_discount(
        &mut self,
        source: impl Into<ModifierSource>,
        key: Option<&str>,
        before_vat: bool,
    ) -> PriceResult<&mut Self> {
        let meta = classified(ModifierKind::Discount, key, before_vat);
        self.add_modifier(source, meta)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Per-unit exclusive price: base after both modifier phases.
    pub fn modified_base(&self) -> PriceResult<Money> {
        Ok(self.computed()?.exclusive_unit)
    }

    /// Exclusive price, per unit or for all units.
    pub fn exclusive(&self, per_unit: bool) -> PriceResult<Money> {
        let unit = self.modified_base()?;
        Ok(unit.multiplied_by(self.multiplier(per_unit), self.config.rounding)?)
    }

    /// VAT owed, or `None` when no VAT rate is set.
    ///
    /// Computed on the base after the before-VAT phase only. After-VAT
    /// modifiers never change the VAT.
    pub fn vat(&self, per_unit: bool) -> PriceResult<Option<Money>> {
        let Some(rate) = self.vat else {
            return Ok(None);
        };
        let rounding = self.config.rounding;

        let taxable = apply_phase(
            self.base,
            phase_modifiers(&self.modifiers, Phase::BeforeVat),
            rounding,
            None,
        )?;
        let factor = divided_by(rate, Decimal::ONE_HUNDRED, self.config.vat_scale, rounding)?;
        let vat = taxable
            .multiplied_by(factor, rounding)?
            .multiplied_by(self.multiplier(per_unit), rounding)?;
        Ok(Some(vat))
    }

    /// Exclusive price plus VAT (equal to exclusive when no VAT is set).
    pub fn inclusive(&self, per_unit: bool) -> PriceResult<Money> {
        let exclusive = self.exclusive(per_unit)?;
        match self.vat(per_unit)? {
            Some(vat) => Ok(exclusive.plus(&vat)?),
            None => Ok(exclusive),
        }
    }

    /// The ledger of the last pipeline run, optionally filtered by kind.
    pub fn modifications(&self, kind: Option<ModifierKind>) -> PriceResult<Vec<Modification>> {
        let computed = self.computed()?;
        Ok(computed
            .modifications
            .iter()
            .filter(|m| kind.map_or(true, |k| m.kind == k))
            .cloned()
            .collect())
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn computed(&self) -> PriceResult<Arc<ModifiedBase>> {
        self.memo.get_or_try_fill(|| {
            let rounding = self.config.rounding;
            let mut modifications = Vec::new();

            let intermediate = apply_phase(
                self.base,
                phase_modifiers(&self.modifiers, Phase::BeforeVat),
                rounding,
                Some(&mut modifications),
            )?;
            let exclusive_unit = apply_phase(
                intermediate,
                phase_modifiers(&self.modifiers, Phase::AfterVat),
                rounding,
                Some(&mut modifications),
            )?;

            debug!(
                base = %self.base,
                modifiers = self.modifiers.len(),
                entries = modifications.len(),
                exclusive_unit = %exclusive_unit,
                "Modified base recomputed"
            );
            Ok(ModifiedBase {
                exclusive_unit,
                modifications,
            })
        })
    }

    fn multiplier(&self, per_unit: bool) -> Decimal {
        if per_unit {
            Decimal::ONE
        } else {
            self.units
        }
    }

    fn derive_vat_rate(&self, amount: &Money) -> PriceResult<Decimal> {
        if amount.currency() != self.currency() {
            return Err(MoneyError::CurrencyMismatch {
                expected: self.currency(),
                actual: amount.currency(),
            }
            .into());
        }
        let scaled = amount
            .amount()
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(MoneyError::Overflow)?;
        let rate = divided_by(
            scaled,
            self.base.amount(),
            self.config.vat_rate_scale,
            self.config.rounding,
        )?;
        if rate.is_sign_negative() && !rate.is_zero() {
            return Err(PriceError::NegativeVatRate(rate));
        }
        Ok(rate)
    }
}

fn classified(kind: ModifierKind, key: Option<&str>, before_vat: bool) -> ModifierMeta {
    let meta = ModifierMeta::new().kind(kind).before_vat(before_vat);
    match key {
        Some(key) => meta.key(key),
        None => meta,
    }
}

impl fmt::Debug for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Price")
            .field("base", &self.base)
            .field("units", &self.units)
            .field("vat", &self.vat)
            .field("modifiers", &self.modifiers)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
