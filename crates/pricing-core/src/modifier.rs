//! # Modifier Module
//!
//! A modifier is one adjustment (tax, discount, anything else) applied to
//! a running price. This module turns the different ways a caller can
//! describe an adjustment into one concrete [`Modifier`].
//!
//! ## Construction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    ModifierSource → Modifier                            │
//! │                                                                         │
//! │  Fixed(21.50)           ──► "add 21.50 in the price's currency"        │
//! │  Addend(Money)          ──► "add this Money"                           │
//! │  Effect(closure)        ──► closure is the effect                      │
//! │  Amendment(impl trait)  ──► trait supplies effect + classification     │
//! │  Named { name, args }   ──► AmendmentRegistry builds the amendment     │
//! │                                                                         │
//! │  Classification (key, kind, before_vat) comes from ModifierMeta,        │
//! │  falling back to the amendment's own answers, then (None, Custom,       │
//! │  false).                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The `None` Contract
//! An effect returning `Ok(None)` means "does not apply": the running value
//! passes through and no ledger entry is written. Returning `Ok(Some(x))`
//! always writes an entry, even when `x` equals the input.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::decimal::{divided_by, RoundingMode, Scalar};
use crate::error::{MoneyResult, PriceError, PriceResult};
use crate::money::Money;
use crate::types::{Currency, ModifierKind};
use crate::validation::normalize_key;

/// Scale used for percentage factors inside built-in amendments.
const PERCENTAGE_FACTOR_SCALE: u32 = 6;

/// The effect of a modifier: running value in, adjusted value (or `None`) out.
pub type EffectFn = Arc<dyn Fn(&Money, RoundingMode) -> MoneyResult<Option<Money>> + Send + Sync>;

// =============================================================================
// Amendment Capability
// =============================================================================

/// Capability of a type that can act as a price modifier.
///
/// Implementors decide their own effect and may report a default
/// classification; explicit [`ModifierMeta`] values win over these.
pub trait Amendment: fmt::Debug + Send + Sync {
    /// Adjusts the running value, or returns `None` when not applicable.
    fn apply(&self, input: &Money, rounding: RoundingMode) -> MoneyResult<Option<Money>>;

    fn key(&self) -> Option<&str> {
        None
    }

    fn kind(&self) -> ModifierKind {
        ModifierKind::Custom
    }

    fn is_before_vat(&self) -> bool {
        false
    }
}

// =============================================================================
// Built-in Amendments
// =============================================================================

/// Adjusts the running value by a percentage of itself.
///
/// ## Example
/// ```rust
/// use pricing_core::modifier::{Amendment, Percentage};
/// use pricing_core::decimal::RoundingMode;
/// use pricing_core::money::Money;
/// use pricing_core::types::Currency;
/// use rust_decimal::Decimal;
///
/// let ten = Money::of_minor(1000, Currency::USD);
/// let off = Percentage::discount(Decimal::new(15, 0));
/// let result = off.apply(&ten, RoundingMode::HalfUp).unwrap().unwrap();
/// assert_eq!(result.minor_amount().unwrap(), 850);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Percentage {
    rate: Decimal,
    kind: ModifierKind,
}

impl Percentage {
    /// Adds `rate`% of the running value (negative rates reduce it).
    pub fn new(rate: Decimal) -> Self {
        Percentage {
            rate,
            kind: ModifierKind::Custom,
        }
    }

    /// Adds `rate`% of the running value, classified as a tax.
    pub fn tax(rate: Decimal) -> Self {
        Percentage {
            rate: rate.abs(),
            kind: ModifierKind::Tax,
        }
    }

    /// Removes `rate`% of the running value, classified as a discount.
    pub fn discount(rate: Decimal) -> Self {
        Percentage {
            rate: -rate.abs(),
            kind: ModifierKind::Discount,
        }
    }
}

impl Amendment for Percentage {
    fn apply(&self, input: &Money, rounding: RoundingMode) -> MoneyResult<Option<Money>> {
        let factor = divided_by(self.rate, Decimal::ONE_HUNDRED, PERCENTAGE_FACTOR_SCALE, rounding)?;
        let delta = input.multiplied_by(factor, rounding)?;
        input.plus(&delta).map(Some)
    }

    fn kind(&self) -> ModifierKind {
        self.kind
    }
}

/// Adds `adjustment` only when the running value reaches `threshold`.
///
/// Below the threshold it returns `None`, so nothing is logged.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimumSpend {
    threshold: Money,
    adjustment: Money,
}

impl MinimumSpend {
    pub fn new(threshold: Money, adjustment: Money) -> Self {
        MinimumSpend {
            threshold,
            adjustment,
        }
    }
}

impl Amendment for MinimumSpend {
    fn apply(&self, input: &Money, _rounding: RoundingMode) -> MoneyResult<Option<Money>> {
        if input.compare(&self.threshold)?.is_lt() {
            return Ok(None);
        }
        input.plus(&self.adjustment).map(Some)
    }

    fn kind(&self) -> ModifierKind {
        if self.adjustment.is_negative() {
            ModifierKind::Discount
        } else {
            ModifierKind::Custom
        }
    }
}

// =============================================================================
// Named Amendment Registry
// =============================================================================

/// Argument passed to a named amendment factory.
#[derive(Debug, Clone, PartialEq)]
pub enum ModifierArg {
    Number(Decimal),
    Money(Money),
    Text(String),
    Flag(bool),
}

impl From<Decimal> for ModifierArg {
    fn from(value: Decimal) -> Self {
        ModifierArg::Number(value)
    }
}

impl From<i64> for ModifierArg {
    fn from(value: i64) -> Self {
        ModifierArg::Number(Decimal::from(value))
    }
}

impl From<Money> for ModifierArg {
    fn from(value: Money) -> Self {
        ModifierArg::Money(value)
    }
}

impl From<&str> for ModifierArg {
    fn from(value: &str) -> Self {
        ModifierArg::Text(value.to_string())
    }
}

impl From<bool> for ModifierArg {
    fn from(value: bool) -> Self {
        ModifierArg::Flag(value)
    }
}

/// Builds an amendment from positional arguments.
pub type AmendmentFactory =
    Arc<dyn Fn(&[ModifierArg]) -> PriceResult<Arc<dyn Amendment>> + Send + Sync>;

/// Maps amendment names to factories.
///
/// ## Built-ins
/// | Name                  | Arguments                      |
/// |-----------------------|--------------------------------|
/// | `percentage`          | rate                           |
/// | `percentage_tax`      | rate                           |
/// | `percentage_discount` | rate                           |
/// | `minimum_spend`       | threshold Money, adjustment    |
#[derive(Clone)]
pub struct AmendmentRegistry {
    factories: HashMap<String, AmendmentFactory>,
}

impl AmendmentRegistry {
    /// A registry with no entries.
    pub fn empty() -> Self {
        AmendmentRegistry {
            factories: HashMap::new(),
        }
    }

    /// A registry holding the built-in amendments.
    pub fn with_builtins() -> Self {
        let mut registry = AmendmentRegistry::empty();
        registry.register("percentage", |args| {
            Ok(Arc::new(Percentage::new(single_rate("percentage", args)?)))
        });
        registry.register("percentage_tax", |args| {
            Ok(Arc::new(Percentage::tax(single_rate("percentage_tax", args)?)))
        });
        registry.register("percentage_discount", |args| {
            Ok(Arc::new(Percentage::discount(single_rate(
                "percentage_discount",
                args,
            )?)))
        });
        registry.register("minimum_spend", |args| match args {
            [ModifierArg::Money(threshold), ModifierArg::Money(adjustment)] => {
                Ok(Arc::new(MinimumSpend::new(*threshold, *adjustment)))
            }
            _ => Err(PriceError::InvalidModifier(
                "minimum_spend expects (threshold: Money, adjustment: Money)".to_string(),
            )),
        });
        registry
    }

    /// Registers (or replaces) a factory. Names are case-insensitive.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&[ModifierArg]) -> PriceResult<Arc<dyn Amendment>> + Send + Sync + 'static,
    {
        self.factories
            .insert(name.trim().to_lowercase(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.trim().to_lowercase())
    }

    /// Instantiates the named amendment.
    pub fn resolve(&self, name: &str, args: &[ModifierArg]) -> PriceResult<Arc<dyn Amendment>> {
        let factory = self
            .factories
            .get(&name.trim().to_lowercase())
            .ok_or_else(|| PriceError::InvalidModifier(format!("unknown amendment '{}'", name)))?;
        factory(args)
    }
}

impl Default for AmendmentRegistry {
    fn default() -> Self {
        AmendmentRegistry::with_builtins()
    }
}

impl fmt::Debug for AmendmentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("AmendmentRegistry")
            .field("names", &names)
            .finish()
    }
}

fn single_rate(name: &str, args: &[ModifierArg]) -> PriceResult<Decimal> {
    match args {
        [ModifierArg::Number(rate)] => Ok(*rate),
        [ModifierArg::Text(text)] => Scalar::from(text.as_str())
            .to_decimal()
            .map_err(|e| PriceError::InvalidModifier(format!("{}: {}", name, e))),
        _ => Err(PriceError::InvalidModifier(format!(
            "{} expects a single rate argument",
            name
        ))),
    }
}

// =============================================================================
// Modifier Source & Meta
// =============================================================================

/// Every accepted way of describing a modifier.
#[derive(Clone)]
pub enum ModifierSource {
    /// A plain number, added in the price's currency.
    Fixed(Scalar),
    /// A Money amount added as-is.
    Addend(Money),
    /// An arbitrary effect.
    Effect(EffectFn),
    /// A value implementing the [`Amendment`] capability.
    Amendment(Arc<dyn Amendment>),
    /// An amendment looked up by name in an [`AmendmentRegistry`].
    Named { name: String, args: Vec<ModifierArg> },
}

impl ModifierSource {
    pub fn fixed(amount: impl Into<Scalar>) -> Self {
        ModifierSource::Fixed(amount.into())
    }

    /// Wraps a closure as the effect.
    ///
    /// ## Example
    /// ```rust
    /// use pricing_core::modifier::ModifierSource;
    ///
    /// // Doubles the running value
    /// let source = ModifierSource::effect(|m, mode| {
    ///     m.multiplied_by(2.into(), mode).map(Some)
    /// });
    /// # let _ = source;
    /// ```
    pub fn effect<F>(effect: F) -> Self
    where
        F: Fn(&Money, RoundingMode) -> MoneyResult<Option<Money>> + Send + Sync + 'static,
    {
        ModifierSource::Effect(Arc::new(effect))
    }

    pub fn amendment(amendment: impl Amendment + 'static) -> Self {
        ModifierSource::Amendment(Arc::new(amendment))
    }

    pub fn named(name: &str, args: Vec<ModifierArg>) -> Self {
        ModifierSource::Named {
            name: name.to_string(),
            args,
        }
    }
}

impl From<Money> for ModifierSource {
    fn from(value: Money) -> Self {
        ModifierSource::Addend(value)
    }
}

impl From<Decimal> for ModifierSource {
    fn from(value: Decimal) -> Self {
        ModifierSource::Fixed(Scalar::Decimal(value))
    }
}

impl From<Scalar> for ModifierSource {
    fn from(value: Scalar) -> Self {
        ModifierSource::Fixed(value)
    }
}

impl From<i64> for ModifierSource {
    fn from(value: i64) -> Self {
        ModifierSource::Fixed(Scalar::from(value))
    }
}

impl From<i32> for ModifierSource {
    fn from(value: i32) -> Self {
        ModifierSource::Fixed(Scalar::from(value))
    }
}

impl From<f64> for ModifierSource {
    fn from(value: f64) -> Self {
        ModifierSource::Fixed(Scalar::from(value))
    }
}

impl From<&str> for ModifierSource {
    fn from(value: &str) -> Self {
        ModifierSource::Fixed(Scalar::from(value))
    }
}

impl From<String> for ModifierSource {
    fn from(value: String) -> Self {
        ModifierSource::Fixed(Scalar::from(value))
    }
}

impl fmt::Debug for ModifierSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModifierSource::Fixed(amount) => f.debug_tuple("Fixed").field(amount).finish(),
            ModifierSource::Addend(money) => f.debug_tuple("Addend").field(money).finish(),
            ModifierSource::Effect(_) => f.write_str("Effect(..)"),
            ModifierSource::Amendment(a) => f.debug_tuple("Amendment").field(a).finish(),
            ModifierSource::Named { name, args } => f
                .debug_struct("Named")
                .field("name", name)
                .field("args", args)
                .finish(),
        }
    }
}

/// Explicit classification for a modifier. Unset fields fall back to the
/// amendment's own answer, then to `(None, Custom, false)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifierMeta {
    pub key: Option<String>,
    pub kind: Option<ModifierKind>,
    pub before_vat: Option<bool>,
}

impl ModifierMeta {
    pub fn new() -> Self {
        ModifierMeta::default()
    }

    /// Blank keys are treated as absent.
    pub fn key(mut self, key: &str) -> Self {
        self.key = normalize_key(Some(key));
        self
    }

    pub fn kind(mut self, kind: ModifierKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn before_vat(mut self, before_vat: bool) -> Self {
        self.before_vat = Some(before_vat);
        self
    }
}

// =============================================================================
// Modifier
// =============================================================================

/// A resolved, immutable modifier owned by a price.
#[derive(Clone)]
pub struct Modifier {
    effect: EffectFn,
    key: Option<String>,
    kind: ModifierKind,
    before_vat: bool,
}

impl Modifier {
    /// Resolves a source into a modifier for a price in `currency`.
    ///
    /// ## Errors
    /// [`PriceError::InvalidModifier`] when the fixed amount is not a usable
    /// number, an addend is in another currency, or a named amendment is
    /// unknown or rejects its arguments.
    pub fn resolve(
        source: ModifierSource,
        meta: ModifierMeta,
        currency: Currency,
        registry: &AmendmentRegistry,
    ) -> PriceResult<Modifier> {
        let (effect, amendment): (EffectFn, Option<Arc<dyn Amendment>>) = match source {
            ModifierSource::Fixed(amount) => {
                let amount = amount
                    .to_decimal()
                    .map_err(|e| PriceError::InvalidModifier(e.to_string()))?;
                let addend = Money::of(amount, currency)
                    .map_err(|e| PriceError::InvalidModifier(e.to_string()))?;
                (adding(addend), None)
            }
            ModifierSource::Addend(addend) => {
                if addend.currency() != currency {
                    return Err(PriceError::InvalidModifier(format!(
                        "addend is in {}, price is in {}",
                        addend.currency(),
                        currency
                    )));
                }
                (adding(addend), None)
            }
            ModifierSource::Effect(effect) => (effect, None),
            ModifierSource::Amendment(amendment) => (delegating(&amendment), Some(amendment)),
            ModifierSource::Named { name, args } => {
                let amendment = registry.resolve(&name, &args)?;
                (delegating(&amendment), Some(amendment))
            }
        };

        let key = meta.key.or_else(|| {
            amendment
                .as_ref()
                .and_then(|a| normalize_key(a.key()))
        });
        let kind = meta
            .kind
            .or_else(|| amendment.as_ref().map(|a| a.kind()))
            .unwrap_or_default();
        let before_vat = meta
            .before_vat
            .or_else(|| amendment.as_ref().map(|a| a.is_before_vat()))
            .unwrap_or(false);

        Ok(Modifier {
            effect,
            key,
            kind,
            before_vat,
        })
    }

    /// Runs the effect against the running value.
    pub fn apply(&self, input: &Money, rounding: RoundingMode) -> MoneyResult<Option<Money>> {
        (self.effect)(input, rounding)
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn kind(&self) -> ModifierKind {
        self.kind
    }

    pub fn is_before_vat(&self) -> bool {
        self.before_vat
    }
}

impl fmt::Debug for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modifier")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("before_vat", &self.before_vat)
            .finish_non_exhaustive()
    }
}

fn adding(addend: Money) -> EffectFn {
    Arc::new(move |input: &Money, _: RoundingMode| input.plus(&addend).map(Some))
}

fn delegating(amendment: &Arc<dyn Amendment>) -> EffectFn {
    let amendment = Arc::clone(amendment);
    Arc::new(move |input: &Money, rounding: RoundingMode| {
        amendment.apply(input, rounding)
    })
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

    fn resolve(source: ModifierSource, meta: ModifierMeta) -> PriceResult<Modifier> {
        Modifier::resolve(source, meta, Currency::USD, &AmendmentRegistry::default())
    }

    #[derive(Debug)]
    struct Service;

    impl Amendment for Service {
        fn apply(&self, input: &Money, _: RoundingMode) -> MoneyResult<Option<Money>> {
            input.plus(&Money::of_minor(250, input.currency())).map(Some)
        }

        fn key(&self) -> Option<&str> {
            Some("service")
        }

        fn kind(&self) -> ModifierKind {
            ModifierKind::Tax
        }

        fn is_before_vat(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_plain_numbers_and_text_are_fixed_amounts() {
        let cases: Vec<(ModifierSource, i64)> = vec![
            (5.into(), 1500),
            (5i64.into(), 1500),
            (2.5f64.into(), 1250),
            ("1,50".into(), 1150),
            (String::from("-0.25").into(), 975),
        ];
        for (source, expected) in cases {
            assert!(matches!(source, ModifierSource::Fixed(_)));
            let m = resolve(source, ModifierMeta::new()).unwrap();
            let out = m.apply(&usd(1000), RoundingMode::HalfUp).unwrap();
            assert_eq!(out, Some(usd(expected)));
        }
    }

    #[test]
    fn test_fixed_amount_uses_price_currency() {
        let m = resolve(ModifierSource::fixed("1,50"), ModifierMeta::new()).unwrap();
        let out = m.apply(&usd(1000), RoundingMode::HalfUp).unwrap();
        assert_eq!(out, Some(usd(1150)));
        assert_eq!(m.kind(), ModifierKind::Custom);
        assert_eq!(m.key(), None);
        assert!(!m.is_before_vat());
    }

    #[test]
    fn test_fixed_amount_with_too_many_digits_is_invalid() {
        let err = resolve(ModifierSource::fixed("0.001"), ModifierMeta::new()).unwrap_err();
        assert!(matches!(err, PriceError::InvalidModifier(_)));
        let err = resolve(ModifierSource::fixed("ten"), ModifierMeta::new()).unwrap_err();
        assert!(matches!(err, PriceError::InvalidModifier(_)));
    }

    #[test]
    fn test_addend_currency_is_checked() {
        let eur = Money::of_minor(100, Currency::EUR);
        let err = resolve(eur.into(), ModifierMeta::new()).unwrap_err();
        assert!(matches!(err, PriceError::InvalidModifier(_)));

        let m = resolve(usd(-100).into(), ModifierMeta::new().kind(ModifierKind::Discount))
            .unwrap();
        assert_eq!(m.apply(&usd(1000), RoundingMode::HalfUp).unwrap(), Some(usd(900)));
        assert_eq!(m.kind(), ModifierKind::Discount);
    }

    #[test]
    fn test_effect_can_decline() {
        let m = resolve(
            ModifierSource::effect(|_, _| Ok(None)),
            ModifierMeta::new().key("noop"),
        )
        .unwrap();
        assert_eq!(m.apply(&usd(1000), RoundingMode::HalfUp).unwrap(), None);
        assert_eq!(m.key(), Some("noop"));
    }

    #[test]
    fn test_blank_key_normalizes_to_none() {
        let m = resolve(ModifierSource::fixed(1), ModifierMeta::new().key("")).unwrap();
        assert_eq!(m.key(), None);
    }

    #[test]
    fn test_amendment_supplies_classification() {
        let m = resolve(ModifierSource::amendment(Service), ModifierMeta::new()).unwrap();
        assert_eq!(m.key(), Some("service"));
        assert_eq!(m.kind(), ModifierKind::Tax);
        assert!(m.is_before_vat());

        let overridden = resolve(
            ModifierSource::amendment(Service),
            ModifierMeta::new().key("tip").before_vat(false),
        )
        .unwrap();
        assert_eq!(overridden.key(), Some("tip"));
        assert_eq!(overridden.kind(), ModifierKind::Tax);
        assert!(!overridden.is_before_vat());
    }

    #[test]
    fn test_named_builtins() {
        let m = resolve(
            ModifierSource::named("Percentage_Discount", vec![dec!(10).into()]),
            ModifierMeta::new(),
        )
        .unwrap();
        assert_eq!(m.kind(), ModifierKind::Discount);
        assert_eq!(m.apply(&usd(2000), RoundingMode::HalfUp).unwrap(), Some(usd(1800)));

        let m = resolve(
            ModifierSource::named("percentage_tax", vec!["7,5".into()]),
            ModifierMeta::new(),
        )
        .unwrap();
        assert_eq!(m.apply(&usd(1000), RoundingMode::HalfUp).unwrap(), Some(usd(1075)));
    }

    #[test]
    fn test_named_rejects_unknown_and_bad_args() {
        let err = resolve(ModifierSource::named("bogus", vec![]), ModifierMeta::new()).unwrap_err();
        assert!(matches!(err, PriceError::InvalidModifier(_)));

        let err = resolve(
            ModifierSource::named("percentage", vec![true.into()]),
            ModifierMeta::new(),
        )
        .unwrap_err();
        assert!(matches!(err, PriceError::InvalidModifier(_)));

        let err = resolve(
            ModifierSource::named("minimum_spend", vec![usd(100).into()]),
            ModifierMeta::new(),
        )
        .unwrap_err();
        assert!(matches!(err, PriceError::InvalidModifier(_)));
    }

    #[test]
    fn test_minimum_spend_declines_below_threshold() {
        let offer = MinimumSpend::new(usd(5000), usd(-500));
        assert_eq!(offer.kind(), ModifierKind::Discount);
        assert_eq!(offer.apply(&usd(4999), RoundingMode::HalfUp).unwrap(), None);
        assert_eq!(
            offer.apply(&usd(5000), RoundingMode::HalfUp).unwrap(),
            Some(usd(4500))
        );
    }

    #[test]
    fn test_custom_registry_entry() {
        let mut registry = AmendmentRegistry::empty();
        assert!(!registry.contains("service"));
        registry.register("service", |_| Ok(Arc::new(Service)));
        let m = Modifier::resolve(
            ModifierSource::named("SERVICE", vec![]),
            ModifierMeta::new(),
            Currency::USD,
            &registry,
        )
        .unwrap();
        assert_eq!(m.apply(&usd(100), RoundingMode::HalfUp).unwrap(), Some(usd(350)));
    }
}
