//! Property tests for the price aggregate.
//!
//! Tests cover:
//! - Declining modifiers leave totals and the ledger untouched
//! - Repeated queries agree (memoized or not)
//! - Adding a modifier is reflected by the next query
//! - Whole-unit VAT equals per-unit VAT times units
//! - Serialized records rebuild the same totals
//! - Fractional units and VAT keep every digit through JSON

use pricing_core::{Currency, ModifierMeta, ModifierSource, Money, Price};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn usd(minor: i64) -> Money {
    Money::of_minor(minor, Currency::USD)
}

fn price_with(base: i64, units: i64, vat: Option<i64>) -> Price {
    let mut price = Price::new(usd(base), units).unwrap();
    price.set_vat(vat).unwrap();
    price
}

proptest! {
    #[test]
    fn declining_modifier_is_neutral(
        base in 0i64..1_000_000,
        units in 0i64..50,
        vat in proptest::option::of(0i64..30),
        before_vat in any::<bool>(),
    ) {
        let plain = price_with(base, units, vat);
        let mut declined = price_with(base, units, vat);
        declined
            .add_modifier(
                ModifierSource::effect(|_, _| Ok(None)),
                ModifierMeta::new().key("noop").before_vat(before_vat),
            )
            .unwrap();

        prop_assert_eq!(declined.exclusive(false).unwrap(), plain.exclusive(false).unwrap());
        prop_assert_eq!(declined.inclusive(false).unwrap(), plain.inclusive(false).unwrap());
        prop_assert_eq!(declined.vat(true).unwrap(), plain.vat(true).unwrap());
        prop_assert!(declined.modifications(None).unwrap().is_empty());
    }

    #[test]
    fn repeated_queries_agree(
        base in 0i64..1_000_000,
        units in 0i64..50,
        vat in proptest::option::of(0i64..30),
        fee in -10_000i64..10_000,
    ) {
        let mut price = price_with(base, units, vat);
        price.add_tax(usd(fee), Some("fee"), fee % 2 == 0).unwrap();

        let first = (price.exclusive(false).unwrap(), price.inclusive(false).unwrap());
        let ledger = price.modifications(None).unwrap();
        let second = (price.exclusive(false).unwrap(), price.inclusive(false).unwrap());

        prop_assert_eq!(first, second);
        prop_assert_eq!(ledger, price.modifications(None).unwrap());
    }

    #[test]
    fn added_modifier_is_visible_to_next_query(
        base in 0i64..1_000_000,
        first in -10_000i64..10_000,
        second in -10_000i64..10_000,
    ) {
        let mut price = Price::new(usd(base), 1).unwrap();
        price.add_discount(usd(first), Some("first"), false).unwrap();
        let before = price.exclusive(true).unwrap();

        price.add_discount(usd(second), Some("second"), false).unwrap();
        prop_assert_eq!(price.exclusive(true).unwrap(), before.plus(&usd(second)).unwrap());
        prop_assert_eq!(price.modifications(None).unwrap().len(), 2);
    }

    #[test]
    fn whole_vat_is_unit_vat_times_units(
        base in 0i64..1_000_000,
        units in 0i64..50,
        vat in 0i64..30,
    ) {
        let price = price_with(base, units, Some(vat));
        let unit = price.vat(true).unwrap().unwrap();
        let whole = price.vat(false).unwrap().unwrap();
        prop_assert_eq!(whole.minor_amount().unwrap(), unit.minor_amount().unwrap() * units);
    }

    #[test]
    fn serialized_record_rebuilds_totals(
        base in 0i64..1_000_000,
        units in 0i64..50,
        vat in proptest::option::of(0i64..30),
    ) {
        let price = price_with(base, units, vat);
        let back = Price::from_json(&price.to_json().unwrap()).unwrap();

        prop_assert_eq!(back.base(), price.base());
        prop_assert_eq!(back.units(), price.units());
        prop_assert_eq!(back.exclusive(false).unwrap(), price.exclusive(false).unwrap());
        prop_assert_eq!(back.inclusive(false).unwrap(), price.inclusive(false).unwrap());
    }

    #[test]
    fn serialized_record_keeps_fractional_units_and_vat(
        base in 0i64..1_000_000,
        units_mantissa in 0i64..1_000_000,
        units_scale in 0u32..=18,
        vat_mantissa in 0i64..1_000_000,
        vat_scale in 0u32..=18,
    ) {
        let units = Decimal::new(units_mantissa, units_scale);
        let vat = Decimal::new(vat_mantissa, vat_scale);
        let mut price = Price::new(usd(base), units).unwrap();
        price.set_vat(vat).unwrap();

        let back = Price::from_json(&price.to_json().unwrap()).unwrap();

        prop_assert_eq!(back.units(), units);
        prop_assert_eq!(back.vat_percentage(), Some(vat));
        prop_assert_eq!(back.exclusive(false).unwrap(), price.exclusive(false).unwrap());
        prop_assert_eq!(back.inclusive(false).unwrap(), price.inclusive(false).unwrap());
    }
}
