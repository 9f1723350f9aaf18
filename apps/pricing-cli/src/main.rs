//! # pricing
//!
//! Command-line wrapper around `pricing-core`.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Init tracing (RUST_LOG, default info)                               │
//! │  2. Load PricingConfig (--config file, then PRICING_* env)              │
//! │  3. Read {base, currency, units, vat} from a file or stdin              │
//! │  4. Apply --units / --vat / --tax / --discount                          │
//! │  5. Print {price, modifications} as JSON                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```text
//! echo '{"base": 1000, "currency": "USD", "units": 2}' \
//!     | pricing --vat 21 --discount 1.00@promo
//! ```

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use pricing_core::decimal::parse_decimal;
use pricing_core::{Modification, ModifierKind, Price, PriceSnapshot, PricingConfig, RoundingMode};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Compute exclusive / inclusive totals for a serialized price.
#[derive(Parser, Debug)]
#[command(name = "pricing")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Serialized price JSON file (stdin when omitted or "-")
    input: Option<PathBuf>,

    /// Path to a TOML file with a [pricing] table
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the rounding mode (half_up, half_even, floor, ...)
    #[arg(long)]
    rounding: Option<RoundingMode>,

    /// Override the unit count
    #[arg(long)]
    units: Option<String>,

    /// Set the VAT percentage ("21", "21%", "7,5"); "none" clears it
    #[arg(long)]
    vat: Option<String>,

    /// Add a fixed tax, AMOUNT or AMOUNT@KEY (repeatable)
    #[arg(long = "tax", value_name = "AMOUNT[@KEY]")]
    taxes: Vec<String>,

    /// Subtract a fixed discount, AMOUNT or AMOUNT@KEY (repeatable)
    #[arg(long = "discount", value_name = "AMOUNT[@KEY]")]
    discounts: Vec<String>,

    /// Apply --tax / --discount before VAT instead of after
    #[arg(long)]
    before_vat: bool,
}

/// What gets printed.
#[derive(Debug, Serialize)]
struct Report {
    price: PriceSnapshot,
    modifications: Vec<Modification>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let report = run(&cli)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Initializes the tracing subscriber on stderr.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - memo recomputation and invalidation
/// - `RUST_LOG=pricing_core=trace` - every modifier step
/// - Default: INFO level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<Report> {
    let mut config = PricingConfig::load(cli.config.as_deref())?;
    if let Some(rounding) = cli.rounding {
        config = config.with_rounding(rounding);
    }

    let input = read_input(cli.input.as_ref())?;
    let mut price = Price::from_json(&input).context("Failed to read serialized price")?;
    price.set_config(config);

    if let Some(units) = &cli.units {
        price.set_units(units.as_str())?;
    }

    match cli.vat.as_deref().map(str::trim) {
        Some(vat) if vat.eq_ignore_ascii_case("none") => {
            price.clear_vat();
        }
        Some(vat) => {
            price.set_vat(vat)?;
        }
        None => {}
    }

    for flag in &cli.taxes {
        let (amount, key) = parse_modifier_flag(flag, ModifierKind::Tax)?;
        price.add_tax(amount, key.as_deref(), cli.before_vat)?;
    }
    for flag in &cli.discounts {
        let (amount, key) = parse_modifier_flag(flag, ModifierKind::Discount)?;
        price.add_discount(amount, key.as_deref(), cli.before_vat)?;
    }

    let report = Report {
        price: price.snapshot()?,
        modifications: price.modifications(None)?,
    };
    info!(
        currency = %price.currency(),
        exclusive = report.price.total.exclusive,
        inclusive = report.price.total.inclusive,
        modifications = report.modifications.len(),
        "Price computed"
    );
    Ok(report)
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) if path.as_os_str() != "-" => {
            debug!(path = %path.display(), "Reading serialized price");
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))
        }
        _ => {
            debug!("Reading serialized price from stdin");
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}

/// Splits `AMOUNT[@KEY]` into a signed amount and an optional key.
///
/// Discounts are always applied as negative amounts, taxes as positive.
fn parse_modifier_flag(flag: &str, kind: ModifierKind) -> Result<(Decimal, Option<String>)> {
    let (amount, key) = match flag.split_once('@') {
        Some((amount, key)) => (amount, Some(key.trim().to_string())),
        None => (flag, None),
    };
    let amount = parse_decimal(amount).with_context(|| format!("Invalid {} amount", kind))?;

    let signed = match kind {
        ModifierKind::Tax => amount.abs(),
        ModifierKind::Discount => -amount.abs(),
        ModifierKind::Custom => bail!("only tax and discount flags are supported"),
    };
    Ok((signed, key.filter(|k| !k.is_empty())))
}

// =============================================================================
// Unit Tests
// =============================================================================
