//! # Pricing Configuration
//!
//! The arithmetic policy every [`crate::price::Price`] computes under.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PRICING_ROUNDING=half_even                                         │
//! │     PRICING_VAT_SCALE=4                                                │
//! │     PRICING_VAT_RATE_SCALE=2                                           │
//! │                                                                         │
//! │  2. TOML Config File ([pricing] table)                                 │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     half_up, VAT factor scale 4, derived rate scale 2                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [pricing]
//! rounding = "half_up"   # up | down | ceiling | floor | half_up | half_down
//!                        # half_even | half_ceiling | half_floor | unnecessary
//! vat_scale = 4          # digits kept when turning 21% into 0.21
//! vat_rate_scale = 2     # digits kept when deriving a rate from a VAT amount
//! ```
//!
//! The config is a plain `Copy` value handed to each price at construction.
//! There is no process-wide rounding state.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::decimal::RoundingMode;
use crate::error::ConfigError;
use crate::{DEFAULT_VAT_RATE_SCALE, DEFAULT_VAT_SCALE};

pub const ENV_ROUNDING: &str = "PRICING_ROUNDING";
pub const ENV_VAT_SCALE: &str = "PRICING_VAT_SCALE";
pub const ENV_VAT_RATE_SCALE: &str = "PRICING_VAT_RATE_SCALE";

/// Arithmetic policy for price computations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Rounding mode for every multiplication, division and addition.
    #[serde(default)]
    pub rounding: RoundingMode,

    /// Fraction digits of the `rate / 100` factor used to compute VAT.
    #[serde(default = "default_vat_scale")]
    pub vat_scale: u32,

    /// Fraction digits of a rate derived from a VAT amount.
    #[serde(default = "default_vat_rate_scale")]
    pub vat_rate_scale: u32,
}

fn default_vat_scale() -> u32 {
    DEFAULT_VAT_SCALE
}

fn default_vat_rate_scale() -> u32 {
    DEFAULT_VAT_RATE_SCALE
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            rounding: RoundingMode::default(),
            vat_scale: default_vat_scale(),
            vat_rate_scale: default_vat_rate_scale(),
        }
    }
}

/// On-disk layout: everything lives under `[pricing]`.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    pricing: PricingConfig,
}

impl PricingConfig {
    /// Returns a copy using `rounding`.
    pub fn with_rounding(mut self, rounding: RoundingMode) -> Self {
        self.rounding = rounding;
        self
    }

    /// Loads defaults, then the optional TOML file, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                debug!(path = %path.display(), "Read pricing config file");
                PricingConfig::from_toml_str(&text)?
            }
            None => PricingConfig::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        info!(
            rounding = %config.rounding,
            vat_scale = config.vat_scale,
            vat_rate_scale = config.vat_rate_scale,
            "Pricing configuration loaded"
        );
        Ok(config)
    }

    /// Parses a TOML document with a `[pricing]` table.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text)?;
        Ok(file.pricing)
    }

    /// Overrides fields from environment-style lookups.
    ///
    /// `lookup` is `std::env::var` in production and a map in tests.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_ROUNDING) {
            self.rounding = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_ROUNDING.to_string(),
                value: value.clone(),
            })?;
            debug!(rounding = %self.rounding, "Rounding overridden from environment");
        }

        if let Some(value) = lookup(ENV_VAT_SCALE) {
            self.vat_scale = parse_scale(ENV_VAT_SCALE, &value)?;
        }

        if let Some(value) = lookup(ENV_VAT_RATE_SCALE) {
            self.vat_rate_scale = parse_scale(ENV_VAT_RATE_SCALE, &value)?;
        }

        Ok(())
    }
}

/// Decimal scales above 28 cannot be represented.
fn parse_scale(key: &str, value: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|scale| *scale <= 28)
        .ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PricingConfig::default();
        assert_eq!(config.rounding, RoundingMode::HalfUp);
        assert_eq!(config.vat_scale, 4);
        assert_eq!(config.vat_rate_scale, 2);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = PricingConfig::from_toml_str(
            r#"
            [pricing]
            rounding = "half_even"
            "#,
        )
        .unwrap();
        assert_eq!(config.rounding, RoundingMode::HalfEven);
        assert_eq!(config.vat_scale, 4);

        let empty = PricingConfig::from_toml_str("").unwrap();
        assert_eq!(empty, PricingConfig::default());
    }

    #[test]
    fn test_from_toml_rejects_unknown_rounding() {
        let result = PricingConfig::from_toml_str("[pricing]\nrounding = \"sideways\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_ROUNDING, "FLOOR"),
            (ENV_VAT_SCALE, "6"),
            (ENV_VAT_RATE_SCALE, " 3 "),
        ]
        .into_iter()
        .collect();

        let mut config = PricingConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.rounding, RoundingMode::Floor);
        assert_eq!(config.vat_scale, 6);
        assert_eq!(config.vat_rate_scale, 3);
    }

    #[test]
    fn test_env_rejects_invalid_values() {
        let mut config = PricingConfig::default();
        let err = config
            .apply_env(|key| (key == ENV_VAT_SCALE).then(|| "29".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = config
            .apply_env(|key| (key == ENV_ROUNDING).then(|| "nope".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pricing]\nvat_scale = 5").unwrap();

        let config = PricingConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.vat_scale, 5);

        let missing = PricingConfig::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
