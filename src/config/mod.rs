//! Configuration management for the rebalancer.
//!
//! Loads settings from an optional config file and environment variables.
//! Environment variables use the `SPOT_REBALANCER` prefix and `__` as the
//! section separator, e.g. `SPOT_REBALANCER__EXCHANGE__API_KEY`.

use crate::error::RebalanceError;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Exchange endpoint and credentials
    #[serde(default)]
    pub exchange: ExchangeConfig,
    /// Allocation band and trade sizing
    #[serde(default)]
    pub rebalance: RebalanceConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// REST API root
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sub-account the orders belong to
    #[serde(default)]
    pub subaccount: String,
    /// API key for authentication
    #[serde(default)]
    pub api_key: String,
    /// Secret for signing requests
    #[serde(default)]
    pub api_secret: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Allocation band and trade sizing for one tracked currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalanceConfig {
    /// Lowest acceptable allocation ratio of the tracked currency (0.0-1.0)
    #[serde(default = "default_lowest_balance")]
    pub lowest_balance: Decimal,
    /// Highest acceptable allocation ratio of the tracked currency (0.0-1.0)
    #[serde(default = "default_highest_balance")]
    pub highest_balance: Decimal,
    /// Allocation ratio moved by a single trade
    #[serde(default = "default_offset_balance")]
    pub offset_balance: Decimal,
    /// Distance from the last fill price, as a fraction, that triggers a trade
    #[serde(default = "default_offset_price_percent")]
    pub offset_price_percent: Decimal,
    /// Traded pair, e.g. "BTC/USD"
    #[serde(default = "default_target_market")]
    pub target_market: String,
    /// Coin whose allocation is tracked, e.g. "BTC"
    #[serde(default = "default_currency")]
    pub currency: String,
}

// Default value functions
fn default_base_url() -> String {
    "https://ftx.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("spot-rebalancer/{}", env!("CARGO_PKG_VERSION"))
}

fn default_lowest_balance() -> Decimal {
    Decimal::new(40, 2) // 0.40
}

fn default_highest_balance() -> Decimal {
    Decimal::new(60, 2) // 0.60
}

fn default_offset_balance() -> Decimal {
    Decimal::new(1, 2) // 0.01 = 1% of the portfolio per trade
}

fn default_offset_price_percent() -> Decimal {
    Decimal::new(3, 2) // 0.03 = 3% move from the last fill
}

fn default_target_market() -> String {
    "BTC/USD".to_string()
}

fn default_currency() -> String {
    "BTC".to_string()
}

impl Config {
    /// Load configuration, reading the optional file `<name>.{toml,json,yaml,...}`.
    pub fn load_from(name: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(name).required(false))
            .add_source(
                config::Environment::with_prefix("SPOT_REBALANCER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate every section. Runs before any network call.
    pub fn validate(&self) -> std::result::Result<(), RebalanceError> {
        self.rebalance.validate()?;
        self.exchange.validate()
    }
}

impl ExchangeConfig {
    /// Check that every secret is present.
    pub fn validate(&self) -> std::result::Result<(), RebalanceError> {
        let missing: Vec<&str> = [
            ("subaccount", &self.subaccount),
            ("api_key", &self.api_key),
            ("api_secret", &self.api_secret),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(RebalanceError::Configuration(format!(
                "missing exchange credentials: {} (set SPOT_REBALANCER__EXCHANGE__<NAME>)",
                missing.join(", ")
            )));
        }

        if self.timeout_secs == 0 {
            return Err(RebalanceError::Configuration(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl RebalanceConfig {
    /// Validate the allocation band, step and price trigger.
    pub fn validate(&self) -> std::result::Result<(), RebalanceError> {
        let ensure = |ok: bool, message: &str| {
            if ok {
                Ok(())
            } else {
                Err(RebalanceError::Configuration(message.to_string()))
            }
        };

        ensure(
            self.lowest_balance >= Decimal::ZERO
                && self.lowest_balance < self.highest_balance
                && self.highest_balance <= Decimal::ONE,
            "lowest_balance and highest_balance must satisfy 0 <= lowest < highest <= 1",
        )?;
        ensure(
            self.offset_balance > Decimal::ZERO
                && self.offset_balance < self.highest_balance - self.lowest_balance,
            "offset_balance must be greater than 0 and smaller than the allocation band",
        )?;
        ensure(
            self.offset_price_percent > Decimal::ZERO && self.offset_price_percent < Decimal::ONE,
            "offset_price_percent must be between 0 and 1 (exclusive)",
        )?;
        ensure(
            !self.target_market.trim().is_empty(),
            "target_market must not be empty",
        )?;
        ensure(!self.currency.trim().is_empty(), "currency must not be empty")
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            subaccount: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl fmt::Debug for ExchangeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &str| if value.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("ExchangeConfig")
            .field("base_url", &self.base_url)
            .field("subaccount", &self.subaccount)
            .field("api_key", &redact(&self.api_key))
            .field("api_secret", &redact(&self.api_secret))
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            lowest_balance: default_lowest_balance(),
            highest_balance: default_highest_balance(),
            offset_balance: default_offset_balance(),
            offset_price_percent: default_offset_price_percent(),
            target_market: default_target_market(),
            currency: default_currency(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn with_credentials() -> Config {
        let mut config = Config::default();
        config.exchange.subaccount = "rebalance".to_string();
        config.exchange.api_key = "key".to_string();
        config.exchange.api_secret = "secret".to_string();
        config
    }

    #[test]
    fn test_default_rebalance_config_is_valid() {
        assert!(RebalanceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_with_credentials_is_valid() {
        assert!(with_credentials().validate().is_ok());
    }

    #[test]
    fn test_missing_credentials_are_reported() {
        let err = Config::default().validate().unwrap_err();
        match err {
            RebalanceError::Configuration(message) => {
                assert!(message.contains("subaccount"));
                assert!(message.contains("api_key"));
                assert!(message.contains("api_secret"));
            }
            other => panic!("Expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_inverted_band_is_rejected() {
        let config = RebalanceConfig {
            lowest_balance: dec!(0.6),
            highest_balance: dec!(0.4),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_band_above_one_is_rejected() {
        let config = RebalanceConfig {
            highest_balance: dec!(1.2),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_offset_wider_than_band_is_rejected() {
        let config = RebalanceConfig {
            offset_balance: dec!(0.2),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_offset_price_percent_bounds() {
        let zero = RebalanceConfig {
            offset_price_percent: Decimal::ZERO,
            ..Default::default()
        };
        let one = RebalanceConfig {
            offset_price_percent: Decimal::ONE,
            ..Default::default()
        };
        assert!(zero.validate().is_err());
        assert!(one.validate().is_err());
    }

    #[test]
    fn test_full_range_band_is_valid() {
        let config = RebalanceConfig {
            lowest_balance: Decimal::ZERO,
            highest_balance: Decimal::ONE,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", with_credentials().exchange);
        assert!(!rendered.contains("secret\""));
        assert!(rendered.contains("<redacted>"));
    }
}
