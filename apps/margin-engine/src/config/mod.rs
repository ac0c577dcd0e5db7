//! Configuration module for the margin engine.
//!
//! Provides configuration loading, validation, and environment variable
//! interpolation for the engine and the account scenario run by the binary.
//!
//! # Usage
//!
//! ```rust,ignore
//! use margin_engine::config::{Config, load_config};
//!
//! // Load from $MARGIN_ENGINE_CONFIG, or margin-engine.yaml
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("custom/margin-engine.yaml"))?;
//!
//! println!("reserve: {}", config.buying_power.required_free_buying_power_percent);
//! ```

mod account;
mod buying_power;
mod observability;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

pub use account::{
    AccountConfig, BasketConfig, BasketLegConfig, FeesConfig, MarginConfig, SecurityConfig,
    SizingRequestConfig,
};
pub use buying_power::BuyingPowerConfig;
pub use observability::{LoggingConfig, ObservabilityConfig};

/// Default configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "margin-engine.yaml";

/// Environment variable overriding the configuration file path.
pub const CONFIG_PATH_ENV: &str = "MARGIN_ENGINE_CONFIG";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Buying power engine settings.
    #[serde(default)]
    pub buying_power: BuyingPowerConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
    /// Account scenario evaluated by the binary.
    #[serde(default)]
    pub account: Option<AccountConfig>,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to `$MARGIN_ENGINE_CONFIG`,
///   then to "margin-engine.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(
        || std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()),
        str::to_string,
    );

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map(|m| m.as_str());
        match cap.get(1).map(|m| std::env::var(m.as_str())) {
            Some(Ok(v)) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        }
    })
    .into_owned()
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let percent = config.buying_power.required_free_buying_power_percent;
    if percent < Decimal::ZERO || percent >= Decimal::ONE {
        return Err(invalid(
            "buying_power.required_free_buying_power_percent must be in [0, 1)",
        ));
    }

    let valid_formats = ["json", "pretty", "compact"];
    if !valid_formats.contains(&config.observability.logging.format.as_str()) {
        return Err(invalid(format!(
            "observability.logging.format must be one of: {valid_formats:?}"
        )));
    }

    if let Some(account) = &config.account {
        validate_account(account)?;
    }
    Ok(())
}

fn validate_margin(margin: &MarginConfig, scope: &str) -> Result<(), ConfigError> {
    if margin.initial_rate < Decimal::ZERO || margin.maintenance_rate < Decimal::ZERO {
        return Err(invalid(format!("{scope}.margin rates must not be negative")));
    }
    Ok(())
}

fn validate_account(account: &AccountConfig) -> Result<(), ConfigError> {
    validate_margin(&account.margin, "account")?;

    if account.fees.per_unit < Decimal::ZERO || account.fees.minimum < Decimal::ZERO {
        return Err(invalid("account.fees must not be negative"));
    }

    for security in &account.securities {
        if security.lot_size <= Decimal::ZERO {
            return Err(invalid(format!(
                "account.securities: lot_size of {} must be positive",
                security.instrument
            )));
        }
    }

    let mut names = HashSet::new();
    for basket in &account.baskets {
        if !names.insert(basket.name.as_str()) {
            return Err(invalid(format!(
                "account.baskets: duplicate basket {}",
                basket.name
            )));
        }
        if basket.legs.is_empty() {
            return Err(invalid(format!(
                "account.baskets: basket {} has no legs",
                basket.name
            )));
        }
        if basket.legs.iter().any(|leg| leg.ratio == 0) {
            return Err(invalid(format!(
                "account.baskets: basket {} has a zero ratio",
                basket.name
            )));
        }
        if let Some(margin) = &basket.margin {
            validate_margin(margin, &format!("account.baskets.{}", basket.name))?;
        }
    }

    for (index, request) in account.sizing.iter().enumerate() {
        if request.instrument.is_some() == request.basket.is_some() {
            return Err(invalid(format!(
                "account.sizing[{index}]: exactly one of instrument or basket is required"
            )));
        }
        if request.target.is_some() == request.delta.is_some() {
            return Err(invalid(format!(
                "account.sizing[{index}]: exactly one of target or delta is required"
            )));
        }
        if let Some(basket) = &request.basket {
            if !names.contains(basket.as_str()) {
                return Err(invalid(format!(
                    "account.sizing[{index}]: unknown basket {basket}"
                )));
            }
        }
    }
    Ok(())
}
