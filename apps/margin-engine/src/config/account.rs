//! Account scenario evaluated by the binary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Account state and the sizing requests to run against it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountConfig {
    /// ISO code of the account currency.
    #[serde(default = "default_currency")]
    pub account_currency: String,
    /// Margin still available.
    pub margin_remaining: Decimal,
    /// Total portfolio value.
    pub total_portfolio_value: Decimal,
    /// Reference data of every instrument.
    #[serde(default)]
    pub securities: Vec<SecurityConfig>,
    /// Signed quantity held per instrument.
    #[serde(default)]
    pub holdings: BTreeMap<String, Decimal>,
    /// Fee schedule.
    #[serde(default)]
    pub fees: FeesConfig,
    /// Margin rates of the default model.
    #[serde(default)]
    pub margin: MarginConfig,
    /// Fixed-ratio baskets, registered ahead of the single-instrument fallback in order.
    #[serde(default)]
    pub baskets: Vec<BasketConfig>,
    /// Sizing requests.
    #[serde(default)]
    pub sizing: Vec<SizingRequestConfig>,
}

/// Reference data of one instrument.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecurityConfig {
    /// Instrument identifier.
    pub instrument: String,
    /// Last price.
    pub price: Decimal,
    /// Quantity step.
    #[serde(default = "default_lot_size")]
    pub lot_size: Decimal,
    /// Quote currency.
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Per-unit fee schedule.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct FeesConfig {
    /// Fee per unit traded.
    #[serde(default)]
    pub per_unit: Decimal,
    /// Minimum fee per non-empty order.
    #[serde(default)]
    pub minimum: Decimal,
}

/// Percentage margin rates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarginConfig {
    /// Fraction of notional required to open.
    #[serde(default = "default_rate")]
    pub initial_rate: Decimal,
    /// Fraction of notional reserved while held.
    #[serde(default = "default_rate")]
    pub maintenance_rate: Decimal,
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self {
            initial_rate: default_rate(),
            maintenance_rate: default_rate(),
        }
    }
}

/// A fixed-ratio basket resolver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BasketConfig {
    /// Descriptor name.
    pub name: String,
    /// Legs of one unit.
    pub legs: Vec<BasketLegConfig>,
    /// Margin rates of the basket; the account rates when absent.
    #[serde(default)]
    pub margin: Option<MarginConfig>,
}

/// One leg of a basket unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BasketLegConfig {
    /// Instrument identifier.
    pub instrument: String,
    /// Signed integer ratio.
    pub ratio: i64,
}

/// One maximum-quantity request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SizingRequestConfig {
    /// Single instrument to size. Exclusive with `basket`.
    #[serde(default)]
    pub instrument: Option<String>,
    /// Basket to size. Exclusive with `instrument`.
    #[serde(default)]
    pub basket: Option<String>,
    /// Target margin as a fraction of total portfolio value.
    #[serde(default)]
    pub target: Option<Decimal>,
    /// Change in margin, in account currency.
    #[serde(default)]
    pub delta: Option<Decimal>,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_lot_size() -> Decimal {
    Decimal::ONE
}

fn default_rate() -> Decimal {
    Decimal::ONE
}
