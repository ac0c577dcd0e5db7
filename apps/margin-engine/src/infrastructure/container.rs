//! Dependency Injection Container
//!
//! Wires the in-memory adapters, the position group manager and the buying-power
//! engine from an account configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::{InMemoryPortfolio, InMemorySecurityReference, PercentageMarginModel, PerUnitFeeModel};
use crate::application::ports::{HoldingsPort, LedgerPort};
use crate::application::services::{BuyingPowerEngine, PositionGroupManager};
use crate::config::{AccountConfig, BuyingPowerConfig, MarginConfig, SizingRequestConfig};
use crate::domain::buying_power::{
    MaximumOrderQuantityForDeltaParameters, MaximumOrderQuantityForTargetParameters,
    MaximumOrderQuantityResult,
};
use crate::domain::position_group::{
    FixedRatioResolver, PositionGroupKey, SecurityPositionGroupResolver, SecurityReference,
    SecurityReferenceProvider, UnitLeg,
};
use crate::domain::shared::{DescriptorId, InstrumentId};
use crate::error::{EngineError, ErrorCode};

/// Outcome of one configured sizing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizingOutcome {
    /// Group key that was sized.
    pub group: String,
    /// Target fraction requested, if any.
    pub target: Option<Decimal>,
    /// Margin delta requested, if any.
    pub delta: Option<Decimal>,
    /// Solver result.
    #[serde(flatten)]
    pub result: MaximumOrderQuantityResult,
}

/// Holds all wired dependencies for one account.
pub struct Container {
    portfolio: Arc<InMemoryPortfolio>,
    manager: Arc<PositionGroupManager>,
    engine: BuyingPowerEngine,
    baskets: HashMap<String, PositionGroupKey>,
    silent: bool,
}

fn margin_model(margin: &MarginConfig) -> Arc<PercentageMarginModel> {
    Arc::new(PercentageMarginModel::new(
        margin.initial_rate,
        margin.maintenance_rate,
    ))
}

impl Container {
    /// Build the adapters and services described by the account.
    ///
    /// # Errors
    ///
    /// Returns an error if a basket cannot be registered in the resolver chain.
    pub fn from_config(
        settings: &BuyingPowerConfig,
        account: &AccountConfig,
    ) -> Result<Self, EngineError> {
        let reference = Arc::new(InMemorySecurityReference::new());
        for security in &account.securities {
            reference.upsert(
                InstrumentId::new(security.instrument.as_str()),
                SecurityReference::new(security.price, security.lot_size, security.currency.as_str()),
            );
        }

        let portfolio = Arc::new(InMemoryPortfolio::new(
            account.account_currency.as_str(),
            Arc::clone(&reference) as Arc<dyn SecurityReferenceProvider>,
        ));
        portfolio.set_margin_remaining(account.margin_remaining);
        portfolio.set_total_portfolio_value(account.total_portfolio_value);

        let manager = Arc::new(PositionGroupManager::new(
            Arc::clone(&portfolio) as Arc<dyn HoldingsPort>,
            Arc::clone(&reference) as Arc<dyn SecurityReferenceProvider>,
            SecurityPositionGroupResolver::new(margin_model(&account.margin)),
        ));

        let mut baskets = HashMap::new();
        for (index, basket) in account.baskets.iter().enumerate() {
            let resolver = FixedRatioResolver::new(
                DescriptorId::new(basket.name.as_str()),
                basket
                    .legs
                    .iter()
                    .map(|leg| UnitLeg::new(leg.instrument.as_str(), leg.ratio))
                    .collect(),
                margin_model(basket.margin.as_ref().unwrap_or(&account.margin)),
            );
            baskets.insert(basket.name.clone(), resolver.key().clone());
            manager.register_descriptor(Arc::new(resolver), index)?;
        }

        for security in &account.securities {
            portfolio.track(&InstrumentId::new(security.instrument.as_str()));
        }
        for (instrument, quantity) in &account.holdings {
            portfolio.set_quantity(&InstrumentId::new(instrument.as_str()), *quantity);
        }

        let engine = BuyingPowerEngine::new(
            Arc::clone(&manager),
            Arc::clone(&portfolio) as Arc<dyn LedgerPort>,
            Arc::new(PerUnitFeeModel::new(account.fees.per_unit, account.fees.minimum)),
        )
        .with_required_free_buying_power_percent(settings.required_free_buying_power_percent);

        tracing::info!(
            securities = account.securities.len(),
            holdings = account.holdings.len(),
            baskets = baskets.len(),
            "Account wired"
        );

        Ok(Self {
            portfolio,
            manager,
            engine,
            baskets,
            silent: settings.silent_solver,
        })
    }

    /// Get the portfolio adapter.
    pub fn portfolio(&self) -> Arc<InMemoryPortfolio> {
        Arc::clone(&self.portfolio)
    }

    /// Get the position group manager.
    pub fn manager(&self) -> Arc<PositionGroupManager> {
        Arc::clone(&self.manager)
    }

    /// Get the buying-power engine.
    pub const fn engine(&self) -> &BuyingPowerEngine {
        &self.engine
    }

    /// Key of the configured basket.
    pub fn basket_key(&self, name: &str) -> Option<&PositionGroupKey> {
        self.baskets.get(name)
    }

    /// Run one configured sizing request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request names an unknown basket, has neither a target
    /// nor a delta, or if the solver fails to converge.
    pub fn run_sizing(&self, request: &SizingRequestConfig) -> Result<SizingOutcome, EngineError> {
        let key = match (&request.instrument, &request.basket) {
            (Some(instrument), _) => PositionGroupKey::single(InstrumentId::new(instrument.as_str())),
            (None, Some(basket)) => self.basket_key(basket).cloned().ok_or_else(|| {
                EngineError::new(ErrorCode::InvalidConfig, format!("Unknown basket {basket}"))
                    .with_context("basket", basket)
            })?,
            (None, None) => {
                return Err(EngineError::new(
                    ErrorCode::InvalidConfig,
                    "Sizing request names neither an instrument nor a basket",
                ));
            }
        };

        self.manager.resolve_position_groups();
        let group = (*self.manager.get_position_group(&key)).clone();

        let result = match (request.target, request.delta) {
            (Some(target), _) => self.engine.get_maximum_order_quantity_for_target_buying_power(
                &MaximumOrderQuantityForTargetParameters {
                    group,
                    target_buying_power: target,
                    silent: self.silent,
                },
            )?,
            (None, Some(delta)) => self.engine.get_maximum_order_quantity_for_delta_buying_power(
                &MaximumOrderQuantityForDeltaParameters {
                    group,
                    delta_buying_power: delta,
                    silent: self.silent,
                },
            )?,
            (None, None) => {
                return Err(EngineError::new(
                    ErrorCode::InvalidConfig,
                    "Sizing request has neither a target nor a delta",
                )
                .with_context("group", &key));
            }
        };

        Ok(SizingOutcome {
            group: key.to_string(),
            target: request.target,
            delta: request.delta,
            result,
        })
    }
}
