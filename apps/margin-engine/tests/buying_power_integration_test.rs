//! Buying Power Integration Tests
//!
//! Drives the engine through the public API with the in-memory portfolio:
//! holdings change, groups re-resolve on demand, and every request sees the
//! current grouping.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use margin_engine::{
    BuyingPowerEngine, BuyingPowerError, DescriptorId, FixedRatioResolver,
    HasSufficientBuyingPowerParameters, HoldingsPort, InMemoryPortfolio,
    InMemorySecurityReference, InstrumentId, LedgerPort, MarketOrder,
    MaximumOrderQuantityForDeltaParameters, MaximumOrderQuantityForTargetParameters, OrderDirection,
    OrderId, PerUnitFeeModel, PercentageMarginModel, Position, PositionGroup,
    PositionGroupBuyingPowerParameters, PositionGroupKey, PositionGroupManager,
    ReservedBuyingPowerImpactParameters, SecurityPositionGroupResolver, SecurityReference,
    SecurityReferenceProvider, UnitLeg,
};

// =============================================================================
// Harness
// =============================================================================

struct Account {
    reference: Arc<InMemorySecurityReference>,
    portfolio: Arc<InMemoryPortfolio>,
    manager: Arc<PositionGroupManager>,
    engine: BuyingPowerEngine,
}

impl Account {
    fn new(prices: &[(&str, Decimal)], margin: PercentageMarginModel) -> Self {
        let reference = Arc::new(InMemorySecurityReference::new());
        for (symbol, price) in prices {
            reference.upsert(
                InstrumentId::new(*symbol),
                SecurityReference::new(*price, dec!(1), "USD"),
            );
        }
        let portfolio = Arc::new(InMemoryPortfolio::new(
            "USD",
            Arc::clone(&reference) as Arc<dyn SecurityReferenceProvider>,
        ));
        let manager = Arc::new(PositionGroupManager::new(
            Arc::clone(&portfolio) as Arc<dyn HoldingsPort>,
            Arc::clone(&reference) as Arc<dyn SecurityReferenceProvider>,
            SecurityPositionGroupResolver::new(Arc::new(margin)),
        ));
        let engine = BuyingPowerEngine::new(
            Arc::clone(&manager),
            Arc::clone(&portfolio) as Arc<dyn LedgerPort>,
            Arc::new(PerUnitFeeModel::free()),
        );
        Self {
            reference,
            portfolio,
            manager,
            engine,
        }
    }

    fn funded(self, margin_remaining: Decimal, total_portfolio_value: Decimal) -> Self {
        self.portfolio.set_margin_remaining(margin_remaining);
        self.portfolio.set_total_portfolio_value(total_portfolio_value);
        self
    }

    fn list(&self, symbol: &str, price: Decimal, lot_size: Decimal) {
        self.reference.upsert(
            InstrumentId::new(symbol),
            SecurityReference::new(price, lot_size, "USD"),
        );
    }

    fn hold(&self, symbol: &str, quantity: Decimal) {
        self.portfolio
            .set_quantity(&InstrumentId::new(symbol), quantity);
    }

    fn register_pair(&self, margin: PercentageMarginModel) {
        self.manager
            .register_descriptor(
                Arc::new(FixedRatioResolver::new(
                    DescriptorId::new("pair"),
                    vec![UnitLeg::new("AAPL", 1), UnitLeg::new("MSFT", -1)],
                    Arc::new(margin),
                )),
                0,
            )
            .unwrap();
    }
}

fn single(symbol: &str) -> PositionGroup {
    PositionGroup::single(
        Position::of(symbol, Decimal::ZERO),
        Arc::new(PercentageMarginModel::cash()),
    )
}

fn pair_key() -> PositionGroupKey {
    PositionGroupKey::new(
        DescriptorId::new("pair"),
        vec![UnitLeg::new("AAPL", 1), UnitLeg::new("MSFT", -1)],
    )
}

// =============================================================================
// Maximum order quantity
// =============================================================================

#[test]
fn test_half_of_portfolio_buys_fifty_shares() {
    let account = Account::new(&[("AAPL", dec!(1000))], PercentageMarginModel::cash())
        .funded(dec!(100000), dec!(100000));

    let result = account
        .engine
        .get_maximum_order_quantity_for_target_buying_power(&MaximumOrderQuantityForTargetParameters {
            group: single("AAPL"),
            target_buying_power: dec!(0.5),
            silent: false,
        })
        .unwrap();

    assert_eq!(result.quantity, dec!(50));
    assert!(!result.is_error);
}

#[test]
fn test_zero_target_closes_short_holdings() {
    let account = Account::new(&[("AAPL", dec!(1000))], PercentageMarginModel::cash())
        .funded(dec!(100000), dec!(100000));
    account.hold("AAPL", dec!(-7));

    let result = account
        .engine
        .get_maximum_order_quantity_for_target_buying_power(&MaximumOrderQuantityForTargetParameters {
            group: single("AAPL"),
            target_buying_power: Decimal::ZERO,
            silent: true,
        })
        .unwrap();

    assert_eq!(result.quantity, dec!(7));
}

#[test]
fn test_target_sees_fill_applied_after_previous_request() {
    let account = Account::new(&[("AAPL", dec!(1000))], PercentageMarginModel::cash())
        .funded(dec!(100000), dec!(100000));
    let request = MaximumOrderQuantityForTargetParameters {
        group: single("AAPL"),
        target_buying_power: dec!(0.5),
        silent: false,
    };

    let first = account
        .engine
        .get_maximum_order_quantity_for_target_buying_power(&request)
        .unwrap();
    account
        .portfolio
        .apply_fill(&InstrumentId::new("AAPL"), first.quantity);
    let second = account
        .engine
        .get_maximum_order_quantity_for_target_buying_power(&request)
        .unwrap();

    assert_eq!(first.quantity, dec!(50));
    assert!(second.quantity.is_zero());
    assert!(second.reason.is_some());
}

#[test]
fn test_basket_sized_in_units_after_regrouping() {
    let account = Account::new(
        &[("AAPL", dec!(1000)), ("MSFT", dec!(500))],
        PercentageMarginModel::cash(),
    )
    .funded(dec!(100000), dec!(100000));
    account.register_pair(PercentageMarginModel::cash());
    account.hold("AAPL", dec!(10));
    account.hold("MSFT", dec!(-10));

    let group = (*account.manager.get_position_group(&pair_key())).clone();
    let result = account
        .engine
        .get_maximum_order_quantity_for_target_buying_power(&MaximumOrderQuantityForTargetParameters {
            group,
            target_buying_power: dec!(0.3),
            silent: false,
        })
        .unwrap();

    // 30000 of margin at 1500 per unit, 10 units already held
    assert_eq!(result.quantity, dec!(10));
}

#[test]
fn test_delta_request_adds_to_current_margin() {
    let account = Account::new(&[("AAPL", dec!(1000))], PercentageMarginModel::cash())
        .funded(dec!(100000), dec!(100000));
    account.hold("AAPL", dec!(20));

    let result = account
        .engine
        .get_maximum_order_quantity_for_delta_buying_power(&MaximumOrderQuantityForDeltaParameters {
            group: single("AAPL"),
            delta_buying_power: dec!(-5000),
            silent: false,
        })
        .unwrap();

    assert_eq!(result.quantity, dec!(-5));
}

#[test]
fn test_delta_budget_of_exactly_ten_units() {
    let account = Account::new(&[("AAPL", dec!(1000))], PercentageMarginModel::cash())
        .funded(dec!(30000), dec!(30000));

    let result = account
        .engine
        .get_maximum_order_quantity_for_delta_buying_power(&MaximumOrderQuantityForDeltaParameters {
            group: single("AAPL"),
            delta_buying_power: dec!(10000),
            silent: false,
        })
        .unwrap();

    assert_eq!(result.quantity, dec!(10));
    assert!(result.reason.is_none());
}

#[test]
fn test_odd_lot_holding_closes_in_whole_lots() {
    let account = Account::new(&[], PercentageMarginModel::cash()).funded(dec!(100000), dec!(100000));
    account.list("AAPL", dec!(10), dec!(100));
    account.hold("AAPL", dec!(150));

    let result = account
        .engine
        .get_maximum_order_quantity_for_target_buying_power(&MaximumOrderQuantityForTargetParameters {
            group: single("AAPL"),
            target_buying_power: Decimal::ZERO,
            silent: true,
        })
        .unwrap();

    // One whole lot of 100; the remaining 50 sit in their own group
    assert_eq!(result.quantity, dec!(-1));
    assert!(result.quantity.fract().is_zero());
    let snapshot = account.manager.snapshot();
    let odd = snapshot
        .get(&PositionGroupKey::odd_lot(InstrumentId::new("AAPL")))
        .unwrap();
    assert_eq!(odd.multiplier(), dec!(1));
    assert_eq!(odd.positions()[0].quantity(), dec!(50));
}

// =============================================================================
// Sufficiency
// =============================================================================

#[test]
fn test_initial_margin_above_free_margin_is_rejected() {
    let account = Account::new(
        &[("AAPL", dec!(100))],
        PercentageMarginModel::new(dec!(0.5), dec!(0.25)),
    )
    .funded(dec!(900), dec!(10000));
    let order = MarketOrder::new(OrderId::new("ord-1"), InstrumentId::new("AAPL"), dec!(20));
    let group = PositionGroup::single(
        Position::of("AAPL", dec!(20)),
        Arc::new(PercentageMarginModel::new(dec!(0.5), dec!(0.25))),
    );

    let result = account
        .engine
        .has_sufficient_buying_power_for_order(&HasSufficientBuyingPowerParameters { order, group })
        .unwrap();

    assert!(!result.is_sufficient);
    assert_eq!(
        result.reason.as_deref(),
        Some("Id: ord-1, Initial Margin: 1000, Free Margin: 900")
    );
}

#[test]
fn test_maintenance_delta_above_free_margin_is_rejected() {
    let margin = PercentageMarginModel::new(dec!(0.1), dec!(0.5));
    let account = Account::new(&[("AAPL", dec!(100))], margin).funded(dec!(900), dec!(10000));
    let order = MarketOrder::new(OrderId::new("ord-2"), InstrumentId::new("AAPL"), dec!(20));
    let group = PositionGroup::single(Position::of("AAPL", dec!(20)), Arc::new(margin));

    let result = account
        .engine
        .has_sufficient_buying_power_for_order(&HasSufficientBuyingPowerParameters { order, group })
        .unwrap();

    assert!(!result.is_sufficient);
    assert_eq!(
        result.reason.as_deref(),
        Some("Id: ord-2, Maintenance Margin Delta: 1000, Free Margin: 900")
    );
}

#[test]
fn test_combo_group_is_not_a_single_order() {
    let account = Account::new(
        &[("AAPL", dec!(100)), ("MSFT", dec!(100))],
        PercentageMarginModel::cash(),
    )
    .funded(dec!(100000), dec!(100000));
    let order = MarketOrder::new(OrderId::new("ord-3"), InstrumentId::new("AAPL"), dec!(1));
    let group = account.manager.get_position_group(&pair_key());

    let err = account
        .engine
        .has_sufficient_buying_power_for_order(&HasSufficientBuyingPowerParameters {
            order,
            group: (*group).clone(),
        })
        .unwrap_err();

    assert!(matches!(
        err,
        BuyingPowerError::UnsupportedComboOrder { group_size: 2, .. }
    ));
}

// =============================================================================
// Impact and group buying power
// =============================================================================

#[test]
fn test_impact_prices_pair_formation() {
    let account = Account::new(
        &[("AAPL", dec!(100)), ("MSFT", dec!(100)), ("TSLA", dec!(100))],
        PercentageMarginModel::new(dec!(0.5), dec!(0.25)),
    )
    .funded(dec!(10000), dec!(10000));
    account.register_pair(PercentageMarginModel::new(dec!(0.1), dec!(0.05)));
    account.hold("AAPL", dec!(4));
    account.hold("MSFT", dec!(-4));
    account.hold("TSLA", dec!(100));

    let impact = account.engine.compute_reserved_buying_power_impact(
        &ReservedBuyingPowerImpactParameters::new(vec![
            Position::of("AAPL", dec!(2)),
            Position::of("MSFT", dec!(-2)),
        ]),
    );

    // Pair grows from 4 to 6 units; TSLA is never re-resolved
    assert_eq!(impact.impacted_groups.len(), 1);
    assert_eq!(impact.current, dec!(40));
    assert_eq!(impact.contemplated, dec!(60));
    assert_eq!(impact.delta, dec!(20));
    assert_eq!(impact.contemplated_groups[0].multiplier(), dec!(6));
}

#[test]
fn test_contemplated_changes_count_lots_from_reference() {
    let account = Account::new(&[], PercentageMarginModel::cash()).funded(dec!(100000), dec!(100000));
    account.list("AAPL", dec!(10), dec!(100));
    account.list("MSFT", dec!(10), dec!(100));
    account.register_pair(PercentageMarginModel::cash());

    let impact = account.engine.compute_reserved_buying_power_impact(
        &ReservedBuyingPowerImpactParameters::new(vec![
            Position::of("AAPL", dec!(200)),
            Position::of("MSFT", dec!(-200)),
        ]),
    );

    assert_eq!(impact.contemplated_groups.len(), 1);
    let pair = &impact.contemplated_groups[0];
    assert_eq!(pair.key(), &pair_key());
    assert_eq!(pair.multiplier(), dec!(2));
    assert_eq!(pair.positions()[0].lot_size(), dec!(100));
}

#[test]
fn test_closing_direction_releases_held_margin() {
    let account = Account::new(
        &[("AAPL", dec!(100))],
        PercentageMarginModel::new(dec!(0.5), dec!(0.25)),
    )
    .funded(dec!(5000), dec!(10000));
    account.hold("AAPL", dec!(20));

    let closing = account
        .engine
        .get_position_group_buying_power(&PositionGroupBuyingPowerParameters {
            group: single("AAPL"),
            direction: OrderDirection::Sell,
        });
    let opening = account
        .engine
        .get_position_group_buying_power(&PositionGroupBuyingPowerParameters {
            group: single("AAPL"),
            direction: OrderDirection::Buy,
        });

    // free 5000 + reserved 500 + initial 1000
    assert_eq!(closing.value, dec!(6500));
    assert_eq!(opening.value, dec!(5000));
}

#[test]
fn test_reserve_shrinks_free_margin() {
    let account = Account::new(&[("AAPL", dec!(100))], PercentageMarginModel::cash())
        .funded(dec!(8000), dec!(10000));
    let engine = account
        .engine
        .with_required_free_buying_power_percent(dec!(0.25));

    assert_eq!(engine.free_fraction(), dec!(0.75));
    assert_eq!(engine.free_margin(), dec!(6000));
}
