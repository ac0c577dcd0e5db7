//! Position Group Integration Tests
//!
//! Resolver chain registration, partial claims and lazy re-resolution as seen
//! through the manager and the in-memory portfolio.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use margin_engine::{
    DescriptorId, EngineError, ErrorCode, FixedRatioResolver, HoldingsPort, InMemoryPortfolio,
    InMemorySecurityReference, InstrumentId, PercentageMarginModel, PositionGroupError,
    PositionGroupKey, PositionGroupManager, PositionGroupResolver, SecurityPositionGroupResolver,
    SecurityReference, SecurityReferenceProvider, UnitLeg,
};

fn setup(symbols: &[&str]) -> (Arc<InMemoryPortfolio>, PositionGroupManager) {
    let reference = Arc::new(InMemorySecurityReference::new());
    for symbol in symbols {
        reference.upsert(
            InstrumentId::new(*symbol),
            SecurityReference::new(dec!(50), dec!(1), "USD"),
        );
    }
    let portfolio = Arc::new(InMemoryPortfolio::new(
        "USD",
        Arc::clone(&reference) as Arc<dyn SecurityReferenceProvider>,
    ));
    let manager = PositionGroupManager::new(
        Arc::clone(&portfolio) as Arc<dyn HoldingsPort>,
        reference,
        SecurityPositionGroupResolver::new(Arc::new(PercentageMarginModel::cash())),
    );
    (portfolio, manager)
}

fn basket(name: &str, legs: Vec<UnitLeg>) -> Arc<dyn PositionGroupResolver> {
    Arc::new(FixedRatioResolver::new(
        DescriptorId::new(name),
        legs,
        Arc::new(PercentageMarginModel::cash()),
    ))
}

fn quantity_in_groups(manager: &PositionGroupManager, symbol: &str) -> Decimal {
    let instrument = InstrumentId::new(symbol);
    manager
        .snapshot()
        .positions()
        .filter(|position| position.instrument() == &instrument)
        .map(|position| position.quantity())
        .sum()
}

#[test]
fn test_registration_past_fallback_is_rejected_with_exit_code() {
    let (_portfolio, manager) = setup(&["AAPL", "MSFT"]);
    let pair = basket("pair", vec![UnitLeg::new("AAPL", 1), UnitLeg::new("MSFT", -1)]);

    let err = manager.register_descriptor(pair, 1).unwrap_err();
    assert_eq!(
        err,
        PositionGroupError::InvalidDescriptorIndex { index: 1, count: 1 }
    );

    let err = EngineError::from(err);
    assert_eq!(err.code(), ErrorCode::InvalidDescriptorIndex);
    assert_eq!(err.to_report().exit_code, 3);
    assert_eq!(manager.descriptors().len(), 1);
}

#[test]
fn test_duplicate_descriptor_is_rejected() {
    let (_portfolio, manager) = setup(&["AAPL", "MSFT"]);
    let legs = vec![UnitLeg::new("AAPL", 1), UnitLeg::new("MSFT", -1)];

    manager.register_descriptor(basket("pair", legs.clone()), 0).unwrap();
    let err = manager.register_descriptor(basket("pair", legs), 0).unwrap_err();

    assert!(matches!(err, PositionGroupError::DuplicateDescriptor { .. }));
}

#[test]
fn test_higher_priority_basket_claims_shared_leg_first() {
    let (portfolio, manager) = setup(&["AAPL", "MSFT", "GOOG"]);
    manager
        .register_descriptor(
            basket("pair", vec![UnitLeg::new("AAPL", 1), UnitLeg::new("MSFT", -1)]),
            0,
        )
        .unwrap();
    manager
        .register_descriptor(
            basket("hedge", vec![UnitLeg::new("AAPL", 1), UnitLeg::new("GOOG", -1)]),
            0,
        )
        .unwrap();
    portfolio.set_quantity(&InstrumentId::new("AAPL"), dec!(5));
    portfolio.set_quantity(&InstrumentId::new("MSFT"), dec!(-5));
    portfolio.set_quantity(&InstrumentId::new("GOOG"), dec!(-5));

    manager.resolve_position_groups();
    let snapshot = manager.snapshot();

    let hedge = PositionGroupKey::new(
        DescriptorId::new("hedge"),
        vec![UnitLeg::new("AAPL", 1), UnitLeg::new("GOOG", -1)],
    );
    assert_eq!(snapshot.get(&hedge).unwrap().multiplier(), dec!(5));
    assert_eq!(
        snapshot
            .get(&PositionGroupKey::single(InstrumentId::new("MSFT")))
            .unwrap()
            .multiplier(),
        dec!(-5)
    );
    assert_eq!(quantity_in_groups(&manager, "AAPL"), dec!(5));
}

#[test]
fn test_partial_claim_leaves_remainder_in_default_group() {
    let (portfolio, manager) = setup(&["AAPL", "MSFT"]);
    manager
        .register_descriptor(
            basket("ratio", vec![UnitLeg::new("AAPL", 2), UnitLeg::new("MSFT", -1)]),
            0,
        )
        .unwrap();
    portfolio.set_quantity(&InstrumentId::new("AAPL"), dec!(7));
    portfolio.set_quantity(&InstrumentId::new("MSFT"), dec!(-5));

    manager.resolve_position_groups();
    let snapshot = manager.snapshot();

    assert_eq!(snapshot.groups_for_instrument(&InstrumentId::new("AAPL")).len(), 2);
    assert_eq!(snapshot.groups_for_instrument(&InstrumentId::new("MSFT")).len(), 2);
    assert_eq!(quantity_in_groups(&manager, "AAPL"), dec!(7));
    assert_eq!(quantity_in_groups(&manager, "MSFT"), dec!(-5));
}

#[test]
fn test_changes_between_requests_cost_one_resolution() {
    let (portfolio, manager) = setup(&["AAPL", "MSFT"]);
    portfolio.set_quantity(&InstrumentId::new("AAPL"), dec!(1));
    assert!(manager.resolve_position_groups());

    for quantity in [dec!(0), dec!(3), dec!(-2), dec!(4)] {
        portfolio.set_quantity(&InstrumentId::new("MSFT"), quantity);
    }
    portfolio.apply_fill(&InstrumentId::new("AAPL"), dec!(-1));

    assert!(manager.is_dirty());
    assert!(manager.resolve_position_groups());
    assert!(!manager.resolve_position_groups());
    assert_eq!(quantity_in_groups(&manager, "MSFT"), dec!(4));
    assert_eq!(quantity_in_groups(&manager, "AAPL"), dec!(0));
}

#[test]
fn test_tracked_flat_instruments_have_placeholders() {
    let (portfolio, manager) = setup(&["AAPL", "MSFT"]);
    portfolio.track(&InstrumentId::new("AAPL"));
    portfolio.set_quantity(&InstrumentId::new("MSFT"), dec!(10));

    manager.resolve_position_groups();
    let snapshot = manager.snapshot();

    let placeholder = snapshot
        .get(&PositionGroupKey::single(InstrumentId::new("AAPL")))
        .unwrap();
    assert!(placeholder.is_empty());
    assert!(placeholder.multiplier().is_zero());
    assert_eq!(snapshot.len(), 2);
}
