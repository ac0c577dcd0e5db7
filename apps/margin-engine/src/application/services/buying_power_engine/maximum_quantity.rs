//! Maximum order quantity search.
//!
//! Fees are not linear in quantity and groups only trade in whole units, so a single
//! division can both overshoot and stall. The search takes the one-unit fee off the
//! budget, estimates linearly, then shrinks the estimate by at least one unit per pass
//! until the order margin fits the fee-adjusted budget.

use rust_decimal::Decimal;

use super::BuyingPowerEngine;
use crate::domain::buying_power::{
    BuyingPowerError, MaximumOrderQuantityForDeltaParameters,
    MaximumOrderQuantityForTargetParameters, MaximumOrderQuantityResult,
};
use crate::domain::position_group::{Position, PositionGroup};

impl BuyingPowerEngine {
    /// Signed number of group units to trade so the group's initial margin reaches
    /// `target_buying_power` of total portfolio value.
    ///
    /// A target of exactly zero closes the group.
    ///
    /// # Errors
    ///
    /// Returns `NonConvergence` if the search stops making progress.
    pub fn get_maximum_order_quantity_for_target_buying_power(
        &self,
        parameters: &MaximumOrderQuantityForTargetParameters,
    ) -> Result<MaximumOrderQuantityResult, BuyingPowerError> {
        self.manager.resolve_position_groups();
        let held = self.manager.get_position_group(parameters.group.key());

        if parameters.target_buying_power.is_zero() {
            return Ok(MaximumOrderQuantityResult::quantity(-held.multiplier()));
        }

        let target_margin = self.free_fraction()
            * parameters.target_buying_power
            * self.ledger.total_portfolio_value();
        self.solve_for_target_margin(&held, target_margin, parameters.silent)
    }

    /// Signed number of group units to trade so the group's initial margin changes by
    /// `delta_buying_power`.
    ///
    /// The delta is added to the margin of current holdings and solved as an absolute
    /// target, so the budget stays exact.
    ///
    /// # Errors
    ///
    /// Returns `NonConvergence` if the search stops making progress.
    pub fn get_maximum_order_quantity_for_delta_buying_power(
        &self,
        parameters: &MaximumOrderQuantityForDeltaParameters,
    ) -> Result<MaximumOrderQuantityResult, BuyingPowerError> {
        self.manager.resolve_position_groups();
        let held = self.manager.get_position_group(parameters.group.key());

        let target_margin = self.signed_initial_margin(&held) + parameters.delta_buying_power;
        self.solve_for_target_margin(&held, target_margin, parameters.silent)
    }

    fn solve_for_target_margin(
        &self,
        held: &PositionGroup,
        target_margin: Decimal,
        silent: bool,
    ) -> Result<MaximumOrderQuantityResult, BuyingPowerError> {
        let current_margin = self.signed_initial_margin(held);
        let difference = target_margin - current_margin;
        let direction = if difference.is_sign_negative() {
            Decimal::NEGATIVE_ONE
        } else {
            Decimal::ONE
        };
        let abs_target_delta = difference.abs();

        let unit = held.unit();
        let unit_margin = self.get_initial_margin_requirement(&unit).abs();
        if unit_margin.is_zero() {
            return Ok(self.zero_unit_margin(&unit));
        }

        let mut order_fee = self.order_fee(&unit.with_multiplier(direction));
        let mut budget = abs_target_delta - order_fee;
        if unit_margin > budget {
            return Ok(below_one_unit(held, budget, unit_margin, silent));
        }

        let mut quantity = (budget / unit_margin).floor();
        let mut first_pass = true;
        let mut guard = StallGuard::default();
        loop {
            order_fee = self.order_fee(&unit.with_multiplier(direction * quantity));
            budget = abs_target_delta - order_fee;

            if first_pass {
                first_pass = false;
                quantity = (budget / unit_margin).floor();
                tracing::debug!(
                    group = %held.key(),
                    quantity = %quantity,
                    order_fee = %order_fee,
                    target = %budget,
                    "Fee-adjusted quantity estimate"
                );
                if quantity <= Decimal::ZERO {
                    return Ok(below_one_unit(held, budget, unit_margin, silent));
                }
                continue;
            }

            let order_margin = quantity * unit_margin;
            tracing::debug!(
                group = %held.key(),
                quantity = %quantity,
                order_margin = %order_margin,
                order_fee = %order_fee,
                target = %budget,
                "Maximum quantity pass"
            );
            if order_margin <= budget {
                break;
            }

            let next = shrink(quantity, order_margin, budget);
            if next <= Decimal::ZERO {
                return Ok(below_one_unit(held, budget, unit_margin, silent));
            }
            if guard.stalled(next) {
                return Err(BuyingPowerError::NonConvergence {
                    group: held.key().clone(),
                    current_margin,
                    quantity: next,
                    lot_size: unit.positions().first().map_or(Decimal::ONE, Position::lot_size),
                    order_fee,
                    unit_margin,
                    order_margin,
                    target_margin: budget,
                });
            }
            quantity = next;
        }

        Ok(MaximumOrderQuantityResult::quantity(direction * quantity))
    }

    fn zero_unit_margin(&self, unit: &PositionGroup) -> MaximumOrderQuantityResult {
        let unpriced = unit
            .positions()
            .iter()
            .map(Position::instrument)
            .find(|instrument| self.reference().price(instrument).is_zero());

        let reason = match unpriced {
            Some(instrument) => format!(
                "The price of {instrument} is zero; the margin requirement of one unit of {} cannot be computed",
                unit.key()
            ),
            None => format!(
                "The margin requirement of one unit of {} is zero",
                unit.key()
            ),
        };
        tracing::warn!(group = %unit.key(), reason = %reason, "Unable to size order");
        MaximumOrderQuantityResult::error(reason)
    }
}

/// Next quantity after an overshoot of `budget`.
///
/// Reduces by the overshoot in units, never by less than one, so the search always
/// moves down.
fn shrink(quantity: Decimal, order_margin: Decimal, budget: Decimal) -> Decimal {
    let reduce_by = ((order_margin - budget) / (order_margin / quantity))
        .ceil()
        .max(Decimal::ONE);
    (quantity - reduce_by).floor()
}

/// Detects a search that has stopped moving.
///
/// Trips once a pass produces the same quantity as the pass before it twice in a
/// row. `shrink` always moves down, so this only trips if that stops holding.
#[derive(Debug, Default)]
struct StallGuard {
    last: Option<Decimal>,
    repeats: u8,
}

impl StallGuard {
    fn stalled(&mut self, quantity: Decimal) -> bool {
        if self.last == Some(quantity) {
            self.repeats = self.repeats.saturating_add(1);
        } else {
            self.last = Some(quantity);
            self.repeats = 0;
        }
        self.repeats >= 2
    }
}

fn below_one_unit(
    group: &PositionGroup,
    budget: Decimal,
    unit_margin: Decimal,
    silent: bool,
) -> MaximumOrderQuantityResult {
    MaximumOrderQuantityResult::zero(
        format!(
            "The target order margin {} is less than the minimum {} required for one unit of {}",
            budget.normalize(),
            unit_margin.normalize(),
            group.key()
        ),
        silent,
    )
}
