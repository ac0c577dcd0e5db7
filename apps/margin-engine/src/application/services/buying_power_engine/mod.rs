//! Buying Power Engine
//!
//! Evaluates contemplated trades against the account's free margin:
//! - Reserved buying power impact, re-resolving only the groups a change touches
//! - Sufficiency of a single-instrument order
//! - Buying power available to a group in a trade direction
//! - Maximum order quantity for a target or delta margin (see `maximum_quantity`)
//!
//! Every operation first asks the manager to re-resolve, so a stale snapshot is never
//! used for a decision.

mod maximum_quantity;

use rust_decimal::Decimal;
use std::sync::Arc;

use super::PositionGroupManager;
use crate::application::ports::{FeeModelPort, LedgerPort};
use crate::domain::buying_power::{
    BuyingPower, BuyingPowerError, HasSufficientBuyingPowerParameters,
    HasSufficientBuyingPowerResult, PositionGroupBuyingPowerParameters, ReservedBuyingPowerImpact,
    ReservedBuyingPowerImpactParameters,
};
use crate::domain::position_group::{PositionCollection, PositionGroup, SecurityReferenceProvider};

/// Margin-based trade evaluation over the manager's position groups.
pub struct BuyingPowerEngine {
    manager: Arc<PositionGroupManager>,
    ledger: Arc<dyn LedgerPort>,
    fees: Arc<dyn FeeModelPort>,
    required_free_buying_power_percent: Decimal,
}

impl BuyingPowerEngine {
    /// Create an engine that keeps no buying power in reserve.
    pub fn new(
        manager: Arc<PositionGroupManager>,
        ledger: Arc<dyn LedgerPort>,
        fees: Arc<dyn FeeModelPort>,
    ) -> Self {
        Self {
            manager,
            ledger,
            fees,
            required_free_buying_power_percent: Decimal::ZERO,
        }
    }

    /// Keep a fraction of margin remaining out of reach of new trades.
    #[must_use]
    pub const fn with_required_free_buying_power_percent(mut self, percent: Decimal) -> Self {
        self.required_free_buying_power_percent = percent;
        self
    }

    /// The manager whose snapshot this engine reads.
    pub const fn manager(&self) -> &Arc<PositionGroupManager> {
        &self.manager
    }

    /// Fraction of margin remaining usable by new trades.
    pub fn free_fraction(&self) -> Decimal {
        Decimal::ONE - self.required_free_buying_power_percent
    }

    /// Margin remaining after the required free buying power is set aside.
    pub fn free_margin(&self) -> Decimal {
        self.ledger.margin_remaining() * self.free_fraction()
    }

    fn reference(&self) -> &dyn SecurityReferenceProvider {
        self.manager.reference().as_ref()
    }

    /// Initial margin of the group under its own margin model.
    pub fn get_initial_margin_requirement(&self, group: &PositionGroup) -> Decimal {
        group
            .margin_model()
            .initial_margin_requirement(self.reference(), group)
    }

    /// Maintenance margin currently reserved against the group.
    pub fn get_reserved_buying_power_for_group(&self, group: &PositionGroup) -> Decimal {
        group
            .margin_model()
            .maintenance_margin_requirement(self.reference(), group)
    }

    /// Fee of trading the group's positions as one order, summed over its legs.
    pub fn order_fee(&self, order: &PositionGroup) -> Decimal {
        order
            .positions()
            .iter()
            .map(|position| self.fees.order_fee(position.instrument(), position.quantity()))
            .sum()
    }

    /// Initial margin of the group, signed like its multiplier.
    fn signed_initial_margin(&self, group: &PositionGroup) -> Decimal {
        if group.multiplier().is_zero() {
            return Decimal::ZERO;
        }
        let margin = self.get_initial_margin_requirement(group).abs();
        if group.multiplier().is_sign_negative() {
            -margin
        } else {
            margin
        }
    }

    /// Reserved buying power before and after the contemplated changes.
    ///
    /// Only groups sharing an instrument with the changes are priced and re-resolved.
    pub fn compute_reserved_buying_power_impact(
        &self,
        parameters: &ReservedBuyingPowerImpactParameters,
    ) -> ReservedBuyingPowerImpact {
        self.manager.resolve_position_groups();
        let snapshot = self.manager.snapshot();
        let changes = &parameters.contemplated_changes;

        let impacted_groups = snapshot.impacted_groups(changes);
        let current: Decimal = impacted_groups
            .iter()
            .map(|group| self.get_reserved_buying_power_for_group(group))
            .sum();

        let working_set = PositionCollection::assemble(
            impacted_groups.iter().flat_map(|group| group.positions().iter()),
            changes,
            self.reference(),
        );
        let contemplated_groups: Vec<Arc<PositionGroup>> = self
            .manager
            .resolve_working_set(working_set)
            .iter()
            .cloned()
            .collect();
        let contemplated: Decimal = contemplated_groups
            .iter()
            .map(|group| self.get_reserved_buying_power_for_group(group))
            .sum();

        tracing::debug!(
            impacted = impacted_groups.len(),
            contemplated_groups = contemplated_groups.len(),
            current = %current,
            contemplated = %contemplated,
            "Computed reserved buying power impact"
        );

        ReservedBuyingPowerImpact {
            current,
            contemplated,
            delta: contemplated - current,
            impacted_groups,
            contemplated_changes: changes.clone(),
            contemplated_groups,
        }
    }

    /// Whether a single-instrument order fits in free margin.
    ///
    /// `parameters.group` is the order's own position group, priced for its initial
    /// margin; the maintenance impact is then computed against current holdings.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedComboOrder` if the group does not have exactly one leg.
    pub fn has_sufficient_buying_power_for_order(
        &self,
        parameters: &HasSufficientBuyingPowerParameters,
    ) -> Result<HasSufficientBuyingPowerResult, BuyingPowerError> {
        let order = &parameters.order;
        if parameters.group.len() != 1 {
            return Err(BuyingPowerError::UnsupportedComboOrder {
                order_id: order.id.clone(),
                group_size: parameters.group.len(),
            });
        }

        let free_margin = self.free_margin();
        let initial_margin = self.get_initial_margin_requirement(&parameters.group);
        if free_margin < initial_margin {
            return Ok(HasSufficientBuyingPowerResult::insufficient(format!(
                "Id: {}, Initial Margin: {}, Free Margin: {}",
                order.id,
                initial_margin.normalize(),
                free_margin.normalize()
            )));
        }

        let impact = self.compute_reserved_buying_power_impact(
            &ReservedBuyingPowerImpactParameters::new(vec![
                order.position_change(self.reference()),
            ]),
        );
        if impact.delta > free_margin {
            return Ok(HasSufficientBuyingPowerResult::insufficient(format!(
                "Id: {}, Maintenance Margin Delta: {}, Free Margin: {}",
                order.id,
                impact.delta.normalize(),
                free_margin.normalize()
            )));
        }

        Ok(HasSufficientBuyingPowerResult::sufficient())
    }

    /// Buying power available to trade the group in the given direction.
    ///
    /// Closing trades also get back the group's reserved maintenance margin and its
    /// initial margin requirement.
    pub fn get_position_group_buying_power(
        &self,
        parameters: &PositionGroupBuyingPowerParameters,
    ) -> BuyingPower {
        self.manager.resolve_position_groups();
        let held = self.manager.get_position_group(parameters.group.key());

        let mut value = self.free_margin();
        if parameters.direction.closes(&held) {
            value += self.get_reserved_buying_power_for_group(&held)
                + self.get_initial_margin_requirement(&held);
        }
        BuyingPower { value }
    }
}
