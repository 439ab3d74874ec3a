//! Per-household battery action for the cycle.

use std::collections::BTreeMap;

use crate::model::{BatteryAction, HouseholdState};

/// Picks the battery action for one household from its net balance and fill.
pub fn action_for(state: &HouseholdState) -> BatteryAction {
    let fill = state.battery_fill();
    if state.net_balance_kw > 0.0 {
        if fill < 0.8 {
            BatteryAction::Charge
        } else {
            BatteryAction::Sell
        }
    } else if fill > 0.3 {
        BatteryAction::Discharge
    } else {
        BatteryAction::Buy
    }
}

/// Battery strategy for the whole fleet, keyed by household id.
pub fn optimize_strategy(households: &[HouseholdState]) -> BTreeMap<u64, BatteryAction> {
    households.iter().map(|s| (s.id, action_for(s))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HouseholdKind;

    fn state(id: u64, net_balance_kw: f32, battery_level_kwh: f32) -> HouseholdState {
        HouseholdState {
            id,
            kind: HouseholdKind::Residential,
            solar_capacity_kw: 5.0,
            battery_capacity_kwh: 10.0,
            battery_level_kwh,
            is_online: true,
            location: "Sector 1".to_string(),
            predicted_generation_kw: 2.0 + net_balance_kw.max(0.0),
            predicted_demand_kw: 2.0 + (-net_balance_kw).max(0.0),
            net_balance_kw,
            can_support: false,
            needs_support: false,
        }
    }

    #[test]
    fn surplus_charges_until_nearly_full_then_sells() {
        assert_eq!(action_for(&state(1, 2.0, 5.0)), BatteryAction::Charge);
        assert_eq!(action_for(&state(1, 2.0, 9.0)), BatteryAction::Sell);
    }

    #[test]
    fn deficit_discharges_until_reserve_then_buys() {
        assert_eq!(action_for(&state(1, -2.0, 5.0)), BatteryAction::Discharge);
        assert_eq!(action_for(&state(1, -2.0, 2.0)), BatteryAction::Buy);
    }

    #[test]
    fn strategy_covers_every_household() {
        let fleet = vec![state(1, 2.0, 5.0), state(2, -1.0, 9.0), state(3, 0.0, 1.0)];
        let strategy = optimize_strategy(&fleet);
        assert_eq!(strategy.len(), 3);
        assert_eq!(strategy[&3], BatteryAction::Buy);
    }
}
