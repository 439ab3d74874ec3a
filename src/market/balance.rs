//! Fleet-level supply/demand balancing and load-shedding flags.

use crate::model::{GridBalanceReport, HouseholdState};

/// Per-household surplus above which a household counts as a grid-support
/// provider, and (negated) below which it becomes a shedding candidate.
const SURPLUS_THRESHOLD_KWH: f32 = 2.0;

/// Load factor above which shedding is required.
const SHEDDING_LOAD_FACTOR: f32 = 0.9;

/// Aggregates the fleet and flags shedding candidates and support providers.
///
/// Only online households contribute to the totals and the candidate lists.
pub fn balance_grid(households: &[HouseholdState]) -> GridBalanceReport {
    let mut total_generation_kw = 0.0;
    let mut total_demand_kw = 0.0;
    let mut total_battery_capacity_kwh = 0.0;
    let mut total_stored_kwh = 0.0;
    let mut shedding_candidates = Vec::new();
    let mut support_providers = Vec::new();

    for s in households.iter().filter(|s| s.is_online) {
        total_generation_kw += s.predicted_generation_kw;
        total_demand_kw += s.predicted_demand_kw;
        total_battery_capacity_kwh += s.battery_capacity_kwh;
        total_stored_kwh += s.battery_level_kwh;

        if s.net_balance_kw < -SURPLUS_THRESHOLD_KWH {
            shedding_candidates.push(s.id);
        } else if s.net_balance_kw > SURPLUS_THRESHOLD_KWH {
            support_providers.push(s.id);
        }
    }

    let supply_demand_ratio = if total_demand_kw <= 0.0 {
        1.0
    } else {
        total_generation_kw / total_demand_kw
    };
    // Demand against an empty grid saturates the load factor; only an
    // entirely idle network reports 0.0.
    let available = total_generation_kw + total_stored_kwh;
    let grid_load_factor = if available <= 0.0 {
        if total_demand_kw > 0.0 { 1.0 } else { 0.0 }
    } else {
        (total_demand_kw / available).min(1.0)
    };

    GridBalanceReport {
        total_generation_kw,
        total_demand_kw,
        total_battery_capacity_kwh,
        total_stored_kwh,
        supply_demand_ratio,
        grid_load_factor,
        load_shedding_required: grid_load_factor > SHEDDING_LOAD_FACTOR,
        shedding_candidates,
        support_providers,
    }
}

/// How closely generation matches demand, in [0, 1].
///
/// With no demand at all the grid is trivially stable when generating (1.0)
/// and indeterminate when idle (0.5). Never NaN or infinite.
pub fn grid_stability(total_generation_kw: f32, total_demand_kw: f32) -> f32 {
    if total_demand_kw <= 0.0 {
        return if total_generation_kw > 0.0 { 1.0 } else { 0.5 };
    }
    (1.0 - (1.0 - total_generation_kw / total_demand_kw).abs()).clamp(0.0, 1.0)
}
