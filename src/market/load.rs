//! Load-shifting plans for households running a meaningful deficit.

use crate::model::{HouseholdState, LoadManagementReport, LoadShiftPlan};

/// Deficit below which a household is left alone (kWh).
const DEFICIT_FLOOR_KWH: f32 = 1.0;
/// At most this share of the deficit can be shifted.
const SHIFTABLE_FRAC: f32 = 0.3;
/// Hard cap on shiftable energy per household (kWh).
const SHIFTABLE_CAP_KWH: f32 = 2.0;
/// Share of the deficit saved by shifting.
const SAVINGS_FRAC: f32 = 0.15;

/// Evening peak window during which deferrable loads are pushed further out.
fn is_peak_hour(hour: u32) -> bool {
    (17..=21).contains(&(hour % 24))
}

/// Hour a deferred load should resume: past the peak window when shifting
/// during it, otherwise just the next hour.
fn shift_target_hour(hour: u32) -> u32 {
    let offset = if is_peak_hour(hour) { 4 } else { 1 };
    (hour + offset) % 24
}

/// Builds shift plans for every online household whose deficit (demand minus
/// generation minus stored energy) exceeds 1 kWh.
pub fn manage_loads(households: &[HouseholdState], hour: u32) -> LoadManagementReport {
    let mut plans = Vec::new();
    let mut peak_reduction_kwh = 0.0;

    for s in households.iter().filter(|s| s.is_online) {
        let deficit = s.predicted_demand_kw - s.predicted_generation_kw - s.battery_level_kwh;
        if deficit <= DEFICIT_FLOOR_KWH {
            continue;
        }

        let shiftable_kwh = (SHIFTABLE_FRAC * deficit).min(SHIFTABLE_CAP_KWH);
        let savings_kwh = SAVINGS_FRAC * deficit;
        peak_reduction_kwh += savings_kwh;

        plans.push(LoadShiftPlan {
            household_id: s.id,
            deficit_kwh: deficit,
            priority_loads: s.kind.priority_loads().iter().map(|l| l.to_string()).collect(),
            deferrable_loads: s
                .kind
                .deferrable_loads()
                .iter()
                .map(|l| l.to_string())
                .collect(),
            shiftable_kwh,
            shift_to_hour: shift_target_hour(hour),
            savings_kwh,
        });
    }

    LoadManagementReport {
        plans,
        peak_reduction_kwh,
    }
}
