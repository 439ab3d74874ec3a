//! Enriches the raw fleet into a per-cycle [`NetworkState`] snapshot.

use crate::forecast::ForecastModel;
use crate::model::{Household, HouseholdState, NetworkState, WeatherCondition};

/// A household can support peers when it clearly over-generates or its
/// battery is nearly full.
fn can_support(generation_kw: f32, demand_kw: f32, battery_fill: f32) -> bool {
    generation_kw > 1.1 * demand_kw || battery_fill >= 0.8
}

/// A household needs support when generation falls short or its battery runs
/// low.
fn needs_support(generation_kw: f32, demand_kw: f32, battery_fill: f32) -> bool {
    generation_kw < 0.9 * demand_kw || battery_fill < 0.3
}

/// Builds the cycle snapshot: forecasts every household and derives the
/// support flags and fleet totals.
///
/// Pure with respect to its inputs; safe to call concurrently for different
/// snapshots.
pub fn analyze_network(
    households: &[Household],
    weather: &WeatherCondition,
    hour: u32,
    day_of_week: u32,
    tick: u64,
    forecast: &ForecastModel,
) -> NetworkState {
    let mut states = Vec::with_capacity(households.len());
    let mut total_generation_kw = 0.0;
    let mut total_demand_kw = 0.0;

    for h in households {
        let predicted_generation_kw = forecast.predict_generation(h, weather, hour);
        let predicted_demand_kw = forecast.predict_demand(h, hour, day_of_week);
        let fill = h.battery_fill();

        if h.is_online {
            total_generation_kw += predicted_generation_kw;
            total_demand_kw += predicted_demand_kw;
        }

        states.push(HouseholdState {
            id: h.id,
            kind: h.kind,
            solar_capacity_kw: h.solar_capacity_kw,
            battery_capacity_kwh: h.battery_capacity_kwh,
            battery_level_kwh: h.battery_level_kwh(),
            is_online: h.is_online,
            location: h.location.clone(),
            predicted_generation_kw,
            predicted_demand_kw,
            net_balance_kw: predicted_generation_kw - predicted_demand_kw,
            can_support: can_support(predicted_generation_kw, predicted_demand_kw, fill),
            needs_support: needs_support(predicted_generation_kw, predicted_demand_kw, fill),
        });
    }

    NetworkState {
        households: states,
        weather: weather.clone(),
        hour,
        day_of_week,
        total_generation_kw,
        total_demand_kw,
        tick,
    }
}
