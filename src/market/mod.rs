//! Per-cycle market optimization pipeline.
//!
//! Every component is a pure function over the analyzed [`NetworkState`];
//! [`optimize`] wires them together into one [`OptimizationResult`].

pub mod analyzer;
pub mod balance;
pub mod battery;
pub mod equity;
pub mod load;
pub mod matcher;
pub mod pricing;

use tracing::debug;

use crate::config::MarketConfig;
use crate::model::{NetworkState, OptimizationResult};

/// Builds operator-facing recommendations from the cycle's reports.
fn build_recommendations(result: &OptimizationResult, state: &NetworkState) -> Vec<String> {
    let mut notes = Vec::new();

    if result.pairs.is_empty() {
        notes.push("no actionable trades this cycle".to_string());
    } else {
        let total: f32 = result.pairs.iter().map(|p| p.energy_kwh).sum();
        notes.push(format!(
            "{} trades moving {total:.2} kWh between neighbors",
            result.pairs.len()
        ));
    }

    if result.balance.load_shedding_required {
        notes.push(format!(
            "grid load factor {:.2}: shed deferrable loads at {} households",
            result.balance.grid_load_factor,
            result.balance.shedding_candidates.len()
        ));
    }
    if result.grid_stability < 0.5 {
        notes.push(format!(
            "grid stability {:.2}: generation and demand are far apart",
            result.grid_stability
        ));
    }
    if result.equity.emergency_support {
        notes.push(format!(
            "{} vulnerable households: activate emergency support",
            result.equity.vulnerable.len()
        ));
    }
    if result.loads.peak_reduction_kwh > 0.0 {
        notes.push(format!(
            "load shifting can cut peak demand by {:.2} kWh",
            result.loads.peak_reduction_kwh
        ));
    }
    if state.total_generation_kw <= 0.0 && state.hour >= 6 && state.hour <= 18 {
        notes.push("no daytime generation: check panel availability".to_string());
    }

    notes
}

/// Runs the full optimization pipeline over one analyzed snapshot.
///
/// Deterministic: identical snapshots produce identical results.
pub fn optimize(state: &NetworkState, cfg: &MarketConfig) -> OptimizationResult {
    let pairs = matcher::match_pairs(&state.households, &cfg.matching);
    let prices = pricing::optimize_prices(
        &pairs,
        &cfg.pricing,
        state.hour,
        state.total_generation_kw,
        state.total_demand_kw,
    );
    let strategy = battery::optimize_strategy(&state.households);
    let balance = balance::balance_grid(&state.households);
    let loads = load::manage_loads(&state.households, state.hour);
    let equity = equity::plan_equity(&state.households);
    let grid_stability =
        balance::grid_stability(state.total_generation_kw, state.total_demand_kw);

    let mut result = OptimizationResult {
        pairs,
        prices,
        strategy,
        grid_stability,
        recommendations: Vec::new(),
        balance,
        loads,
        equity,
        tick: state.tick,
    };
    result.recommendations = build_recommendations(&result, state);

    debug!(
        tick = state.tick,
        pairs = result.pairs.len(),
        stability = result.grid_stability,
        "optimization cycle complete"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForecastConfig;
    use crate::forecast::ForecastModel;
    use crate::forecast::baseline::Season;
    use crate::model::{Household, HouseholdKind, WeatherCondition, WeatherKind};

    fn household(
        id: u64,
        solar_kw: f32,
        battery_capacity_kwh: f32,
        battery_pct: f32,
        kind: HouseholdKind,
    ) -> Household {
        Household {
            id,
            name: format!("H{id}"),
            kind,
            solar_capacity_kw: solar_kw,
            battery_capacity_kwh,
            battery_level_pct: battery_pct,
            is_online: true,
            location: format!("Sector {}", id % 4),
            owner_id: 1,
        }
    }

    fn snapshot(hour: u32, weather: WeatherKind) -> NetworkState {
        let forecast = ForecastModel::new(&ForecastConfig::default(), Season::Summer, 42);
        let fleet = vec![
            household(1, 6.0, 15.0, 80.0, HouseholdKind::Residential),
            household(2, 0.0, 10.0, 10.0, HouseholdKind::Residential),
            household(3, 4.0, 12.0, 55.0, HouseholdKind::Commercial),
            household(4, 0.0, 8.0, 25.0, HouseholdKind::Farm),
        ];
        analyzer::analyze_network(
            &fleet,
            &WeatherCondition::from_kind(weather),
            hour,
            2,
            7,
            &forecast,
        )
    }

    #[test]
    fn pipeline_produces_consistent_bundle() {
        let cfg = MarketConfig::baseline();
        let state = snapshot(12, WeatherKind::Sunny);
        let result = optimize(&state, &cfg);

        assert_eq!(result.tick, 7);
        assert_eq!(result.strategy.len(), 4);
        assert!((0.0..=1.0).contains(&result.grid_stability));
        for pair in &result.pairs {
            assert!(pair.energy_kwh >= cfg.matching.min_trade_kwh);
            assert!(pair.energy_kwh <= cfg.matching.max_trade_kwh);
            assert!(result.prices.contains_key(&pair.supplier_id));
        }
        for price in result.prices.values() {
            assert!((cfg.pricing.floor_price..=cfg.pricing.ceiling_price).contains(price));
        }
        assert!(!result.recommendations.is_empty());
    }

    #[test]
    fn identical_snapshots_optimize_identically() {
        let cfg = MarketConfig::baseline();
        let state = snapshot(12, WeatherKind::Sunny);
        let a = optimize(&state, &cfg);
        let b = optimize(&state, &cfg);
        assert_eq!(a.pairs, b.pairs);
        assert_eq!(a.prices, b.prices);
        assert_eq!(a.strategy, b.strategy);
        assert_eq!(a.grid_stability, b.grid_stability);
    }

    #[test]
    fn night_storm_yields_trades_from_storage_only() {
        let cfg = MarketConfig::baseline();
        let state = snapshot(1, WeatherKind::Stormy);
        assert_eq!(state.total_generation_kw, 0.0);
        let result = optimize(&state, &cfg);
        // Whatever happens, nothing divides by zero.
        assert!(result.grid_stability.is_finite());
        assert!(result.balance.supply_demand_ratio.is_finite());
    }
}
