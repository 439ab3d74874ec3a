//! Shared fixtures for integration tests.

use gridshare::config::MarketConfig;
use gridshare::forecast::ForecastModel;
use gridshare::forecast::baseline::Season;
use gridshare::market::analyzer::analyze_network;
use gridshare::model::{Household, HouseholdKind, NetworkState, WeatherCondition, WeatherKind};

/// A small, deterministic scenario configuration for tests.
pub fn test_config() -> MarketConfig {
    let mut cfg = MarketConfig::baseline();
    cfg.simulation.fleet_size = 8;
    cfg.simulation.seed = 42;
    cfg
}

/// A household with explicit solar and battery characteristics.
pub fn household(
    id: u64,
    kind: HouseholdKind,
    solar_capacity_kw: f32,
    battery_capacity_kwh: f32,
    battery_level_pct: f32,
) -> Household {
    Household {
        id,
        name: format!("test-household-{id}"),
        kind,
        solar_capacity_kw,
        battery_capacity_kwh,
        battery_level_pct,
        is_online: true,
        location: format!("Sector {}", id % 4 + 1),
        owner_id: 1,
    }
}

/// Analyzes a fleet under the given weather and hour with a fresh forecast
/// model seeded at 42.
pub fn analyzed(fleet: &[Household], weather: WeatherKind, hour: u32) -> NetworkState {
    let cfg = test_config();
    let forecast = ForecastModel::new(&cfg.forecast, Season::Summer, 42);
    analyze_network(
        fleet,
        &WeatherCondition::from_kind(weather),
        hour,
        2,
        0,
        &forecast,
    )
}
