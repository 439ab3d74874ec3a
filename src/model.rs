//! Core domain types: households, weather, network state, and per-cycle
//! optimization artifacts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// First id handed out to simulation-owned households.
///
/// Externally supplied rosters use low ids; keeping synthetic ids above this
/// offset guarantees the two ranges never collide.
pub const SIM_ID_OFFSET: u64 = 1_000_000;

/// Coarse household category, used to derive the base demand profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseholdKind {
    Residential,
    Commercial,
    Farm,
}

impl HouseholdKind {
    /// Baseline demand in kW before time-of-day and seasonal shaping.
    pub fn base_demand_kw(self) -> f32 {
        match self {
            Self::Residential => 1.2,
            Self::Commercial => 3.0,
            Self::Farm => 2.0,
        }
    }

    /// Appliance groups that must stay powered during a deficit.
    pub fn priority_loads(self) -> &'static [&'static str] {
        match self {
            Self::Residential => &["refrigeration", "lighting", "medical"],
            Self::Commercial => &["refrigeration", "lighting", "point_of_sale"],
            Self::Farm => &["irrigation_pump", "cold_storage", "lighting"],
        }
    }

    /// Appliance groups that can be deferred to a later hour.
    pub fn deferrable_loads(self) -> &'static [&'static str] {
        match self {
            Self::Residential => &["water_heater", "washing_machine", "ev_charging"],
            Self::Commercial => &["hvac_precool", "water_heater"],
            Self::Farm => &["grain_dryer", "water_pump_refill"],
        }
    }
}

/// A residential or commercial unit with solar generation and battery storage.
///
/// Battery level is tracked as a percentage of capacity; [`Household::battery_level_kwh`]
/// converts to absolute energy. Mutable fields are `battery_level_pct` and
/// `is_online`; everything else is fixed at registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Household {
    pub id: u64,
    pub name: String,
    pub kind: HouseholdKind,
    /// Rated solar panel capacity (kW).
    pub solar_capacity_kw: f32,
    /// Battery capacity (kWh).
    pub battery_capacity_kwh: f32,
    /// Battery level as a percentage of capacity (0–100).
    pub battery_level_pct: f32,
    pub is_online: bool,
    /// Coarse location label; distances are derived from it deterministically.
    pub location: String,
    pub owner_id: u64,
}

impl Household {
    /// Absolute stored energy (kWh).
    pub fn battery_level_kwh(&self) -> f32 {
        self.battery_capacity_kwh * self.battery_level_pct / 100.0
    }

    /// Battery fill as a fraction of capacity (0.0 when there is no battery).
    pub fn battery_fill(&self) -> f32 {
        if self.battery_capacity_kwh <= 0.0 {
            0.0
        } else {
            (self.battery_level_pct / 100.0).clamp(0.0, 1.0)
        }
    }

    /// Adds (or removes, when negative) energy to the battery, clamping the
    /// resulting level to `[0, capacity]`.
    pub fn apply_battery_delta_kwh(&mut self, delta_kwh: f32) {
        if self.battery_capacity_kwh <= 0.0 {
            return;
        }
        let level = (self.battery_level_kwh() + delta_kwh).clamp(0.0, self.battery_capacity_kwh);
        self.battery_level_pct = 100.0 * level / self.battery_capacity_kwh;
    }
}

/// Enumerated sky condition, ordered from best to worst solar yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherKind {
    Sunny,
    PartlyCloudy,
    Cloudy,
    Overcast,
    Rainy,
    Stormy,
}

impl WeatherKind {
    /// All kinds in yield order, used by the weather engine's random walk.
    pub const ALL: [WeatherKind; 6] = [
        Self::Sunny,
        Self::PartlyCloudy,
        Self::Cloudy,
        Self::Overcast,
        Self::Rainy,
        Self::Stormy,
    ];

    /// Fraction of rated panel output achievable under this sky.
    ///
    /// Strictly decreasing from sunny to stormy so that worse weather always
    /// lowers the generation forecast.
    pub fn solar_efficiency(self) -> f32 {
        match self {
            Self::Sunny => 1.0,
            Self::PartlyCloudy => 0.80,
            Self::Cloudy => 0.55,
            Self::Overcast => 0.40,
            Self::Rainy => 0.25,
            Self::Stormy => 0.12,
        }
    }

    /// Parses the snake_case names used in config files and the API.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sunny" => Some(Self::Sunny),
            "partly_cloudy" => Some(Self::PartlyCloudy),
            "cloudy" => Some(Self::Cloudy),
            "overcast" => Some(Self::Overcast),
            "rainy" => Some(Self::Rainy),
            "stormy" => Some(Self::Stormy),
            _ => None,
        }
    }
}

impl fmt::Display for WeatherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Sunny => "sunny",
            Self::PartlyCloudy => "partly_cloudy",
            Self::Cloudy => "cloudy",
            Self::Overcast => "overcast",
            Self::Rainy => "rainy",
            Self::Stormy => "stormy",
        };
        f.write_str(s)
    }
}

/// Immutable weather snapshot, replaced wholesale on each change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub kind: WeatherKind,
    pub temperature_c: f32,
    pub cloud_cover_pct: f32,
    pub wind_speed_kmh: f32,
    /// Derived scalar, cached here so consumers never recompute it.
    pub solar_efficiency: f32,
}

impl WeatherCondition {
    /// Canonical snapshot for a sky condition (no jitter).
    pub fn from_kind(kind: WeatherKind) -> Self {
        let (temperature_c, cloud_cover_pct, wind_speed_kmh) = match kind {
            WeatherKind::Sunny => (32.0, 5.0, 8.0),
            WeatherKind::PartlyCloudy => (29.0, 30.0, 12.0),
            WeatherKind::Cloudy => (26.0, 65.0, 15.0),
            WeatherKind::Overcast => (24.0, 85.0, 18.0),
            WeatherKind::Rainy => (22.0, 95.0, 25.0),
            WeatherKind::Stormy => (20.0, 100.0, 45.0),
        };
        Self {
            kind,
            temperature_c,
            cloud_cover_pct,
            wind_speed_kmh,
            solar_efficiency: kind.solar_efficiency(),
        }
    }
}

/// Priority tier attached to a trading pair, derived from demander urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradePriority {
    Normal,
    High,
    Emergency,
}

/// A proposed energy transfer for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingPair {
    pub supplier_id: u64,
    pub demander_id: u64,
    /// Energy to move (kWh), always in `[0.3, 3.0]`.
    pub energy_kwh: f32,
    /// Deterministic inter-party distance (km).
    pub distance_km: f32,
    pub priority: TradePriority,
}

/// Per-cycle battery action for one household.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryAction {
    Charge,
    Discharge,
    Sell,
    Buy,
}

/// One household enriched with forecasts and derived support flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseholdState {
    pub id: u64,
    pub kind: HouseholdKind,
    pub solar_capacity_kw: f32,
    pub battery_capacity_kwh: f32,
    /// Absolute stored energy (kWh).
    pub battery_level_kwh: f32,
    pub is_online: bool,
    pub location: String,
    pub predicted_generation_kw: f32,
    pub predicted_demand_kw: f32,
    /// `predicted_generation_kw - predicted_demand_kw`.
    pub net_balance_kw: f32,
    pub can_support: bool,
    pub needs_support: bool,
}

impl HouseholdState {
    /// Battery fill fraction (0.0 without a battery).
    pub fn battery_fill(&self) -> f32 {
        if self.battery_capacity_kwh <= 0.0 {
            0.0
        } else {
            (self.battery_level_kwh / self.battery_capacity_kwh).clamp(0.0, 1.0)
        }
    }
}

/// Snapshot of the whole fleet for one cycle. Recomputed every tick, never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkState {
    pub households: Vec<HouseholdState>,
    pub weather: WeatherCondition,
    /// Simulated hour of day (0–23).
    pub hour: u32,
    /// Simulated day of week (0 = Monday).
    pub day_of_week: u32,
    pub total_generation_kw: f32,
    pub total_demand_kw: f32,
    pub tick: u64,
}

/// Supply/demand aggregates and load-shedding candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridBalanceReport {
    pub total_generation_kw: f32,
    pub total_demand_kw: f32,
    pub total_battery_capacity_kwh: f32,
    pub total_stored_kwh: f32,
    /// generation / demand, 1.0 when demand is zero.
    pub supply_demand_ratio: f32,
    /// min(1, demand / (generation + stored)).
    pub grid_load_factor: f32,
    pub load_shedding_required: bool,
    pub shedding_candidates: Vec<u64>,
    pub support_providers: Vec<u64>,
}

/// Load-shifting proposal for one deficit household.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadShiftPlan {
    pub household_id: u64,
    pub deficit_kwh: f32,
    pub priority_loads: Vec<String>,
    pub deferrable_loads: Vec<String>,
    /// Deferrable energy (kWh), at most 30% of the deficit capped at 2 kWh.
    pub shiftable_kwh: f32,
    /// Hour of day the deferrable load should resume.
    pub shift_to_hour: u32,
    pub savings_kwh: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadManagementReport {
    pub plans: Vec<LoadShiftPlan>,
    /// Aggregate peak-demand reduction across all plans (kWh).
    pub peak_reduction_kwh: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedistributionPriority {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedistributionUrgency {
    Immediate,
    Scheduled,
}

/// One proposed transfer from a surplus household to a vulnerable one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedistributionAction {
    pub from_id: u64,
    pub to_id: u64,
    pub energy_kwh: f32,
    pub urgency: RedistributionUrgency,
    pub priority: RedistributionPriority,
}

/// Fairness analysis for one cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityReport {
    /// 1 − vulnerable/total, in [0, 1].
    pub equity_score: f32,
    pub average_security: f32,
    pub vulnerable: Vec<u64>,
    pub actions: Vec<RedistributionAction>,
    /// Set when vulnerable households exceed 20% of the fleet.
    pub emergency_support: bool,
}

/// The per-cycle bundle produced by the optimization pipeline.
///
/// Ephemeral; the simulation clock retains only the most recent instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub pairs: Vec<TradingPair>,
    /// Final clearing price per supplier (whole ₹ per kWh). If a supplier
    /// appears in several pairs the last computed price wins.
    pub prices: std::collections::BTreeMap<u64, u32>,
    pub strategy: std::collections::BTreeMap<u64, BatteryAction>,
    /// How closely generation matches demand, in [0, 1].
    pub grid_stability: f32,
    pub recommendations: Vec<String>,
    pub balance: GridBalanceReport,
    pub loads: LoadManagementReport,
    pub equity: EquityReport,
    pub tick: u64,
}

/// Synthetic meter reading recorded by the simulation each tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyReading {
    pub household_id: u64,
    pub generation_kw: f32,
    pub consumption_kw: f32,
    pub battery_level_pct: f32,
    pub tick: u64,
}

/// Completed trade recorded by the simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub supplier_id: u64,
    pub demander_id: u64,
    pub energy_kwh: f32,
    pub price_per_kwh: u32,
    pub tick: u64,
}

/// Fleet-level aggregates exposed by the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkStats {
    pub household_count: usize,
    pub online_count: usize,
    pub total_generation_kw: f32,
    pub total_demand_kw: f32,
    pub total_battery_capacity_kwh: f32,
    pub total_stored_kwh: f32,
    pub average_battery_pct: f32,
    pub grid_stability: f32,
}
