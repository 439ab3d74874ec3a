//! Mutable simulation state: the synthetic fleet, bounded telemetry, and the
//! latest optimization result.

use std::collections::VecDeque;

use crate::config::SimulationConfig;
use crate::model::{
    EnergyReading, Household, HouseholdKind, OptimizationResult, SIM_ID_OFFSET, TradeRecord,
};

/// Deterministic battery seed level in percent for a synthetic household.
///
/// A sinusoid keyed by id and scenario seed spreads initial levels across
/// the fleet without a PRNG, so fleets are reproducible by construction.
fn seed_battery_pct(id: u64, seed: u64) -> f32 {
    let phase = id as f32 * 1.37 + seed as f32 * 0.71;
    (55.0 + 35.0 * phase.sin()).clamp(5.0, 95.0)
}

fn kind_for(index: usize) -> HouseholdKind {
    match index % 5 {
        3 => HouseholdKind::Commercial,
        4 => HouseholdKind::Farm,
        _ => HouseholdKind::Residential,
    }
}

/// Builds the synthetic fleet for a scenario.
pub fn seed_fleet(cfg: &SimulationConfig) -> Vec<Household> {
    (0..cfg.fleet_size)
        .map(|i| {
            let id = SIM_ID_OFFSET + i as u64;
            let kind = kind_for(i);
            let (solar_kw, battery_kwh) = match kind {
                HouseholdKind::Residential => (3.0 + (i % 3) as f32, 10.0),
                HouseholdKind::Commercial => (8.0, 20.0),
                HouseholdKind::Farm => (5.0, 15.0),
            };
            Household {
                id,
                name: format!("sim-household-{}", i + 1),
                kind,
                solar_capacity_kw: solar_kw,
                battery_capacity_kwh: battery_kwh,
                battery_level_pct: seed_battery_pct(id, cfg.seed),
                is_online: true,
                location: format!("Sector {}", i % 6 + 1),
                owner_id: 0,
            }
        })
        .collect()
}

/// Everything a tick mutates, guarded by one lock in the clock.
pub struct SimStore {
    pub households: Vec<Household>,
    readings: VecDeque<EnergyReading>,
    trades: VecDeque<TradeRecord>,
    readings_cap: usize,
    trades_cap: usize,
    pub latest: Option<OptimizationResult>,
    pub tick: u64,
}

impl SimStore {
    pub fn new(cfg: &SimulationConfig) -> Self {
        Self {
            households: seed_fleet(cfg),
            readings: VecDeque::with_capacity(cfg.readings_cap),
            trades: VecDeque::with_capacity(cfg.trades_cap),
            readings_cap: cfg.readings_cap,
            trades_cap: cfg.trades_cap,
            latest: None,
            tick: 0,
        }
    }

    /// Reseeds the fleet and clears all telemetry.
    pub fn reset(&mut self, cfg: &SimulationConfig) {
        self.households = seed_fleet(cfg);
        self.readings.clear();
        self.trades.clear();
        self.latest = None;
        self.tick = 0;
    }

    /// Appends a reading, evicting the oldest once the cap is reached.
    pub fn push_reading(&mut self, reading: EnergyReading) {
        if self.readings.len() == self.readings_cap {
            self.readings.pop_front();
        }
        self.readings.push_back(reading);
    }

    /// Appends a trade, evicting the oldest once the cap is reached.
    pub fn push_trade(&mut self, trade: TradeRecord) {
        if self.trades.len() == self.trades_cap {
            self.trades.pop_front();
        }
        self.trades.push_back(trade);
    }

    pub fn readings(&self) -> impl Iterator<Item = &EnergyReading> {
        self.readings.iter()
    }

    pub fn trades(&self) -> impl Iterator<Item = &TradeRecord> {
        self.trades.iter()
    }

    pub fn reading_count(&self) -> usize {
        self.readings.len()
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }
}
