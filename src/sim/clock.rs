//! The periodic simulation clock.
//!
//! One clock per name lives in a process-wide registry so hot-reloaded
//! callers get the existing instance instead of a second ticking loop. The
//! lifecycle is explicit: `start` seeds the fleet and spawns the tick task,
//! `stop` halts it. Every mutable piece of simulation state sits behind one
//! lock, taken with `try_lock` on the tick path so ticks never overlap.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::MarketConfig;
use crate::forecast::ForecastModel;
use crate::market::{self, analyzer, balance};
use crate::model::{
    BatteryAction, EnergyReading, NetworkState, NetworkStats, OptimizationResult, TradeRecord,
    WeatherCondition, WeatherKind,
};
use crate::noise::gaussian_noise;
use crate::outage::{OutageReport, OutageSimulator, default_outage_ids};
use crate::sim::store::SimStore;
use crate::sim::weather::WeatherEngine;

/// Relative noise on synthesized meter readings.
const READING_NOISE_STD: f32 = 0.05;
/// Battery energy added by one tick of a `Charge` action (kWh).
const CHARGE_STEP_KWH: f32 = 2.0;
/// Battery energy removed by one tick of a `Discharge` action (kWh).
const DISCHARGE_STEP_KWH: f32 = 1.5;

static REGISTRY: Lazy<Mutex<BTreeMap<String, Arc<SimulationClock>>>> =
    Lazy::new(|| Mutex::new(BTreeMap::new()));

/// Snapshot returned by [`SimulationClock::status`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockStatus {
    pub running: bool,
    pub tick: u64,
    pub hour: u32,
    pub day_of_week: u32,
    pub weather: WeatherCondition,
    pub active_outage_ids: Vec<u64>,
    pub stats: NetworkStats,
}

/// Condensed equity view for external callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquitySummary {
    pub equity_score: f32,
    pub average_security: f32,
    pub vulnerable_count: usize,
    pub emergency_support: bool,
}

/// All mutable simulation state, guarded by one lock.
struct Inner {
    store: SimStore,
    weather: WeatherEngine,
    outage: OutageSimulator,
    rng: StdRng,
}

/// A named, periodically ticking simulation instance.
pub struct SimulationClock {
    name: String,
    config: MarketConfig,
    forecast: ForecastModel,
    inner: Mutex<Inner>,
    running: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SimulationClock {
    /// Returns the registered clock for `name`, creating it if absent.
    ///
    /// An existing clock keeps its original configuration; the one passed
    /// here only applies on first creation.
    pub fn named(name: &str, config: &MarketConfig) -> Arc<Self> {
        let mut registry = REGISTRY.lock();
        Arc::clone(
            registry
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Self::new(name, config.clone()))),
        )
    }

    /// Builds an unregistered clock. Prefer [`SimulationClock::named`] in
    /// long-lived processes.
    pub fn new(name: &str, config: MarketConfig) -> Self {
        let sim = &config.simulation;
        let inner = Inner {
            store: SimStore::new(sim),
            weather: WeatherEngine::new(config.initial_weather(), sim.seed),
            outage: OutageSimulator::new(),
            rng: StdRng::seed_from_u64(sim.seed.wrapping_add(1)),
        };
        let forecast = ForecastModel::new(&config.forecast, config.season(), sim.seed);
        Self {
            name: name.to_string(),
            config,
            forecast,
            inner: Mutex::new(inner),
            running: AtomicBool::new(false),
            task: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Starts ticking. A second call while running is a no-op; returns
    /// whether this call actually started the clock.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self: &Arc<Self>) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            return false;
        }

        {
            let mut inner = self.inner.lock();
            let sim = &self.config.simulation;
            inner.store.reset(sim);
            inner.weather = WeatherEngine::new(self.config.initial_weather(), sim.seed);
            inner.outage = OutageSimulator::new();
            inner.rng = StdRng::seed_from_u64(sim.seed.wrapping_add(1));
        }

        let clock = Arc::clone(self);
        let period = Duration::from_secs(self.config.simulation.tick_interval_secs);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if !clock.running.load(Ordering::SeqCst) {
                    break;
                }
                clock.run_cycle();
            }
        });
        *self.task.lock() = Some(handle);

        info!(name = %self.name, "simulation clock started");
        true
    }

    /// Stops ticking. Idempotent; a tick already in progress completes
    /// because cancellation only lands between ticks.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
        info!(name = %self.name, "simulation clock stopped");
    }

    fn hour_for(&self, tick: u64) -> u32 {
        ((self.config.simulation.start_hour as u64 + tick) % 24) as u32
    }

    fn day_of_week_for(&self, tick: u64) -> u32 {
        (((self.config.simulation.start_hour as u64 + tick) / 24) % 7) as u32
    }

    fn analyzed(&self, inner: &Inner) -> NetworkState {
        analyzer::analyze_network(
            &inner.store.households,
            inner.weather.current(),
            self.hour_for(inner.store.tick),
            self.day_of_week_for(inner.store.tick),
            inner.store.tick,
            &self.forecast,
        )
    }

    /// Runs one full cycle: advance time and weather, optimize, record
    /// telemetry, execute trades, apply battery actions.
    ///
    /// Returns false when a concurrent cycle holds the state lock; the
    /// contended cycle is skipped rather than queued.
    pub fn run_cycle(&self) -> bool {
        let Some(mut inner) = self.inner.try_lock() else {
            warn!(name = %self.name, "tick overlapped a running cycle, skipping");
            return false;
        };
        let inner = &mut *inner;

        // One simulated hour per tick.
        inner.store.tick += 1;
        inner.weather.step();

        let state = self.analyzed(inner);
        let result = market::optimize(&state, &self.config);

        for s in state.households.iter().filter(|s| s.is_online) {
            let generation_kw = (s.predicted_generation_kw
                * (1.0 + gaussian_noise(&mut inner.rng, READING_NOISE_STD)))
            .max(0.0);
            let consumption_kw = (s.predicted_demand_kw
                * (1.0 + gaussian_noise(&mut inner.rng, READING_NOISE_STD)))
            .max(0.0);
            let battery_level_pct = inner
                .store
                .households
                .iter()
                .find(|h| h.id == s.id)
                .map(|h| h.battery_level_pct)
                .unwrap_or(0.0);
            inner.store.push_reading(EnergyReading {
                household_id: s.id,
                generation_kw,
                consumption_kw,
                battery_level_pct,
                tick: inner.store.tick,
            });
        }

        let floor = self.config.pricing.floor_price;
        for pair in &result.pairs {
            let price_per_kwh = result
                .prices
                .get(&pair.supplier_id)
                .copied()
                .unwrap_or(floor);
            inner.store.push_trade(TradeRecord {
                supplier_id: pair.supplier_id,
                demander_id: pair.demander_id,
                energy_kwh: pair.energy_kwh,
                price_per_kwh,
                tick: inner.store.tick,
            });
            for h in inner.store.households.iter_mut() {
                if h.id == pair.supplier_id {
                    h.apply_battery_delta_kwh(-pair.energy_kwh);
                } else if h.id == pair.demander_id {
                    h.apply_battery_delta_kwh(pair.energy_kwh);
                }
            }
        }

        for h in inner.store.households.iter_mut() {
            match result.strategy.get(&h.id) {
                Some(BatteryAction::Charge) => h.apply_battery_delta_kwh(CHARGE_STEP_KWH),
                Some(BatteryAction::Discharge) => h.apply_battery_delta_kwh(-DISCHARGE_STEP_KWH),
                _ => {}
            }
        }

        inner.store.latest = Some(result);
        true
    }

    /// Current status, including fleet aggregates.
    pub fn status(&self) -> ClockStatus {
        let inner = self.inner.lock();
        let stats = self.stats_locked(&inner);
        ClockStatus {
            running: self.is_running(),
            tick: inner.store.tick,
            hour: self.hour_for(inner.store.tick),
            day_of_week: self.day_of_week_for(inner.store.tick),
            weather: inner.weather.current().clone(),
            active_outage_ids: inner.outage.affected(),
            stats,
        }
    }

    /// Forces the sky condition and returns the new snapshot.
    pub fn change_weather(&self, kind: WeatherKind) -> WeatherCondition {
        let mut inner = self.inner.lock();
        let condition = inner.weather.set_kind(kind).clone();
        info!(name = %self.name, weather = %kind, "weather changed");
        condition
    }

    /// Takes households down. With no ids (or an empty list) the default
    /// selection applies: the quarter of the fleet with the lowest battery
    /// fill.
    pub fn trigger_outage(&self, ids: Option<Vec<u64>>) -> OutageReport {
        let mut inner = self.inner.lock();
        let inner = &mut *inner;
        let ids = match ids {
            Some(ids) if !ids.is_empty() => ids,
            _ => default_outage_ids(&inner.store.households),
        };
        inner.outage.trigger(&mut inner.store.households, &ids);
        inner.outage.report(&inner.store.households)
    }

    /// Restores the named households; unknown ids are ignored. Returns the
    /// ids actually restored.
    pub fn restore_power(&self, ids: &[u64]) -> Vec<u64> {
        let mut inner = self.inner.lock();
        let inner = &mut *inner;
        inner.outage.restore(&mut inner.store.households, ids)
    }

    /// The latest optimization result, or one computed on demand before the
    /// first tick.
    pub fn optimization_result(&self) -> OptimizationResult {
        let inner = self.inner.lock();
        if let Some(result) = &inner.store.latest {
            return result.clone();
        }
        market::optimize(&self.analyzed(&inner), &self.config)
    }

    fn stats_locked(&self, inner: &Inner) -> NetworkStats {
        let state = self.analyzed(inner);
        let households = &inner.store.households;
        let online_count = households.iter().filter(|h| h.is_online).count();
        let total_battery_capacity_kwh: f32 =
            households.iter().map(|h| h.battery_capacity_kwh).sum();
        let total_stored_kwh: f32 = households.iter().map(|h| h.battery_level_kwh()).sum();
        let average_battery_pct = if households.is_empty() {
            0.0
        } else {
            households.iter().map(|h| h.battery_level_pct).sum::<f32>() / households.len() as f32
        };

        NetworkStats {
            household_count: households.len(),
            online_count,
            total_generation_kw: state.total_generation_kw,
            total_demand_kw: state.total_demand_kw,
            total_battery_capacity_kwh,
            total_stored_kwh,
            average_battery_pct,
            grid_stability: balance::grid_stability(
                state.total_generation_kw,
                state.total_demand_kw,
            ),
        }
    }

    /// Fleet aggregates for the status surface.
    pub fn network_stats(&self) -> NetworkStats {
        let inner = self.inner.lock();
        self.stats_locked(&inner)
    }

    /// Condensed equity view computed from the current fleet.
    pub fn equity_analysis(&self) -> EquitySummary {
        let inner = self.inner.lock();
        let state = self.analyzed(&inner);
        let report = market::equity::plan_equity(&state.households);
        EquitySummary {
            equity_score: report.equity_score,
            average_security: report.average_security,
            vulnerable_count: report.vulnerable.len(),
            emergency_support: report.emergency_support,
        }
    }

    /// Copies of the retained readings and trades, oldest first.
    pub fn telemetry(&self) -> (Vec<EnergyReading>, Vec<TradeRecord>) {
        let inner = self.inner.lock();
        (
            inner.store.readings().cloned().collect(),
            inner.store.trades().cloned().collect(),
        )
    }
}
