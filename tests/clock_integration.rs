//! Lifecycle and telemetry behavior of the simulation clock.

mod common;

use std::sync::Arc;
use std::time::Duration;

use gridshare::model::{SIM_ID_OFFSET, WeatherKind};
use gridshare::sim::SimulationClock;

use common::test_config;

fn clock(seed: u64) -> Arc<SimulationClock> {
    let mut cfg = test_config();
    cfg.simulation.seed = seed;
    cfg.simulation.tick_interval_secs = 1;
    Arc::new(SimulationClock::new("clock-test", cfg))
}

#[tokio::test]
async fn start_is_a_noop_when_running() {
    let c = clock(1);
    assert!(c.start());
    assert!(!c.start());
    assert!(c.is_running());
    c.stop();
}

#[tokio::test]
async fn stop_twice_is_safe() {
    let c = clock(2);
    c.start();
    c.stop();
    c.stop();
    assert!(!c.is_running());
}

#[tokio::test(start_paused = true)]
async fn ticks_advance_while_running_and_halt_after_stop() {
    let c = clock(3);
    c.start();

    tokio::time::advance(Duration::from_secs(5)).await;
    // Let the spawned tick task actually run.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    let ticked = c.status().tick;
    assert!(ticked > 0, "clock should have ticked, got {ticked}");

    c.stop();
    let after_stop = c.status().tick;
    tokio::time::advance(Duration::from_secs(10)).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(c.status().tick, after_stop);
}

#[tokio::test]
async fn restart_reseeds_the_fleet() {
    let c = clock(4);
    c.start();
    c.stop();

    for _ in 0..5 {
        c.run_cycle();
    }
    let before = c.status();
    assert_eq!(before.tick, 5);

    c.start();
    c.stop();
    let after = c.status();
    assert_eq!(after.tick, 0);
    assert_eq!(after.active_outage_ids.len(), 0);
}

#[test]
fn batteries_remain_clamped_across_many_cycles() {
    let c = clock(5);
    for _ in 0..100 {
        c.run_cycle();
    }
    let stats = c.network_stats();
    assert!(stats.average_battery_pct >= 0.0);
    assert!(stats.average_battery_pct <= 100.0);
    assert!(stats.total_stored_kwh <= stats.total_battery_capacity_kwh + 1e-3);
}

#[test]
fn telemetry_respects_retention_caps() {
    let mut cfg = test_config();
    cfg.simulation.fleet_size = 10;
    cfg.simulation.readings_cap = 500;
    cfg.simulation.trades_cap = 250;
    let c = SimulationClock::new("retention-test", cfg);

    // 10 readings per cycle; 60 cycles overflows the 500 cap.
    for _ in 0..60 {
        c.run_cycle();
    }
    let (readings, trades) = c.telemetry();
    assert_eq!(readings.len(), 500);
    assert!(trades.len() <= 250);
    // Oldest entries were evicted.
    let first_tick = readings.first().map(|r| r.tick);
    assert_eq!(first_tick, Some(11));
}

#[test]
fn outage_default_selection_and_restore_round_trip() {
    let c = clock(6);
    let report = c.trigger_outage(None);
    assert_eq!(report.affected.len(), 2, "quarter of 8 households");

    // The two lowest-battery households were picked.
    let stats = c.network_stats();
    assert_eq!(stats.online_count, stats.household_count - 2);

    let restored = c.restore_power(&report.affected);
    assert_eq!(restored, report.affected);
    assert!(c.status().active_outage_ids.is_empty());
    assert_eq!(c.network_stats().online_count, 8);
}

#[test]
fn outage_ids_survive_cycles_until_restored() {
    let c = clock(7);
    let report = c.trigger_outage(Some(vec![SIM_ID_OFFSET, SIM_ID_OFFSET + 3]));
    for _ in 0..10 {
        c.run_cycle();
    }
    assert_eq!(
        c.status().active_outage_ids,
        vec![SIM_ID_OFFSET, SIM_ID_OFFSET + 3]
    );
    assert_eq!(report.affected, vec![SIM_ID_OFFSET, SIM_ID_OFFSET + 3]);
}

#[test]
fn forced_weather_lowers_generation() {
    let c = clock(8);
    // Advance into daylight hours.
    for _ in 0..6 {
        c.run_cycle();
    }
    c.change_weather(WeatherKind::Sunny);
    let sunny = c.network_stats().total_generation_kw;

    c.change_weather(WeatherKind::Stormy);
    let stormy = c.network_stats().total_generation_kw;

    assert!(
        stormy < sunny,
        "stormy total {stormy} should be below sunny total {sunny}"
    );
}

#[test]
fn trades_record_bounded_energy_and_prices() {
    let c = clock(42);
    for _ in 0..24 {
        c.run_cycle();
    }
    let cfg = c.config();
    let (_, trades) = c.telemetry();
    for t in &trades {
        assert!(t.energy_kwh >= cfg.matching.min_trade_kwh);
        assert!(t.energy_kwh <= cfg.matching.max_trade_kwh);
        assert!(t.price_per_kwh >= cfg.pricing.floor_price);
        assert!(t.price_per_kwh <= cfg.pricing.ceiling_price);
        assert_ne!(t.supplier_id, t.demander_id);
    }
}
