//! Per-trade clearing prices from time-of-use, congestion, priority, and
//! elasticity factors.

use std::collections::BTreeMap;

use crate::config::PricingConfig;
use crate::model::{TradePriority, TradingPair};

/// Time-of-use base rate (₹/kWh) for the given hour.
pub fn base_rate(cfg: &PricingConfig, hour: u32) -> f32 {
    match hour % 24 {
        18..=22 => cfg.peak_rate,
        6..=9 => cfg.morning_rate,
        10..=17 => cfg.day_rate,
        _ => cfg.off_peak_rate,
    }
}

/// Transmission-loss surcharge: 1% of the base rate per km, capped at 10%.
fn distance_surcharge(base: f32, distance_km: f32) -> f32 {
    base * (0.01 * distance_km.max(0.0)).min(0.10)
}

/// Congestion multiplier from network utilization (demand over generation).
fn congestion_factor(total_generation_kw: f32, total_demand_kw: f32) -> f32 {
    if total_generation_kw <= 0.0 {
        // No generation at all reads as maximal congestion.
        return if total_demand_kw > 0.0 { 1.4 } else { 1.0 };
    }
    let utilization = total_demand_kw / total_generation_kw;
    if utilization > 0.95 {
        1.4
    } else if utilization > 0.85 {
        1.2
    } else if utilization < 0.60 {
        0.9
    } else {
        1.0
    }
}

fn priority_factor(priority: TradePriority) -> f32 {
    match priority {
        TradePriority::Normal => 1.0,
        TradePriority::High => 1.25,
        TradePriority::Emergency => 1.5,
    }
}

/// Network-wide elasticity: shortage raises price up to 1.5×, surplus lowers
/// it to 0.75×. Neutral when there is no demand.
fn elasticity_factor(total_generation_kw: f32, total_demand_kw: f32) -> f32 {
    if total_demand_kw <= 0.0 {
        return 1.0;
    }
    (2.0 - total_generation_kw / total_demand_kw).clamp(0.75, 1.5)
}

/// Prices every pair and returns the clearing price per supplier.
///
/// If a supplier appears in several pairs the last computed price wins; the
/// map is keyed by supplier, not by pair.
pub fn optimize_prices(
    pairs: &[TradingPair],
    cfg: &PricingConfig,
    hour: u32,
    total_generation_kw: f32,
    total_demand_kw: f32,
) -> BTreeMap<u64, u32> {
    let base = base_rate(cfg, hour);
    let congestion = congestion_factor(total_generation_kw, total_demand_kw);
    let elasticity = elasticity_factor(total_generation_kw, total_demand_kw);

    let mut prices = BTreeMap::new();
    for pair in pairs {
        let raw = (base + distance_surcharge(base, pair.distance_km))
            * congestion
            * priority_factor(pair.priority)
            * elasticity
            - cfg.renewable_discount;
        let clamped = raw
            .round()
            .clamp(cfg.floor_price as f32, cfg.ceiling_price as f32);
        prices.insert(pair.supplier_id, clamped as u32);
    }
    prices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(supplier_id: u64, distance_km: f32, priority: TradePriority) -> TradingPair {
        TradingPair {
            supplier_id,
            demander_id: 100,
            energy_kwh: 1.5,
            distance_km,
            priority,
        }
    }

    fn cfg() -> PricingConfig {
        PricingConfig::default()
    }

    #[test]
    fn base_rate_follows_time_of_use_tiers() {
        let c = cfg();
        assert_eq!(base_rate(&c, 20), c.peak_rate);
        assert_eq!(base_rate(&c, 7), c.morning_rate);
        assert_eq!(base_rate(&c, 13), c.day_rate);
        assert_eq!(base_rate(&c, 2), c.off_peak_rate);
        assert_eq!(base_rate(&c, 23), c.off_peak_rate);
    }

    #[test]
    fn prices_stay_within_market_bounds() {
        let c = cfg();
        let extremes = [
            (pair(1, 1e6, TradePriority::Emergency), 0.1, 1e6),
            (pair(2, 0.0, TradePriority::Normal), 1e6, 0.0),
            (pair(3, 500.0, TradePriority::High), 1.0, 1.0),
        ];
        for (p, generation, demand) in extremes {
            for hour in 0..24 {
                let prices = optimize_prices(&[p.clone()], &c, hour, generation, demand);
                let price = prices[&p.supplier_id];
                assert!(price >= c.floor_price, "price {price} below floor");
                assert!(price <= c.ceiling_price, "price {price} above ceiling");
            }
        }
    }

    #[test]
    fn emergency_priority_costs_more_than_normal() {
        let c = cfg();
        let normal = optimize_prices(&[pair(1, 2.0, TradePriority::Normal)], &c, 12, 10.0, 9.0);
        let urgent = optimize_prices(&[pair(1, 2.0, TradePriority::Emergency)], &c, 12, 10.0, 9.0);
        assert!(urgent[&1] > normal[&1]);
    }

    #[test]
    fn shortage_raises_price_surplus_lowers_it() {
        let c = cfg();
        let short = optimize_prices(&[pair(1, 0.0, TradePriority::Normal)], &c, 12, 5.0, 10.0);
        let even = optimize_prices(&[pair(1, 0.0, TradePriority::Normal)], &c, 12, 10.0, 10.0);
        let surplus = optimize_prices(&[pair(1, 0.0, TradePriority::Normal)], &c, 12, 30.0, 10.0);
        assert!(short[&1] > even[&1]);
        assert!(surplus[&1] < even[&1]);
    }

    #[test]
    fn zero_demand_is_neutral_not_nan() {
        let c = cfg();
        let prices = optimize_prices(&[pair(1, 3.0, TradePriority::Normal)], &c, 12, 10.0, 0.0);
        let price = prices[&1];
        assert!((c.floor_price..=c.ceiling_price).contains(&price));
    }

    #[test]
    fn last_price_wins_per_supplier() {
        let c = cfg();
        let pairs = vec![
            pair(1, 0.0, TradePriority::Normal),
            pair(1, 9.0, TradePriority::Emergency),
        ];
        let prices = optimize_prices(&pairs, &c, 12, 10.0, 9.0);
        let solo = optimize_prices(&[pair(1, 9.0, TradePriority::Emergency)], &c, 12, 10.0, 9.0);
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[&1], solo[&1]);
    }
}
