//! Greedy, priority-ordered, distance-ranked trading pair matching.
//!
//! The allocation is fully deterministic: demanders are served most-urgent
//! first (lowest battery fill), suppliers are ranked per demander by a
//! distance derived from location labels via a stable hash, and every tie
//! breaks on household id.

use std::hash::{DefaultHasher, Hash, Hasher};

use crate::config::MatchingConfig;
use crate::model::{HouseholdState, TradePriority, TradingPair};

/// Deterministic inter-party distance in km, derived from the two location
/// labels. Symmetric, zero for identical locations, always in [0, 20).
pub fn distance_km(a: &str, b: &str) -> f32 {
    if a == b {
        return 0.0;
    }
    // Order-independent combination keeps the distance symmetric.
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = DefaultHasher::new();
    lo.hash(&mut hasher);
    hi.hash(&mut hasher);
    (hasher.finish() % 2000) as f32 / 100.0
}

struct Supplier<'a> {
    state: &'a HouseholdState,
    remaining_kwh: f32,
}

struct Demander<'a> {
    state: &'a HouseholdState,
    need_kwh: f32,
}

fn supplier_capacity_kwh(s: &HouseholdState, cfg: &MatchingConfig) -> f32 {
    let surplus = s.net_balance_kw.max(0.0);
    let reserve_kwh = cfg.battery_reserve_frac * s.battery_capacity_kwh;
    surplus + (s.battery_level_kwh - reserve_kwh).max(0.0)
}

fn is_supplier(s: &HouseholdState) -> bool {
    if !s.is_online {
        return false;
    }
    let battery_threshold = (0.4 * s.battery_capacity_kwh).max(2.0);
    s.net_balance_kw > 0.0
        || (s.predicted_generation_kw >= 0.7 * s.predicted_demand_kw
            && s.battery_level_kwh >= battery_threshold)
}

fn demander_need_kwh(s: &HouseholdState, cfg: &MatchingConfig) -> f32 {
    let deficit = (-s.net_balance_kw).max(0.0);
    let target_kwh = cfg.target_fill_frac * s.battery_capacity_kwh;
    let battery_gap = (target_kwh - s.battery_level_kwh).max(0.0);
    deficit + battery_gap
}

fn is_demander(s: &HouseholdState) -> bool {
    if !s.is_online {
        return false;
    }
    let battery_threshold = (0.3 * s.battery_capacity_kwh).max(1.5);
    s.predicted_generation_kw < 1.1 * s.predicted_demand_kw
        || s.battery_level_kwh < battery_threshold
}

/// Urgency tier for a demander, from how depleted its battery is.
fn priority_for(s: &HouseholdState) -> TradePriority {
    let fill = s.battery_fill();
    if fill < 0.15 {
        TradePriority::Emergency
    } else if fill < 0.3 {
        TradePriority::High
    } else {
        TradePriority::Normal
    }
}

/// Rounds down to 2 decimals, the precision trades are recorded at.
/// Truncation keeps a supplier's running balance non-negative.
fn round_kwh(v: f32) -> f32 {
    (v * 100.0).floor() / 100.0
}

/// Builds trading pairs for one cycle.
///
/// Identical inputs always produce identical output.
pub fn match_pairs(households: &[HouseholdState], cfg: &MatchingConfig) -> Vec<TradingPair> {
    let mut suppliers: Vec<Supplier<'_>> = households
        .iter()
        .filter(|s| is_supplier(s))
        .map(|state| Supplier {
            state,
            remaining_kwh: supplier_capacity_kwh(state, cfg),
        })
        .filter(|s| s.remaining_kwh >= cfg.min_trade_kwh)
        .collect();

    let mut demanders: Vec<Demander<'_>> = households
        .iter()
        .filter(|s| is_demander(s) && !is_supplier(s))
        .map(|state| Demander {
            state,
            need_kwh: demander_need_kwh(state, cfg),
        })
        .filter(|d| d.need_kwh >= cfg.min_trade_kwh)
        .collect();

    // Most urgent first: lowest battery fill, ties by id.
    demanders.sort_by(|a, b| {
        a.state
            .battery_fill()
            .total_cmp(&b.state.battery_fill())
            .then(a.state.id.cmp(&b.state.id))
    });

    let mut pairs = Vec::new();
    for demander in &mut demanders {
        let mut need = demander.need_kwh;

        while need >= cfg.min_trade_kwh && !suppliers.is_empty() {
            let mut best: Option<(usize, f32)> = None;
            for (i, s) in suppliers.iter().enumerate() {
                let d = distance_km(&s.state.location, &demander.state.location);
                let better = match best {
                    None => true,
                    Some((bi, bd)) => {
                        d < bd || (d == bd && s.state.id < suppliers[bi].state.id)
                    }
                };
                if better {
                    best = Some((i, d));
                }
            }
            let Some((idx, dist)) = best else { break };

            let energy = round_kwh(need.min(suppliers[idx].remaining_kwh).min(cfg.max_trade_kwh));
            if energy < cfg.min_trade_kwh {
                break;
            }

            pairs.push(TradingPair {
                supplier_id: suppliers[idx].state.id,
                demander_id: demander.state.id,
                energy_kwh: energy,
                distance_km: dist,
                priority: priority_for(demander.state),
            });

            need -= energy;
            suppliers[idx].remaining_kwh -= energy;
            if suppliers[idx].remaining_kwh < cfg.min_trade_kwh {
                suppliers.remove(idx);
            }
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HouseholdKind;

    fn state(
        id: u64,
        generation_kw: f32,
        demand_kw: f32,
        battery_capacity_kwh: f32,
        battery_level_kwh: f32,
        location: &str,
    ) -> HouseholdState {
        HouseholdState {
            id,
            kind: HouseholdKind::Residential,
            solar_capacity_kw: 5.0,
            battery_capacity_kwh,
            battery_level_kwh,
            is_online: true,
            location: location.to_string(),
            predicted_generation_kw: generation_kw,
            predicted_demand_kw: demand_kw,
            net_balance_kw: generation_kw - demand_kw,
            can_support: false,
            needs_support: false,
        }
    }

    fn cfg() -> MatchingConfig {
        MatchingConfig::default()
    }

    #[test]
    fn distance_is_symmetric_and_zero_for_same_location() {
        assert_eq!(distance_km("Sector 1", "Sector 1"), 0.0);
        let ab = distance_km("Sector 1", "Sector 2");
        let ba = distance_km("Sector 2", "Sector 1");
        assert_eq!(ab, ba);
        assert!((0.0..20.0).contains(&ab));
    }

    #[test]
    fn surplus_flows_to_deficit_up_to_need() {
        // A over-generates with a healthy battery; B has a deficit and a
        // depleted battery.
        let a = state(1, 6.0, 2.0, 10.0, 8.0, "Sector 1");
        let b = state(2, 0.5, 2.5, 10.0, 1.0, "Sector 2");
        let pairs = match_pairs(&[a, b], &cfg());

        assert!(!pairs.is_empty());
        assert_eq!(pairs[0].supplier_id, 1);
        assert_eq!(pairs[0].demander_id, 2);
        assert_eq!(pairs[0].energy_kwh, 3.0);

        // B's need is a 2.0 kWh deficit plus 5.0 kWh to reach 60% fill.
        let total: f32 = pairs.iter().map(|p| p.energy_kwh).sum();
        assert!(total <= 7.0 + 1e-4);
    }

    #[test]
    fn supplier_with_surplus_serves_low_battery_demander_once() {
        // Need exactly matches the per-trade cap and the supplier's
        // capacity, so a single pair settles the cycle.
        let a = state(1, 5.0, 2.0, 15.0, 0.0, "Sector 1");
        let b = state(2, 0.0, 3.0, 15.0, 12.0, "Sector 2");
        let pairs = match_pairs(&[a, b], &cfg());

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].supplier_id, 1);
        assert_eq!(pairs[0].demander_id, 2);
        assert!(pairs[0].energy_kwh <= 3.0);
    }

    #[test]
    fn energy_respects_trade_bounds() {
        let a = state(1, 10.0, 1.0, 20.0, 18.0, "Sector 1");
        let b = state(2, 0.0, 3.0, 20.0, 0.0, "Sector 2");
        let pairs = match_pairs(&[a, b], &cfg());
        for p in &pairs {
            assert!(p.energy_kwh >= 0.3);
            assert!(p.energy_kwh <= 3.0);
        }
        assert!(!pairs.is_empty());
    }

    #[test]
    fn offline_households_are_excluded() {
        let mut a = state(1, 6.0, 2.0, 10.0, 8.0, "Sector 1");
        a.is_online = false;
        let b = state(2, 0.5, 2.5, 10.0, 1.0, "Sector 2");
        assert!(match_pairs(&[a, b], &cfg()).is_empty());
    }

    #[test]
    fn no_demanders_yields_no_pairs() {
        let a = state(1, 6.0, 2.0, 10.0, 8.0, "Sector 1");
        let b = state(2, 6.0, 2.0, 10.0, 8.0, "Sector 2");
        assert!(match_pairs(&[a, b], &cfg()).is_empty());
    }

    #[test]
    fn most_depleted_demander_served_first() {
        let supplier = state(1, 8.0, 1.0, 10.0, 9.0, "Sector 1");
        let urgent = state(2, 0.0, 2.0, 10.0, 0.5, "Sector 9");
        let mild = state(3, 0.0, 2.0, 10.0, 4.0, "Sector 9");
        let pairs = match_pairs(&[supplier, mild, urgent], &cfg());

        assert!(pairs.len() >= 2);
        assert_eq!(pairs[0].demander_id, 2);
        assert_eq!(pairs[0].priority, TradePriority::Emergency);
    }

    #[test]
    fn deterministic_for_identical_input() {
        let fleet = vec![
            state(1, 6.0, 2.0, 10.0, 8.0, "Sector 1"),
            state(2, 0.5, 2.5, 10.0, 1.0, "Sector 2"),
            state(3, 7.0, 1.5, 12.0, 10.0, "Sector 3"),
            state(4, 0.2, 3.0, 8.0, 0.4, "Sector 4"),
        ];
        let first = match_pairs(&fleet, &cfg());
        let second = match_pairs(&fleet, &cfg());
        assert_eq!(first, second);
    }

    #[test]
    fn rounding_never_overdraws_a_supplier() {
        // Capacity ends in a half-cent; nearest-rounding would push the
        // first trade past the supplier's balance.
        let supplier = state(1, 2.0, 2.0, 10.0, 4.555, "Sector 1");
        let demander = state(2, 0.0, 3.0, 10.0, 0.0, "Sector 2");
        let pairs = match_pairs(&[supplier, demander], &cfg());

        assert!(!pairs.is_empty());
        let total: f32 = pairs.iter().map(|p| p.energy_kwh).sum();
        let capacity = 4.555f32 - 2.0;
        assert!(total <= capacity, "allocated {total} > {capacity}");
    }

    #[test]
    fn supplier_removed_when_depleted() {
        // Supplier capacity just above one max trade; two hungry demanders.
        let supplier = state(1, 4.0, 1.0, 10.0, 2.2, "Sector 1");
        let d1 = state(2, 0.0, 2.0, 10.0, 0.5, "Sector 2");
        let d2 = state(3, 0.0, 2.0, 10.0, 0.6, "Sector 3");
        let pairs = match_pairs(&[supplier, d1, d2], &cfg());

        let total: f32 = pairs.iter().map(|p| p.energy_kwh).sum();
        let capacity = 3.0 + (2.2 - 2.0);
        assert!(total <= capacity + 1e-4, "allocated {total} > {capacity}");
    }
}
