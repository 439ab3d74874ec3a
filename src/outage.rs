//! Outage simulation: marking households offline, planning recovery, and
//! scoring network resilience.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::Household;

/// Fraction of the fleet taken down by a default (unspecified) outage.
const DEFAULT_OUTAGE_FRAC: f32 = 0.25;
/// Share of surviving generation held back as an emergency reserve.
const EMERGENCY_RESERVE_FRAC: f32 = 0.2;
/// Restoration effort per affected household (time units).
const RECOVERY_TIME_PER_HOUSEHOLD: f32 = 0.5;
/// Battery fill below which a household jumps the recovery queue.
const URGENT_BATTERY_FILL: f32 = 0.2;

/// One step of the recovery plan, in execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryStep {
    pub household_id: u64,
    /// 1-based position in the restoration queue.
    pub order: u32,
    /// Cumulative time units until this household is back.
    pub eta_time_units: f32,
}

/// Snapshot of outage impact and the plan to recover from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutageReport {
    pub affected: Vec<u64>,
    /// Sum of rated generation across unaffected households (kW).
    pub surviving_capacity_kw: f32,
    pub emergency_reserve_kw: f32,
    pub recovery_plan: Vec<RecoveryStep>,
    pub estimated_recovery_time_units: f32,
    /// Weighted solar/battery/availability score in [0, 1].
    pub resilience_score: f32,
}

/// Tracks which households an outage has taken down.
///
/// All operations are idempotent set operations; unknown ids are ignored.
#[derive(Debug, Default)]
pub struct OutageSimulator {
    affected: BTreeSet<u64>,
}

/// Default outage selection: the max(1, ⌊n×0.25⌋) households with the lowest
/// battery fill. Fill fraction, not absolute kWh, so the ordering matches
/// the urgency semantics of trade priorities and the recovery queue. Empty
/// for an empty fleet.
pub fn default_outage_ids(households: &[Household]) -> Vec<u64> {
    if households.is_empty() {
        return Vec::new();
    }
    let count = ((households.len() as f32 * DEFAULT_OUTAGE_FRAC) as usize).max(1);
    let mut by_battery: Vec<(f32, u64)> = households
        .iter()
        .map(|h| (h.battery_fill(), h.id))
        .collect();
    by_battery.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    by_battery.into_iter().take(count).map(|(_, id)| id).collect()
}

impl OutageSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids currently affected by an outage.
    pub fn affected(&self) -> Vec<u64> {
        self.affected.iter().copied().collect()
    }

    pub fn is_affected(&self, id: u64) -> bool {
        self.affected.contains(&id)
    }

    /// Takes the named households offline. Ids not present in the fleet are
    /// ignored; already-affected ids stay affected. Returns the ids newly
    /// taken down.
    pub fn trigger(&mut self, households: &mut [Household], ids: &[u64]) -> Vec<u64> {
        let mut newly_affected = Vec::new();
        for h in households.iter_mut() {
            if ids.contains(&h.id) && self.affected.insert(h.id) {
                h.is_online = false;
                newly_affected.push(h.id);
            }
        }
        if !newly_affected.is_empty() {
            info!(count = newly_affected.len(), "outage triggered");
        }
        newly_affected
    }

    /// Brings the named households back online and clears them from the
    /// affected set. Unknown or unaffected ids are ignored.
    pub fn restore(&mut self, households: &mut [Household], ids: &[u64]) -> Vec<u64> {
        let mut restored = Vec::new();
        for h in households.iter_mut() {
            if ids.contains(&h.id) && self.affected.remove(&h.id) {
                h.is_online = true;
                restored.push(h.id);
            }
        }
        if !restored.is_empty() {
            info!(count = restored.len(), "power restored");
        }
        restored
    }

    /// Builds the impact report for the current affected set.
    pub fn report(&self, households: &[Household]) -> OutageReport {
        let surviving_capacity_kw: f32 = households
            .iter()
            .filter(|h| !self.affected.contains(&h.id))
            .map(|h| h.solar_capacity_kw)
            .sum();

        // Depleted batteries first, then the rest; ties by id.
        let mut queue: Vec<&Household> = households
            .iter()
            .filter(|h| self.affected.contains(&h.id))
            .collect();
        queue.sort_by(|a, b| {
            let a_urgent = a.battery_fill() < URGENT_BATTERY_FILL;
            let b_urgent = b.battery_fill() < URGENT_BATTERY_FILL;
            b_urgent
                .cmp(&a_urgent)
                .then(a.battery_fill().total_cmp(&b.battery_fill()))
                .then(a.id.cmp(&b.id))
        });

        let recovery_plan: Vec<RecoveryStep> = queue
            .iter()
            .enumerate()
            .map(|(i, h)| RecoveryStep {
                household_id: h.id,
                order: i as u32 + 1,
                eta_time_units: (i as f32 + 1.0) * RECOVERY_TIME_PER_HOUSEHOLD,
            })
            .collect();

        OutageReport {
            affected: self.affected(),
            surviving_capacity_kw,
            emergency_reserve_kw: EMERGENCY_RESERVE_FRAC * surviving_capacity_kw,
            estimated_recovery_time_units: queue.len() as f32 * RECOVERY_TIME_PER_HOUSEHOLD,
            recovery_plan,
            resilience_score: self.resilience_score(households),
        }
    }

    /// Weighted resilience in [0, 1]: solar coverage, battery coverage, and
    /// the fraction of the fleet still up. 0.5 for an empty fleet.
    pub fn resilience_score(&self, households: &[Household]) -> f32 {
        if households.is_empty() {
            return 0.5;
        }
        let n = households.len() as f32;
        let solar_frac =
            households.iter().filter(|h| h.solar_capacity_kw > 0.0).count() as f32 / n;
        let battery_frac = households
            .iter()
            .filter(|h| h.battery_capacity_kwh > 0.0)
            .count() as f32
            / n;
        let affected_frac = households
            .iter()
            .filter(|h| self.affected.contains(&h.id))
            .count() as f32
            / n;

        (0.4 * solar_frac + 0.3 * battery_frac + 0.3 * (1.0 - affected_frac)).clamp(0.0, 1.0)
    }
}
