//! Equitable-access planning: energy security scoring and greedy
//! redistribution from surplus households to vulnerable ones.

use tracing::warn;

use crate::model::{
    EquityReport, HouseholdState, RedistributionAction, RedistributionPriority,
    RedistributionUrgency,
};

/// Security ratio below which a household counts as vulnerable.
const VULNERABLE_THRESHOLD: f32 = 0.7;
/// Donors must cover their own demand by this factor before giving.
const DONOR_MARGIN: f32 = 1.2;
/// Transfers smaller than this are not worth scheduling (kWh).
const MIN_TRANSFER_KWH: f32 = 0.1;
/// Vulnerable share above which fleet-wide emergency support is flagged.
const EMERGENCY_FRACTION: f32 = 0.2;

/// Energy security ratio: how much of its demand a household can cover from
/// generation plus storage. 1.0 with no demand; capped at 1.0.
pub fn security_ratio(s: &HouseholdState) -> f32 {
    if s.predicted_demand_kw <= 0.0 {
        return 1.0;
    }
    ((s.predicted_generation_kw + s.battery_level_kwh) / s.predicted_demand_kw).min(1.0)
}

fn priority_for(security: f32) -> RedistributionPriority {
    if security < 0.3 {
        RedistributionPriority::Critical
    } else if security < 0.5 {
        RedistributionPriority::High
    } else if security < 0.7 {
        RedistributionPriority::Medium
    } else {
        RedistributionPriority::Low
    }
}

/// Analyzes fleet fairness and proposes redistribution actions.
///
/// Allocation is a greedy first-fit over the fleet in input order, not an
/// optimal assignment.
pub fn plan_equity(households: &[HouseholdState]) -> EquityReport {
    let online: Vec<&HouseholdState> = households.iter().filter(|s| s.is_online).collect();
    if online.is_empty() {
        return EquityReport {
            equity_score: 1.0,
            average_security: 1.0,
            vulnerable: Vec::new(),
            actions: Vec::new(),
            emergency_support: false,
        };
    }

    let securities: Vec<f32> = online.iter().map(|s| security_ratio(s)).collect();
    let average_security = securities.iter().sum::<f32>() / securities.len() as f32;

    let vulnerable: Vec<u64> = online
        .iter()
        .zip(&securities)
        .filter(|(_, sec)| **sec < VULNERABLE_THRESHOLD)
        .map(|(s, _)| s.id)
        .collect();
    let equity_score = 1.0 - vulnerable.len() as f32 / online.len() as f32;

    // Donor budget: whatever exceeds 1.2× the donor's own demand.
    let mut donor_budget: Vec<f32> = online
        .iter()
        .map(|s| {
            (s.predicted_generation_kw + s.battery_level_kwh - DONOR_MARGIN * s.predicted_demand_kw)
                .max(0.0)
        })
        .collect();

    let mut actions = Vec::new();
    for (i, recipient) in online.iter().enumerate() {
        let security = securities[i];
        if security >= VULNERABLE_THRESHOLD {
            continue;
        }
        let shortfall = (recipient.predicted_demand_kw
            - recipient.predicted_generation_kw
            - recipient.battery_level_kwh)
            .max(0.0);
        if shortfall < MIN_TRANSFER_KWH {
            continue;
        }

        // First donor with budget wins; list order is the tie-break.
        for (j, donor) in online.iter().enumerate() {
            if i == j || donor_budget[j] < MIN_TRANSFER_KWH {
                continue;
            }
            let energy_kwh = shortfall.min(donor_budget[j]);
            if energy_kwh < MIN_TRANSFER_KWH {
                continue;
            }
            donor_budget[j] -= energy_kwh;
            actions.push(RedistributionAction {
                from_id: donor.id,
                to_id: recipient.id,
                energy_kwh,
                urgency: if energy_kwh < 1.0 {
                    RedistributionUrgency::Immediate
                } else {
                    RedistributionUrgency::Scheduled
                },
                priority: priority_for(security),
            });
            break;
        }
    }

    let emergency_support =
        vulnerable.len() as f32 > EMERGENCY_FRACTION * online.len() as f32;
    if emergency_support {
        warn!(
            vulnerable = vulnerable.len(),
            fleet = online.len(),
            "vulnerable households exceed the emergency threshold"
        );
    }

    EquityReport {
        equity_score,
        average_security,
        vulnerable,
        actions,
        emergency_support,
    }
}
