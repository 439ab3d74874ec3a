//! Deterministic physical/pattern baselines for generation and demand.

use serde::{Deserialize, Serialize};

use crate::model::{HouseholdKind, WeatherCondition};

/// Sunrise hour for the solar output curve (inclusive).
const SUNRISE_HOUR: u32 = 6;
/// Sunset hour for the solar output curve (exclusive).
const SUNSET_HOUR: u32 = 18;

/// Season used for the seasonal shaping factors.
///
/// Held in configuration rather than derived from the wall clock so that
/// repeated runs of the same scenario stay reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "winter" => Some(Self::Winter),
            "spring" => Some(Self::Spring),
            "summer" => Some(Self::Summer),
            "autumn" => Some(Self::Autumn),
            _ => None,
        }
    }

    /// Scaling applied to solar output.
    pub fn generation_factor(self) -> f32 {
        match self {
            Self::Summer => 1.0,
            Self::Spring => 0.9,
            Self::Autumn => 0.85,
            Self::Winter => 0.6,
        }
    }

    /// Scaling applied to demand (cooling load in summer, heating in winter).
    pub fn demand_factor(self) -> f32 {
        match self {
            Self::Summer => 1.15,
            Self::Winter => 1.1,
            Self::Spring => 1.0,
            Self::Autumn => 0.95,
        }
    }
}

/// Half-cosine daylight fraction for an hour of day: 0.0 outside
/// sunrise..sunset, peaking at 1.0 at solar noon.
pub fn solar_curve(hour: u32) -> f32 {
    let h = hour % 24;
    if h < SUNRISE_HOUR || h >= SUNSET_HOUR {
        return 0.0;
    }
    let span = (SUNSET_HOUR - SUNRISE_HOUR) as f32;
    let x = (h - SUNRISE_HOUR) as f32 / span;
    (std::f32::consts::PI * x).sin().max(0.0)
}

/// Physical generation baseline in kW for one household.
pub fn generation_baseline(
    solar_capacity_kw: f32,
    weather: &WeatherCondition,
    hour: u32,
    season: Season,
) -> f32 {
    (solar_capacity_kw * weather.solar_efficiency * solar_curve(hour) * season.generation_factor())
        .max(0.0)
}

/// Time-of-day demand shaping per household kind.
fn hourly_demand_factor(kind: HouseholdKind, hour: u32) -> f32 {
    let h = hour % 24;
    match kind {
        // Morning and evening peaks, overnight trough.
        HouseholdKind::Residential => match h {
            6..=9 => 1.3,
            17..=22 => 1.5,
            23 | 0..=5 => 0.5,
            _ => 0.9,
        },
        // Business-hours plateau.
        HouseholdKind::Commercial => match h {
            9..=18 => 1.4,
            19..=21 => 0.9,
            _ => 0.4,
        },
        // Early irrigation peak, steady daytime load.
        HouseholdKind::Farm => match h {
            4..=8 => 1.4,
            9..=17 => 1.1,
            _ => 0.6,
        },
    }
}

/// Weekday/weekend shaping per household kind. `day_of_week` 0 = Monday.
fn day_demand_factor(kind: HouseholdKind, day_of_week: u32) -> f32 {
    let weekend = day_of_week % 7 >= 5;
    match kind {
        HouseholdKind::Residential => {
            if weekend {
                1.15
            } else {
                1.0
            }
        }
        HouseholdKind::Commercial => {
            if weekend {
                0.6
            } else {
                1.0
            }
        }
        HouseholdKind::Farm => 1.0,
    }
}

/// Pattern-product demand baseline in kW for one household.
pub fn demand_baseline(kind: HouseholdKind, hour: u32, day_of_week: u32, season: Season) -> f32 {
    kind.base_demand_kw()
        * hourly_demand_factor(kind, hour)
        * day_demand_factor(kind, day_of_week)
        * season.demand_factor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WeatherKind;

    #[test]
    fn solar_curve_zero_at_night() {
        for h in [0, 3, 5, 18, 21, 23] {
            assert_eq!(solar_curve(h), 0.0, "hour {h} should be dark");
        }
    }

    #[test]
    fn solar_curve_peaks_at_noon() {
        let noon = solar_curve(12);
        assert!(noon > 0.99);
        for h in 6..18 {
            assert!(solar_curve(h) <= noon + 1e-6);
        }
    }

    #[test]
    fn solar_curve_symmetric_around_noon() {
        assert!((solar_curve(9) - solar_curve(15)).abs() < 1e-5);
    }

    #[test]
    fn generation_scales_with_weather() {
        let sunny = WeatherCondition::from_kind(WeatherKind::Sunny);
        let stormy = WeatherCondition::from_kind(WeatherKind::Stormy);
        let g_sunny = generation_baseline(5.0, &sunny, 12, Season::Summer);
        let g_stormy = generation_baseline(5.0, &stormy, 12, Season::Summer);
        assert!(g_sunny > g_stormy);
        assert!(g_stormy > 0.0);
    }

    #[test]
    fn generation_zero_without_panels() {
        let sunny = WeatherCondition::from_kind(WeatherKind::Sunny);
        assert_eq!(generation_baseline(0.0, &sunny, 12, Season::Summer), 0.0);
    }

    #[test]
    fn winter_generation_below_summer() {
        let sunny = WeatherCondition::from_kind(WeatherKind::Sunny);
        let summer = generation_baseline(5.0, &sunny, 12, Season::Summer);
        let winter = generation_baseline(5.0, &sunny, 12, Season::Winter);
        assert!(winter < summer);
    }

    #[test]
    fn residential_evening_peak() {
        let evening = demand_baseline(HouseholdKind::Residential, 19, 2, Season::Spring);
        let midday = demand_baseline(HouseholdKind::Residential, 13, 2, Season::Spring);
        let night = demand_baseline(HouseholdKind::Residential, 2, 2, Season::Spring);
        assert!(evening > midday);
        assert!(midday > night);
    }

    #[test]
    fn commercial_drops_on_weekend() {
        let weekday = demand_baseline(HouseholdKind::Commercial, 11, 1, Season::Spring);
        let weekend = demand_baseline(HouseholdKind::Commercial, 11, 6, Season::Spring);
        assert!(weekend < weekday);
    }

    #[test]
    fn demand_always_positive() {
        for kind in [
            HouseholdKind::Residential,
            HouseholdKind::Commercial,
            HouseholdKind::Farm,
        ] {
            for h in 0..24 {
                assert!(demand_baseline(kind, h, 3, Season::Autumn) > 0.0);
            }
        }
    }
}
