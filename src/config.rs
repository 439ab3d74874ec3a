//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::forecast::baseline::Season;
use crate::model::WeatherKind;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`MarketConfig::from_toml_file`] or use
/// [`MarketConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarketConfig {
    /// Simulation timing, fleet, and retention parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Time-of-use rates and market price bounds.
    #[serde(default)]
    pub pricing: PricingConfig,
    /// Trading pair matcher thresholds.
    #[serde(default)]
    pub matching: MatchingConfig,
    /// Forecast blending and training parameters.
    #[serde(default)]
    pub forecast: ForecastConfig,
}

/// Simulation timing, fleet, and retention parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Seconds between optimization cycles (must be > 0).
    pub tick_interval_secs: u64,
    /// Number of synthetic households to seed (must be > 0).
    pub fleet_size: usize,
    /// Master random seed.
    pub seed: u64,
    /// Simulated hour of day at tick 0 (0–23).
    pub start_hour: u32,
    /// Season driving baseline shaping: winter/spring/summer/autumn.
    pub season: String,
    /// Sky condition at start: sunny/partly_cloudy/.../stormy.
    pub initial_weather: String,
    /// Retained energy readings (500–1000).
    pub readings_cap: usize,
    /// Retained trade records (250–500).
    pub trades_cap: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 10,
            fleet_size: 10,
            seed: 42,
            start_hour: 6,
            season: "summer".to_string(),
            initial_weather: "sunny".to_string(),
            readings_cap: 720,
            trades_cap: 360,
        }
    }
}

/// Time-of-use rates (₹/kWh) and market price bounds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PricingConfig {
    /// Overnight rate (hours outside the other tiers).
    pub off_peak_rate: f32,
    /// Morning peak rate (06–09h).
    pub morning_rate: f32,
    /// Daytime rate (10–17h).
    pub day_rate: f32,
    /// Evening peak rate (18–22h).
    pub peak_rate: f32,
    /// Market floor (whole ₹/kWh).
    pub floor_price: u32,
    /// Market ceiling (whole ₹/kWh).
    pub ceiling_price: u32,
    /// Flat discount for renewable supply (₹/kWh).
    pub renewable_discount: f32,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            off_peak_rate: 3.5,
            morning_rate: 6.5,
            day_rate: 5.0,
            peak_rate: 8.0,
            floor_price: 3,
            ceiling_price: 100,
            renewable_discount: 0.5,
        }
    }
}

/// Trading pair matcher thresholds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchingConfig {
    /// Smallest actionable trade (kWh).
    pub min_trade_kwh: f32,
    /// Largest single trade (kWh).
    pub max_trade_kwh: f32,
    /// Battery fraction a supplier keeps in reserve.
    pub battery_reserve_frac: f32,
    /// Battery fill fraction a demander is topped up toward.
    pub target_fill_frac: f32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_trade_kwh: 0.3,
            max_trade_kwh: 3.0,
            battery_reserve_frac: 0.2,
            target_fill_frac: 0.6,
        }
    }
}

/// Forecast blending and training parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// Maximum estimator share of a generation forecast (≤ 0.25).
    pub generation_blend_cap: f32,
    /// Maximum estimator share of a demand forecast (≤ 0.20).
    pub demand_blend_cap: f32,
    /// SGD learning rate for the online estimator.
    pub learning_rate: f32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            generation_blend_cap: 0.25,
            demand_blend_cap: 0.20,
            learning_rate: 0.05,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.fleet_size"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl MarketConfig {
    /// Returns the baseline scenario.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            pricing: PricingConfig::default(),
            matching: MatchingConfig::default(),
            forecast: ForecastConfig::default(),
        }
    }

    /// Returns the monsoon preset: rainy start, reduced yield, a steeper
    /// evening rate to reflect scarcity.
    pub fn monsoon() -> Self {
        Self {
            simulation: SimulationConfig {
                season: "autumn".to_string(),
                initial_weather: "rainy".to_string(),
                ..SimulationConfig::default()
            },
            pricing: PricingConfig {
                peak_rate: 9.5,
                ..PricingConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Returns the dense preset: a larger fleet with maximum retention.
    pub fn dense() -> Self {
        Self {
            simulation: SimulationConfig {
                fleet_size: 24,
                readings_cap: 1000,
                trades_cap: 500,
                ..SimulationConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "monsoon", "dense"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "monsoon" => Ok(Self::monsoon()),
            "dense" => Ok(Self::dense()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new(
                "scenario",
                format!("cannot read \"{}\": {e}", path.display()),
            )
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Season enum from the configured name; call `validate` first.
    pub fn season(&self) -> Season {
        Season::parse(&self.simulation.season).unwrap_or(Season::Summer)
    }

    /// Starting sky condition from the configured name; call `validate` first.
    pub fn initial_weather(&self) -> WeatherKind {
        WeatherKind::parse(&self.simulation.initial_weather).unwrap_or(WeatherKind::Sunny)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.tick_interval_secs == 0 {
            errors.push(ConfigError::new(
                "simulation.tick_interval_secs",
                "must be > 0",
            ));
        }
        if s.fleet_size == 0 {
            errors.push(ConfigError::new("simulation.fleet_size", "must be > 0"));
        }
        if s.start_hour >= 24 {
            errors.push(ConfigError::new("simulation.start_hour", "must be < 24"));
        }
        if Season::parse(&s.season).is_none() {
            errors.push(ConfigError::new(
                "simulation.season",
                format!("must be winter/spring/summer/autumn, got \"{}\"", s.season),
            ));
        }
        if WeatherKind::parse(&s.initial_weather).is_none() {
            errors.push(ConfigError::new(
                "simulation.initial_weather",
                format!("unknown condition \"{}\"", s.initial_weather),
            ));
        }
        if !(500..=1000).contains(&s.readings_cap) {
            errors.push(ConfigError::new(
                "simulation.readings_cap",
                "must be in [500, 1000]",
            ));
        }
        if !(250..=500).contains(&s.trades_cap) {
            errors.push(ConfigError::new(
                "simulation.trades_cap",
                "must be in [250, 500]",
            ));
        }

        let p = &self.pricing;
        for (field, rate) in [
            ("pricing.off_peak_rate", p.off_peak_rate),
            ("pricing.morning_rate", p.morning_rate),
            ("pricing.day_rate", p.day_rate),
            ("pricing.peak_rate", p.peak_rate),
        ] {
            if rate <= 0.0 {
                errors.push(ConfigError::new(field, "must be > 0"));
            }
        }
        if p.floor_price >= p.ceiling_price {
            errors.push(ConfigError::new(
                "pricing.floor_price",
                "must be < pricing.ceiling_price",
            ));
        }
        if p.renewable_discount < 0.0 {
            errors.push(ConfigError::new(
                "pricing.renewable_discount",
                "must be >= 0",
            ));
        }

        let m = &self.matching;
        if m.min_trade_kwh <= 0.0 || m.min_trade_kwh >= m.max_trade_kwh {
            errors.push(ConfigError::new(
                "matching.min_trade_kwh",
                "must be > 0 and < matching.max_trade_kwh",
            ));
        }
        if !(0.0..=1.0).contains(&m.battery_reserve_frac) {
            errors.push(ConfigError::new(
                "matching.battery_reserve_frac",
                "must be in [0.0, 1.0]",
            ));
        }
        if !(0.0..=1.0).contains(&m.target_fill_frac) {
            errors.push(ConfigError::new(
                "matching.target_fill_frac",
                "must be in [0.0, 1.0]",
            ));
        }

        let f = &self.forecast;
        if !(0.0..=0.25).contains(&f.generation_blend_cap) {
            errors.push(ConfigError::new(
                "forecast.generation_blend_cap",
                "must be in [0.0, 0.25]",
            ));
        }
        if !(0.0..=0.20).contains(&f.demand_blend_cap) {
            errors.push(ConfigError::new(
                "forecast.demand_blend_cap",
                "must be in [0.0, 0.20]",
            ));
        }
        if f.learning_rate <= 0.0 || f.learning_rate > 0.5 {
            errors.push(ConfigError::new(
                "forecast.learning_rate",
                "must be in (0.0, 0.5]",
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = MarketConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn all_presets_are_valid() {
        for name in MarketConfig::PRESETS {
            let cfg = MarketConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn from_preset_unknown() {
        let err = MarketConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
tick_interval_secs = 5
fleet_size = 16
seed = 99
start_hour = 0
season = "winter"
initial_weather = "cloudy"
readings_cap = 500
trades_cap = 250

[pricing]
off_peak_rate = 3.0
morning_rate = 6.0
day_rate = 4.5
peak_rate = 9.0
floor_price = 2
ceiling_price = 120
renewable_discount = 0.25

[matching]
min_trade_kwh = 0.3
max_trade_kwh = 2.5
battery_reserve_frac = 0.25
target_fill_frac = 0.5

[forecast]
generation_blend_cap = 0.2
demand_blend_cap = 0.15
learning_rate = 0.1
"#;
        let cfg = MarketConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.simulation.fleet_size), Some(16));
        assert_eq!(cfg.as_ref().map(|c| c.season()), Some(Season::Winter));
        assert_eq!(
            cfg.as_ref().map(|c| c.initial_weather()),
            Some(WeatherKind::Cloudy)
        );
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[simulation]
fleet_size = 10
bogus_field = true
"#;
        let result = MarketConfig::from_toml_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[simulation]
seed = 99
"#;
        let cfg = MarketConfig::from_toml_str(toml);
        assert!(cfg.is_ok());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.simulation.seed), Some(99));
        assert_eq!(cfg.as_ref().map(|c| c.simulation.fleet_size), Some(10));
        assert_eq!(cfg.as_ref().map(|c| c.pricing.peak_rate), Some(8.0));
    }

    #[test]
    fn validation_catches_zero_fleet() {
        let mut cfg = MarketConfig::baseline();
        cfg.simulation.fleet_size = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulation.fleet_size"));
    }

    #[test]
    fn validation_catches_bad_season() {
        let mut cfg = MarketConfig::baseline();
        cfg.simulation.season = "wet".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulation.season"));
    }

    #[test]
    fn validation_catches_inverted_price_bounds() {
        let mut cfg = MarketConfig::baseline();
        cfg.pricing.floor_price = 200;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "pricing.floor_price"));
    }

    #[test]
    fn validation_catches_retention_out_of_range() {
        let mut cfg = MarketConfig::baseline();
        cfg.simulation.readings_cap = 100;
        cfg.simulation.trades_cap = 10_000;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulation.readings_cap"));
        assert!(errors.iter().any(|e| e.field == "simulation.trades_cap"));
    }

    #[test]
    fn monsoon_starts_rainy() {
        let cfg = MarketConfig::monsoon();
        assert_eq!(cfg.initial_weather(), WeatherKind::Rainy);
        assert_eq!(cfg.season(), Season::Autumn);
    }

    #[test]
    fn dense_has_larger_fleet() {
        let base = MarketConfig::baseline();
        let dense = MarketConfig::dense();
        assert!(dense.simulation.fleet_size > base.simulation.fleet_size);
    }
}
