//! Small online-trained linear estimator blended with the physical baseline.
//!
//! This is deliberately not a production ML model: a single linear layer over
//! hand-picked normalized features, trained by stochastic gradient descent
//! toward a synthetic ground truth. Its influence on the final forecast is
//! capped by the blend weight in [`super::ForecastModel`].

use crate::forecast::baseline::Season;
use crate::model::WeatherCondition;

/// Number of input features.
pub const FEATURE_COUNT: usize = 9;

/// Normalized feature vector for one prediction.
pub type Features = [f32; FEATURE_COUNT];

/// Builds the feature vector for a generation prediction.
pub fn generation_features(
    weather: &WeatherCondition,
    hour: u32,
    trend: f32,
    solar_capacity_kw: f32,
    season: Season,
) -> Features {
    let angle = 2.0 * std::f32::consts::PI * (hour % 24) as f32 / 24.0;
    [
        weather.solar_efficiency,
        weather.cloud_cover_pct / 100.0,
        (weather.temperature_c / 50.0).clamp(0.0, 1.0),
        angle.sin(),
        angle.cos(),
        trend,
        (solar_capacity_kw / 10.0).clamp(0.0, 1.0),
        season.generation_factor(),
        0.0,
    ]
}

/// Builds the feature vector for a demand prediction.
pub fn demand_features(
    hour: u32,
    day_of_week: u32,
    trend: f32,
    base_demand_kw: f32,
    season: Season,
) -> Features {
    let angle = 2.0 * std::f32::consts::PI * (hour % 24) as f32 / 24.0;
    let weekend = if day_of_week % 7 >= 5 { 1.0 } else { 0.0 };
    [
        0.0,
        0.0,
        0.0,
        angle.sin(),
        angle.cos(),
        trend,
        (base_demand_kw / 5.0).clamp(0.0, 1.0),
        season.demand_factor(),
        weekend,
    ]
}

/// One linear unit with a rectified output, trained online.
#[derive(Debug, Clone)]
pub struct OnlineEstimator {
    weights: [f32; FEATURE_COUNT],
    bias: f32,
    learning_rate: f32,
}

impl OnlineEstimator {
    /// Starts from a neutral state predicting half the scale regardless of
    /// input, so early (untrained) output is sane rather than random.
    pub fn new(learning_rate: f32) -> Self {
        Self {
            weights: [0.0; FEATURE_COUNT],
            bias: 0.5,
            learning_rate: learning_rate.clamp(1e-4, 0.5),
        }
    }

    fn activation(&self, x: &Features) -> f32 {
        let mut acc = self.bias;
        for (w, v) in self.weights.iter().zip(x.iter()) {
            acc += w * v;
        }
        acc
    }

    /// Predicted output in kW for the given features and physical scale
    /// (panel capacity or base demand). Never negative.
    pub fn predict_kw(&self, x: &Features, scale_kw: f32) -> f32 {
        (self.activation(x).max(0.0) * scale_kw.max(0.0)).max(0.0)
    }

    /// One SGD step toward `target_kw`. The error is normalized by the scale
    /// so large households do not dominate the shared weights.
    pub fn train(&mut self, x: &Features, scale_kw: f32, target_kw: f32) {
        let scale = scale_kw.max(0.1);
        let err = (self.activation(x) - target_kw / scale).clamp(-2.0, 2.0);
        let step = self.learning_rate * err;
        for (w, v) in self.weights.iter_mut().zip(x.iter()) {
            *w -= step * v;
        }
        self.bias -= step;
    }
}
