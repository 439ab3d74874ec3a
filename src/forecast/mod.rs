//! Adaptive per-household generation and demand forecasting.
//!
//! Predictions blend a deterministic physical baseline with a small
//! online-trained estimator. The baseline always dominates: the estimator's
//! blend weight is capped and scaled by the household's demonstrated accuracy
//! and confidence. Training happens off the critical path on a background
//! worker thread.

pub mod baseline;
pub mod estimator;
pub mod history;
pub mod trainer;

use std::sync::Arc;
use std::sync::mpsc::{self, Sender};

use tracing::trace;

use crate::config::ForecastConfig;
use crate::model::{Household, WeatherCondition};
use baseline::{Season, demand_baseline, generation_baseline};
use estimator::{demand_features, generation_features};
use trainer::{
    DEFAULT_CONFIDENCE, ForecastTarget, MIN_SAMPLES, SharedLearning, TrainingJob, spawn_worker,
};

/// Blend inputs read from a household's learning record.
struct LearningInputs {
    trend: f32,
    accuracy: f32,
    confidence: f32,
    adaptation: f32,
}

/// Forecast engine shared by the analyzer and the simulation clock.
///
/// Cheap to share behind an `Arc`; prediction takes `&self` and only holds
/// internal locks briefly.
pub struct ForecastModel {
    shared: Arc<SharedLearning>,
    jobs: Sender<TrainingJob>,
    season: Season,
    generation_blend_cap: f32,
    demand_blend_cap: f32,
}

impl ForecastModel {
    /// Creates the model and spawns its background training worker. The
    /// worker exits once the model is dropped.
    pub fn new(config: &ForecastConfig, season: Season, seed: u64) -> Self {
        let shared = Arc::new(SharedLearning::new(config.learning_rate));
        let (tx, rx) = mpsc::channel();
        // Detached on purpose; queue closure stops the thread.
        let _ = spawn_worker(Arc::clone(&shared), rx, seed);
        Self {
            shared,
            jobs: tx,
            season,
            generation_blend_cap: config.generation_blend_cap.clamp(0.0, 0.25),
            demand_blend_cap: config.demand_blend_cap.clamp(0.0, 0.20),
        }
    }

    /// Predicted solar generation in kW for the given hour.
    ///
    /// Always non-negative and at most 110% of panel rating adjusted for
    /// weather. Households without panels (or outside daylight) get exactly
    /// the baseline floor with no estimator influence.
    pub fn predict_generation(
        &self,
        household: &Household,
        weather: &WeatherCondition,
        hour: u32,
    ) -> f32 {
        let baseline =
            generation_baseline(household.solar_capacity_kw, weather, hour, self.season);
        if household.solar_capacity_kw <= 0.0 || baseline <= 0.0 {
            return baseline.max(0.0);
        }

        let inputs = self.learning_inputs(household.id, ForecastTarget::Generation);
        let features = generation_features(
            weather,
            hour,
            inputs.trend,
            household.solar_capacity_kw,
            self.season,
        );
        let estimate_kw = self
            .shared
            .generation_estimator
            .lock()
            .predict_kw(&features, household.solar_capacity_kw);

        let w = self.generation_blend_cap * inputs.accuracy * inputs.confidence;
        let limit = 1.1 * household.solar_capacity_kw * weather.solar_efficiency;
        let value = ((baseline * (1.0 - w) + estimate_kw * w) * inputs.adaptation)
            .clamp(0.0, limit.max(0.0));

        self.enqueue(TrainingJob {
            household_id: household.id,
            target: ForecastTarget::Generation,
            features,
            scale_kw: household.solar_capacity_kw,
            baseline_kw: baseline,
            predicted_kw: value,
        });
        value
    }

    /// Predicted demand in kW for the given hour and day of week.
    ///
    /// Bounded to `[0.3, 3.0]` times the household kind's base demand.
    pub fn predict_demand(&self, household: &Household, hour: u32, day_of_week: u32) -> f32 {
        let base = household.kind.base_demand_kw();
        let baseline = demand_baseline(household.kind, hour, day_of_week, self.season);

        let inputs = self.learning_inputs(household.id, ForecastTarget::Demand);
        let features = demand_features(hour, day_of_week, inputs.trend, base, self.season);
        let estimate_kw = self
            .shared
            .demand_estimator
            .lock()
            .predict_kw(&features, base);

        let w = self.demand_blend_cap * inputs.accuracy * inputs.confidence;
        let value = ((baseline * (1.0 - w) + estimate_kw * w) * inputs.adaptation)
            .clamp(0.3 * base, 3.0 * base);

        self.enqueue(TrainingJob {
            household_id: household.id,
            target: ForecastTarget::Demand,
            features,
            scale_kw: base,
            baseline_kw: baseline,
            predicted_kw: value,
        });
        value
    }

    /// Enqueue failure must never reach the caller; the prediction has
    /// already been computed.
    fn enqueue(&self, job: TrainingJob) {
        if self.jobs.send(job).is_err() {
            trace!("training queue closed, dropping job");
        }
    }

    fn learning_inputs(&self, household_id: u64, target: ForecastTarget) -> LearningInputs {
        let records = self.shared.records.read();
        let Some(record) = records.get(&household_id) else {
            return LearningInputs {
                trend: 1.0,
                accuracy: 0.5,
                confidence: DEFAULT_CONFIDENCE,
                adaptation: 1.0,
            };
        };

        let samples = match target {
            ForecastTarget::Generation => &record.generation,
            ForecastTarget::Demand => &record.demand,
        };
        if samples.len() < MIN_SAMPLES {
            return LearningInputs {
                trend: 1.0,
                accuracy: 0.5,
                confidence: DEFAULT_CONFIDENCE,
                adaptation: record.adaptation,
            };
        }

        let accuracy = if record.accuracy.is_empty() {
            0.5
        } else {
            record.accuracy.mean()
        };
        LearningInputs {
            trend: samples.trend(),
            accuracy,
            confidence: record.confidence,
            adaptation: record.adaptation,
        }
    }

    #[cfg(test)]
    pub(crate) fn shared(&self) -> &SharedLearning {
        &self.shared
    }
}
