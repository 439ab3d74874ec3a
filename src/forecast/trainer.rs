//! Fire-and-forget background training for the forecast model.
//!
//! Prediction calls enqueue a [`TrainingJob`] and return immediately; a
//! dedicated worker thread drains the queue, synthesizes a ground truth from
//! the baseline plus small seeded noise, trains the shared estimator, and
//! updates the household's learning record. Nothing on this path can affect
//! a value already returned to a caller.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};

use parking_lot::{Mutex, RwLock};
use rand::{SeedableRng, rngs::StdRng};
use tracing::debug;

use crate::forecast::estimator::{Features, OnlineEstimator};
use crate::forecast::history::History;
use crate::noise::gaussian_noise;

/// Sliding-window cap on generation/demand sample history.
pub const SAMPLE_WINDOW: usize = 100;
/// Sliding-window cap on prediction-accuracy history.
pub const ACCURACY_WINDOW: usize = 20;
/// Confidence assumed for households with few samples.
pub const DEFAULT_CONFIDENCE: f32 = 0.75;
/// Below this many samples the trend is neutral and confidence defaults.
pub const MIN_SAMPLES: usize = 10;

/// Relative noise applied to the baseline when synthesizing ground truth.
const GROUND_TRUTH_NOISE_STD: f32 = 0.05;

/// Which forecast a job trains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastTarget {
    Generation,
    Demand,
}

/// Everything the worker needs to run one training step.
#[derive(Debug, Clone)]
pub struct TrainingJob {
    pub household_id: u64,
    pub target: ForecastTarget,
    pub features: Features,
    pub scale_kw: f32,
    pub baseline_kw: f32,
    pub predicted_kw: f32,
}

/// Per-household learning state, owned by the forecast model and never
/// exposed outside it.
#[derive(Debug, Clone)]
pub struct LearningRecord {
    pub generation: History,
    pub demand: History,
    pub accuracy: History,
    pub confidence: f32,
    /// Bounded correction multiplier applied to final forecasts.
    pub adaptation: f32,
}

impl Default for LearningRecord {
    fn default() -> Self {
        Self {
            generation: History::new(SAMPLE_WINDOW),
            demand: History::new(SAMPLE_WINDOW),
            accuracy: History::new(ACCURACY_WINDOW),
            confidence: DEFAULT_CONFIDENCE,
            adaptation: 1.0,
        }
    }
}

/// State shared between prediction callers and the training worker.
pub struct SharedLearning {
    pub generation_estimator: Mutex<OnlineEstimator>,
    pub demand_estimator: Mutex<OnlineEstimator>,
    pub records: RwLock<BTreeMap<u64, LearningRecord>>,
}

impl SharedLearning {
    pub fn new(learning_rate: f32) -> Self {
        Self {
            generation_estimator: Mutex::new(OnlineEstimator::new(learning_rate)),
            demand_estimator: Mutex::new(OnlineEstimator::new(learning_rate)),
            records: RwLock::new(BTreeMap::new()),
        }
    }
}

/// Spawns the worker thread. It exits when every job sender is dropped.
pub fn spawn_worker(
    shared: Arc<SharedLearning>,
    rx: Receiver<TrainingJob>,
    seed: u64,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name("forecast-trainer".to_string())
        .spawn(move || {
            let mut rng = StdRng::seed_from_u64(seed);
            for job in rx {
                train_one(&shared, &mut rng, &job);
            }
            debug!("forecast trainer shutting down");
        })
        .unwrap_or_else(|e| panic!("failed to spawn forecast trainer: {e}"))
}

/// Runs one training step: synthesize truth, train the estimator, update the
/// household's record.
pub fn train_one(shared: &SharedLearning, rng: &mut StdRng, job: &TrainingJob) {
    let truth_kw =
        (job.baseline_kw * (1.0 + gaussian_noise(rng, GROUND_TRUTH_NOISE_STD))).max(0.0);

    match job.target {
        ForecastTarget::Generation => {
            shared
                .generation_estimator
                .lock()
                .train(&job.features, job.scale_kw, truth_kw);
        }
        ForecastTarget::Demand => {
            shared
                .demand_estimator
                .lock()
                .train(&job.features, job.scale_kw, truth_kw);
        }
    }

    let mut records = shared.records.write();
    let record = records.entry(job.household_id).or_default();

    match job.target {
        ForecastTarget::Generation => record.generation.push(truth_kw),
        ForecastTarget::Demand => record.demand.push(truth_kw),
    }

    let denom = truth_kw.max(0.1);
    let accuracy = (1.0 - ((job.predicted_kw - truth_kw).abs() / denom).min(1.0)).max(0.0);
    record.accuracy.push(accuracy);
    record.confidence = (0.9 * record.confidence + 0.1 * accuracy).clamp(0.3, 0.95);

    let rel_err = ((truth_kw - job.predicted_kw) / denom).clamp(-1.0, 1.0);
    record.adaptation = (record.adaptation + 0.02 * rel_err).clamp(0.9, 1.1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::baseline::Season;
    use crate::forecast::estimator::generation_features;
    use crate::model::{WeatherCondition, WeatherKind};

    fn job(household_id: u64, baseline_kw: f32, predicted_kw: f32) -> TrainingJob {
        let w = WeatherCondition::from_kind(WeatherKind::Sunny);
        TrainingJob {
            household_id,
            target: ForecastTarget::Generation,
            features: generation_features(&w, 12, 1.0, 5.0, Season::Summer),
            scale_kw: 5.0,
            baseline_kw,
            predicted_kw,
        }
    }

    #[test]
    fn training_creates_record_with_bounded_adaptation() {
        let shared = SharedLearning::new(0.05);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..300 {
            train_one(&shared, &mut rng, &job(7, 4.0, 1.0));
        }
        let records = shared.records.read();
        let r = records.get(&7).unwrap();
        assert_eq!(r.generation.len(), SAMPLE_WINDOW);
        assert_eq!(r.accuracy.len(), ACCURACY_WINDOW);
        assert!((0.9..=1.1).contains(&r.adaptation));
        assert!((0.3..=0.95).contains(&r.confidence));
    }

    #[test]
    fn accurate_predictions_raise_confidence() {
        let shared = SharedLearning::new(0.05);
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..50 {
            train_one(&shared, &mut rng, &job(1, 4.0, 4.0));
        }
        let good = shared.records.read().get(&1).unwrap().confidence;

        for _ in 0..50 {
            train_one(&shared, &mut rng, &job(2, 4.0, 0.5));
        }
        let bad = shared.records.read().get(&2).unwrap().confidence;

        assert!(good > bad, "confidence {good} should exceed {bad}");
    }

    #[test]
    fn worker_drains_queue_and_exits_when_sender_drops() {
        let shared = Arc::new(SharedLearning::new(0.05));
        let (tx, rx) = std::sync::mpsc::channel();
        let handle = spawn_worker(Arc::clone(&shared), rx, 9);

        for _ in 0..20 {
            tx.send(job(3, 4.0, 3.5)).unwrap();
        }
        drop(tx);
        handle.join().unwrap();

        assert_eq!(shared.records.read().get(&3).unwrap().generation.len(), 20);
    }
}
