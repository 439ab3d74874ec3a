//! Seeded random-walk weather engine.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::model::{WeatherCondition, WeatherKind};

/// Walks the sky condition one step at a time through the ordered
/// [`WeatherKind::ALL`] scale, so weather never jumps from sunny to stormy
/// in a single tick.
pub struct WeatherEngine {
    index: usize,
    current: WeatherCondition,
    rng: StdRng,
}

impl WeatherEngine {
    pub fn new(initial: WeatherKind, seed: u64) -> Self {
        let index = WeatherKind::ALL
            .iter()
            .position(|k| *k == initial)
            .unwrap_or(0);
        Self {
            index,
            current: WeatherCondition::from_kind(initial),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn current(&self) -> &WeatherCondition {
        &self.current
    }

    /// Advances the walk by one tick and returns the (possibly unchanged)
    /// condition.
    pub fn step(&mut self) -> &WeatherCondition {
        // 50% hold, 25% improve, 25% worsen, saturating at the scale ends.
        let roll: f32 = self.rng.random();
        if roll < 0.25 {
            self.index = self.index.saturating_sub(1);
        } else if roll < 0.5 && self.index + 1 < WeatherKind::ALL.len() {
            self.index += 1;
        }
        let kind = WeatherKind::ALL[self.index];
        if kind != self.current.kind {
            self.current = WeatherCondition::from_kind(kind);
        }
        &self.current
    }

    /// Forces the condition, pinning the walk to the new kind.
    pub fn set_kind(&mut self, kind: WeatherKind) -> &WeatherCondition {
        self.index = WeatherKind::ALL
            .iter()
            .position(|k| *k == kind)
            .unwrap_or(self.index);
        self.current = WeatherCondition::from_kind(kind);
        &self.current
    }
}
