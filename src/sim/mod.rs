//! Simulation runtime: the ticking clock, its mutable store, and the
//! weather engine.

pub mod clock;
pub mod store;
pub mod weather;

pub use clock::{ClockStatus, EquitySummary, SimulationClock};
pub use store::SimStore;
pub use weather::WeatherEngine;
