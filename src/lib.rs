//! Neighborhood-scale peer-to-peer electricity market simulator.
//!
//! Forecasts household generation and demand, matches surplus producers
//! with deficit consumers, prices the trades, and runs the whole pipeline
//! on a periodic simulation clock over a synthetic fleet.

pub mod config;
pub mod forecast;
pub mod io;
/// Per-cycle market optimization pipeline and its components.
pub mod market;
pub mod model;
pub mod noise;
pub mod outage;
pub mod sim;

#[cfg(feature = "api")]
pub mod api;
