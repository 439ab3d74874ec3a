//! File export of simulation telemetry.

pub mod export;
