//! API request and response types.

use serde::{Deserialize, Serialize};

/// Response to `POST /simulation/start`.
#[derive(Debug, Serialize)]
pub struct StartResponse {
    /// Whether this request actually started the clock (false when it was
    /// already running).
    pub started: bool,
    pub running: bool,
}

/// Response to `POST /simulation/stop`.
#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub running: bool,
}

/// Body of `POST /simulation/weather`.
#[derive(Debug, Deserialize)]
pub struct WeatherRequest {
    /// Sky condition name (`sunny`, `partly_cloudy`, `cloudy`, `overcast`,
    /// `rainy`, `stormy`).
    pub condition: String,
}

/// Body of `POST /simulation/outage`. Omitting the ids (or sending an empty
/// list) selects the default lowest-battery quarter of the fleet.
#[derive(Debug, Deserialize)]
pub struct OutageRequest {
    #[serde(default)]
    pub household_ids: Option<Vec<u64>>,
}

/// Body of `POST /simulation/restore`.
#[derive(Debug, Deserialize)]
pub struct RestoreRequest {
    pub household_ids: Vec<u64>,
}

/// Response to `POST /simulation/restore`.
#[derive(Debug, Serialize)]
pub struct RestoreResponse {
    /// Ids actually brought back online.
    pub restored: Vec<u64>,
    pub active_outage_ids: Vec<u64>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
