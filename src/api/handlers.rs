//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::types::{
    ErrorResponse, OutageRequest, RestoreRequest, RestoreResponse, StartResponse, StopResponse,
    WeatherRequest,
};
use crate::model::WeatherKind;
use crate::outage::OutageReport;
use crate::sim::{ClockStatus, EquitySummary, SimulationClock};

/// Starts the clock. Starting an already-running clock is a no-op.
///
/// `POST /simulation/start` → 200 + `StartResponse` JSON
pub async fn start_simulation(State(clock): State<Arc<SimulationClock>>) -> Json<StartResponse> {
    let started = clock.start();
    Json(StartResponse {
        started,
        running: clock.is_running(),
    })
}

/// Stops the clock. Idempotent.
///
/// `POST /simulation/stop` → 200 + `StopResponse` JSON
pub async fn stop_simulation(State(clock): State<Arc<SimulationClock>>) -> Json<StopResponse> {
    clock.stop();
    Json(StopResponse {
        running: clock.is_running(),
    })
}

/// Returns the clock status with fleet aggregates.
///
/// `GET /simulation/status` → 200 + `ClockStatus` JSON
pub async fn get_status(State(clock): State<Arc<SimulationClock>>) -> Json<ClockStatus> {
    Json(clock.status())
}

/// Forces the sky condition.
///
/// `POST /simulation/weather` → 200 + `WeatherCondition` JSON
/// Unknown condition name → 400 + `ErrorResponse`
pub async fn change_weather(
    State(clock): State<Arc<SimulationClock>>,
    Json(body): Json<WeatherRequest>,
) -> impl IntoResponse {
    let Some(kind) = WeatherKind::parse(&body.condition) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("unknown weather condition \"{}\"", body.condition),
            }),
        ));
    };
    Ok(Json(clock.change_weather(kind)))
}

/// Takes households offline and reports the outage impact.
///
/// `POST /simulation/outage` → 200 + `OutageReport` JSON
pub async fn trigger_outage(
    State(clock): State<Arc<SimulationClock>>,
    Json(body): Json<OutageRequest>,
) -> Json<OutageReport> {
    Json(clock.trigger_outage(body.household_ids))
}

/// Restores households; unknown ids are ignored.
///
/// `POST /simulation/restore` → 200 + `RestoreResponse` JSON
pub async fn restore_power(
    State(clock): State<Arc<SimulationClock>>,
    Json(body): Json<RestoreRequest>,
) -> Json<RestoreResponse> {
    let restored = clock.restore_power(&body.household_ids);
    Json(RestoreResponse {
        restored,
        active_outage_ids: clock.status().active_outage_ids,
    })
}

/// Returns the latest optimization result, computing one on demand before
/// the first tick.
///
/// `GET /optimization` → 200 + `OptimizationResult` JSON
pub async fn get_optimization(
    State(clock): State<Arc<SimulationClock>>,
) -> Json<crate::model::OptimizationResult> {
    Json(clock.optimization_result())
}

/// Returns fleet aggregates.
///
/// `GET /network/stats` → 200 + `NetworkStats` JSON
pub async fn get_network_stats(
    State(clock): State<Arc<SimulationClock>>,
) -> Json<crate::model::NetworkStats> {
    Json(clock.network_stats())
}

/// Returns the condensed equity view.
///
/// `GET /equity` → 200 + `EquitySummary` JSON
pub async fn get_equity(State(clock): State<Arc<SimulationClock>>) -> Json<EquitySummary> {
    Json(clock.equity_analysis())
}
