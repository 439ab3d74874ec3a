//! REST API over a running simulation clock.
//!
//! Lifecycle and scenario controls are POSTs; inspection endpoints are GETs:
//! - `POST /simulation/start`, `POST /simulation/stop`
//! - `GET /simulation/status`
//! - `POST /simulation/weather`, `POST /simulation/outage`,
//!   `POST /simulation/restore`
//! - `GET /optimization`, `GET /network/stats`, `GET /equity`

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::sim::SimulationClock;

/// Builds the axum router with all API routes.
///
/// # Arguments
///
/// * `clock` - The simulation clock every handler operates on
///
/// # Returns
///
/// Configured `Router` ready to serve.
pub fn router(clock: Arc<SimulationClock>) -> Router {
    Router::new()
        .route("/simulation/start", post(handlers::start_simulation))
        .route("/simulation/stop", post(handlers::stop_simulation))
        .route("/simulation/status", get(handlers::get_status))
        .route("/simulation/weather", post(handlers::change_weather))
        .route("/simulation/outage", post(handlers::trigger_outage))
        .route("/simulation/restore", post(handlers::restore_power))
        .route("/optimization", get(handlers::get_optimization))
        .route("/network/stats", get(handlers::get_network_stats))
        .route("/equity", get(handlers::get_equity))
        .with_state(clock)
}

/// Binds to the given address and serves the API.
///
/// # Arguments
///
/// * `clock` - The simulation clock to expose
/// * `addr` - Socket address to bind to
///
/// # Panics
///
/// Panics if the TCP listener cannot bind to `addr`.
pub async fn serve(clock: Arc<SimulationClock>, addr: SocketAddr) {
    let app = router(clock);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {addr}: {e}"));
    eprintln!("API server listening on http://{addr}");
    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| panic!("server error: {e}"));
}
