//! Router configuration for the ticketing server.

use super::state::AppState;
use super::telemetry::metrics_endpoint;
use crate::api::{create_event, get_stats, purchase_tickets};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use ticketing_web::correlation_id_layer;
use ticketing_web::handlers::{health_check, readiness_check};

/// Build the complete Axum router.
///
/// | Method | Path       | Handler            |
/// |--------|------------|--------------------|
/// | POST   | `/events`  | `create_event`     |
/// | POST   | `/tickets` | `purchase_tickets` |
/// | GET    | `/stats`   | `get_stats`        |
/// | GET    | `/health`  | liveness           |
/// | GET    | `/ready`   | ledger ping        |
/// | GET    | `/metrics` | Prometheus text    |
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/events", post(create_event))
        .route("/tickets", post(purchase_tickets))
        .route("/stats", get(get_stats))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_endpoint))
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
