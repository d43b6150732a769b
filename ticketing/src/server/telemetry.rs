//! `GET /metrics`

use super::state::AppState;
use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use ticketing_web::AppError;

/// Prometheus text exposition of the business metrics.
///
/// Responds 404 when the server runs with `METRICS_ENABLED=false`.
pub async fn metrics_endpoint(State(state): State<AppState>) -> Result<Response, AppError> {
    let handle = state
        .metrics
        .as_ref()
        .ok_or_else(|| AppError::not_found("Metrics are disabled"))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response())
}
