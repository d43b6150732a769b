//! Liveness and readiness endpoints.
//!
//! `/health` only says the process is up. `/ready` pings the ledger store,
//! so load balancers stop routing to an instance that lost its database.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use std::sync::Arc;
use ticketing_core::LedgerStore;

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"`
    pub status: String,
    /// Service version
    pub version: String,
}

/// Liveness check. Does not touch dependencies.
///
/// ```bash
/// curl http://localhost:3000/health
/// # {"status":"ok","version":"0.1.0"}
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Readiness response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// Overall readiness
    pub ready: bool,
    /// Ledger store reachable
    pub ledger: bool,
}

/// Readiness check: 200 when the ledger store answers a ping, 503 otherwise.
///
/// ```bash
/// curl http://localhost:3000/ready
/// # {"ready":true,"ledger":true}
/// ```
pub async fn readiness_check(
    State(store): State<Arc<dyn LedgerStore>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let ledger = match store.ping().await {
        Ok(()) => true,
        Err(error) => {
            tracing::warn!(%error, "Ledger store not ready");
            false
        }
    };

    let status = if ledger {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(ReadinessResponse { ready: ledger, ledger }))
}
