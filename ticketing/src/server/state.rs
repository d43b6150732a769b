//! Application state for the ticketing HTTP server.

use crate::service::TicketingService;
use axum::extract::FromRef;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use ticketing_core::LedgerStore;
use ticketing_core::environment::Clock;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Business operations
    pub service: TicketingService,

    /// Ledger store, used directly by the readiness check
    pub store: Arc<dyn LedgerStore>,

    /// Prometheus handle, `None` when metrics are disabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Build the state around a store and clock.
    #[must_use]
    pub fn new(
        store: Arc<dyn LedgerStore>,
        clock: Arc<dyn Clock>,
        purchase_max_attempts: u32,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            service: TicketingService::new(Arc::clone(&store), clock, purchase_max_attempts),
            store,
            metrics,
        }
    }
}

// Lets the shared readiness handler extract the store from AppState.
impl FromRef<AppState> for Arc<dyn LedgerStore> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.store)
    }
}
