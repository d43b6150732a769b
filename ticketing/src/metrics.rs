//! Business metrics for the ticketing server.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `ticketing_events_created_total` - Events created
//! - `ticketing_purchases_total{outcome}` - Purchase attempts by outcome
//!   (`completed`, `capacity_exceeded`, `not_found`, `invalid`, `conflict`, `error`)
//! - `ticketing_purchase_retries_total` - Purchases re-checked after losing a race
//! - `ticketing_tickets_sold_total` - Tickets sold
//! - `ticketing_revenue_cents_total` - Revenue from completed purchases in cents
//!
//! Recording is a no-op until a recorder is installed, so services can be
//! exercised in tests without one.

use metrics::describe_counter;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use ticketing_core::{Money, TicketingError};

/// Register all business metric descriptions.
///
/// Call once at startup, after the recorder is installed.
pub fn register_business_metrics() {
    describe_counter!(
        "ticketing_events_created_total",
        "Total number of events created"
    );
    describe_counter!(
        "ticketing_purchases_total",
        "Total number of purchase attempts by outcome"
    );
    describe_counter!(
        "ticketing_purchase_retries_total",
        "Purchases re-read and re-checked after a concurrent commit"
    );
    describe_counter!(
        "ticketing_tickets_sold_total",
        "Total number of tickets sold"
    );
    describe_counter!(
        "ticketing_revenue_cents_total",
        "Total revenue from completed purchases in cents"
    );

    tracing::info!("Business metrics registered");
}

/// Install the global Prometheus recorder and register descriptions.
///
/// # Errors
///
/// Returns [`BuildError`] if a recorder is already installed.
pub fn install_prometheus() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    register_business_metrics();
    Ok(handle)
}

/// Record a created event.
pub fn record_event_created() {
    metrics::counter!("ticketing_events_created_total").increment(1);
}

/// Record a completed purchase.
pub fn record_purchase_completed(tickets: u32, total_cost: Money) {
    metrics::counter!("ticketing_purchases_total", "outcome" => "completed").increment(1);
    metrics::counter!("ticketing_tickets_sold_total").increment(u64::from(tickets));
    metrics::counter!("ticketing_revenue_cents_total").increment(total_cost.cents());
}

/// Record a purchase that lost a race and is being re-checked.
pub fn record_purchase_retry() {
    metrics::counter!("ticketing_purchase_retries_total").increment(1);
}

/// Record a failed purchase, labelled by error kind.
pub fn record_purchase_failed(error: &TicketingError) {
    let outcome = match error {
        TicketingError::CapacityExceeded { .. } => "capacity_exceeded",
        TicketingError::NotFound { .. } => "not_found",
        TicketingError::Validation(_) => "invalid",
        TicketingError::Conflict(_) => "conflict",
        TicketingError::Storage(_) => "error",
    };
    metrics::counter!("ticketing_purchases_total", "outcome" => outcome).increment(1);
}
