//! `POST /tickets`

use super::{INVALID_BODY_MESSAGE, bad_body, coerce_number};
use crate::server::state::AppState;
use crate::service::{INVALID_PURCHASE_MESSAGE, PurchaseReceipt};
use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ticketing_core::EventId;
use ticketing_web::{AppError, CorrelationId};
use uuid::Uuid;

/// Success message of a recorded purchase.
pub const PURCHASE_RECORDED_MESSAGE: &str = "Ticket transaction recorded successfully";

/// Request to buy tickets.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    /// Event id
    pub event: Option<String>,
    /// Whole number >= 1, as number or numeric string
    pub n_tickets: Option<Value>,
}

impl PurchaseRequest {
    /// Parses the event id and ticket count.
    ///
    /// # Errors
    ///
    /// Returns a 400 [`AppError`] for a missing id, a ticket count that is not
    /// a whole number >= 1, or an id that is not a UUID.
    pub fn into_parts(self) -> Result<(EventId, u32), AppError> {
        let invalid = || AppError::validation(INVALID_PURCHASE_MESSAGE);

        let event = self.event.filter(|id| !id.trim().is_empty()).ok_or_else(invalid)?;
        let n_tickets = self
            .n_tickets
            .as_ref()
            .and_then(coerce_number)
            .and_then(whole_tickets)
            .ok_or_else(invalid)?;

        let event_id = event
            .trim()
            .parse::<EventId>()
            .map_err(|_| AppError::validation(INVALID_BODY_MESSAGE))?;

        Ok((event_id, n_tickets))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_tickets(value: f64) -> Option<u32> {
    (value.fract() == 0.0 && value >= 1.0 && value <= f64::from(u32::MAX)).then_some(value as u32)
}

/// Response after a purchase.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    /// Confirmation text
    pub message: String,
    /// Ledger entry id
    pub ticket_id: Uuid,
    /// Event name
    pub event: String,
    /// Tickets bought
    pub tickets: u32,
    /// Amount charged
    pub total_cost: f64,
    /// Tickets left
    pub remaining_capacity: u32,
}

impl From<PurchaseReceipt> for PurchaseResponse {
    fn from(receipt: PurchaseReceipt) -> Self {
        Self {
            message: PURCHASE_RECORDED_MESSAGE.to_string(),
            ticket_id: *receipt.ticket_id.as_uuid(),
            event: receipt.event_name,
            tickets: receipt.tickets,
            total_cost: receipt.total_cost.as_decimal(),
            remaining_capacity: receipt.remaining_capacity,
        }
    }
}

/// Buy tickets for an event.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:3000/tickets \
///   -H "Content-Type: application/json" \
///   -d '{"event": "7f9c...", "nTickets": 5}'
/// # {"message":"Ticket transaction recorded successfully","ticketId":"...",
/// #  "event":"Jazz Night","tickets":5,"totalCost":50.0,"remainingCapacity":45}
/// ```
pub async fn purchase_tickets(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    body: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PurchaseResponse>), AppError> {
    let Json(request) = body.map_err(|rejection| bad_body(&rejection))?;
    let (event_id, n_tickets) = request.into_parts()?;
    tracing::debug!(%correlation_id, %event_id, n_tickets, "Purchasing tickets");

    let receipt = state.service.purchase(event_id, n_tickets).await?;

    Ok((StatusCode::CREATED, Json(receipt.into())))
}
