//! `POST /events`

use super::{bad_body, coerce_number};
use crate::server::state::AppState;
use crate::service::{MISSING_FIELDS_MESSAGE, NewEvent};
use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ticketing_web::{AppError, CorrelationId};
use uuid::Uuid;

/// Request to create a new event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    /// Event name
    pub name: Option<String>,
    /// `DD/MM/YYYY`
    pub date: Option<String>,
    /// Whole number >= 1, as number or numeric string
    pub capacity: Option<Value>,
    /// Non-negative decimal, as number or numeric string
    pub cost_per_ticket: Option<Value>,
}

impl CreateEventRequest {
    /// Checks presence of every field and coerces the numbers.
    ///
    /// # Errors
    ///
    /// Returns a 400 [`AppError`] when a field is missing.
    pub fn into_input(self) -> Result<NewEvent, AppError> {
        let (Some(name), Some(date), Some(capacity), Some(cost)) =
            (self.name, self.date, self.capacity, self.cost_per_ticket)
        else {
            return Err(AppError::validation(MISSING_FIELDS_MESSAGE));
        };

        Ok(NewEvent {
            name,
            date,
            capacity: coerce_number(&capacity).unwrap_or(f64::NAN),
            cost_per_ticket: coerce_number(&cost).unwrap_or(f64::NAN),
        })
    }
}

/// Response after creating an event.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventResponse {
    /// Created event ID
    pub event_id: Uuid,
}

/// Create a new event.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:3000/events \
///   -H "Content-Type: application/json" \
///   -d '{"name": "Jazz Night", "date": "15/11/2024", "capacity": 50, "costPerTicket": 10}'
/// # {"eventId":"7f9c..."}
/// ```
pub async fn create_event(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    body: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateEventResponse>), AppError> {
    let Json(request) = body.map_err(|rejection| bad_body(&rejection))?;
    tracing::debug!(%correlation_id, "Creating event");

    let event_id = state.service.create_event(request.into_input()?).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateEventResponse {
            event_id: *event_id.as_uuid(),
        }),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> CreateEventRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn coerces_string_numbers() {
        let input = request(json!({
            "name": "Jazz Night",
            "date": "15/11/2024",
            "capacity": "50",
            "costPerTicket": "10.5"
        }))
        .into_input()
        .unwrap();

        assert!((input.capacity - 50.0).abs() < f64::EPSILON);
        assert!((input.cost_per_ticket - 10.5).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_field_is_rejected() {
        let err = request(json!({"name": "Jazz Night", "date": "15/11/2024", "capacity": 50}))
            .into_input()
            .unwrap_err();
        assert_eq!(err.message(), MISSING_FIELDS_MESSAGE);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn non_numeric_capacity_becomes_nan() {
        let input = request(json!({
            "name": "Jazz Night",
            "date": "15/11/2024",
            "capacity": "lots",
            "costPerTicket": 10
        }))
        .into_input()
        .unwrap();
        assert!(input.capacity.is_nan());
    }

    #[test]
    fn response_uses_camel_case() {
        let id = Uuid::nil();
        let body = serde_json::to_value(CreateEventResponse { event_id: id }).unwrap();
        assert_eq!(body, json!({"eventId": id.to_string()}));
    }
}
