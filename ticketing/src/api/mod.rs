//! HTTP API handlers.
//!
//! - `POST /events`: create an event
//! - `POST /tickets`: buy tickets for an event
//! - `GET /stats`: trailing 12-month statistics
//!
//! Bodies are camelCase JSON. Numeric fields accept either a JSON number or a
//! numeric string; the coercion happens here and nowhere else.

pub mod events;
pub mod stats;
pub mod tickets;

pub use events::create_event;
pub use stats::get_stats;
pub use tickets::purchase_tickets;

use axum::extract::rejection::JsonRejection;
use serde_json::Value;
use ticketing_web::AppError;

/// Message for a body that is not valid JSON or has mistyped fields.
pub const INVALID_BODY_MESSAGE: &str = "Invalid data type provided";

/// Reads a JSON number or a numeric string as `f64`.
///
/// Returns `None` for any other JSON type or a string that is not a number.
#[must_use]
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Maps an axum JSON rejection into the `{code, message}` envelope.
pub(crate) fn bad_body(rejection: &JsonRejection) -> AppError {
    tracing::debug!(error = %rejection, "Rejected request body");
    AppError::validation(INVALID_BODY_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerces_numbers_and_numeric_strings() {
        assert_eq!(coerce_number(&json!(50)), Some(50.0));
        assert_eq!(coerce_number(&json!(12.5)), Some(12.5));
        assert_eq!(coerce_number(&json!("50")), Some(50.0));
        assert_eq!(coerce_number(&json!(" 7.25 ")), Some(7.25));
    }

    #[test]
    fn rejects_non_numeric_values() {
        assert_eq!(coerce_number(&json!("fifty")), None);
        assert_eq!(coerce_number(&json!("NaN")), None);
        assert_eq!(coerce_number(&json!(true)), None);
        assert_eq!(coerce_number(&json!(null)), None);
        assert_eq!(coerce_number(&json!([1])), None);
    }
}
