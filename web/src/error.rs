//! HTTP error type.
//!
//! [`AppError`] carries a status, a stable `code` and a client-facing
//! message, and renders as `{"code": "...", "message": "..."}`. Domain
//! failures convert via `From<TicketingError>`:
//!
//! | Kind               | Status |
//! |--------------------|--------|
//! | `Validation`       | 400    |
//! | `CapacityExceeded` | 400    |
//! | `Conflict`         | 400    |
//! | `NotFound`         | 404    |
//! | `Storage`          | 500    |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use ticketing_core::TicketingError;

/// Message shown to clients instead of internal failure details.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState>) -> Result<Json<Body>, AppError> {
///     let id = state.service.create_event(input).await?; // TicketingError -> AppError
///     Ok(Json(Body { id }))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Attach an internal error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// 400 with code `VALIDATION_ERROR`.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "VALIDATION_ERROR".to_string(),
        )
    }

    /// 404 with code `NOT_FOUND`.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            message.into(),
            "NOT_FOUND".to_string(),
        )
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Client-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    error = %source,
                    "Request failed"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    "Request failed"
                ),
            }
        } else {
            tracing::debug!(status = %self.status, code = %self.code, message = %self.message, "Request rejected");
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<TicketingError> for AppError {
    fn from(err: TicketingError) -> Self {
        let code = err.code().to_string();
        match err {
            TicketingError::Validation(_)
            | TicketingError::CapacityExceeded { .. }
            | TicketingError::Conflict(_) => {
                Self::new(StatusCode::BAD_REQUEST, err.to_string(), code)
            }
            TicketingError::NotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, err.to_string(), code)
            }
            TicketingError::Storage(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR_MESSAGE.to_string(),
                code,
            )
            .with_source(anyhow::Error::new(err)),
        }
    }
}
