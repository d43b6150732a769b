//! Domain error kinds.
//!
//! Every failure in the core is one of these kinds. The HTTP layer maps each
//! kind to a status code; nothing here knows about HTTP.

use crate::ledger::LedgerError;
use thiserror::Error;

/// Result alias for domain operations.
pub type Result<T> = std::result::Result<T, TicketingError>;

/// Errors surfaced to callers of the ticketing core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TicketingError {
    /// Malformed or missing input (field presence, date shape, capacity, cost).
    #[error("{0}")]
    Validation(String),

    /// A referenced resource does not exist.
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Resource kind (e.g. "Event")
        resource: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// The purchase would sell more tickets than the event holds.
    #[error("Event sold out or capacity exceeded: requested {requested}, available {available}")]
    CapacityExceeded {
        /// Tickets requested
        requested: u32,
        /// Tickets still available
        available: u32,
    },

    /// A uniqueness or concurrency conflict (duplicate event date, lost purchase race).
    #[error("{0}")]
    Conflict(String),

    /// Unrecognized storage failure. The message is for logs, not clients.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl TicketingError {
    /// Stable machine-readable classification.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            Self::Conflict(_) => "CONFLICT",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Shorthand for an unknown event.
    #[must_use]
    pub fn event_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            resource: "Event",
            id: id.to_string(),
        }
    }
}

impl From<LedgerError> for TicketingError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::DuplicateDate(_) => {
                Self::Conflict("An event already exists on this date".to_string())
            }
            LedgerError::EventNotFound(id) => Self::event_not_found(id),
            LedgerError::ConcurrencyConflict { .. } => {
                Self::Conflict("The event was modified concurrently, please retry".to_string())
            }
            LedgerError::Database(message) => Self::Storage(message),
        }
    }
}
