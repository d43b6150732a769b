//! # Ticketing Core
//!
//! Domain types and pure business rules for the event-ticketing backend.
//!
//! This crate holds everything that has a real invariant to protect and does no I/O:
//!
//! - **Date Normalizer** ([`date`]): strict `DD/MM/YYYY` validation and conversion
//! - **Capacity Guard** ([`capacity`]): admit/reject a purchase without overselling
//! - **Monthly Aggregator** ([`stats`]): 12-bucket revenue and sell-through series
//! - **Ledger Store contract** ([`ledger`]): the persistence seam implemented by
//!   `ticketing-postgres` (production) and `ticketing-testing` (in-memory)
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell: handlers and stores live in other crates
//! - Dependency Injection via Environment ([`environment::Clock`])
//! - Failures are values ([`error::TicketingError`]), never panics
//!
//! ## Example
//!
//! ```
//! use ticketing_core::capacity::admit;
//! use ticketing_core::types::{Capacity, Event, Money};
//! use chrono::{NaiveDate, Utc};
//!
//! let date = NaiveDate::from_ymd_opt(2024, 11, 15).unwrap_or_default();
//! let event = Event::new("Jazz Night".to_string(), date, Capacity::new(50), Money::from_cents(1000), Utc::now());
//!
//! let admission = admit(&event, 5, Utc::now());
//! assert!(admission.is_ok());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod capacity;
pub mod date;
pub mod error;
pub mod ledger;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use chrono::{DateTime, NaiveDate, Utc};
pub use error::TicketingError;
pub use ledger::{LedgerError, LedgerStore};
pub use types::{Capacity, DateRange, Event, EventId, Money, TicketId, TicketTransaction};

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// into the services that need them.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Test - fixed time for deterministic tests
    /// struct FixedClock { time: DateTime<Utc> }
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> DateTime<Utc> {
    ///         self.time
    ///     }
    /// }
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
