//! Ledger Store trait: durable storage for events and ticket transactions.
//!
//! # Implementations
//!
//! - `PostgresLedgerStore` (in `ticketing-postgres` crate): Production implementation
//! - `InMemoryLedgerStore` (in `ticketing-testing` crate): Fast, deterministic testing
//!
//! # Dyn Compatibility
//!
//! Methods return explicit `Pin<Box<dyn Future>>` values instead of using
//! `async fn` so the store can be shared as `Arc<dyn LedgerStore>` in the
//! application state.

use crate::types::{DateRange, Event, EventId, TicketId, TicketTransaction};
use chrono::NaiveDate;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by every [`LedgerStore`] method.
pub type LedgerFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, LedgerError>> + Send + 'a>>;

/// Errors that can occur during ledger store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Another event is already scheduled on this calendar date.
    #[error("An event already exists on {0}")]
    DuplicateDate(NaiveDate),

    /// The event does not exist.
    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    /// The purchase no longer fits at the stored sold-count.
    ///
    /// Returned by [`LedgerStore::commit_purchase`] when other purchases
    /// committed first and used up the room. The caller should re-read the
    /// event and re-check capacity.
    #[error("Concurrency conflict on event {event_id}: expected {expected} tickets sold, found {actual}")]
    ConcurrencyConflict {
        /// Event being purchased
        event_id: EventId,
        /// Sold-count the caller based its decision on
        expected: u32,
        /// Sold-count currently stored
        actual: u32,
    },

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Persistence contract for the ticketing core.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a single store can serve all
/// request handlers concurrently.
pub trait LedgerStore: Send + Sync {
    /// Look up one event.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    fn find_event_by_id(&self, id: EventId) -> LedgerFuture<'_, Option<Event>>;

    /// Insert a new event.
    ///
    /// # Errors
    ///
    /// - `DuplicateDate`: an event already exists on `event.date`
    /// - `Database`: query failed
    fn insert_event(&self, event: Event) -> LedgerFuture<'_, EventId>;

    /// Overwrite a stored event with `event`.
    ///
    /// # Errors
    ///
    /// - `EventNotFound`: no event with `event.id`
    /// - `DuplicateDate`: the new date collides with another event
    /// - `Database`: query failed
    fn update_event(&self, event: Event) -> LedgerFuture<'_, ()>;

    /// All events, optionally restricted to those dated inside `range`.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    fn find_all_events(&self, range: Option<DateRange>) -> LedgerFuture<'_, Vec<Event>>;

    /// Append a transaction to the ledger without touching its event.
    ///
    /// # Errors
    ///
    /// - `EventNotFound`: the referenced event does not exist
    /// - `Database`: query failed
    fn insert_ticket_transaction(&self, transaction: TicketTransaction)
    -> LedgerFuture<'_, TicketId>;

    /// The whole ledger.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    fn find_all_ticket_transactions(&self) -> LedgerFuture<'_, Vec<TicketTransaction>>;

    /// Record a purchase as a single unit of work.
    ///
    /// Under the store's lock on the event, adds `transaction.n_tickets` to the
    /// stored sold-count if the result does not exceed capacity, and appends
    /// `transaction` in the same unit. Either both writes happen or neither does.
    ///
    /// `expected_tickets_sold` is the count the caller admitted the purchase
    /// against. Other purchases committing in between do not fail the write as
    /// long as the tickets still fit.
    ///
    /// Returns the updated event.
    ///
    /// # Errors
    ///
    /// - `EventNotFound`: the referenced event does not exist
    /// - `ConcurrencyConflict`: the tickets no longer fit at the stored
    ///   sold-count; `actual` carries that count
    /// - `Database`: query failed
    fn commit_purchase(
        &self,
        transaction: TicketTransaction,
        expected_tickets_sold: u32,
    ) -> LedgerFuture<'_, Event>;

    /// Cheap connectivity check used by readiness checks.
    ///
    /// # Errors
    ///
    /// - `Database`: the backing store is unreachable
    fn ping(&self) -> LedgerFuture<'_, ()>;
}
