//! Application service: the imperative shell around the core rules.
//!
//! [`TicketingService`] owns a [`LedgerStore`] and a [`Clock`] and exposes the
//! three operations behind the HTTP surface:
//!
//! - [`TicketingService::create_event`]: validate and store a new event
//! - [`TicketingService::purchase`]: capacity-checked ticket purchase
//! - [`TicketingService::monthly_stats`]: trailing 12-month statistics
//!
//! # Purchase flow
//!
//! ```text
//! loop (up to max_attempts):
//!     event     = store.find_event_by_id(id)        // NotFound if missing
//!     admission = capacity::admit(&event, n, now)   // CapacityExceeded / Validation
//!     store.commit_purchase(tx, event.tickets_sold)
//!         Ok                   -> done
//!         ConcurrencyConflict  -> concurrent sales used up the room, re-read
//! ```

use crate::metrics;
use std::sync::Arc;
use ticketing_core::capacity::admit;
use ticketing_core::date;
use ticketing_core::environment::Clock;
use ticketing_core::error::Result;
use ticketing_core::ledger::{LedgerError, LedgerStore};
use ticketing_core::stats::{MonthStat, aggregate, stats_window};
use ticketing_core::{Capacity, Event, EventId, Money, TicketId, TicketingError};

/// Message for a body missing `name`, `date`, `capacity` or `costPerTicket`.
pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields";

/// Message for a zero, fractional or negative capacity.
pub const INVALID_CAPACITY_MESSAGE: &str = "Capacity must be a positive integer";

/// Message for a negative or non-numeric ticket price.
pub const INVALID_COST_MESSAGE: &str = "Cost per ticket must be a non-negative number";

/// Message for a purchase without an event id or with fewer than one ticket.
pub const INVALID_PURCHASE_MESSAGE: &str =
    "Invalid input. Event ID and number of tickets (min 1) are required";

/// Message when every purchase attempt lost a race.
pub const CONTENTION_MESSAGE: &str = "The event was modified concurrently, please retry";

/// Unvalidated input for a new event.
///
/// Numbers are already coerced from JSON; the service checks their ranges.
#[derive(Clone, Debug, PartialEq)]
pub struct NewEvent {
    /// Display name
    pub name: String,
    /// `DD/MM/YYYY`
    pub date: String,
    /// Must be a whole number >= 1
    pub capacity: f64,
    /// Decimal price, must be >= 0
    pub cost_per_ticket: f64,
}

impl NewEvent {
    /// Checks every field and builds the event to store.
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::Validation`] naming the first bad field.
    pub fn into_event(self, now: chrono::DateTime<chrono::Utc>) -> Result<Event> {
        if self.name.trim().is_empty() || self.date.is_empty() {
            return Err(TicketingError::Validation(MISSING_FIELDS_MESSAGE.to_string()));
        }

        let date = date::parse(&self.date)?;
        let capacity = whole_capacity(self.capacity)
            .ok_or_else(|| TicketingError::Validation(INVALID_CAPACITY_MESSAGE.to_string()))?;
        let cost = Money::from_decimal(self.cost_per_ticket)
            .ok_or_else(|| TicketingError::Validation(INVALID_COST_MESSAGE.to_string()))?;

        Ok(Event::new(self.name, date, capacity, cost, now))
    }
}

/// Largest capacity every ledger backend can store (`INTEGER` column).
pub const MAX_CAPACITY: u32 = i32::MAX.unsigned_abs();

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_capacity(value: f64) -> Option<Capacity> {
    if !value.is_finite() || value.fract() != 0.0 || value < 1.0 || value > f64::from(MAX_CAPACITY) {
        return None;
    }
    Some(Capacity::new(value as u32))
}

/// Result of a completed purchase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchaseReceipt {
    /// Ledger entry id
    pub ticket_id: TicketId,
    /// Event purchased
    pub event_id: EventId,
    /// Event display name
    pub event_name: String,
    /// Tickets bought
    pub tickets: u32,
    /// Amount charged
    pub total_cost: Money,
    /// Tickets left after this purchase
    pub remaining_capacity: u32,
}

/// Orchestrates event creation, purchases and statistics.
#[derive(Clone)]
pub struct TicketingService {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    max_attempts: u32,
}

impl TicketingService {
    /// Create a service; `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>, max_attempts: u32) -> Self {
        Self {
            store,
            clock,
            max_attempts: max_attempts.max(1),
        }
    }

    /// The ledger store backing this service.
    #[must_use]
    pub fn store(&self) -> Arc<dyn LedgerStore> {
        Arc::clone(&self.store)
    }

    /// Validate and store a new event.
    ///
    /// # Errors
    ///
    /// - [`TicketingError::Validation`] for bad fields
    /// - [`TicketingError::Conflict`] if an event already exists on that date
    /// - [`TicketingError::Storage`] if the store fails
    pub async fn create_event(&self, input: NewEvent) -> Result<EventId> {
        let event = input.into_event(self.clock.now())?;
        let (name, date) = (event.name.clone(), event.date);

        let id = self.store.insert_event(event).await.map_err(|err| {
            if !matches!(err, LedgerError::DuplicateDate(_)) {
                tracing::error!(error = %err, "Failed to store event");
            }
            TicketingError::from(err)
        })?;

        metrics::record_event_created();
        tracing::info!(event_id = %id, %name, %date, "Event created");
        Ok(id)
    }

    /// Buy `n_tickets` for `event_id` without overselling.
    ///
    /// # Errors
    ///
    /// - [`TicketingError::Validation`] if `n_tickets` is zero
    /// - [`TicketingError::NotFound`] if the event does not exist
    /// - [`TicketingError::CapacityExceeded`] if not enough tickets are left
    /// - [`TicketingError::Conflict`] if every attempt lost a concurrent race
    /// - [`TicketingError::Storage`] if the store fails
    pub async fn purchase(&self, event_id: EventId, n_tickets: u32) -> Result<PurchaseReceipt> {
        let result = self.try_purchase(event_id, n_tickets).await;
        match &result {
            Ok(receipt) => {
                metrics::record_purchase_completed(receipt.tickets, receipt.total_cost);
                tracing::info!(
                    %event_id,
                    ticket_id = %receipt.ticket_id,
                    tickets = receipt.tickets,
                    total_cost = %receipt.total_cost,
                    remaining = receipt.remaining_capacity,
                    "Ticket transaction recorded"
                );
            }
            Err(error) => {
                metrics::record_purchase_failed(error);
                if matches!(error, TicketingError::Storage(_)) {
                    tracing::error!(%event_id, %error, "Purchase failed");
                } else {
                    tracing::info!(%event_id, n_tickets, %error, "Purchase rejected");
                }
            }
        }
        result
    }

    async fn try_purchase(&self, event_id: EventId, n_tickets: u32) -> Result<PurchaseReceipt> {
        if n_tickets == 0 {
            return Err(TicketingError::Validation(INVALID_PURCHASE_MESSAGE.to_string()));
        }

        for attempt in 1..=self.max_attempts {
            let event = self
                .store
                .find_event_by_id(event_id)
                .await?
                .ok_or_else(|| TicketingError::event_not_found(event_id))?;

            let admission = admit(&event, n_tickets, self.clock.now())?;
            let transaction = admission.transaction.clone();

            match self
                .store
                .commit_purchase(transaction, admission.previous_tickets_sold)
                .await
            {
                Ok(updated) => {
                    return Ok(PurchaseReceipt {
                        ticket_id: admission.transaction.id,
                        event_id,
                        event_name: updated.name.clone(),
                        tickets: n_tickets,
                        total_cost: admission.total_cost(),
                        remaining_capacity: updated.remaining_capacity(),
                    });
                }
                Err(LedgerError::ConcurrencyConflict { expected, actual, .. }) => {
                    metrics::record_purchase_retry();
                    tracing::debug!(%event_id, attempt, expected, actual, "Purchase lost a race, re-checking");
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(TicketingError::Conflict(CONTENTION_MESSAGE.to_string()))
    }

    /// Statistics for the twelve months ending at the current month.
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::Storage`] if the store fails.
    pub async fn monthly_stats(&self) -> Result<Vec<MonthStat>> {
        let now = self.clock.now();
        let window = stats_window(now);
        tracing::debug!(from = %window.start, to = %window.end, "Calculating statistics");

        let events = self.store.find_all_events(Some(window)).await?;
        let transactions = self.store.find_all_ticket_transactions().await?;
        let stats = aggregate(&events, &transactions, now);

        tracing::debug!(
            events = events.len(),
            transactions = transactions.len(),
            "Statistics calculated"
        );
        Ok(stats)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use ticketing_core::ledger::LedgerFuture;
    use ticketing_core::{DateRange, TicketTransaction};
    use ticketing_testing::{InMemoryLedgerStore, test_clock};

    fn service(store: Arc<dyn LedgerStore>) -> TicketingService {
        TicketingService::new(store, Arc::new(test_clock()), 5)
    }

    fn new_event(date: &str, capacity: f64, cost: f64) -> NewEvent {
        NewEvent {
            name: "Concert".to_string(),
            date: date.to_string(),
            capacity,
            cost_per_ticket: cost,
        }
    }

    #[tokio::test]
    async fn purchase_flow_matches_receipt() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let service = service(store.clone());
        let id = service
            .create_event(new_event("15/11/2024", 50.0, 10.0))
            .await
            .unwrap();

        let receipt = service.purchase(id, 5).await.unwrap();
        assert_eq!(receipt.remaining_capacity, 45);
        assert_eq!(receipt.total_cost, Money::from_cents(5000));
        assert_eq!(receipt.event_name, "Concert");

        let err = service.purchase(id, 50).await.unwrap_err();
        assert_eq!(
            err,
            TicketingError::CapacityExceeded {
                requested: 50,
                available: 45
            }
        );
        assert_eq!(store.transaction_count(), 1);
    }

    #[tokio::test]
    async fn rejects_invalid_event_fields() {
        let service = service(Arc::new(InMemoryLedgerStore::new()));
        let cases = [
            (new_event("31/02/2024", 10.0, 1.0), date::INVALID_DATE_MESSAGE),
            (new_event("2024-11-15", 10.0, 1.0), date::INVALID_DATE_MESSAGE),
            (new_event("15/11/2024", 0.0, 1.0), INVALID_CAPACITY_MESSAGE),
            (new_event("15/11/2024", 2.5, 1.0), INVALID_CAPACITY_MESSAGE),
            (new_event("15/11/2024", 2_147_483_648.0, 1.0), INVALID_CAPACITY_MESSAGE),
            (new_event("15/11/2024", 10.0, -1.0), INVALID_COST_MESSAGE),
            (new_event("15/11/2024", 10.0, f64::NAN), INVALID_COST_MESSAGE),
            (new_event("", 10.0, 1.0), MISSING_FIELDS_MESSAGE),
        ];

        for (input, message) in cases {
            let err = service.create_event(input).await.unwrap_err();
            assert_eq!(err, TicketingError::Validation(message.to_string()));
        }
    }

    #[tokio::test]
    async fn largest_storable_capacity_is_accepted() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let service = service(store.clone());

        let id = service
            .create_event(new_event("15/11/2024", f64::from(MAX_CAPACITY), 1.0))
            .await
            .unwrap();

        let event = store.find_event_by_id(id).await.unwrap().unwrap();
        assert_eq!(event.capacity.value(), 2_147_483_647);
    }

    #[tokio::test]
    async fn name_is_stored_as_given() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let service = service(store.clone());
        let mut input = new_event("15/11/2024", 10.0, 1.0);
        input.name = "  Jazz Night ".to_string();

        let id = service.create_event(input).await.unwrap();

        let event = store.find_event_by_id(id).await.unwrap().unwrap();
        assert_eq!(event.name, "  Jazz Night ");

        let mut blank = new_event("16/11/2024", 10.0, 1.0);
        blank.name = "   ".to_string();
        assert_eq!(
            service.create_event(blank).await.unwrap_err(),
            TicketingError::Validation(MISSING_FIELDS_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn duplicate_date_is_conflict() {
        let service = service(Arc::new(InMemoryLedgerStore::new()));
        service
            .create_event(new_event("15/11/2024", 10.0, 1.0))
            .await
            .unwrap();

        let err = service
            .create_event(new_event("15/11/2024", 20.0, 2.0))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            TicketingError::Conflict("An event already exists on this date".to_string())
        );
    }

    #[tokio::test]
    async fn unknown_event_and_zero_tickets() {
        let service = service(Arc::new(InMemoryLedgerStore::new()));
        assert!(matches!(
            service.purchase(EventId::new(), 1).await,
            Err(TicketingError::NotFound { .. })
        ));
        assert!(matches!(
            service.purchase(EventId::new(), 0).await,
            Err(TicketingError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn stats_follow_the_clock() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let service = service(store);
        let id = service
            .create_event(new_event("15/11/2024", 100.0, 15.0))
            .await
            .unwrap();
        service.purchase(id, 80).await.unwrap();
        // After the clock's "now" (2024-11-20): outside the window.
        service
            .create_event(new_event("25/11/2024", 100.0, 15.0))
            .await
            .unwrap();

        let stats = service.monthly_stats().await.unwrap();

        assert_eq!(stats.len(), 12);
        assert_eq!((stats[0].year, stats[0].month), (2024, 11));
        assert_eq!(stats[0].n_events, 1);
        assert_eq!(stats[0].revenue, Money::from_cents(120_000));
        assert_eq!(stats[0].average_tickets_sold, 80);
    }

    /// Store that reports a lost race on every commit.
    struct AlwaysRacingStore(InMemoryLedgerStore);

    impl LedgerStore for AlwaysRacingStore {
        fn find_event_by_id(&self, id: EventId) -> LedgerFuture<'_, Option<Event>> {
            self.0.find_event_by_id(id)
        }
        fn insert_event(&self, event: Event) -> LedgerFuture<'_, EventId> {
            self.0.insert_event(event)
        }
        fn update_event(&self, event: Event) -> LedgerFuture<'_, ()> {
            self.0.update_event(event)
        }
        fn find_all_events(&self, range: Option<DateRange>) -> LedgerFuture<'_, Vec<Event>> {
            self.0.find_all_events(range)
        }
        fn insert_ticket_transaction(&self, tx: TicketTransaction) -> LedgerFuture<'_, TicketId> {
            self.0.insert_ticket_transaction(tx)
        }
        fn find_all_ticket_transactions(&self) -> LedgerFuture<'_, Vec<TicketTransaction>> {
            self.0.find_all_ticket_transactions()
        }
        fn commit_purchase(&self, tx: TicketTransaction, expected: u32) -> LedgerFuture<'_, Event> {
            Box::pin(async move {
                Err(LedgerError::ConcurrencyConflict {
                    event_id: tx.event,
                    expected,
                    actual: expected + 1,
                })
            })
        }
        fn ping(&self) -> LedgerFuture<'_, ()> {
            self.0.ping()
        }
    }

    /// Store where another buyer commits just before the first purchase does.
    struct InterleavedSaleStore {
        inner: InMemoryLedgerStore,
        raced: AtomicBool,
        competing_tickets: u32,
    }

    impl LedgerStore for InterleavedSaleStore {
        fn find_event_by_id(&self, id: EventId) -> LedgerFuture<'_, Option<Event>> {
            self.inner.find_event_by_id(id)
        }
        fn insert_event(&self, event: Event) -> LedgerFuture<'_, EventId> {
            self.inner.insert_event(event)
        }
        fn update_event(&self, event: Event) -> LedgerFuture<'_, ()> {
            self.inner.update_event(event)
        }
        fn find_all_events(&self, range: Option<DateRange>) -> LedgerFuture<'_, Vec<Event>> {
            self.inner.find_all_events(range)
        }
        fn insert_ticket_transaction(&self, tx: TicketTransaction) -> LedgerFuture<'_, TicketId> {
            self.inner.insert_ticket_transaction(tx)
        }
        fn find_all_ticket_transactions(&self) -> LedgerFuture<'_, Vec<TicketTransaction>> {
            self.inner.find_all_ticket_transactions()
        }
        fn commit_purchase(&self, tx: TicketTransaction, expected: u32) -> LedgerFuture<'_, Event> {
            Box::pin(async move {
                if !self.raced.swap(true, Ordering::SeqCst) {
                    let competing = TicketTransaction::new(
                        tx.event,
                        self.competing_tickets,
                        Money::ZERO,
                        tx.transaction_date,
                    );
                    self.inner.commit_purchase(competing, expected).await?;
                }
                self.inner.commit_purchase(tx, expected).await
            })
        }
        fn ping(&self) -> LedgerFuture<'_, ()> {
            self.inner.ping()
        }
    }

    fn interleaved(competing_tickets: u32) -> Arc<InterleavedSaleStore> {
        Arc::new(InterleavedSaleStore {
            inner: InMemoryLedgerStore::new(),
            raced: AtomicBool::new(false),
            competing_tickets,
        })
    }

    #[tokio::test]
    async fn concurrent_sale_that_leaves_room_does_not_fail_purchase() {
        let store = interleaved(4);
        // A single attempt: the purchase must not need a retry
        let service = TicketingService::new(store.clone(), Arc::new(test_clock()), 1);
        let id = service
            .create_event(new_event("01/06/2024", 10.0, 1.0))
            .await
            .unwrap();

        let receipt = service.purchase(id, 3).await.unwrap();

        assert_eq!(receipt.remaining_capacity, 3);
        assert_eq!(store.inner.ledger_tickets_for(id), 7);
    }

    #[tokio::test]
    async fn concurrent_sale_that_fills_event_reports_capacity() {
        let store = interleaved(8);
        let service = TicketingService::new(store.clone(), Arc::new(test_clock()), 5);
        let id = service
            .create_event(new_event("01/06/2024", 10.0, 1.0))
            .await
            .unwrap();

        let err = service.purchase(id, 3).await.unwrap_err();

        assert_eq!(
            err,
            TicketingError::CapacityExceeded {
                requested: 3,
                available: 2
            }
        );
        assert_eq!(store.inner.ledger_tickets_for(id), 8);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let store = Arc::new(AlwaysRacingStore(InMemoryLedgerStore::new()));
        let service = TicketingService::new(store, Arc::new(test_clock()), 3);
        let id = service
            .create_event(new_event("01/06/2024", 10.0, 1.0))
            .await
            .unwrap();

        let err = service.purchase(id, 1).await.unwrap_err();

        assert_eq!(err, TicketingError::Conflict(CONTENTION_MESSAGE.to_string()));
    }
}
