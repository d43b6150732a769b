//! In-memory ledger store.
//!
//! A single `RwLock` guards events and transactions together, so
//! [`LedgerStore::commit_purchase`] updates the sold-count and appends the
//! transaction inside one critical section.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use ticketing_core::ledger::{LedgerError, LedgerFuture, LedgerStore};
use ticketing_core::{DateRange, Event, EventId, TicketId, TicketTransaction};

#[derive(Debug, Default)]
struct Ledger {
    events: HashMap<EventId, Event>,
    transactions: Vec<TicketTransaction>,
}

impl Ledger {
    fn date_taken(&self, event: &Event) -> bool {
        self.events
            .values()
            .any(|existing| existing.date == event.date && existing.id != event.id)
    }
}

/// `HashMap`-backed [`LedgerStore`] for tests and local development.
///
/// # Example
///
/// ```
/// use ticketing_testing::InMemoryLedgerStore;
///
/// let store = InMemoryLedgerStore::new();
/// assert_eq!(store.event_count(), 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryLedgerStore {
    inner: Arc<RwLock<Ledger>>,
}

impl InMemoryLedgerStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Ledger>, LedgerError> {
        self.inner
            .read()
            .map_err(|_| LedgerError::Database("ledger lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Ledger>, LedgerError> {
        self.inner
            .write()
            .map_err(|_| LedgerError::Database("ledger lock poisoned".to_string()))
    }

    /// Number of stored events
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.read().map_or(0, |ledger| ledger.events.len())
    }

    /// Number of stored transactions
    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.read().map_or(0, |ledger| ledger.transactions.len())
    }

    /// Sum of `n_tickets` over the ledger entries of `event_id`
    #[must_use]
    pub fn ledger_tickets_for(&self, event_id: EventId) -> u64 {
        self.read().map_or(0, |ledger| {
            ledger
                .transactions
                .iter()
                .filter(|t| t.event == event_id)
                .map(|t| u64::from(t.n_tickets))
                .sum()
        })
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn find_event_by_id(&self, id: EventId) -> LedgerFuture<'_, Option<Event>> {
        Box::pin(async move { Ok(self.read()?.events.get(&id).cloned()) })
    }

    fn insert_event(&self, event: Event) -> LedgerFuture<'_, EventId> {
        Box::pin(async move {
            let mut ledger = self.write()?;
            if ledger.date_taken(&event) {
                return Err(LedgerError::DuplicateDate(event.date));
            }
            let id = event.id;
            ledger.events.insert(id, event);
            tracing::debug!(event_id = %id, "Event stored");
            Ok(id)
        })
    }

    fn update_event(&self, event: Event) -> LedgerFuture<'_, ()> {
        Box::pin(async move {
            let mut ledger = self.write()?;
            if !ledger.events.contains_key(&event.id) {
                return Err(LedgerError::EventNotFound(event.id));
            }
            if ledger.date_taken(&event) {
                return Err(LedgerError::DuplicateDate(event.date));
            }
            ledger.events.insert(event.id, event);
            Ok(())
        })
    }

    fn find_all_events(&self, range: Option<DateRange>) -> LedgerFuture<'_, Vec<Event>> {
        Box::pin(async move {
            let ledger = self.read()?;
            let mut events: Vec<Event> = ledger
                .events
                .values()
                .filter(|event| range.is_none_or(|r| r.contains(event.date)))
                .cloned()
                .collect();
            events.sort_by_key(|event| event.date);
            Ok(events)
        })
    }

    fn insert_ticket_transaction(
        &self,
        transaction: TicketTransaction,
    ) -> LedgerFuture<'_, TicketId> {
        Box::pin(async move {
            let mut ledger = self.write()?;
            if !ledger.events.contains_key(&transaction.event) {
                return Err(LedgerError::EventNotFound(transaction.event));
            }
            let id = transaction.id;
            ledger.transactions.push(transaction);
            Ok(id)
        })
    }

    fn find_all_ticket_transactions(&self) -> LedgerFuture<'_, Vec<TicketTransaction>> {
        Box::pin(async move { Ok(self.read()?.transactions.clone()) })
    }

    fn commit_purchase(
        &self,
        transaction: TicketTransaction,
        expected_tickets_sold: u32,
    ) -> LedgerFuture<'_, Event> {
        Box::pin(async move {
            let mut ledger = self.write()?;
            let event = ledger
                .events
                .get_mut(&transaction.event)
                .ok_or(LedgerError::EventNotFound(transaction.event))?;

            let new_sold = event
                .tickets_sold
                .checked_add(transaction.n_tickets)
                .filter(|sold| *sold <= event.capacity.value())
                .ok_or(LedgerError::ConcurrencyConflict {
                    event_id: event.id,
                    expected: expected_tickets_sold,
                    actual: event.tickets_sold,
                })?;

            event.tickets_sold = new_sold;
            let updated = event.clone();
            ledger.transactions.push(transaction);
            Ok(updated)
        })
    }

    fn ping(&self) -> LedgerFuture<'_, ()> {
        Box::pin(async move { self.read().map(|_| ()) })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::fixtures::{event_on, transaction_for};

    #[tokio::test]
    async fn rejects_duplicate_dates() {
        let store = InMemoryLedgerStore::new();
        store.insert_event(event_on(2024, 11, 15, 50, 1000)).await.unwrap();

        let err = store
            .insert_event(event_on(2024, 11, 15, 10, 500))
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::DuplicateDate(_)));
        assert_eq!(store.event_count(), 1);
    }

    #[tokio::test]
    async fn filters_events_by_range() {
        let store = InMemoryLedgerStore::new();
        let inside = event_on(2024, 6, 1, 10, 100);
        store.insert_event(inside.clone()).await.unwrap();
        store.insert_event(event_on(2023, 1, 1, 10, 100)).await.unwrap();

        let range = DateRange::new(inside.date, inside.date);
        let found = store.find_all_events(Some(range)).await.unwrap();

        assert_eq!(found, vec![inside]);
        assert_eq!(store.find_all_events(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_event_requires_existing_event() {
        let store = InMemoryLedgerStore::new();
        let event = event_on(2024, 6, 1, 10, 100);
        assert!(matches!(
            store.update_event(event.clone()).await,
            Err(LedgerError::EventNotFound(_))
        ));

        store.insert_event(event.clone()).await.unwrap();
        let mut renamed = event.clone();
        renamed.name = "Renamed".to_string();
        store.update_event(renamed).await.unwrap();

        let stored = store.find_event_by_id(event.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Renamed");
    }

    #[tokio::test]
    async fn transaction_must_reference_event() {
        let store = InMemoryLedgerStore::new();
        let orphan = transaction_for(EventId::new(), 1, 100);
        assert!(matches!(
            store.insert_ticket_transaction(orphan).await,
            Err(LedgerError::EventNotFound(_))
        ));

        let event = event_on(2024, 6, 1, 10, 100);
        store.insert_event(event.clone()).await.unwrap();
        let tx = transaction_for(event.id, 2, 200);
        let id = store.insert_ticket_transaction(tx.clone()).await.unwrap();
        assert_eq!(id, tx.id);
        assert_eq!(store.find_all_ticket_transactions().await.unwrap(), vec![tx]);
    }

    #[tokio::test]
    async fn commit_purchase_is_conditional() {
        let store = InMemoryLedgerStore::new();
        let event = event_on(2024, 6, 1, 10, 100);
        store.insert_event(event.clone()).await.unwrap();

        let updated = store
            .commit_purchase(transaction_for(event.id, 4, 400), 0)
            .await
            .unwrap();
        assert_eq!(updated.tickets_sold, 4);

        // Would exceed capacity
        let err = store
            .commit_purchase(transaction_for(event.id, 7, 700), 4)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::ConcurrencyConflict {
                event_id: event.id,
                expected: 4,
                actual: 4
            }
        );

        assert_eq!(store.transaction_count(), 1);
        assert_eq!(store.ledger_tickets_for(event.id), 4);
    }

    #[tokio::test]
    async fn stale_commit_that_still_fits_is_applied() {
        let store = InMemoryLedgerStore::new();
        let event = event_on(2024, 6, 1, 10, 100);
        store.insert_event(event.clone()).await.unwrap();
        store
            .commit_purchase(transaction_for(event.id, 4, 400), 0)
            .await
            .unwrap();

        // Admitted against 0 sold; 4 sold since, 3 more still fit
        let updated = store
            .commit_purchase(transaction_for(event.id, 3, 300), 0)
            .await
            .unwrap();
        assert_eq!(updated.tickets_sold, 7);

        // Admitted against 0 sold; 7 sold since, 4 more do not fit
        let err = store
            .commit_purchase(transaction_for(event.id, 4, 400), 0)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::ConcurrencyConflict {
                event_id: event.id,
                expected: 0,
                actual: 7
            }
        );

        assert_eq!(store.transaction_count(), 2);
        assert_eq!(store.ledger_tickets_for(event.id), 7);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_commits_never_oversell() {
        let store = InMemoryLedgerStore::new();
        let event = event_on(2024, 6, 1, 10, 100);
        store.insert_event(event.clone()).await.unwrap();

        let buyers: Vec<_> = (0..25)
            .map(|_| {
                let store = store.clone();
                let event_id = event.id;
                tokio::spawn(async move {
                    loop {
                        let current = store.find_event_by_id(event_id).await.unwrap().unwrap();
                        if current.remaining_capacity() == 0 {
                            return false;
                        }
                        let tx = transaction_for(event_id, 1, 100);
                        match store.commit_purchase(tx, current.tickets_sold).await {
                            Ok(_) => return true,
                            Err(LedgerError::ConcurrencyConflict { .. }) => {}
                            Err(other) => panic!("unexpected error {other:?}"),
                        }
                    }
                })
            })
            .collect();

        let results = futures::future::join_all(buyers).await;
        let winners = results.into_iter().filter(|r| *r.as_ref().unwrap()).count();

        assert_eq!(winners, 10);
        let stored = store.find_event_by_id(event.id).await.unwrap().unwrap();
        assert_eq!(stored.tickets_sold, 10);
        assert_eq!(store.ledger_tickets_for(event.id), 10);
    }

    #[tokio::test]
    async fn ping_succeeds() {
        assert!(InMemoryLedgerStore::new().ping().await.is_ok());
    }
}
