//! Concurrency tests for last-ticket scenarios.
//!
//! Many buyers race for the same event through `TicketingService` with the
//! default attempt budget. The sold count must never exceed capacity and must
//! equal the ledger sum, and no buyer fails while tickets remain.
//!
//! Run with: `cargo test --test concurrency_test -- --nocapture`

#![allow(clippy::expect_used, clippy::unwrap_used)]

use futures::future::join_all;
use std::sync::Arc;
use ticketing::{NewEvent, TicketingService};
use ticketing_core::{LedgerStore, TicketingError};
use ticketing_testing::{InMemoryLedgerStore, test_clock};

async fn setup(capacity: f64) -> (Arc<InMemoryLedgerStore>, TicketingService, ticketing_core::EventId) {
    let store = Arc::new(InMemoryLedgerStore::new());
    let service = TicketingService::new(store.clone(), Arc::new(test_clock()), 5);
    let event_id = service
        .create_event(NewEvent {
            name: "Last Seat".to_string(),
            date: "20/11/2024".to_string(),
            capacity,
            cost_per_ticket: 25.0,
        })
        .await
        .unwrap();
    (store, service, event_id)
}

/// 100 concurrent single-ticket purchases for 1 ticket: exactly one wins.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_100_buyers_for_last_ticket() {
    let (store, service, event_id) = setup(1.0).await;

    let handles = (0..100).map(|_| {
        let service = service.clone();
        tokio::spawn(async move { service.purchase(event_id, 1).await })
    });
    let results: Vec<_> = join_all(handles).await.into_iter().map(Result::unwrap).collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let sold_out = results
        .iter()
        .filter(|r| matches!(r, Err(TicketingError::CapacityExceeded { .. })))
        .count();

    println!("successes: {successes}, sold out: {sold_out}");
    assert_eq!(successes, 1);
    assert_eq!(sold_out, 99);

    let event = store.find_event_by_id(event_id).await.unwrap().unwrap();
    assert_eq!(event.tickets_sold, 1);
    assert_eq!(store.ledger_tickets_for(event_id), 1);
}

/// Mixed quantities against a larger event never oversell.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_mixed_quantities_never_oversell() {
    let (store, service, event_id) = setup(50.0).await;

    let handles = (0..60_u32).map(|i| {
        let service = service.clone();
        tokio::spawn(async move { service.purchase(event_id, i % 4 + 1).await })
    });
    let results: Vec<_> = join_all(handles).await.into_iter().map(Result::unwrap).collect();

    let sold: u32 = results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .map(|receipt| receipt.tickets)
        .sum();
    let event = store.find_event_by_id(event_id).await.unwrap().unwrap();

    assert!(event.tickets_sold <= 50);
    // Every rejection happened with fewer tickets left than requested
    assert!(event.tickets_sold > 50 - 4);
    assert_eq!(event.tickets_sold, sold);
    assert_eq!(store.ledger_tickets_for(event_id), u64::from(sold));
    assert!(
        results
            .iter()
            .all(|r| matches!(r, Ok(_) | Err(TicketingError::CapacityExceeded { .. })))
    );
}
