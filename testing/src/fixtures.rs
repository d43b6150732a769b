//! Builders for events and ledger entries.
//!
//! Fixtures panic on impossible calendar dates; they are meant for tests only.

#![allow(clippy::expect_used)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use ticketing_core::{Capacity, Event, EventId, Money, TicketTransaction};

/// Creation timestamp shared by all fixtures (2024-01-01 00:00:00 UTC)
#[must_use]
pub fn fixture_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .expect("fixture time is valid")
}

/// An unsold event on the given calendar day.
///
/// # Panics
///
/// Panics if `year`/`month`/`day` is not a real date.
#[must_use]
pub fn event_on(year: i32, month: u32, day: u32, capacity: u32, price_cents: u64) -> Event {
    let date = NaiveDate::from_ymd_opt(year, month, day).expect("fixture date is valid");
    Event::new(
        format!("Event on {date}"),
        date,
        Capacity::new(capacity),
        Money::from_cents(price_cents),
        fixture_time(),
    )
}

/// A ledger entry for `event` made at [`fixture_time`].
#[must_use]
pub fn transaction_for(event: EventId, n_tickets: u32, total_cents: u64) -> TicketTransaction {
    TicketTransaction::new(
        event,
        n_tickets,
        Money::from_cents(total_cents),
        fixture_time(),
    )
}

/// A ledger entry priced from the event's `cost_per_ticket`.
#[must_use]
pub fn sale_of(event: &Event, n_tickets: u32) -> TicketTransaction {
    let total = event
        .cost_per_ticket
        .checked_multiply(n_tickets)
        .unwrap_or(Money::ZERO);
    TicketTransaction::new(event.id, n_tickets, total, fixture_time())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sale_is_priced_from_event() {
        let event = event_on(2024, 11, 15, 50, 1000);
        let sale = sale_of(&event, 5);
        assert_eq!(sale.event, event.id);
        assert_eq!(sale.total_cost, Money::from_cents(5000));
    }
}
