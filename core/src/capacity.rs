//! Capacity Guard: decides whether a purchase fits and what it costs.
//!
//! Pure function over an in-memory [`Event`]. The caller is responsible for
//! loading the current persisted event and for committing the resulting
//! [`Admission`] atomically (see `LedgerStore::commit_purchase`).
//!
//! ```text
//! CRITICAL: new_sold = tickets_sold + quantity
//!
//! if new_sold > capacity {
//!     return CapacityExceeded // nothing is written
//! }
//! ```

use crate::error::{Result, TicketingError};
use crate::types::{Event, Money, TicketTransaction};
use chrono::{DateTime, Utc};

/// Outcome of an admitted purchase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Admission {
    /// The new, not yet persisted, ledger entry
    pub transaction: TicketTransaction,
    /// Sold-count the decision was based on
    pub previous_tickets_sold: u32,
    /// Sold-count after the purchase
    pub new_tickets_sold: u32,
    /// `capacity - new_tickets_sold`
    pub remaining_capacity: u32,
}

impl Admission {
    /// Total charged for the purchase
    #[must_use]
    pub const fn total_cost(&self) -> Money {
        self.transaction.total_cost
    }

    /// Applies the admission to `event`, returning the updated event.
    #[must_use]
    pub fn apply_to(&self, mut event: Event) -> Event {
        event.tickets_sold = self.new_tickets_sold;
        event
    }
}

/// Checks `requested` tickets against `event` and prices the purchase.
///
/// # Errors
///
/// - [`TicketingError::Validation`] if `requested` is zero or the total cost overflows
/// - [`TicketingError::CapacityExceeded`] if `tickets_sold + requested > capacity`
pub fn admit(event: &Event, requested: u32, now: DateTime<Utc>) -> Result<Admission> {
    if requested == 0 {
        return Err(TicketingError::Validation(
            "Invalid input. Event ID and number of tickets (min 1) are required".to_string(),
        ));
    }

    let available = event.remaining_capacity();
    let new_tickets_sold = event
        .tickets_sold
        .checked_add(requested)
        .filter(|sold| *sold <= event.capacity.value())
        .ok_or(TicketingError::CapacityExceeded {
            requested,
            available,
        })?;

    let total_cost = event
        .cost_per_ticket
        .checked_multiply(requested)
        .ok_or_else(|| TicketingError::Validation("Total cost is too large".to_string()))?;

    Ok(Admission {
        transaction: TicketTransaction::new(event.id, requested, total_cost, now),
        previous_tickets_sold: event.tickets_sold,
        new_tickets_sold,
        remaining_capacity: event.capacity.value() - new_tickets_sold,
    })
}
