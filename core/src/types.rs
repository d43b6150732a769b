//! Domain types for the ticketing backend.
//!
//! Value objects (identifiers, [`Money`], [`Capacity`]) and the two persisted
//! entities: [`Event`] and [`TicketTransaction`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Unique identifier for a ticket purchase transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(Uuid);

impl TicketId {
    /// Creates a new random `TicketId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `TicketId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from a decimal amount (e.g. `12.5` → 1250 cents).
    ///
    /// Rounds to the nearest cent. Returns `None` for negative, NaN, infinite
    /// or out-of-range amounts.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn from_decimal(amount: f64) -> Option<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return None;
        }
        let cents = (amount * 100.0).round();
        if cents > u64::MAX as f64 {
            return None;
        }
        Some(Self(cents as u64))
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Returns the amount as a decimal number (cents / 100)
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts, clamping at the maximum representable value
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Multiplies money by a quantity with overflow checking
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Capacity
// ============================================================================

/// Maximum number of tickets an event can sell
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Capacity(pub u32);

impl Capacity {
    /// Creates a new `Capacity`
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the capacity value
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Date range
// ============================================================================

/// Inclusive calendar date range used to scan events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day included
    pub start: NaiveDate,
    /// Last day included
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a new inclusive range
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether `date` falls inside the range
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A ticketed event.
///
/// `tickets_sold` is a cached sum of the event's transactions and is only
/// ever increased through the capacity guard. At all times
/// `tickets_sold <= capacity`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event ID
    pub id: EventId,
    /// Display name
    pub name: String,
    /// Calendar date (unique across events)
    pub date: NaiveDate,
    /// Maximum tickets
    pub capacity: Capacity,
    /// Price of a single ticket
    pub cost_per_ticket: Money,
    /// Tickets sold so far
    pub tickets_sold: u32,
    /// When the event was recorded
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Creates a new event with a fresh ID and no tickets sold
    #[must_use]
    pub fn new(
        name: String,
        date: NaiveDate,
        capacity: Capacity,
        cost_per_ticket: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EventId::new(),
            name,
            date,
            capacity,
            cost_per_ticket,
            tickets_sold: 0,
            created_at,
        }
    }

    /// Seats still available for purchase
    #[must_use]
    pub const fn remaining_capacity(&self) -> u32 {
        self.capacity.value().saturating_sub(self.tickets_sold)
    }
}

/// An immutable record of one successful ticket purchase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketTransaction {
    /// Transaction ID
    pub id: TicketId,
    /// Event the tickets belong to
    pub event: EventId,
    /// Number of tickets bought
    pub n_tickets: u32,
    /// `n_tickets` × the event's price at time of purchase
    pub total_cost: Money,
    /// When the purchase happened
    pub transaction_date: DateTime<Utc>,
}

impl TicketTransaction {
    /// Creates a new transaction with a fresh ID
    #[must_use]
    pub fn new(
        event: EventId,
        n_tickets: u32,
        total_cost: Money,
        transaction_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TicketId::new(),
            event,
            n_tickets,
            total_cost,
            transaction_date,
        }
    }
}
