//! Monthly Aggregator: trailing 12-month sales statistics.
//!
//! Turns a snapshot of events and the ticket ledger into exactly twelve
//! [`MonthStat`] buckets, one per calendar month, newest first:
//!
//! ```text
//! as_of = 2025-02-10
//!
//!   [0] 2025-02   [1] 2025-01   [2] 2024-12   ...   [11] 2024-03
//! ```
//!
//! An event belongs to the bucket of its own `date`. Its transactions count
//! toward that bucket no matter when they were made. Tickets sold are summed
//! from the ledger rather than read from `Event::tickets_sold`, so the
//! sell-through rate stays correct even if the cached counter drifts.

use crate::types::{DateRange, Event, EventId, Money, TicketTransaction};
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of buckets in the statistics window.
pub const WINDOW_MONTHS: u32 = 12;

/// A calendar month.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    /// Calendar year
    pub year: i32,
    /// Month, 1-12
    pub month: u32,
}

impl YearMonth {
    /// The month containing `date`
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The calendar month before this one (January rolls back to December).
    #[must_use]
    pub const fn previous(self) -> Self {
        if self.month <= 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

/// Statistics for one calendar month.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthStat {
    /// Calendar year
    pub year: i32,
    /// Month, 1-12
    pub month: u32,
    /// Sum of `total_cost` over transactions for events held this month
    pub revenue: Money,
    /// Events held this month
    pub n_events: u32,
    /// Sell-through rate in whole percent (round half up)
    pub average_tickets_sold: u32,
}

impl MonthStat {
    /// A bucket with no events
    #[must_use]
    pub const fn empty(month: YearMonth) -> Self {
        Self {
            year: month.year,
            month: month.month,
            revenue: Money::ZERO,
            n_events: 0,
            average_tickets_sold: 0,
        }
    }
}

/// The twelve months of the window ending at `as_of`, most recent first.
#[must_use]
pub fn window_months(as_of: DateTime<Utc>) -> Vec<YearMonth> {
    std::iter::successors(Some(YearMonth::of(as_of.date_naive())), |m| Some(m.previous()))
        .take(WINDOW_MONTHS as usize)
        .collect()
}

/// Date range covering the window: first day of the oldest month through `as_of`.
///
/// Used to restrict the event scan. Events later in the current month than
/// `as_of` are outside the range.
#[must_use]
pub fn stats_window(as_of: DateTime<Utc>) -> DateRange {
    let end = as_of.date_naive();
    let start = end
        .with_day(1)
        .and_then(|first| first.checked_sub_months(Months::new(WINDOW_MONTHS - 1)))
        .unwrap_or(NaiveDate::MIN);
    DateRange::new(start, end)
}

/// Per-event totals recomputed from the ledger.
#[derive(Clone, Copy, Debug, Default)]
struct EventSales {
    revenue: Money,
    tickets: u64,
}

/// Round-half-up percentage of `sold` over `capacity`; 0 when capacity is 0.
fn sell_through_percent(sold: u64, capacity: u64) -> u32 {
    if capacity == 0 {
        return 0;
    }
    let sold = u128::from(sold);
    let capacity = u128::from(capacity);
    let percent = (sold * 200 + capacity) / (capacity * 2);
    u32::try_from(percent).unwrap_or(u32::MAX)
}

/// Builds the 12-month series ending at the month containing `as_of`.
///
/// Always returns exactly [`WINDOW_MONTHS`] entries, most recent first. Events
/// outside the window and transactions for unknown events are ignored.
#[must_use]
pub fn aggregate(
    events: &[Event],
    transactions: &[TicketTransaction],
    as_of: DateTime<Utc>,
) -> Vec<MonthStat> {
    let mut sales: HashMap<EventId, EventSales> = HashMap::new();
    for transaction in transactions {
        let entry = sales.entry(transaction.event).or_default();
        entry.revenue = entry.revenue.saturating_add(transaction.total_cost);
        entry.tickets += u64::from(transaction.n_tickets);
    }

    let mut by_month: HashMap<YearMonth, Vec<&Event>> = HashMap::new();
    for event in events {
        by_month.entry(YearMonth::of(event.date)).or_default().push(event);
    }

    window_months(as_of)
        .into_iter()
        .map(|month| {
            let Some(month_events) = by_month.get(&month) else {
                return MonthStat::empty(month);
            };

            let mut revenue = Money::ZERO;
            let mut tickets_sold = 0_u64;
            let mut total_capacity = 0_u64;
            for event in month_events {
                let event_sales = sales.get(&event.id).copied().unwrap_or_default();
                revenue = revenue.saturating_add(event_sales.revenue);
                tickets_sold += event_sales.tickets;
                total_capacity += u64::from(event.capacity.value());
            }

            MonthStat {
                year: month.year,
                month: month.month,
                revenue,
                n_events: u32::try_from(month_events.len()).unwrap_or(u32::MAX),
                average_tickets_sold: sell_through_percent(tickets_sold, total_capacity),
            }
        })
        .collect()
}
