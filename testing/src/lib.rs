//! # Ticketing Testing
//!
//! Testing utilities and helpers for the ticketing backend.
//!
//! This crate provides:
//! - [`FixedClock`]: deterministic time for services under test
//! - [`InMemoryLedgerStore`]: a `LedgerStore` backed by a `HashMap`
//! - [`fixtures`]: builders for events and transactions
//!
//! ## Example
//!
//! ```ignore
//! use ticketing_testing::{test_clock, InMemoryLedgerStore};
//!
//! #[tokio::test]
//! async fn test_purchase_flow() {
//!     let store = Arc::new(InMemoryLedgerStore::new());
//!     let service = TicketingService::new(store.clone(), Arc::new(test_clock()), 5);
//!     // ...
//! }
//! ```

use chrono::{DateTime, Utc};
use ticketing_core::environment::Clock;

pub mod fixtures;
mod ledger;

pub use ledger::InMemoryLedgerStore;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::RwLock;

    /// Fixed clock for deterministic tests
    ///
    /// Returns the same time until [`FixedClock::set`] moves it.
    ///
    /// # Example
    ///
    /// ```
    /// use ticketing_testing::mocks::FixedClock;
    /// use ticketing_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug)]
    pub struct FixedClock {
        time: RwLock<DateTime<Utc>>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: RwLock::new(time),
            }
        }

        /// Move the clock to `time`
        pub fn set(&self, time: DateTime<Utc>) {
            if let Ok(mut guard) = self.time.write() {
                *guard = time;
            }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time.read().map_or_else(|poisoned| *poisoned.into_inner(), |guard| *guard)
        }
    }

    /// Create a default fixed clock for tests (2024-11-20 12:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2024-11-20T12:00:00Z")
                .map_or_else(|_| Utc::now(), |time| time.with_timezone(&Utc)),
        )
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
        assert_eq!(time1.to_rfc3339(), "2024-11-20T12:00:00+00:00");
    }

    #[test]
    fn test_fixed_clock_can_move() {
        let clock = test_clock();
        let later = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single();
        if let Some(later) = later {
            clock.set(later);
            assert_eq!(clock.now(), later);
        }
    }
}
