//! Event ticketing backend.
//!
//! Records events (name, date, capacity, price), sells tickets against them
//! without ever overselling, and reports trailing 12-month sales statistics.
//!
//! # Architecture
//!
//! ```text
//!  HTTP (axum)          api::{events, tickets, stats}
//!        │
//!        ▼
//!  TicketingService     validation, purchase re-check loop, logging, metrics
//!        │
//!        ├──► ticketing_core::capacity::admit      (pure)
//!        ├──► ticketing_core::stats::aggregate     (pure)
//!        ▼
//!  LedgerStore          PostgresLedgerStore | InMemoryLedgerStore
//! ```
//!
//! ## Overselling
//!
//! ```text
//! CRITICAL: tickets_sold + requested <= capacity
//!
//! The check and the write are committed together through
//! LedgerStore::commit_purchase, conditioned on the sold-count that was read.
//! A concurrent purchase makes the commit fail; the service re-reads and
//! re-checks instead of overwriting.
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod metrics;
pub mod server;
pub mod service;

pub use config::Config;
pub use server::{AppState, build_router};
pub use service::{NewEvent, PurchaseReceipt, TicketingService};
