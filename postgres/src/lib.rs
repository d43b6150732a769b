//! `PostgreSQL` ledger store for the ticketing backend.
//!
//! Implements [`LedgerStore`] from `ticketing-core` on two tables:
//!
//! ```text
//! events  (id, name, event_date UNIQUE, capacity, cost_cents, tickets_sold, created_at)
//! tickets (id, event_id -> events.id, n_tickets, total_cost_cents, transaction_date)
//! ```
//!
//! Purchases lock the event row, add to `tickets_sold` only while the result
//! stays within `capacity`, and insert the ticket row in the same SQL
//! transaction.
//!
//! # Example
//!
//! ```ignore
//! use sqlx::postgres::PgPoolOptions;
//! use ticketing_postgres::PostgresLedgerStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = PgPoolOptions::new()
//!         .max_connections(10)
//!         .connect("postgres://localhost/ticketing")
//!         .await?;
//!     let store = PostgresLedgerStore::from_pool(pool);
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use ticketing_core::ledger::{LedgerError, LedgerFuture, LedgerStore};
use ticketing_core::{
    Capacity, DateRange, Event, EventId, Money, TicketId, TicketTransaction,
};
use uuid::Uuid;

/// Raw `events` row.
type EventRow = (Uuid, String, NaiveDate, i32, i64, i32, DateTime<Utc>);

/// Raw `tickets` row.
type TicketRow = (Uuid, Uuid, i32, i64, DateTime<Utc>);

const EVENT_COLUMNS: &str =
    "id, name, event_date, capacity, cost_cents, tickets_sold, created_at";

const TICKET_COLUMNS: &str = "id, event_id, n_tickets, total_cost_cents, transaction_date";

fn out_of_range(column: &str) -> LedgerError {
    LedgerError::Database(format!("Column {column} out of range"))
}

fn event_from_row(row: EventRow) -> Result<Event, LedgerError> {
    let (id, name, date, capacity, cost_cents, tickets_sold, created_at) = row;
    Ok(Event {
        id: EventId::from_uuid(id),
        name,
        date,
        capacity: Capacity::new(u32::try_from(capacity).map_err(|_| out_of_range("capacity"))?),
        cost_per_ticket: Money::from_cents(
            u64::try_from(cost_cents).map_err(|_| out_of_range("cost_cents"))?,
        ),
        tickets_sold: u32::try_from(tickets_sold).map_err(|_| out_of_range("tickets_sold"))?,
        created_at,
    })
}

fn transaction_from_row(row: TicketRow) -> Result<TicketTransaction, LedgerError> {
    let (id, event_id, n_tickets, total_cost_cents, transaction_date) = row;
    Ok(TicketTransaction {
        id: TicketId::from_uuid(id),
        event: EventId::from_uuid(event_id),
        n_tickets: u32::try_from(n_tickets).map_err(|_| out_of_range("n_tickets"))?,
        total_cost: Money::from_cents(
            u64::try_from(total_cost_cents).map_err(|_| out_of_range("total_cost_cents"))?,
        ),
        transaction_date,
    })
}

fn to_i32(value: u32, column: &str) -> Result<i32, LedgerError> {
    i32::try_from(value).map_err(|_| out_of_range(column))
}

fn to_i64(money: Money, column: &str) -> Result<i64, LedgerError> {
    i64::try_from(money.cents()).map_err(|_| out_of_range(column))
}

/// Maps unique violations on `event_date` to [`LedgerError::DuplicateDate`].
fn event_write_error(err: &sqlx::Error, date: NaiveDate, action: &str) -> LedgerError {
    if let sqlx::Error::Database(db_err) = err {
        if db_err.is_unique_violation() {
            return LedgerError::DuplicateDate(date);
        }
    }
    LedgerError::Database(format!("Failed to {action} event: {err}"))
}

/// `PostgreSQL`-backed ledger store.
#[derive(Clone, Debug)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `events` and `tickets` tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), LedgerError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| LedgerError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl LedgerStore for PostgresLedgerStore {
    fn find_event_by_id(&self, id: EventId) -> LedgerFuture<'_, Option<Event>> {
        Box::pin(async move {
            let query = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
            let row: Option<EventRow> = sqlx::query_as(&query)
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| LedgerError::Database(format!("Failed to load event: {e}")))?;
            row.map(event_from_row).transpose()
        })
    }

    fn insert_event(&self, event: Event) -> LedgerFuture<'_, EventId> {
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO events (id, name, event_date, capacity, cost_cents, tickets_sold, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(event.id.as_uuid())
            .bind(&event.name)
            .bind(event.date)
            .bind(to_i32(event.capacity.value(), "capacity")?)
            .bind(to_i64(event.cost_per_ticket, "cost_cents")?)
            .bind(to_i32(event.tickets_sold, "tickets_sold")?)
            .bind(event.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| event_write_error(&e, event.date, "insert"))?;

            tracing::debug!(event_id = %event.id, date = %event.date, "Event stored");
            Ok(event.id)
        })
    }

    fn update_event(&self, event: Event) -> LedgerFuture<'_, ()> {
        Box::pin(async move {
            let result = sqlx::query(
                "UPDATE events
                 SET name = $2, event_date = $3, capacity = $4, cost_cents = $5, tickets_sold = $6
                 WHERE id = $1",
            )
            .bind(event.id.as_uuid())
            .bind(&event.name)
            .bind(event.date)
            .bind(to_i32(event.capacity.value(), "capacity")?)
            .bind(to_i64(event.cost_per_ticket, "cost_cents")?)
            .bind(to_i32(event.tickets_sold, "tickets_sold")?)
            .execute(&self.pool)
            .await
            .map_err(|e| event_write_error(&e, event.date, "update"))?;

            if result.rows_affected() == 0 {
                return Err(LedgerError::EventNotFound(event.id));
            }
            Ok(())
        })
    }

    fn find_all_events(&self, range: Option<DateRange>) -> LedgerFuture<'_, Vec<Event>> {
        Box::pin(async move {
            let result: Result<Vec<EventRow>, sqlx::Error> = if let Some(range) = range {
                let query = format!(
                    "SELECT {EVENT_COLUMNS} FROM events
                     WHERE event_date >= $1 AND event_date <= $2
                     ORDER BY event_date"
                );
                sqlx::query_as(&query)
                    .bind(range.start)
                    .bind(range.end)
                    .fetch_all(&self.pool)
                    .await
            } else {
                let query = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY event_date");
                sqlx::query_as(&query).fetch_all(&self.pool).await
            };
            let rows =
                result.map_err(|e| LedgerError::Database(format!("Failed to list events: {e}")))?;

            rows.into_iter().map(event_from_row).collect()
        })
    }

    fn insert_ticket_transaction(
        &self,
        transaction: TicketTransaction,
    ) -> LedgerFuture<'_, TicketId> {
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO tickets (id, event_id, n_tickets, total_cost_cents, transaction_date)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(transaction.id.as_uuid())
            .bind(transaction.event.as_uuid())
            .bind(to_i32(transaction.n_tickets, "n_tickets")?)
            .bind(to_i64(transaction.total_cost, "total_cost_cents")?)
            .bind(transaction.transaction_date)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return LedgerError::EventNotFound(transaction.event);
                    }
                }
                LedgerError::Database(format!("Failed to insert ticket: {e}"))
            })?;
            Ok(transaction.id)
        })
    }

    fn find_all_ticket_transactions(&self) -> LedgerFuture<'_, Vec<TicketTransaction>> {
        Box::pin(async move {
            let query = format!("SELECT {TICKET_COLUMNS} FROM tickets ORDER BY transaction_date");
            let rows: Vec<TicketRow> = sqlx::query_as(&query)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| LedgerError::Database(format!("Failed to list tickets: {e}")))?;
            rows.into_iter().map(transaction_from_row).collect()
        })
    }

    fn commit_purchase(
        &self,
        transaction: TicketTransaction,
        expected_tickets_sold: u32,
    ) -> LedgerFuture<'_, Event> {
        Box::pin(async move {
            let event_id = transaction.event;
            let n_tickets = to_i32(transaction.n_tickets, "n_tickets")?;

            // Dropping `tx` without commit rolls it back.
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| LedgerError::Database(format!("Failed to start transaction: {e}")))?;

            // Row lock: concurrent purchases of the same event queue here.
            let locked: Option<(i32,)> =
                sqlx::query_as("SELECT tickets_sold FROM events WHERE id = $1 FOR UPDATE")
                    .bind(event_id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| LedgerError::Database(format!("Failed to lock event: {e}")))?;

            let Some((actual,)) = locked else {
                return Err(LedgerError::EventNotFound(event_id));
            };

            let query = format!(
                "UPDATE events SET tickets_sold = tickets_sold + $2
                 WHERE id = $1 AND tickets_sold + $2 <= capacity
                 RETURNING {EVENT_COLUMNS}"
            );
            let updated: Option<EventRow> = sqlx::query_as(&query)
                .bind(event_id.as_uuid())
                .bind(n_tickets)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| LedgerError::Database(format!("Failed to update event: {e}")))?;

            let Some(updated) = updated else {
                return Err(LedgerError::ConcurrencyConflict {
                    event_id,
                    expected: expected_tickets_sold,
                    actual: u32::try_from(actual).map_err(|_| out_of_range("tickets_sold"))?,
                });
            };

            sqlx::query(
                "INSERT INTO tickets (id, event_id, n_tickets, total_cost_cents, transaction_date)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(transaction.id.as_uuid())
            .bind(event_id.as_uuid())
            .bind(n_tickets)
            .bind(to_i64(transaction.total_cost, "total_cost_cents")?)
            .bind(transaction.transaction_date)
            .execute(&mut *tx)
            .await
            .map_err(|e| LedgerError::Database(format!("Failed to insert ticket: {e}")))?;

            tx.commit()
                .await
                .map_err(|e| LedgerError::Database(format!("Failed to commit transaction: {e}")))?;

            tracing::debug!(
                event_id = %event_id,
                ticket_id = %transaction.id,
                n_tickets = transaction.n_tickets,
                "Purchase committed"
            );
            event_from_row(updated)
        })
    }

    fn ping(&self) -> LedgerFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(|e| LedgerError::Database(format!("Ping failed: {e}")))?;
            Ok(())
        })
    }
}
