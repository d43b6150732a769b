//! Infrastructure setup: turns a [`Config`] into ready-to-serve resources.
//!
//! ```text
//! Config ──► connect ledger store (postgres pool + migrations | in-memory)
//!        ──► SystemClock
//!        ──► AppState
//! ```

use crate::config::{Config, DatabaseConfig, LedgerBackend};
use crate::server::AppState;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use thiserror::Error;
use ticketing_core::LedgerStore;
use ticketing_core::environment::{Clock, SystemClock};
use ticketing_core::ledger::LedgerError;
use ticketing_postgres::PostgresLedgerStore;
use ticketing_testing::InMemoryLedgerStore;
use tracing::info;

/// Errors raised while wiring up infrastructure.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Could not open the connection pool.
    #[error("Failed to connect to database: {0}")]
    Connect(#[from] sqlx::Error),

    /// Migrations failed.
    #[error("Failed to prepare ledger store: {0}")]
    Ledger(#[from] LedgerError),
}

/// Shared infrastructure for the server.
#[derive(Clone)]
pub struct Resources {
    /// Application configuration
    pub config: Arc<Config>,
    /// Event and ticket storage
    pub store: Arc<dyn LedgerStore>,
    /// System clock for timestamps
    pub clock: Arc<dyn Clock>,
}

impl Resources {
    /// Connect to the configured ledger backend.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError`] if the database is unreachable or migrations fail.
    pub async fn from_config(config: &Config) -> Result<Self, BootstrapError> {
        let store: Arc<dyn LedgerStore> = match config.ledger.backend {
            LedgerBackend::Postgres => Arc::new(connect_postgres(&config.database).await?),
            LedgerBackend::Memory => {
                tracing::warn!("Using in-memory ledger store; data will not survive a restart");
                Arc::new(InMemoryLedgerStore::new())
            }
        };

        Ok(Self {
            config: Arc::new(config.clone()),
            store,
            clock: Arc::new(SystemClock),
        })
    }

    /// Build the HTTP state from these resources.
    #[must_use]
    pub fn into_state(self, metrics: Option<PrometheusHandle>) -> AppState {
        AppState::new(
            self.store,
            self.clock,
            self.config.ledger.purchase_max_attempts,
            metrics,
        )
    }
}

async fn connect_postgres(database: &DatabaseConfig) -> Result<PostgresLedgerStore, BootstrapError> {
    info!("Connecting to ledger database...");
    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .min_connections(database.min_connections)
        .acquire_timeout(database.connect_timeout())
        .idle_timeout(database.idle_timeout())
        .connect(&database.url)
        .await?;

    let store = PostgresLedgerStore::from_pool(pool);
    if database.run_migrations {
        info!("Running ledger migrations...");
        store.migrate().await?;
        info!("Ledger migrations complete");
    }
    Ok(store)
}
