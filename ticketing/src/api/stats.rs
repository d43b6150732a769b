//! `GET /stats`

use crate::server::state::AppState;
use axum::{Json, extract::State};
use serde::Serialize;
use ticketing_core::stats::MonthStat;
use ticketing_web::{AppError, CorrelationId};

/// One month of statistics on the wire.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthStatResponse {
    /// Calendar year
    pub year: i32,
    /// Month, 1-12
    pub month: u32,
    /// Revenue as a decimal amount
    pub revenue: f64,
    /// Events held that month
    pub n_events: u32,
    /// Sell-through rate in whole percent
    pub average_tickets_sold: u32,
}

impl From<MonthStat> for MonthStatResponse {
    fn from(stat: MonthStat) -> Self {
        Self {
            year: stat.year,
            month: stat.month,
            revenue: stat.revenue.as_decimal(),
            n_events: stat.n_events,
            average_tickets_sold: stat.average_tickets_sold,
        }
    }
}

/// Twelve months of statistics, most recent first.
///
/// # Example
///
/// ```bash
/// curl http://localhost:3000/stats
/// # [{"year":2024,"month":11,"revenue":1200.0,"nEvents":1,"averageTicketsSold":80}, ...]
/// ```
pub async fn get_stats(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
) -> Result<Json<Vec<MonthStatResponse>>, AppError> {
    tracing::debug!(%correlation_id, "Fetching statistics");
    let stats = state.service.monthly_stats().await?;
    Ok(Json(stats.into_iter().map(MonthStatResponse::from).collect()))
}
