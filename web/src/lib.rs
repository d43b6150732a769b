//! Axum glue shared by the ticketing HTTP server.
//!
//! Domain logic lives in `ticketing-core`; this crate only turns its results
//! into HTTP:
//!
//! - [`AppError`]: `TicketingError` to status code and `{code, message}` body
//! - [`middleware`]: correlation-id layer and extractor
//! - [`handlers`]: `/health` and `/ready`
//!
//! # Example
//!
//! ```ignore
//! use ticketing_web::{AppError, correlation_id_layer};
//! use axum::{Router, routing::post, Json};
//!
//! async fn create(Json(body): Json<CreateEventRequest>) -> Result<Json<Created>, AppError> {
//!     let id = service.create_event(body.into_input()?).await?;
//!     Ok(Json(Created { event_id: id }))
//! }
//!
//! let app = Router::new()
//!     .route("/events", post(create))
//!     .layer(correlation_id_layer());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod handlers;
pub mod middleware;

pub use error::AppError;
pub use middleware::{CORRELATION_ID_HEADER, CorrelationId, correlation_id_layer};
