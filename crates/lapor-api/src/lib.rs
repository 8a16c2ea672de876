//! JSON HTTP API for the Lapor warehouse.
//!
//! Two routers, both generic over the storage backend:
//!
//! - [`analytics_router`]: read-only dashboard aggregates.
//! - [`etl_router`]: triggers an ingestion batch.
//!
//! Auth and tracing are the caller's responsibility; the server binary wraps
//! the ETL router in basic auth.
//!
//! # Mounting
//!
//! ```rust,ignore
//! Router::new()
//!   .nest("/api/analytics", lapor_api::analytics_router(warehouse.clone()))
//!   .nest("/api/etl", lapor_api::etl_router(state))
//! ```

pub mod analytics;
pub mod error;
pub mod etl;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use lapor_core::{batch::ReportSource, store::Warehouse};

pub use error::ApiError;
pub use etl::EtlState;

/// Build the analytics router for `warehouse`.
pub fn analytics_router<W>(warehouse: Arc<W>) -> Router<()>
where
  W: Warehouse + 'static,
{
  Router::new()
    .route("/ranking", get(analytics::ranking::<W>))
    .route("/sla-compliance", get(analytics::sla_compliance::<W>))
    .route("/mttr-by-type", get(analytics::mttr_by_type::<W>))
    .route("/report-type-distribution", get(analytics::report_type_distribution::<W>))
    .route("/heatmap", get(analytics::heatmap::<W>))
    .route("/escalation", get(analytics::escalation::<W>))
    .route("/overview", get(analytics::overview::<W>))
    .route("/recent-reports", get(analytics::recent_reports::<W>))
    .with_state(warehouse)
}

/// Build the ETL router. `POST /run` runs one batch to completion before
/// responding.
pub fn etl_router<W, R>(state: EtlState<W, R>) -> Router<()>
where
  W: Warehouse + 'static,
  R: ReportSource + 'static,
{
  Router::new()
    .route("/run", post(etl::run::<W, R>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
