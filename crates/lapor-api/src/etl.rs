//! `POST /etl/run`.

use std::sync::Arc;

use axum::{Json, extract::State};
use lapor_core::{
  batch::{BatchOptions, FailedReport, ReportSource, run_batch},
  store::Warehouse,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;

/// Everything a batch run needs. The options are fixed at start-up.
pub struct EtlState<W, R> {
  pub warehouse: Arc<W>,
  pub source:    Arc<R>,
  pub options:   BatchOptions,
}

// Manual impl: cloning only bumps the `Arc`s, so `W` and `R` need not be
// `Clone` themselves.
impl<W, R> Clone for EtlState<W, R> {
  fn clone(&self) -> Self {
    Self {
      warehouse: Arc::clone(&self.warehouse),
      source:    Arc::clone(&self.source),
      options:   self.options,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct EtlRunResponse {
  pub message:   String,
  pub processed: usize,
  pub succeeded: Vec<Uuid>,
  pub failed:    Vec<FailedReport>,
}

pub async fn run<W, R>(
  State(state): State<EtlState<W, R>>,
) -> Result<Json<EtlRunResponse>, ApiError>
where
  W: Warehouse,
  R: ReportSource,
{
  let report = run_batch(&*state.source, &*state.warehouse, state.options).await?;
  info!(
    processed = report.processed,
    failed = report.failed.len(),
    "etl run finished via api"
  );

  let message = if report.failed.is_empty() {
    "ETL process completed successfully".to_string()
  } else {
    format!("ETL process completed with {} failed reports", report.failed.len())
  };

  Ok(Json(EtlRunResponse {
    message,
    processed: report.processed,
    succeeded: report.succeeded,
    failed:    report.failed,
  }))
}
