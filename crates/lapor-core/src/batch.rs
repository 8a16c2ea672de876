//! The ingestion orchestrator: pull every document from the upstream source
//! and push each through the warehouse in its own transaction.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result, raw::RawReport, store::Warehouse, warehouse::IngestPolicy,
};

/// Where raw report documents come from.
///
/// Documents are handed over undecoded so that one malformed document fails
/// on its own instead of failing the whole fetch.
pub trait ReportSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn fetch_reports(
    &self,
  ) -> impl Future<Output = Result<Vec<serde_json::Value>, Self::Error>> + Send + '_;
}

/// What the orchestrator does when a single report fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
  /// Record the failure and carry on with the next report.
  #[default]
  Isolate,
  /// Stop at the first failure with [`Error::BatchAborted`]. Reports already
  /// committed stay committed.
  AbortOnFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchOptions {
  #[serde(default)]
  pub policy:  IngestPolicy,
  #[serde(default)]
  pub failure: FailurePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedReport {
  /// `None` when the document was too broken to carry a readable id.
  pub report_id: Option<Uuid>,
  pub error:     String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
  /// Reports committed by this batch.
  pub processed:   usize,
  pub succeeded:   Vec<Uuid>,
  pub failed:      Vec<FailedReport>,
  pub started_at:  DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
}

/// Fetch every document from `source` and ingest them one at a time.
///
/// An upstream failure aborts before anything is written.
pub async fn run_batch<S, W>(source: &S, warehouse: &W, options: BatchOptions) -> Result<BatchReport>
where
  S: ReportSource,
  W: Warehouse,
{
  let started_at = Utc::now();
  info!(?options, "etl batch started");

  let documents = source
    .fetch_reports()
    .await
    .map_err(|e| Error::UpstreamFetch(e.to_string()))?;
  info!(count = documents.len(), "fetched report documents");

  let mut processed = 0;
  let mut succeeded = Vec::new();
  let mut failed = Vec::new();

  for document in documents {
    let peeked = RawReport::peek_id(&document);

    let outcome = match RawReport::from_value(document) {
      Ok(raw) => {
        let report_id = raw.report_id;
        warehouse
          .ingest_report(raw, options.policy)
          .await
          .map(|receipt| receipt.report_id)
          .map_err(|e| (Some(report_id), e.to_string()))
      }
      Err(e) => Err((peeked, e.to_string())),
    };

    match outcome {
      Ok(report_id) => {
        processed += 1;
        succeeded.push(report_id);
      }
      Err((report_id, reason)) => match options.failure {
        FailurePolicy::Isolate => {
          warn!(?report_id, error = %reason, "report failed, continuing batch");
          failed.push(FailedReport { report_id, error: reason });
        }
        FailurePolicy::AbortOnFirst => {
          error!(?report_id, error = %reason, processed, "etl batch aborted");
          return Err(Error::BatchAborted { processed, report_id, reason });
        }
      },
    }
  }

  let finished_at = Utc::now();
  info!(
    processed,
    failed = failed.len(),
    elapsed_ms = (finished_at - started_at).num_milliseconds(),
    "etl batch finished"
  );

  Ok(BatchReport { processed, succeeded, failed, started_at, finished_at })
}
