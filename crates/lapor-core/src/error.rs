//! Error types for `lapor-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::dimension::EnumDimension;

#[derive(Debug, Error)]
pub enum Error {
  /// An enumerated dimension has no row with this name. The enumerated
  /// dimensions are closed sets established by seeding.
  #[error("missing dimension value: {dimension} {name:?}")]
  MissingDimensionValue {
    dimension: EnumDimension,
    name:      String,
  },

  /// Creating an authority row collided with an existing agency.
  #[error("authority {agency:?} already exists")]
  DimensionConflict { agency: String },

  #[error("upstream fetch failed: {0}")]
  UpstreamFetch(String),

  /// A store-level read or write failed inside an ingestion transaction.
  #[error("transaction failed: {0}")]
  Transaction(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("batch aborted after {processed} reports at {report_id:?}: {reason}")]
  BatchAborted {
    processed: usize,
    report_id: Option<Uuid>,
    reason:    String,
  },

  #[error("invalid date window: {0}")]
  InvalidWindow(String),

  #[error("invalid report document: {0}")]
  InvalidDocument(#[from] serde_json::Error),
}

impl Error {
  /// Wrap a backend error raised inside an ingestion transaction.
  pub fn transaction<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Transaction(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
