//! Warehouse row contracts and the transaction-scoped write seam.
//!
//! Every row the ingestion engine produces is described here. Backends
//! implement [`WarehouseTx`] over an open transaction; the engine never sees
//! SQL and the backend never sees a raw document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dimension::{City, DimensionId, EnumDimension, NewAuthority, Reporter};

// ─── Fact rows ───────────────────────────────────────────────────────────────

/// Grain: one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFact {
  pub report_id:         Uuid,
  pub report_type_id:    DimensionId,
  pub visibility_id:     DimensionId,
  pub current_status_id: DimensionId,
  pub authority_id:      Option<DimensionId>,
  pub city_id:           Option<DimensionId>,
  pub title:             Option<String>,
  pub description:       Option<String>,
  pub latitude:          Option<f64>,
  pub longitude:         Option<f64>,
  pub address:           Option<String>,
  pub created_at:        DateTime<Utc>,
  pub upvote_count:      i64,
  pub is_escalated:      bool,
}

/// Grain: one status transition. Natural key
/// `(report_id, status_id, event_timestamp)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
  pub report_id:       Uuid,
  pub status_id:       DimensionId,
  pub actor_role_id:   DimensionId,
  pub actor_id:        Option<Uuid>,
  pub note:            Option<String>,
  pub event_timestamp: DateTime<Utc>,
}

/// Grain: one uploaded asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaEvent {
  pub media_id:    Uuid,
  pub report_id:   Uuid,
  pub media_type:  String,
  pub uploaded_at: DateTime<Utc>,
}

/// Grain: one voter on one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteEvent {
  pub report_id: Uuid,
  pub voter_id:  Uuid,
}

/// Grain: one escalation action. Natural key `(report_id, escalated_at)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationEvent {
  pub report_id:    Uuid,
  pub escalated_to: Option<String>,
  pub reason:       Option<String>,
  pub escalated_at: Option<DateTime<Utc>>,
}

/// Bridge row between a report and its reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportReporter {
  pub report_id:   Uuid,
  pub reporter_id: Uuid,
}

// ─── Write results and policies ──────────────────────────────────────────────

/// Whether a conflict-tolerant write produced a new row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
  Inserted,
  AlreadyPresent,
}

impl WriteOutcome {
  pub fn inserted(self) -> bool { matches!(self, Self::Inserted) }

  pub fn from_affected(rows: usize) -> Self {
    if rows > 0 { Self::Inserted } else { Self::AlreadyPresent }
  }
}

/// How status and escalation events are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplayPolicy {
  /// Skip rows whose natural key already exists; replays are no-ops.
  #[default]
  Dedupe,
  /// Always append; replaying a report duplicates its timeline and
  /// escalation rows.
  Append,
}

/// What to do when creating an authority row collides with an existing
/// agency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthorityPolicy {
  /// Look the agency up first and insert only when absent.
  #[default]
  LookupExisting,
  /// Insert; on conflict leave the report without an authority link.
  SkipLink,
  /// Insert; on conflict abort the report's transaction.
  Fail,
}

/// Knobs applied to every report in an ingestion pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IngestPolicy {
  #[serde(default)]
  pub authority: AuthorityPolicy,
  #[serde(default)]
  pub replay:    ReplayPolicy,
}

// ─── Transaction seam ────────────────────────────────────────────────────────

/// Reads and writes available inside one open warehouse transaction.
///
/// Implementations must not commit; the caller owns the transaction boundary
/// and commits only after [`crate::ingest::ingest_report`] returns `Ok`.
pub trait WarehouseTx {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Dimension lookups ─────────────────────────────────────────────────

  /// Exact-name lookup in an enumerated dimension.
  fn lookup_dimension(
    &self,
    kind: EnumDimension,
    name: &str,
  ) -> Result<Option<DimensionId>, Self::Error>;

  fn city_by_name(&self, name: &str) -> Result<Option<DimensionId>, Self::Error>;

  /// Every row of the city dimension.
  fn cities(&self) -> Result<Vec<City>, Self::Error>;

  fn authority_by_agency(&self, agency: &str) -> Result<Option<DimensionId>, Self::Error>;

  /// Insert an authority row. Returns `None` if the agency already exists.
  fn insert_authority(
    &self,
    authority: &NewAuthority,
  ) -> Result<Option<DimensionId>, Self::Error>;

  // ── Conflict-tolerant writes ──────────────────────────────────────────

  fn upsert_reporter(&self, reporter: &Reporter) -> Result<WriteOutcome, Self::Error>;

  fn upsert_report(&self, report: &ReportFact) -> Result<WriteOutcome, Self::Error>;

  fn upsert_report_reporter(
    &self,
    bridge: &ReportReporter,
  ) -> Result<WriteOutcome, Self::Error>;

  fn upsert_media_event(&self, media: &MediaEvent) -> Result<WriteOutcome, Self::Error>;

  fn upsert_vote_event(&self, vote: &VoteEvent) -> Result<WriteOutcome, Self::Error>;

  // ── Events obeying ReplayPolicy ───────────────────────────────────────

  fn write_status_event(
    &self,
    event: &StatusEvent,
    replay: ReplayPolicy,
  ) -> Result<WriteOutcome, Self::Error>;

  fn write_escalation_event(
    &self,
    event: &EscalationEvent,
    replay: ReplayPolicy,
  ) -> Result<WriteOutcome, Self::Error>;
}
