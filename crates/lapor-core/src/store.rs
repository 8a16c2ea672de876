//! The `Warehouse` trait and the aggregate rows it returns.
//!
//! The trait is implemented by storage backends (e.g. `lapor-store-sqlite`).
//! The batch orchestrator and the analytics service functions depend on this
//! abstraction, not on any concrete backend. Backends do the grouping and
//! counting; scoring, rounding and reshaping live in [`crate::analytics`].

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  ingest::IngestReceipt, raw::RawReport, warehouse::IngestPolicy, window::DateWindow,
};

// ─── Aggregate rows ──────────────────────────────────────────────────────────

/// Per-agency resolution counts. Reports without an authority are never
/// counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgencyStatsRow {
  pub agency:               String,
  pub total_reports:        i64,
  /// Reports whose current status is `resolved`.
  pub resolved_count:       i64,
  /// Mean hours from creation to the first `resolved` status event, over the
  /// currently resolved reports that have one. Never negative; `None` when
  /// `resolved_count` is zero.
  pub avg_resolution_hours: Option<f64>,
  /// Currently resolved reports whose first `resolved` event came later than
  /// the SLA.
  pub sla_breached_count:   i64,
}

/// Per-report-type resolution counts. Every seeded type appears, including
/// those with no reports in the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeResolutionRow {
  pub report_type:          String,
  /// Same definition as [`AgencyStatsRow::resolved_count`].
  pub resolved_count:       i64,
  pub total_count:          i64,
  pub avg_resolution_hours: Option<f64>,
}

/// One `(type, current status)` cell of the distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeStatusRow {
  pub report_type: String,
  pub status:      String,
  pub count:       i64,
}

/// A geolocated report. Reports missing either coordinate are never
/// returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapRow {
  pub report_id:    Uuid,
  pub latitude:     f64,
  pub longitude:    f64,
  pub report_type:  String,
  pub upvote_count: i64,
}

/// Outcome counts for reports created in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyOutcomeRow {
  pub year:      i32,
  pub month:     u32,
  pub total:     i64,
  pub escalated: i64,
  pub rejected:  i64,
  pub resolved:  i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OverviewCounts {
  pub total:     i64,
  /// Current status `submitted`, `verified` or `in_progress`.
  pub pending:   i64,
  pub resolved:  i64,
  /// Reports flagged as escalated, whatever their current status.
  pub escalated: i64,
  pub rejected:  i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentReportRow {
  pub report_id:    Uuid,
  pub title:        Option<String>,
  pub report_type:  String,
  pub status:       String,
  pub city:         Option<String>,
  pub agency:       Option<String>,
  pub created_at:   DateTime<Utc>,
  pub upvote_count: i64,
  pub is_escalated: bool,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a complaint warehouse backend.
///
/// Ingestion is the only write path: each call runs one report through
/// [`crate::ingest::ingest_report`] inside its own transaction. All other
/// methods are read-only and filter reports by `created_at` with the given
/// [`DateWindow`].
///
/// All methods return `Send` futures so the trait can be used behind axum
/// handlers.
pub trait Warehouse: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Ingestion ─────────────────────────────────────────────────────────

  /// Ingest one report atomically. On error nothing from this report is
  /// visible.
  fn ingest_report(
    &self,
    report: RawReport,
    policy: IngestPolicy,
  ) -> impl Future<Output = Result<IngestReceipt, Self::Error>> + Send + '_;

  // ── Aggregates ────────────────────────────────────────────────────────

  /// Per-agency counts, ordered by total reports descending then agency.
  fn agency_stats(
    &self,
    window: DateWindow,
    sla_hours: f64,
  ) -> impl Future<Output = Result<Vec<AgencyStatsRow>, Self::Error>> + Send + '_;

  fn type_resolution_stats(
    &self,
    window: DateWindow,
  ) -> impl Future<Output = Result<Vec<TypeResolutionRow>, Self::Error>> + Send + '_;

  fn type_status_counts(
    &self,
    window: DateWindow,
  ) -> impl Future<Output = Result<Vec<TypeStatusRow>, Self::Error>> + Send + '_;

  /// Geolocated reports in insertion order.
  fn heatmap_rows(
    &self,
    window: DateWindow,
  ) -> impl Future<Output = Result<Vec<HeatmapRow>, Self::Error>> + Send + '_;

  /// Monthly buckets, newest month first, at most `limit` of them.
  fn monthly_outcomes(
    &self,
    window: DateWindow,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<MonthlyOutcomeRow>, Self::Error>> + Send + '_;

  fn overview_counts(
    &self,
    window: DateWindow,
  ) -> impl Future<Output = Result<OverviewCounts, Self::Error>> + Send + '_;

  /// The newest `limit` reports, newest first.
  fn recent_reports(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<RecentReportRow>, Self::Error>> + Send + '_;
}
