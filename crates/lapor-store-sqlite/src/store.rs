//! [`SqliteWarehouse`]: the SQLite implementation of [`Warehouse`].

use std::path::Path;

use lapor_core::{
  ingest::{IngestReceipt, ingest_report},
  raw::RawReport,
  store::{
    AgencyStatsRow, HeatmapRow, MonthlyOutcomeRow, OverviewCounts, RecentReportRow,
    TypeResolutionRow, TypeStatusRow, Warehouse,
  },
  warehouse::IngestPolicy,
  window::DateWindow,
};
use serde::Serialize;
use tracing::debug;

use crate::{
  Result,
  encode::{RawHeatmapRow, RawRecentReport},
  queries,
  schema::{SCHEMA, TABLES},
  seed::{SeedSummary, seed_dimensions},
  tx::SqliteTx,
};

/// Row count of every warehouse table, in [`TABLES`] order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCounts(pub Vec<(&'static str, i64)>);

impl TableCounts {
  pub fn get(&self, table: &str) -> Option<i64> {
    self.0.iter().find(|(t, _)| *t == table).map(|(_, n)| *n)
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A complaint warehouse backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection handle is shared.
#[derive(Clone)]
pub struct SqliteWarehouse {
  conn: tokio_rusqlite::Connection,
}

impl SqliteWarehouse {
  /// Open (or create) a warehouse at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory warehouse, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert the static dimension values that are not already present.
  pub async fn seed_dimensions(&self) -> Result<SeedSummary> {
    let summary = self
      .conn
      .call(|conn| Ok(seed_dimensions(conn)?))
      .await?;
    debug!(inserted = summary.total(), "dimensions seeded");
    Ok(summary)
  }

  /// Row counts for every table.
  pub async fn table_counts(&self) -> Result<TableCounts> {
    let counts = self
      .conn
      .call(|conn| {
        let mut counts = Vec::with_capacity(TABLES.len());
        for table in TABLES {
          let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
          counts.push((table, n));
        }
        Ok(counts)
      })
      .await?;
    Ok(TableCounts(counts))
  }
}

// ─── Warehouse impl ──────────────────────────────────────────────────────────

impl Warehouse for SqliteWarehouse {
  type Error = crate::Error;

  async fn ingest_report(&self, report: RawReport, policy: IngestPolicy) -> Result<IngestReceipt> {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let outcome = ingest_report(&SqliteTx(&tx), &report, policy);
        // Dropping an uncommitted transaction rolls it back.
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await?;
    Ok(outcome?)
  }

  async fn agency_stats(&self, window: DateWindow, sla_hours: f64) -> Result<Vec<AgencyStatsRow>> {
    let rows = self
      .conn
      .call(move |conn| Ok(queries::agency_stats(conn, &window, sla_hours)?))
      .await?;
    Ok(rows)
  }

  async fn type_resolution_stats(&self, window: DateWindow) -> Result<Vec<TypeResolutionRow>> {
    let rows = self
      .conn
      .call(move |conn| Ok(queries::type_resolution_stats(conn, &window)?))
      .await?;
    Ok(rows)
  }

  async fn type_status_counts(&self, window: DateWindow) -> Result<Vec<TypeStatusRow>> {
    let rows = self
      .conn
      .call(move |conn| Ok(queries::type_status_counts(conn, &window)?))
      .await?;
    Ok(rows)
  }

  async fn heatmap_rows(&self, window: DateWindow) -> Result<Vec<HeatmapRow>> {
    let raws = self
      .conn
      .call(move |conn| Ok(queries::heatmap_rows(conn, &window)?))
      .await?;
    raws.into_iter().map(RawHeatmapRow::into_row).collect()
  }

  async fn monthly_outcomes(
    &self,
    window: DateWindow,
    limit: usize,
  ) -> Result<Vec<MonthlyOutcomeRow>> {
    let rows = self
      .conn
      .call(move |conn| Ok(queries::monthly_outcomes(conn, &window, limit)?))
      .await?;
    Ok(rows)
  }

  async fn overview_counts(&self, window: DateWindow) -> Result<OverviewCounts> {
    let counts = self
      .conn
      .call(move |conn| Ok(queries::overview_counts(conn, &window)?))
      .await?;
    Ok(counts)
  }

  async fn recent_reports(&self, limit: usize) -> Result<Vec<RecentReportRow>> {
    let raws = self
      .conn
      .call(move |conn| Ok(queries::recent_reports(conn, limit)?))
      .await?;
    raws.into_iter().map(RawRecentReport::into_row).collect()
  }
}
