//! Test doubles for the async seams.

use std::sync::Mutex;

use crate::{
  Error, Result,
  batch::ReportSource,
  ingest::{IngestReceipt, ingest_report, tests::MemoryTx},
  raw::RawReport,
  store::{
    AgencyStatsRow, HeatmapRow, MonthlyOutcomeRow, OverviewCounts, RecentReportRow,
    TypeResolutionRow, TypeStatusRow, Warehouse,
  },
  warehouse::IngestPolicy,
  window::DateWindow,
};

#[derive(Debug, thiserror::Error)]
#[error("stub source: {0}")]
pub struct StubSourceError(String);

pub struct StubSource {
  result: std::result::Result<Vec<serde_json::Value>, String>,
}

impl StubSource {
  pub fn documents(documents: Vec<serde_json::Value>) -> Self { Self { result: Ok(documents) } }

  pub fn failing(message: &str) -> Self { Self { result: Err(message.to_owned()) } }
}

impl ReportSource for StubSource {
  type Error = StubSourceError;

  async fn fetch_reports(&self) -> std::result::Result<Vec<serde_json::Value>, StubSourceError> {
    self.result.clone().map_err(StubSourceError)
  }
}

/// Ingests through the real engine into a [`MemoryTx`]; aggregate reads
/// return whatever the test put in the canned fields, and record the last
/// window they were asked for.
#[derive(Default)]
pub struct StubWarehouse {
  pub tx:          Mutex<MemoryTx>,
  pub agencies:    Vec<AgencyStatsRow>,
  pub types:       Vec<TypeResolutionRow>,
  pub type_status: Vec<TypeStatusRow>,
  pub heatmap:     Vec<HeatmapRow>,
  pub monthly:     Vec<MonthlyOutcomeRow>,
  pub overview:    OverviewCounts,
  pub recent:      Vec<RecentReportRow>,
  pub last_window: Mutex<Option<DateWindow>>,
  pub last_limit:  Mutex<Option<usize>>,
}

impl StubWarehouse {
  pub fn seeded() -> Self { Self { tx: Mutex::new(MemoryTx::seeded()), ..Default::default() } }

  pub fn report_count(&self) -> usize { self.tx.lock().unwrap().state.borrow().reports.len() }

  fn saw(&self, window: DateWindow) { *self.last_window.lock().unwrap() = Some(window); }
}

impl Warehouse for StubWarehouse {
  type Error = Error;

  async fn ingest_report(&self, report: RawReport, policy: IngestPolicy) -> Result<IngestReceipt> {
    let tx = self.tx.lock().unwrap();
    ingest_report(&*tx, &report, policy)
  }

  async fn agency_stats(&self, window: DateWindow, _sla_hours: f64) -> Result<Vec<AgencyStatsRow>> {
    self.saw(window);
    Ok(self.agencies.clone())
  }

  async fn type_resolution_stats(&self, window: DateWindow) -> Result<Vec<TypeResolutionRow>> {
    self.saw(window);
    Ok(self.types.clone())
  }

  async fn type_status_counts(&self, window: DateWindow) -> Result<Vec<TypeStatusRow>> {
    self.saw(window);
    Ok(self.type_status.clone())
  }

  async fn heatmap_rows(&self, window: DateWindow) -> Result<Vec<HeatmapRow>> {
    self.saw(window);
    Ok(self.heatmap.clone())
  }

  async fn monthly_outcomes(
    &self,
    window: DateWindow,
    limit: usize,
  ) -> Result<Vec<MonthlyOutcomeRow>> {
    self.saw(window);
    *self.last_limit.lock().unwrap() = Some(limit);
    Ok(self.monthly.iter().take(limit).cloned().collect())
  }

  async fn overview_counts(&self, window: DateWindow) -> Result<OverviewCounts> {
    self.saw(window);
    Ok(self.overview)
  }

  async fn recent_reports(&self, limit: usize) -> Result<Vec<RecentReportRow>> {
    *self.last_limit.lock().unwrap() = Some(limit);
    Ok(self.recent.iter().take(limit).cloned().collect())
  }
}
