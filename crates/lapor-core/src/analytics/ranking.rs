//! Agency ranking and SLA compliance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SLA_HOURS, UNASSIGNED_AGENCY, round_to};
use crate::{
  store::{AgencyStatsRow, Warehouse},
  window::DateWindow,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
  pub rank:                      usize,
  pub agency_name:               String,
  pub total_reports:             i64,
  pub resolved_count:            i64,
  pub sla_breached_count:        i64,
  pub avg_resolution_time_hours: Option<f64>,
  pub score:                     i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingResponse {
  pub data:       Vec<RankingEntry>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaComplianceEntry {
  pub agency_name:        String,
  pub total_assigned:     i64,
  pub sla_breached_count: i64,
  pub compliance_rate:    f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaComplianceResponse {
  pub data:       Vec<SlaComplianceEntry>,
  pub updated_at: DateTime<Utc>,
}

/// Agency performance score in `0..=100`.
///
/// `100 - breach_rate * 0.3 - min(avg / SLA * 20, 30)`, rounded and clamped
/// to the range. A missing average costs nothing.
pub fn score(total_reports: i64, sla_breached: i64, avg_resolution_hours: Option<f64>) -> i64 {
  let breach_rate = if total_reports > 0 {
    sla_breached as f64 / total_reports as f64 * 100.0
  } else {
    0.0
  };
  let avg = avg_resolution_hours.unwrap_or(0.0);
  let resolution_penalty = (avg / SLA_HOURS * 20.0).min(30.0);
  (100.0 - breach_rate * 0.3 - resolution_penalty).round().clamp(0.0, 100.0) as i64
}

/// Percentage of assigned reports resolved within SLA, two decimals.
pub fn compliance_rate(total_assigned: i64, sla_breached: i64) -> Option<f64> {
  if total_assigned <= 0 {
    return None;
  }
  let rate = (total_assigned - sla_breached) as f64 / total_assigned as f64 * 100.0;
  Some(round_to(rate, 2))
}

fn ranked(row: &AgencyStatsRow) -> bool { row.agency != UNASSIGNED_AGENCY }

/// Score and rank agencies. Input order breaks ties.
pub fn rank_agencies(rows: &[AgencyStatsRow]) -> Vec<RankingEntry> {
  let mut entries: Vec<RankingEntry> = rows
    .iter()
    .filter(|r| ranked(r))
    .map(|r| RankingEntry {
      rank:                      0,
      agency_name:               r.agency.clone(),
      total_reports:             r.total_reports,
      resolved_count:            r.resolved_count,
      sla_breached_count:        r.sla_breached_count,
      avg_resolution_time_hours: r.avg_resolution_hours.map(|h| round_to(h, 1)),
      score:                     score(r.total_reports, r.sla_breached_count, r.avg_resolution_hours),
    })
    .collect();

  entries.sort_by(|a, b| b.score.cmp(&a.score));
  for (i, entry) in entries.iter_mut().enumerate() {
    entry.rank = i + 1;
  }
  entries
}

/// Compliance per agency, best first. Agencies with nothing assigned are
/// dropped.
pub fn sla_compliance_entries(rows: &[AgencyStatsRow]) -> Vec<SlaComplianceEntry> {
  let mut entries: Vec<SlaComplianceEntry> = rows
    .iter()
    .filter(|r| ranked(r))
    .filter_map(|r| {
      compliance_rate(r.total_reports, r.sla_breached_count).map(|rate| SlaComplianceEntry {
        agency_name:        r.agency.clone(),
        total_assigned:     r.total_reports,
        sla_breached_count: r.sla_breached_count,
        compliance_rate:    rate,
      })
    })
    .collect();

  entries.sort_by(|a, b| b.compliance_rate.total_cmp(&a.compliance_rate));
  entries
}

pub async fn ranking<W: Warehouse>(
  warehouse: &W,
  window: DateWindow,
) -> Result<RankingResponse, W::Error> {
  let rows = warehouse.agency_stats(window, SLA_HOURS).await?;
  Ok(RankingResponse { data: rank_agencies(&rows), updated_at: Utc::now() })
}

pub async fn sla_compliance<W: Warehouse>(
  warehouse: &W,
  window: DateWindow,
) -> Result<SlaComplianceResponse, W::Error> {
  let rows = warehouse.agency_stats(window, SLA_HOURS).await?;
  Ok(SlaComplianceResponse { data: sla_compliance_entries(&rows), updated_at: Utc::now() })
}
