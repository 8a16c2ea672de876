//! Per-report-type views: mean time to resolution and status distribution.

use std::{cmp::Ordering, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{display_category, round_to};
use crate::{
  dimension::ReportStatus,
  store::{TypeResolutionRow, TypeStatusRow, Warehouse},
  window::DateWindow,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MttrEntry {
  pub report_type:          String,
  pub category:             String,
  pub resolved_count:       i64,
  pub total_count:          i64,
  pub avg_resolution_hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MttrResponse {
  pub data:       Vec<MttrEntry>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionEntry {
  pub report_type: String,
  pub category:    String,
  pub submitted:   i64,
  pub verified:    i64,
  pub in_progress: i64,
  pub resolved:    i64,
  pub rejected:    i64,
  pub escalated:   i64,
  pub total:       i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionResponse {
  pub data:       Vec<DistributionEntry>,
  pub updated_at: DateTime<Utc>,
}

/// Fastest average first; types with nothing resolved go last.
pub fn mttr_entries(rows: &[TypeResolutionRow]) -> Vec<MttrEntry> {
  let mut entries: Vec<MttrEntry> = rows
    .iter()
    .map(|r| MttrEntry {
      report_type:          r.report_type.clone(),
      category:             display_category(&r.report_type).to_owned(),
      resolved_count:       r.resolved_count,
      total_count:          r.total_count,
      avg_resolution_hours: r.avg_resolution_hours.map(|h| round_to(h, 1)),
    })
    .collect();

  entries.sort_by(|a, b| match (a.avg_resolution_hours, b.avg_resolution_hours) {
    (Some(x), Some(y)) => x.total_cmp(&y),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  });
  entries
}

/// Pivot `(type, status, count)` cells into one row per type, largest total
/// first.
pub fn distribution_entries(rows: &[TypeStatusRow]) -> Vec<DistributionEntry> {
  let mut entries: Vec<DistributionEntry> = Vec::new();

  for row in rows {
    let idx = match entries.iter().position(|e| e.report_type == row.report_type) {
      Some(idx) => idx,
      None => {
        entries.push(DistributionEntry {
          report_type: row.report_type.clone(),
          category: display_category(&row.report_type).to_owned(),
          ..Default::default()
        });
        entries.len() - 1
      }
    };
    let entry = &mut entries[idx];

    entry.total += row.count;
    match ReportStatus::from_str(&row.status) {
      Ok(ReportStatus::Submitted) => entry.submitted += row.count,
      Ok(ReportStatus::Verified) => entry.verified += row.count,
      Ok(ReportStatus::InProgress) => entry.in_progress += row.count,
      Ok(ReportStatus::Resolved) => entry.resolved += row.count,
      Ok(ReportStatus::Rejected) => entry.rejected += row.count,
      Ok(ReportStatus::Escalated) => entry.escalated += row.count,
      // Seeded but non-canonical statuses only count towards the total.
      Err(_) => {}
    }
  }

  entries.sort_by(|a, b| b.total.cmp(&a.total));
  entries
}

pub async fn mttr_by_type<W: Warehouse>(
  warehouse: &W,
  window: DateWindow,
) -> Result<MttrResponse, W::Error> {
  let rows = warehouse.type_resolution_stats(window).await?;
  Ok(MttrResponse { data: mttr_entries(&rows), updated_at: Utc::now() })
}

pub async fn report_type_distribution<W: Warehouse>(
  warehouse: &W,
  window: DateWindow,
) -> Result<DistributionResponse, W::Error> {
  let rows = warehouse.type_status_counts(window).await?;
  Ok(DistributionResponse { data: distribution_entries(&rows), updated_at: Utc::now() })
}
