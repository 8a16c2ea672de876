//! Dashboard overview counts and the recent-reports feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::display_category;
use crate::{
  store::{RecentReportRow, Warehouse},
  window::DateWindow,
};

pub const DEFAULT_RECENT_LIMIT: usize = 10;
pub const MAX_RECENT_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
  pub total_reports:     i64,
  pub pending_reports:   i64,
  pub resolved_reports:  i64,
  pub escalated_reports: i64,
  pub rejected_reports:  i64,
  pub updated_at:        DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentReport {
  pub id:           Uuid,
  pub title:        Option<String>,
  pub report_type:  String,
  pub category:     String,
  pub status:       String,
  pub city:         Option<String>,
  pub agency:       Option<String>,
  pub created_at:   DateTime<Utc>,
  pub upvotes:      i64,
  pub is_escalated: bool,
}

impl From<RecentReportRow> for RecentReport {
  fn from(row: RecentReportRow) -> Self {
    Self {
      id:           row.report_id,
      category:     display_category(&row.report_type).to_owned(),
      title:        row.title,
      report_type:  row.report_type,
      status:       row.status,
      city:         row.city,
      agency:       row.agency,
      created_at:   row.created_at,
      upvotes:      row.upvote_count,
      is_escalated: row.is_escalated,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentReportsResponse {
  pub data:       Vec<RecentReport>,
  pub updated_at: DateTime<Utc>,
}

/// Default to [`DEFAULT_RECENT_LIMIT`] and clamp into `1..=MAX_RECENT_LIMIT`.
pub fn clamp_limit(requested: Option<i64>) -> usize {
  match requested {
    None => DEFAULT_RECENT_LIMIT,
    Some(n) => n.clamp(1, MAX_RECENT_LIMIT as i64) as usize,
  }
}

pub async fn overview<W: Warehouse>(
  warehouse: &W,
  window: DateWindow,
) -> Result<OverviewResponse, W::Error> {
  let counts = warehouse.overview_counts(window).await?;
  Ok(OverviewResponse {
    total_reports:     counts.total,
    pending_reports:   counts.pending,
    resolved_reports:  counts.resolved,
    escalated_reports: counts.escalated,
    rejected_reports:  counts.rejected,
    updated_at:        Utc::now(),
  })
}

pub async fn recent_reports<W: Warehouse>(
  warehouse: &W,
  limit: Option<i64>,
) -> Result<RecentReportsResponse, W::Error> {
  let rows = warehouse.recent_reports(clamp_limit(limit)).await?;
  Ok(RecentReportsResponse {
    data:       rows.into_iter().map(RecentReport::from).collect(),
    updated_at: Utc::now(),
  })
}
