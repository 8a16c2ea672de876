//! Escalation and rejection rates, and their monthly trend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::percent_one_decimal;
use crate::{
  store::{MonthlyOutcomeRow, OverviewCounts, Warehouse},
  window::DateWindow,
};

/// Months requested from the store, newest first.
pub const TREND_QUERY_MONTHS: usize = 12;

/// Months returned to the dashboard.
pub const TREND_MONTHS: usize = 8;

const MONTH_LABELS: [&str; 12] = [
  "Jan", "Feb", "Mar", "Apr", "Mei", "Jun", "Jul", "Agu", "Sep", "Okt", "Nov", "Des",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationStats {
  pub total_reports:   i64,
  pub total_escalated: i64,
  pub total_rejected:  i64,
  pub escalation_rate: f64,
  pub rejection_rate:  f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
  /// Indonesian month abbreviation.
  pub period:    String,
  pub year:      i32,
  pub month:     u32,
  pub escalated: i64,
  pub rejected:  i64,
  pub resolved:  i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationResponse {
  pub stats:      EscalationStats,
  pub trends:     Vec<TrendPoint>,
  pub updated_at: DateTime<Utc>,
}

/// Indonesian abbreviation for a 1-based month; out-of-range months render
/// as their number.
pub fn month_label(month: u32) -> String {
  month
    .checked_sub(1)
    .and_then(|i| MONTH_LABELS.get(i as usize))
    .map(|s| (*s).to_owned())
    .unwrap_or_else(|| month.to_string())
}

pub fn escalation_stats(counts: &OverviewCounts) -> EscalationStats {
  EscalationStats {
    total_reports:   counts.total,
    total_escalated: counts.escalated,
    total_rejected:  counts.rejected,
    escalation_rate: percent_one_decimal(counts.escalated, counts.total),
    rejection_rate:  percent_one_decimal(counts.rejected, counts.total),
  }
}

/// Take the most recent [`TREND_MONTHS`] of newest-first rows and return
/// them oldest-first.
pub fn trend_points(newest_first: &[MonthlyOutcomeRow]) -> Vec<TrendPoint> {
  newest_first
    .iter()
    .take(TREND_MONTHS)
    .rev()
    .map(|r| TrendPoint {
      period:    month_label(r.month),
      year:      r.year,
      month:     r.month,
      escalated: r.escalated,
      rejected:  r.rejected,
      resolved:  r.resolved,
    })
    .collect()
}

pub async fn escalation<W: Warehouse>(
  warehouse: &W,
  window: DateWindow,
) -> Result<EscalationResponse, W::Error> {
  let counts = warehouse.overview_counts(window).await?;
  let months = warehouse.monthly_outcomes(window, TREND_QUERY_MONTHS).await?;
  Ok(EscalationResponse {
    stats:      escalation_stats(&counts),
    trends:     trend_points(&months),
    updated_at: Utc::now(),
  })
}
