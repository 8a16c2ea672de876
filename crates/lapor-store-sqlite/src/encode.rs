//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings with microsecond
//! precision, so lexical comparison in SQL agrees with chronological order and
//! `julianday()`/`strftime()` can read them. UUIDs are stored as hyphenated
//! lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use lapor_core::store::{HeatmapRow, RecentReportRow};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from the heatmap query.
pub struct RawHeatmapRow {
  pub report_id:    String,
  pub latitude:     f64,
  pub longitude:    f64,
  pub report_type:  String,
  pub upvote_count: i64,
}

impl RawHeatmapRow {
  pub fn into_row(self) -> Result<HeatmapRow> {
    Ok(HeatmapRow {
      report_id:    decode_uuid(&self.report_id)?,
      latitude:     self.latitude,
      longitude:    self.longitude,
      report_type:  self.report_type,
      upvote_count: self.upvote_count,
    })
  }
}

/// Raw values read from the recent-reports query.
pub struct RawRecentReport {
  pub report_id:    String,
  pub title:        Option<String>,
  pub report_type:  String,
  pub status:       String,
  pub city:         Option<String>,
  pub agency:       Option<String>,
  pub created_at:   String,
  pub upvote_count: i64,
  pub is_escalated: bool,
}

impl RawRecentReport {
  pub fn into_row(self) -> Result<RecentReportRow> {
    Ok(RecentReportRow {
      report_id:    decode_uuid(&self.report_id)?,
      title:        self.title,
      report_type:  self.report_type,
      status:       self.status,
      city:         self.city,
      agency:       self.agency,
      created_at:   decode_dt(&self.created_at)?,
      upvote_count: self.upvote_count,
      is_escalated: self.is_escalated,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_are_fixed_width_and_sort_lexically() {
    let a = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let b = a + chrono::Duration::microseconds(1500);
    let (ea, eb) = (encode_dt(a), encode_dt(b));
    assert_eq!(ea, "2024-03-01T08:00:00.000000Z");
    assert_eq!(ea.len(), eb.len());
    assert!(ea < eb);
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn bad_timestamp_is_date_parse_error() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }
}
