//! Optional inclusive bounds on report `created_at`, applied to every
//! aggregation.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateWindow {
  pub start: Option<DateTime<Utc>>,
  pub end:   Option<DateTime<Utc>>,
}

impl DateWindow {
  /// No bounds: every report.
  pub fn all() -> Self { Self::default() }

  pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
    Self { start: Some(start), end: Some(end) }
  }

  /// Parse query-string bounds. Each side accepts RFC 3339 or `YYYY-MM-DD`;
  /// a date-only `end` covers the whole of that day. Empty strings count as
  /// absent.
  pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
    let start = match start.map(str::trim).filter(|s| !s.is_empty()) {
      Some(s) => Some(parse_bound(s, Bound::Start)?),
      None => None,
    };
    let end = match end.map(str::trim).filter(|s| !s.is_empty()) {
      Some(s) => Some(parse_bound(s, Bound::End)?),
      None => None,
    };

    if let (Some(s), Some(e)) = (start, end)
      && s > e
    {
      return Err(Error::InvalidWindow(format!("start {s} is after end {e}")));
    }

    Ok(Self { start, end })
  }

  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    self.start.is_none_or(|s| at >= s) && self.end.is_none_or(|e| at <= e)
  }

  pub fn is_unbounded(&self) -> bool { self.start.is_none() && self.end.is_none() }
}

#[derive(Clone, Copy)]
enum Bound {
  Start,
  End,
}

fn parse_bound(input: &str, bound: Bound) -> Result<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
    return Ok(dt.with_timezone(&Utc));
  }

  let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
    .map_err(|_| Error::InvalidWindow(format!("unrecognised date {input:?}")))?;
  let time = match bound {
    Bound::Start => NaiveTime::MIN,
    Bound::End => NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)
      .ok_or_else(|| Error::InvalidWindow("end of day".into()))?,
  };
  Ok(date.and_time(time).and_utc())
}
