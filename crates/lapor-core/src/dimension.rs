//! Dimension types and the geographic resolver.
//!
//! Enumerated dimensions (report type, visibility, status, actor role) are
//! closed sets seeded ahead of time. Reporter and authority rows are created
//! lazily during ingestion. Cities are a static reference set; a report is
//! bucketed into one by exact name or by nearest centre.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

/// Surrogate key of a dimension row.
pub type DimensionId = i64;

/// Kilometres per degree of latitude.
pub const KM_PER_DEGREE: f64 = 111.0;

// ─── Enumerated dimensions ───────────────────────────────────────────────────

/// The closed-set dimensions resolved by exact name.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EnumDimension {
  ReportType,
  Visibility,
  Status,
  ActorRole,
}

/// Canonical report lifecycle statuses, as seeded into the status dimension.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReportStatus {
  Submitted,
  Verified,
  InProgress,
  Resolved,
  Rejected,
  Escalated,
}

impl ReportStatus {
  /// Statuses counted as "pending" by the overview.
  pub fn is_pending(self) -> bool {
    matches!(self, Self::Submitted | Self::Verified | Self::InProgress)
  }

  pub fn as_str(self) -> &'static str { self.into() }
}

// ─── Lazily created dimensions ───────────────────────────────────────────────

/// Sanitised reporter identity. Contact details never reach the warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reporter {
  pub reporter_id: Uuid,
  pub name:        String,
}

/// An authority row about to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuthority {
  pub agency:     String,
  pub unit:       Option<String>,
  pub officer_id: Option<Uuid>,
}

// ─── Cities ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
  pub city_id:    DimensionId,
  pub name:       String,
  pub province:   String,
  pub center_lat: f64,
  pub center_lng: f64,
}

/// How a report's city was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "city_id", rename_all = "snake_case")]
pub enum CityResolution {
  /// The document named a city that exists in the dimension.
  ByName(DimensionId),
  /// The closest city centre to the report coordinates.
  Nearest(DimensionId),
  Unresolved,
}

impl CityResolution {
  pub fn city_id(self) -> Option<DimensionId> {
    match self {
      Self::ByName(id) | Self::Nearest(id) => Some(id),
      Self::Unresolved => None,
    }
  }
}

/// Approximate planar distance in kilometres between a point and a city
/// centre. Longitude degrees are scaled by the cosine of the point's latitude.
///
/// Coarse by intent: good enough for heatmap bucketing, not for geocoding.
pub fn approx_distance_km(lat: f64, lng: f64, center_lat: f64, center_lng: f64) -> f64 {
  let d_lat = (lat - center_lat) * KM_PER_DEGREE;
  let d_lng = (lng - center_lng) * KM_PER_DEGREE * lat.to_radians().cos();
  (d_lat * d_lat + d_lng * d_lng).sqrt()
}

/// The city whose centre is closest to `(lat, lng)`. The first city wins
/// ties; `None` if `cities` is empty.
pub fn nearest_city(cities: &[City], lat: f64, lng: f64) -> Option<&City> {
  let mut best: Option<(&City, f64)> = None;
  for city in cities {
    let d = approx_distance_km(lat, lng, city.center_lat, city.center_lng);
    match best {
      Some((_, best_d)) if d >= best_d => {}
      _ => best = Some((city, d)),
    }
  }
  best.map(|(city, _)| city)
}
