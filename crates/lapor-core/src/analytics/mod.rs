//! The aggregation engine.
//!
//! Each submodule pairs pure formulas over store rows with an async service
//! function generic over [`Warehouse`](crate::store::Warehouse). Responses
//! serialise as camelCase and carry `updatedAt`, the time the query ran.

pub mod heatmap;
pub mod ranking;
pub mod summary;
pub mod trend;
pub mod types;

/// Resolution deadline in hours; anything slower is an SLA breach.
pub const SLA_HOURS: f64 = 72.0;

/// Placeholder agency name that some upstream documents use for "nobody yet".
/// Never ranked.
pub const UNASSIGNED_AGENCY: &str = "Belum Ditugaskan";

/// Dashboard category for a raw report type name.
pub fn display_category(report_type: &str) -> &'static str {
  match report_type {
    "kriminalitas" => "Keamanan",
    "kebersihan" => "Kebersihan",
    "kesehatan" => "Pelayanan Publik",
    "fasilitas" => "Infrastruktur",
    _ => "Lainnya",
  }
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
  let factor = 10f64.powi(places);
  (value * factor).round() / factor
}

/// `count / total` as a percentage with one decimal; 0 when `total` is 0.
pub fn percent_one_decimal(count: i64, total: i64) -> f64 {
  if total <= 0 {
    return 0.0;
  }
  (count as f64 / total as f64 * 1000.0).round() / 10.0
}
