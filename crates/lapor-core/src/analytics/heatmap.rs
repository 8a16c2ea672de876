//! Geographic heatmap: one point per geolocated report plus grid clusters.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{display_category, round_to};
use crate::{
  store::{HeatmapRow, Warehouse},
  window::DateWindow,
};

/// Cluster cell size in degrees, roughly one kilometre.
pub const GRID_DEGREES: f64 = 0.01;

/// Upvotes at which a point reaches full intensity.
const FULL_INTENSITY_VOTES: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPoint {
  pub id:        Uuid,
  pub latitude:  f64,
  pub longitude: f64,
  /// Display category.
  #[serde(rename = "type")]
  pub category:  String,
  pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCluster {
  /// Cell centre.
  pub latitude:  f64,
  pub longitude: f64,
  pub count:     usize,
  /// Reports per display category.
  pub types:     BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapResponse {
  pub points:     Vec<HeatmapPoint>,
  pub clusters:   Vec<HeatmapCluster>,
  pub updated_at: DateTime<Utc>,
}

pub fn intensity(upvote_count: i64) -> f64 {
  (upvote_count as f64 / FULL_INTENSITY_VOTES).min(1.0)
}

/// Nearest grid index, with halves rounding towards positive infinity.
fn grid_index(degrees: f64) -> i64 { (degrees / GRID_DEGREES + 0.5).floor() as i64 }

fn cell_of(lat: f64, lng: f64) -> (i64, i64) { (grid_index(lat), grid_index(lng)) }

pub fn points(rows: &[HeatmapRow]) -> Vec<HeatmapPoint> {
  rows
    .iter()
    .map(|r| HeatmapPoint {
      id:        r.report_id,
      latitude:  r.latitude,
      longitude: r.longitude,
      category:  display_category(&r.report_type).to_owned(),
      intensity: intensity(r.upvote_count),
    })
    .collect()
}

/// Bucket reports into grid cells and keep the cells holding more than one
/// report, in the order each cell was first seen.
pub fn clusters(rows: &[HeatmapRow]) -> Vec<HeatmapCluster> {
  let mut index: HashMap<(i64, i64), usize> = HashMap::new();
  let mut cells: Vec<HeatmapCluster> = Vec::new();

  for row in rows {
    let key = cell_of(row.latitude, row.longitude);
    let idx = *index.entry(key).or_insert_with(|| {
      cells.push(HeatmapCluster {
        latitude:  round_to(key.0 as f64 * GRID_DEGREES, 2),
        longitude: round_to(key.1 as f64 * GRID_DEGREES, 2),
        count:     0,
        types:     BTreeMap::new(),
      });
      cells.len() - 1
    });

    let cell = &mut cells[idx];
    cell.count += 1;
    *cell
      .types
      .entry(display_category(&row.report_type).to_owned())
      .or_default() += 1;
  }

  cells.retain(|c| c.count > 1);
  cells
}

pub async fn heatmap<W: Warehouse>(
  warehouse: &W,
  window: DateWindow,
) -> Result<HeatmapResponse, W::Error> {
  let rows = warehouse.heatmap_rows(window).await?;
  Ok(HeatmapResponse {
    points:     points(&rows),
    clusters:   clusters(&rows),
    updated_at: Utc::now(),
  })
}
