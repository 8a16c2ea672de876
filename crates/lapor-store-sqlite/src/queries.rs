//! Analytical SQL. Each function runs one read statement on the worker
//! thread and returns rows still carrying their raw column encodings where
//! decoding can fail.

use lapor_core::{
  store::{AgencyStatsRow, MonthlyOutcomeRow, OverviewCounts, TypeResolutionRow, TypeStatusRow},
  window::DateWindow,
};
use rusqlite::{Connection, types::Value};

use crate::{
  encode::{RawHeatmapRow, RawRecentReport},
  filter::Predicates,
};

/// Per-report resolution hours: time from `created_at` to the first
/// `resolved` status event. NULL unless the report is currently resolved and
/// has such an event, so every aggregate counts "resolved" the same way.
/// Events dated before creation count as zero hours. `{filter}` filters the
/// reports.
const RESOLUTION_CTE: &str = "
  WITH resolution AS (
    SELECT
      fr.report_id,
      fr.report_type_id,
      fr.authority_id,
      ds.name AS current_status,
      CASE WHEN ds.name = 'resolved' THEN
        MAX(0.0, (julianday((
          SELECT MIN(fse.event_timestamp)
          FROM fact_status_events fse
          JOIN dim_status rs ON rs.status_id = fse.status_id
          WHERE fse.report_id = fr.report_id AND rs.name = 'resolved'
        )) - julianday(fr.created_at)) * 24.0)
      END AS hours
    FROM fact_reports fr
    JOIN dim_status ds ON ds.status_id = fr.current_status_id
    {filter}
  )";

fn resolution_cte(preds: &Predicates) -> String {
  RESOLUTION_CTE.replace("{filter}", &preds.where_clause())
}

pub fn agency_stats(
  conn: &Connection,
  window: &DateWindow,
  sla_hours: f64,
) -> rusqlite::Result<Vec<AgencyStatsRow>> {
  let mut preds = Predicates::window("fr.created_at", window);
  let cte = resolution_cte(&preds);
  let sla = preds.bind(Value::Real(sla_hours));

  let sql = format!(
    "{cte}
     SELECT
       da.agency,
       COUNT(*) AS total_reports,
       SUM(CASE WHEN r.current_status = 'resolved' THEN 1 ELSE 0 END),
       AVG(r.hours),
       SUM(CASE WHEN r.hours > {sla} THEN 1 ELSE 0 END)
     FROM resolution r
     JOIN dim_authority da ON da.authority_id = r.authority_id
     GROUP BY da.authority_id
     ORDER BY total_reports DESC, da.agency ASC"
  );

  let mut stmt = conn.prepare(&sql)?;
  stmt
    .query_map(preds.params(), |row| {
      Ok(AgencyStatsRow {
        agency:               row.get(0)?,
        total_reports:        row.get(1)?,
        resolved_count:       row.get(2)?,
        avg_resolution_hours: row.get(3)?,
        sla_breached_count:   row.get(4)?,
      })
    })?
    .collect()
}

/// One row per seeded report type, even when no report in the window has it.
pub fn type_resolution_stats(
  conn: &Connection,
  window: &DateWindow,
) -> rusqlite::Result<Vec<TypeResolutionRow>> {
  let preds = Predicates::window("fr.created_at", window);
  let sql = format!(
    "{cte}
     SELECT
       rt.name,
       SUM(CASE WHEN r.current_status = 'resolved' THEN 1 ELSE 0 END),
       COUNT(r.report_id),
       AVG(r.hours)
     FROM dim_report_type rt
     LEFT JOIN resolution r ON r.report_type_id = rt.report_type_id
     GROUP BY rt.report_type_id
     ORDER BY rt.report_type_id",
    cte = resolution_cte(&preds),
  );

  let mut stmt = conn.prepare(&sql)?;
  stmt
    .query_map(preds.params(), |row| {
      Ok(TypeResolutionRow {
        report_type:          row.get(0)?,
        resolved_count:       row.get(1)?,
        total_count:          row.get(2)?,
        avg_resolution_hours: row.get(3)?,
      })
    })?
    .collect()
}

pub fn type_status_counts(
  conn: &Connection,
  window: &DateWindow,
) -> rusqlite::Result<Vec<TypeStatusRow>> {
  let preds = Predicates::window("fr.created_at", window);
  let sql = format!(
    "SELECT rt.name, ds.name, COUNT(*)
     FROM fact_reports fr
     JOIN dim_report_type rt ON rt.report_type_id = fr.report_type_id
     JOIN dim_status ds      ON ds.status_id      = fr.current_status_id
     {filter}
     GROUP BY rt.report_type_id, ds.status_id
     ORDER BY rt.report_type_id, ds.status_id",
    filter = preds.where_clause(),
  );

  let mut stmt = conn.prepare(&sql)?;
  stmt
    .query_map(preds.params(), |row| {
      Ok(TypeStatusRow { report_type: row.get(0)?, status: row.get(1)?, count: row.get(2)? })
    })?
    .collect()
}

pub fn heatmap_rows(conn: &Connection, window: &DateWindow) -> rusqlite::Result<Vec<RawHeatmapRow>> {
  let mut preds = Predicates::window("fr.created_at", window);
  preds
    .require("fr.latitude IS NOT NULL")
    .require("fr.longitude IS NOT NULL");

  let sql = format!(
    "SELECT fr.report_id, fr.latitude, fr.longitude, rt.name, fr.upvote_count
     FROM fact_reports fr
     JOIN dim_report_type rt ON rt.report_type_id = fr.report_type_id
     {filter}
     ORDER BY fr.rowid",
    filter = preds.where_clause(),
  );

  let mut stmt = conn.prepare(&sql)?;
  stmt
    .query_map(preds.params(), |row| {
      Ok(RawHeatmapRow {
        report_id:    row.get(0)?,
        latitude:     row.get(1)?,
        longitude:    row.get(2)?,
        report_type:  row.get(3)?,
        upvote_count: row.get(4)?,
      })
    })?
    .collect()
}

pub fn monthly_outcomes(
  conn: &Connection,
  window: &DateWindow,
  limit: usize,
) -> rusqlite::Result<Vec<MonthlyOutcomeRow>> {
  let mut preds = Predicates::window("fr.created_at", window);
  let limit = preds.bind(Value::Integer(limit as i64));

  let sql = format!(
    "SELECT
       CAST(strftime('%Y', fr.created_at) AS INTEGER) AS year,
       CAST(strftime('%m', fr.created_at) AS INTEGER) AS month,
       COUNT(*),
       SUM(CASE WHEN fr.is_escalated THEN 1 ELSE 0 END),
       SUM(CASE WHEN ds.name = 'rejected' THEN 1 ELSE 0 END),
       SUM(CASE WHEN ds.name = 'resolved' THEN 1 ELSE 0 END)
     FROM fact_reports fr
     JOIN dim_status ds ON ds.status_id = fr.current_status_id
     {filter}
     GROUP BY year, month
     ORDER BY year DESC, month DESC
     LIMIT {limit}",
    filter = preds.where_clause(),
  );

  let mut stmt = conn.prepare(&sql)?;
  stmt
    .query_map(preds.params(), |row| {
      Ok(MonthlyOutcomeRow {
        year:      row.get(0)?,
        month:     row.get(1)?,
        total:     row.get(2)?,
        escalated: row.get(3)?,
        rejected:  row.get(4)?,
        resolved:  row.get(5)?,
      })
    })?
    .collect()
}

pub fn overview_counts(conn: &Connection, window: &DateWindow) -> rusqlite::Result<OverviewCounts> {
  let preds = Predicates::window("fr.created_at", window);
  let sql = format!(
    "SELECT
       COUNT(*),
       COALESCE(SUM(CASE WHEN ds.name IN ('submitted', 'verified', 'in_progress') THEN 1 ELSE 0 END), 0),
       COALESCE(SUM(CASE WHEN ds.name = 'resolved' THEN 1 ELSE 0 END), 0),
       COALESCE(SUM(CASE WHEN fr.is_escalated THEN 1 ELSE 0 END), 0),
       COALESCE(SUM(CASE WHEN ds.name = 'rejected' THEN 1 ELSE 0 END), 0)
     FROM fact_reports fr
     JOIN dim_status ds ON ds.status_id = fr.current_status_id
     {filter}",
    filter = preds.where_clause(),
  );

  conn.query_row(&sql, preds.params(), |row| {
    Ok(OverviewCounts {
      total:     row.get(0)?,
      pending:   row.get(1)?,
      resolved:  row.get(2)?,
      escalated: row.get(3)?,
      rejected:  row.get(4)?,
    })
  })
}

pub fn recent_reports(conn: &Connection, limit: usize) -> rusqlite::Result<Vec<RawRecentReport>> {
  let mut stmt = conn.prepare(
    "SELECT
       fr.report_id, fr.title, rt.name, ds.name, dc.name, da.agency,
       fr.created_at, fr.upvote_count, fr.is_escalated
     FROM fact_reports fr
     JOIN dim_report_type rt  ON rt.report_type_id = fr.report_type_id
     JOIN dim_status ds       ON ds.status_id      = fr.current_status_id
     LEFT JOIN dim_city dc    ON dc.city_id        = fr.city_id
     LEFT JOIN dim_authority da ON da.authority_id = fr.authority_id
     ORDER BY fr.created_at DESC, fr.rowid DESC
     LIMIT ?1",
  )?;

  stmt
    .query_map([limit as i64], |row| {
      Ok(RawRecentReport {
        report_id:    row.get(0)?,
        title:        row.get(1)?,
        report_type:  row.get(2)?,
        status:       row.get(3)?,
        city:         row.get(4)?,
        agency:       row.get(5)?,
        created_at:   row.get(6)?,
        upvote_count: row.get(7)?,
        is_escalated: row.get(8)?,
      })
    })?
    .collect()
}
