//! [`SqliteTx`]: the ingestion engine's view of an open SQLite transaction.

use lapor_core::{
  dimension::{City, DimensionId, EnumDimension, NewAuthority, Reporter},
  warehouse::{
    EscalationEvent, MediaEvent, ReplayPolicy, ReportFact, ReportReporter, StatusEvent,
    VoteEvent, WarehouseTx, WriteOutcome,
  },
};
use rusqlite::{Connection, OptionalExtension as _, params};

use crate::{
  encode::{encode_dt, encode_uuid},
  schema::enum_table,
};

/// Borrows a connection that is inside a transaction. Pass `&tx` where `tx`
/// is a [`rusqlite::Transaction`]; committing stays with the caller.
pub struct SqliteTx<'a>(pub &'a Connection);

impl WarehouseTx for SqliteTx<'_> {
  type Error = rusqlite::Error;

  // ── Dimension lookups ─────────────────────────────────────────────────────

  fn lookup_dimension(
    &self,
    kind: EnumDimension,
    name: &str,
  ) -> rusqlite::Result<Option<DimensionId>> {
    let (table, id) = enum_table(kind);
    self
      .0
      .prepare_cached(&format!("SELECT {id} FROM {table} WHERE name = ?1"))?
      .query_row(params![name], |r| r.get(0))
      .optional()
  }

  fn city_by_name(&self, name: &str) -> rusqlite::Result<Option<DimensionId>> {
    self
      .0
      .prepare_cached("SELECT city_id FROM dim_city WHERE name = ?1")?
      .query_row(params![name], |r| r.get(0))
      .optional()
  }

  fn cities(&self) -> rusqlite::Result<Vec<City>> {
    let mut stmt = self.0.prepare_cached(
      "SELECT city_id, name, province, center_lat, center_lng
       FROM dim_city ORDER BY city_id",
    )?;
    stmt
      .query_map([], |row| {
        Ok(City {
          city_id:    row.get(0)?,
          name:       row.get(1)?,
          province:   row.get(2)?,
          center_lat: row.get(3)?,
          center_lng: row.get(4)?,
        })
      })?
      .collect()
  }

  fn authority_by_agency(&self, agency: &str) -> rusqlite::Result<Option<DimensionId>> {
    self
      .0
      .prepare_cached("SELECT authority_id FROM dim_authority WHERE agency = ?1")?
      .query_row(params![agency], |r| r.get(0))
      .optional()
  }

  fn insert_authority(&self, authority: &NewAuthority) -> rusqlite::Result<Option<DimensionId>> {
    let inserted = self.0.prepare_cached(
      "INSERT INTO dim_authority (agency, unit, officer_id) VALUES (?1, ?2, ?3)
       ON CONFLICT(agency) DO NOTHING",
    )?
    .execute(params![
      authority.agency,
      authority.unit,
      authority.officer_id.map(encode_uuid),
    ])?;

    Ok((inserted > 0).then(|| self.0.last_insert_rowid()))
  }

  // ── Conflict-tolerant writes ──────────────────────────────────────────────

  fn upsert_reporter(&self, reporter: &Reporter) -> rusqlite::Result<WriteOutcome> {
    let n = self
      .0
      .prepare_cached(
        "INSERT INTO dim_reporter (reporter_id, name) VALUES (?1, ?2)
         ON CONFLICT(reporter_id) DO NOTHING",
      )?
      .execute(params![encode_uuid(reporter.reporter_id), reporter.name])?;
    Ok(WriteOutcome::from_affected(n))
  }

  fn upsert_report(&self, report: &ReportFact) -> rusqlite::Result<WriteOutcome> {
    let n = self
      .0
      .prepare_cached(
        "INSERT INTO fact_reports (
           report_id, report_type_id, visibility_id, current_status_id,
           authority_id, city_id, title, description,
           latitude, longitude, address, created_at,
           upvote_count, is_escalated
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
         ON CONFLICT(report_id) DO NOTHING",
      )?
      .execute(params![
        encode_uuid(report.report_id),
        report.report_type_id,
        report.visibility_id,
        report.current_status_id,
        report.authority_id,
        report.city_id,
        report.title,
        report.description,
        report.latitude,
        report.longitude,
        report.address,
        encode_dt(report.created_at),
        report.upvote_count,
        report.is_escalated,
      ])?;
    Ok(WriteOutcome::from_affected(n))
  }

  fn upsert_report_reporter(&self, bridge: &ReportReporter) -> rusqlite::Result<WriteOutcome> {
    let n = self
      .0
      .prepare_cached(
        "INSERT INTO bridge_report_reporter (report_id, reporter_id) VALUES (?1, ?2)
         ON CONFLICT DO NOTHING",
      )?
      .execute(params![encode_uuid(bridge.report_id), encode_uuid(bridge.reporter_id)])?;
    Ok(WriteOutcome::from_affected(n))
  }

  fn upsert_media_event(&self, media: &MediaEvent) -> rusqlite::Result<WriteOutcome> {
    let n = self
      .0
      .prepare_cached(
        "INSERT INTO fact_media_events (media_id, report_id, media_type, uploaded_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(media_id) DO NOTHING",
      )?
      .execute(params![
        encode_uuid(media.media_id),
        encode_uuid(media.report_id),
        media.media_type,
        encode_dt(media.uploaded_at),
      ])?;
    Ok(WriteOutcome::from_affected(n))
  }

  fn upsert_vote_event(&self, vote: &VoteEvent) -> rusqlite::Result<WriteOutcome> {
    let n = self
      .0
      .prepare_cached(
        "INSERT INTO fact_vote_events (report_id, voter_id) VALUES (?1, ?2)
         ON CONFLICT DO NOTHING",
      )?
      .execute(params![encode_uuid(vote.report_id), encode_uuid(vote.voter_id)])?;
    Ok(WriteOutcome::from_affected(n))
  }

  // ── Events obeying ReplayPolicy ───────────────────────────────────────────

  fn write_status_event(
    &self,
    event: &StatusEvent,
    replay: ReplayPolicy,
  ) -> rusqlite::Result<WriteOutcome> {
    let sql = match replay {
      ReplayPolicy::Append => {
        "INSERT INTO fact_status_events (
           report_id, status_id, actor_role_id, actor_id, note, event_timestamp
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
      }
      ReplayPolicy::Dedupe => {
        "INSERT INTO fact_status_events (
           report_id, status_id, actor_role_id, actor_id, note, event_timestamp
         )
         SELECT ?1, ?2, ?3, ?4, ?5, ?6
         WHERE NOT EXISTS (
           SELECT 1 FROM fact_status_events
           WHERE report_id = ?1 AND status_id = ?2 AND event_timestamp = ?6
         )"
      }
    };

    let n = self.0.prepare_cached(sql)?.execute(params![
      encode_uuid(event.report_id),
      event.status_id,
      event.actor_role_id,
      event.actor_id.map(encode_uuid),
      event.note,
      encode_dt(event.event_timestamp),
    ])?;
    Ok(WriteOutcome::from_affected(n))
  }

  fn write_escalation_event(
    &self,
    event: &EscalationEvent,
    replay: ReplayPolicy,
  ) -> rusqlite::Result<WriteOutcome> {
    let sql = match replay {
      ReplayPolicy::Append => {
        "INSERT INTO fact_escalation_events (report_id, escalated_to, reason, escalated_at)
         VALUES (?1, ?2, ?3, ?4)"
      }
      // `IS` so that two undated escalations of one report count as the same.
      ReplayPolicy::Dedupe => {
        "INSERT INTO fact_escalation_events (report_id, escalated_to, reason, escalated_at)
         SELECT ?1, ?2, ?3, ?4
         WHERE NOT EXISTS (
           SELECT 1 FROM fact_escalation_events
           WHERE report_id = ?1 AND escalated_at IS ?4
         )"
      }
    };

    let n = self.0.prepare_cached(sql)?.execute(params![
      encode_uuid(event.report_id),
      event.escalated_to,
      event.reason,
      event.escalated_at.map(encode_dt),
    ])?;
    Ok(WriteOutcome::from_affected(n))
  }
}
