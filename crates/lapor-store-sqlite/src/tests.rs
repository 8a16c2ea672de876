//! Integration tests for `SqliteWarehouse` against an in-memory database.

use chrono::{DateTime, Duration, TimeZone, Utc};
use lapor_core::{
  analytics::{heatmap, ranking, trend, types},
  dimension::{CityResolution, EnumDimension},
  ingest::AuthorityLink,
  raw::RawReport,
  store::Warehouse,
  warehouse::{AuthorityPolicy, IngestPolicy, ReplayPolicy, WriteOutcome},
  window::DateWindow,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{Error, SqliteWarehouse};

async fn store() -> SqliteWarehouse {
  let s = SqliteWarehouse::open_in_memory().await.expect("in-memory store");
  s.seed_dimensions().await.expect("seed");
  s
}

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

/// A minimal upstream document: submitted, assigned, located in central
/// Jakarta, not escalated.
fn doc(created: DateTime<Utc>) -> Value {
  json!({
    "report_id": Uuid::new_v4(),
    "type": "kebersihan",
    "title": "Sampah menumpuk",
    "description": "Belum diangkut",
    "visibility": "public",
    "reporter": {
      "user_id": Uuid::new_v4(),
      "name": "Budi",
      "contact": { "email": "budi@example.com", "phone": "0812" }
    },
    "location": { "latitude": -6.18, "longitude": 106.83, "address": "Jl. Merdeka" },
    "media": [],
    "status": { "current": "submitted" },
    "timeline": [{
      "status": "submitted",
      "actor": { "actor_role": "citizen" },
      "timestamp": created.to_rfc3339()
    }],
    "votes": { "upvote_count": 0, "voters": [] },
    "authority": { "assigned_agency": "Dinas Lingkungan Hidup" },
    "escalation": { "is_escalated": false },
    "created_at": created.to_rfc3339()
  })
}

fn resolved_after(mut d: Value, hours: i64) -> Value {
  let created: DateTime<Utc> = d["created_at"].as_str().unwrap().parse().unwrap();
  d["status"]["current"] = json!("resolved");
  d["timeline"].as_array_mut().unwrap().push(json!({
    "status": "resolved",
    "actor": { "actor_role": "officer" },
    "timestamp": (created + Duration::hours(hours)).to_rfc3339()
  }));
  d
}

fn escalated(mut d: Value, when: DateTime<Utc>) -> Value {
  d["escalation"] = json!({
    "is_escalated": true,
    "escalated_to": "Walikota",
    "escalation_reason": "Lambat",
    "escalated_at": when.to_rfc3339()
  });
  d
}

fn raw(d: Value) -> RawReport { RawReport::from_value(d).unwrap() }

async fn ingest(s: &SqliteWarehouse, d: Value) -> lapor_core::ingest::IngestReceipt {
  s.ingest_report(raw(d), IngestPolicy::default()).await.unwrap()
}

// ─── Schema & seeding ────────────────────────────────────────────────────────

#[tokio::test]
async fn seeding_is_idempotent() {
  let s = SqliteWarehouse::open_in_memory().await.unwrap();

  let first = s.seed_dimensions().await.unwrap();
  assert_eq!(first.report_types, 5);
  assert_eq!(first.statuses, 6);
  assert_eq!(first.cities, 32);

  let second = s.seed_dimensions().await.unwrap();
  assert_eq!(second.total(), 0);

  let counts = s.table_counts().await.unwrap();
  assert_eq!(counts.get("dim_city"), Some(32));
  assert_eq!(counts.get("dim_actor_role"), Some(4));
  assert_eq!(counts.get("fact_reports"), Some(0));
}

// ─── Ingestion ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn ingest_populates_every_table() {
  let s = store().await;
  let mut d = escalated(resolved_after(doc(at(2024, 3, 1, 8)), 5), at(2024, 3, 1, 10));
  d["media"] = json!([{
    "media_id": Uuid::new_v4(),
    "type": "image",
    "url": "https://cdn.example.com/x.jpg",
    "uploaded_at": at(2024, 3, 1, 8).to_rfc3339()
  }]);
  d["votes"] = json!({ "upvote_count": 2, "voters": [Uuid::new_v4(), Uuid::new_v4()] });

  let receipt = ingest(&s, d).await;
  assert_eq!(receipt.report, WriteOutcome::Inserted);
  assert!(matches!(receipt.authority, AuthorityLink::Created(_)));
  assert_eq!(receipt.status_events, 2);

  let c = s.table_counts().await.unwrap();
  assert_eq!(c.get("fact_reports"), Some(1));
  assert_eq!(c.get("dim_reporter"), Some(1));
  assert_eq!(c.get("bridge_report_reporter"), Some(1));
  assert_eq!(c.get("dim_authority"), Some(1));
  assert_eq!(c.get("fact_status_events"), Some(2));
  assert_eq!(c.get("fact_media_events"), Some(1));
  assert_eq!(c.get("fact_vote_events"), Some(2));
  assert_eq!(c.get("fact_escalation_events"), Some(1));
}

#[tokio::test]
async fn dedupe_replay_is_a_no_op() {
  let s = store().await;
  let d = escalated(resolved_after(doc(at(2024, 3, 1, 8)), 5), at(2024, 3, 2, 8));

  ingest(&s, d.clone()).await;
  let before = s.table_counts().await.unwrap();

  let again = ingest(&s, d).await;
  assert_eq!(again.report, WriteOutcome::AlreadyPresent);
  assert_eq!(again.status_events, 0);
  assert!(!again.escalation);
  assert_eq!(s.table_counts().await.unwrap(), before);
}

#[tokio::test]
async fn append_replay_duplicates_only_timeline_and_escalation() {
  let s = store().await;
  let d = escalated(resolved_after(doc(at(2024, 3, 1, 8)), 5), at(2024, 3, 2, 8));
  let policy = IngestPolicy { replay: ReplayPolicy::Append, ..Default::default() };

  s.ingest_report(raw(d.clone()), policy).await.unwrap();
  s.ingest_report(raw(d), policy).await.unwrap();

  let c = s.table_counts().await.unwrap();
  assert_eq!(c.get("fact_reports"), Some(1));
  assert_eq!(c.get("dim_reporter"), Some(1));
  assert_eq!(c.get("bridge_report_reporter"), Some(1));
  assert_eq!(c.get("fact_status_events"), Some(4));
  assert_eq!(c.get("fact_escalation_events"), Some(2));
}

#[tokio::test]
async fn missing_dimension_rolls_back_the_whole_report() {
  let s = store().await;
  let mut d = doc(at(2024, 3, 1, 8));
  // Fails at the timeline step, after reporter, authority and report rows
  // were written inside the transaction.
  d["timeline"][0]["status"] = json!("archived");

  let err = s.ingest_report(raw(d), IngestPolicy::default()).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(lapor_core::Error::MissingDimensionValue { dimension: EnumDimension::Status, .. })
  ));

  let c = s.table_counts().await.unwrap();
  for table in ["fact_reports", "dim_reporter", "dim_authority", "bridge_report_reporter"] {
    assert_eq!(c.get(table), Some(0), "{table} should be empty");
  }
}

#[tokio::test]
async fn lookup_existing_links_both_reports_to_one_authority() {
  let s = store().await;
  let a = ingest(&s, doc(at(2024, 3, 1, 8))).await;
  let b = ingest(&s, doc(at(2024, 3, 2, 8))).await;

  let id = a.authority.authority_id().unwrap();
  assert_eq!(b.authority, AuthorityLink::Existing(id));
  assert_eq!(s.table_counts().await.unwrap().get("dim_authority"), Some(1));

  let recent = s.recent_reports(10).await.unwrap();
  assert!(recent.iter().all(|r| r.agency.as_deref() == Some("Dinas Lingkungan Hidup")));
}

#[tokio::test]
async fn skip_link_leaves_the_second_report_unassigned() {
  let s = store().await;
  let policy = IngestPolicy { authority: AuthorityPolicy::SkipLink, ..Default::default() };

  s.ingest_report(raw(doc(at(2024, 3, 1, 8))), policy).await.unwrap();
  let second = doc(at(2024, 3, 2, 8));
  let second_id = second["report_id"].as_str().unwrap().to_owned();
  let receipt = s.ingest_report(raw(second), policy).await.unwrap();
  assert_eq!(receipt.authority, AuthorityLink::Skipped);

  let recent = s.recent_reports(10).await.unwrap();
  let row = recent.iter().find(|r| r.report_id.to_string() == second_id).unwrap();
  assert_eq!(row.agency, None);
}

#[tokio::test]
async fn fail_policy_rolls_the_second_report_back() {
  let s = store().await;
  let policy = IngestPolicy { authority: AuthorityPolicy::Fail, ..Default::default() };

  s.ingest_report(raw(doc(at(2024, 3, 1, 8))), policy).await.unwrap();
  let err = s
    .ingest_report(raw(doc(at(2024, 3, 2, 8))), policy)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(lapor_core::Error::DimensionConflict { .. })));
  assert_eq!(s.table_counts().await.unwrap().get("fact_reports"), Some(1));
}

#[tokio::test]
async fn city_resolution_prefers_name_then_nearest() {
  let s = store().await;

  let mut near_bandung = doc(at(2024, 3, 1, 8));
  near_bandung["location"] = json!({ "latitude": -6.91, "longitude": 107.61 });
  let r = ingest(&s, near_bandung).await;
  assert!(matches!(r.city, CityResolution::Nearest(_)));

  let mut named = doc(at(2024, 3, 1, 9));
  named["location"]["city"] = json!("Surabaya");
  let r = ingest(&s, named).await;
  assert!(matches!(r.city, CityResolution::ByName(_)));

  let mut nowhere = doc(at(2024, 3, 1, 10));
  nowhere["location"] = json!({ "address": "unknown" });
  let r = ingest(&s, nowhere).await;
  assert_eq!(r.city, CityResolution::Unresolved);

  let recent = s.recent_reports(10).await.unwrap();
  let cities: Vec<_> = recent.iter().map(|r| r.city.as_deref()).collect();
  assert_eq!(cities, vec![None, Some("Surabaya"), Some("Bandung")]);
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn agency_stats_measure_first_resolution() {
  let s = store().await;
  ingest(&s, resolved_after(doc(at(2024, 3, 1, 0)), 10)).await;
  ingest(&s, resolved_after(doc(at(2024, 3, 2, 0)), 80)).await;
  ingest(&s, doc(at(2024, 3, 3, 0))).await;

  let mut unassigned = doc(at(2024, 3, 4, 0));
  unassigned["authority"] = json!({ "assigned_agency": null });
  ingest(&s, unassigned).await;

  let rows = s.agency_stats(DateWindow::all(), 72.0).await.unwrap();
  assert_eq!(rows.len(), 1);
  let row = &rows[0];
  assert_eq!(row.agency, "Dinas Lingkungan Hidup");
  assert_eq!(row.total_reports, 3);
  assert_eq!(row.resolved_count, 2);
  assert_eq!(row.sla_breached_count, 1);
  let avg = row.avg_resolution_hours.unwrap();
  assert!((avg - 45.0).abs() < 1e-6, "avg was {avg}");
}

#[tokio::test]
async fn window_filters_every_aggregate() {
  let s = store().await;
  ingest(&s, doc(at(2024, 1, 15, 12))).await;
  ingest(&s, doc(at(2024, 2, 15, 12))).await;
  ingest(&s, escalated(doc(at(2024, 3, 15, 12)), at(2024, 3, 16, 0))).await;

  let all = s.overview_counts(DateWindow::all()).await.unwrap();
  assert_eq!(all.total, 3);
  assert_eq!(all.pending, 3);
  assert_eq!(all.escalated, 1);

  let feb = DateWindow::parse(Some("2024-02-01"), Some("2024-02-29")).unwrap();
  assert_eq!(s.overview_counts(feb).await.unwrap().total, 1);
  assert_eq!(s.heatmap_rows(feb).await.unwrap().len(), 1);

  let from_feb = DateWindow::parse(Some("2024-02-15T12:00:00Z"), None).unwrap();
  assert_eq!(s.overview_counts(from_feb).await.unwrap().total, 2);

  let until_jan = DateWindow::parse(None, Some("2024-01-15")).unwrap();
  assert_eq!(s.overview_counts(until_jan).await.unwrap().total, 1);

  let empty = DateWindow::parse(Some("2025-01-01"), None).unwrap();
  let none = s.overview_counts(empty).await.unwrap();
  assert_eq!(none.total, 0);
  assert_eq!(none.pending, 0);
}

#[tokio::test]
async fn type_stats_cover_every_seeded_type() {
  let s = store().await;
  ingest(&s, resolved_after(doc(at(2024, 3, 1, 0)), 24)).await;
  let mut crime = doc(at(2024, 3, 1, 1));
  crime["type"] = json!("kriminalitas");
  ingest(&s, crime).await;

  let rows = s.type_resolution_stats(DateWindow::all()).await.unwrap();
  assert_eq!(rows.len(), 5);
  let clean = rows.iter().find(|r| r.report_type == "kebersihan").unwrap();
  assert_eq!((clean.resolved_count, clean.total_count), (1, 1));
  assert!((clean.avg_resolution_hours.unwrap() - 24.0).abs() < 1e-6);
  let health = rows.iter().find(|r| r.report_type == "kesehatan").unwrap();
  assert_eq!((health.total_count, health.avg_resolution_hours), (0, None));

  let mttr = types::mttr_by_type(&s, DateWindow::all()).await.unwrap();
  assert_eq!(mttr.data[0].report_type, "kebersihan");

  let dist = types::report_type_distribution(&s, DateWindow::all()).await.unwrap();
  assert_eq!(dist.data.len(), 2);
  assert!(dist.data.iter().any(|e| e.report_type == "kriminalitas" && e.submitted == 1));
}

#[tokio::test]
async fn heatmap_skips_reports_without_coordinates() {
  let s = store().await;
  let mut a = doc(at(2024, 3, 1, 0));
  a["votes"]["upvote_count"] = json!(20);
  ingest(&s, a).await;
  ingest(&s, doc(at(2024, 3, 1, 1))).await;
  let mut no_lat = doc(at(2024, 3, 1, 2));
  no_lat["location"] = json!({ "longitude": 106.83 });
  ingest(&s, no_lat).await;

  let response = heatmap::heatmap(&s, DateWindow::all()).await.unwrap();
  assert_eq!(response.points.len(), 2);
  assert_eq!(response.points[0].intensity, 1.0);
  assert_eq!(response.clusters.len(), 1);
  assert_eq!(response.clusters[0].count, 2);
  assert_eq!(response.clusters[0].types["Kebersihan"], 2);
}

#[tokio::test]
async fn monthly_outcomes_are_newest_first_and_limited() {
  let s = store().await;
  for month in 1..=4 {
    ingest(&s, doc(at(2024, month, 10, 0))).await;
  }
  ingest(&s, resolved_after(doc(at(2024, 4, 11, 0)), 2)).await;

  let rows = s.monthly_outcomes(DateWindow::all(), 3).await.unwrap();
  let months: Vec<_> = rows.iter().map(|r| (r.year, r.month)).collect();
  assert_eq!(months, vec![(2024, 4), (2024, 3), (2024, 2)]);
  assert_eq!(rows[0].total, 2);
  assert_eq!(rows[0].resolved, 1);

  let response = trend::escalation(&s, DateWindow::all()).await.unwrap();
  assert_eq!(response.stats.total_reports, 5);
  let periods: Vec<_> = response.trends.iter().map(|t| t.period.as_str()).collect();
  assert_eq!(periods, vec!["Jan", "Feb", "Mar", "Apr"]);
}

#[tokio::test]
async fn recent_reports_are_newest_first() {
  let s = store().await;
  for day in 1..=5 {
    ingest(&s, doc(at(2024, 3, day, 0))).await;
  }
  let rows = s.recent_reports(3).await.unwrap();
  assert_eq!(rows.len(), 3);
  assert_eq!(rows[0].created_at, at(2024, 3, 5, 0));
  assert_eq!(rows[2].created_at, at(2024, 3, 3, 0));
  assert_eq!(rows[0].status, "submitted");
}

#[tokio::test]
async fn ranking_end_to_end() {
  let s = store().await;
  ingest(&s, resolved_after(doc(at(2024, 3, 1, 0)), 36)).await;

  let mut other = resolved_after(doc(at(2024, 3, 1, 0)), 100);
  other["authority"]["assigned_agency"] = json!("Dinas Perhubungan");
  ingest(&s, other).await;

  let mut sentinel = doc(at(2024, 3, 1, 0));
  sentinel["authority"]["assigned_agency"] = json!("Belum Ditugaskan");
  ingest(&s, sentinel).await;

  let response = ranking::ranking(&s, DateWindow::all()).await.unwrap();
  let names: Vec<_> = response.data.iter().map(|e| e.agency_name.as_str()).collect();
  assert_eq!(names, vec!["Dinas Lingkungan Hidup", "Dinas Perhubungan"]);
  // 100 - 0 - 10
  assert_eq!(response.data[0].score, 90);
  // 100 - 30 - min(27.8, 30) = 42
  assert_eq!(response.data[1].score, 42);
  assert_eq!(response.data[1].sla_breached_count, 1);
}

#[tokio::test]
async fn resolution_before_creation_counts_as_zero_hours() {
  let s = store().await;
  ingest(&s, resolved_after(doc(at(2024, 3, 10, 0)), -72)).await;

  let rows = s.agency_stats(DateWindow::all(), 72.0).await.unwrap();
  assert_eq!(rows[0].resolved_count, 1);
  assert_eq!(rows[0].avg_resolution_hours, Some(0.0));
  assert_eq!(rows[0].sla_breached_count, 0);

  let response = ranking::ranking(&s, DateWindow::all()).await.unwrap();
  assert_eq!(response.data[0].score, 100);
  assert_eq!(response.data[0].avg_resolution_time_hours, Some(0.0));

  let mttr = types::mttr_by_type(&s, DateWindow::all()).await.unwrap();
  let clean = mttr.data.iter().find(|e| e.report_type == "kebersihan").unwrap();
  assert_eq!(clean.avg_resolution_hours, Some(0.0));
}

#[tokio::test]
async fn reopened_report_is_not_counted_as_resolved() {
  let s = store().await;
  let mut reopened = resolved_after(doc(at(2024, 3, 1, 0)), 10);
  reopened["status"]["current"] = json!("in_progress");
  ingest(&s, reopened).await;

  let rows = s.agency_stats(DateWindow::all(), 72.0).await.unwrap();
  assert_eq!((rows[0].total_reports, rows[0].resolved_count), (1, 0));
  assert_eq!(rows[0].avg_resolution_hours, None);
  assert_eq!(rows[0].sla_breached_count, 0);

  let types = s.type_resolution_stats(DateWindow::all()).await.unwrap();
  let clean = types.iter().find(|r| r.report_type == "kebersihan").unwrap();
  assert_eq!((clean.resolved_count, clean.total_count), (0, 1));
  assert_eq!(clean.avg_resolution_hours, None);

  // Resolved again later: both aggregates now agree on one resolved report.
  ingest(&s, resolved_after(doc(at(2024, 3, 2, 0)), 20)).await;
  let agency = &s.agency_stats(DateWindow::all(), 72.0).await.unwrap()[0];
  let clean = s
    .type_resolution_stats(DateWindow::all())
    .await
    .unwrap()
    .into_iter()
    .find(|r| r.report_type == "kebersihan")
    .unwrap();
  assert_eq!(agency.resolved_count, clean.resolved_count);
  assert!((agency.avg_resolution_hours.unwrap() - 20.0).abs() < 1e-6);
  assert!((clean.avg_resolution_hours.unwrap() - 20.0).abs() < 1e-6);
}
