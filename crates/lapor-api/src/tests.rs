//! Router tests against an in-memory SQLite warehouse.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode},
};
use lapor_core::batch::{BatchOptions, FailurePolicy, ReportSource};
use lapor_store_sqlite::SqliteWarehouse;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{EtlState, analytics_router, etl_router};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct SourceDown(String);

struct FixedSource(Result<Vec<Value>, String>);

impl ReportSource for FixedSource {
  type Error = SourceDown;

  async fn fetch_reports(&self) -> Result<Vec<Value>, SourceDown> {
    self.0.clone().map_err(SourceDown)
  }
}

async fn warehouse() -> Arc<SqliteWarehouse> {
  let w = SqliteWarehouse::open_in_memory().await.unwrap();
  w.seed_dimensions().await.unwrap();
  Arc::new(w)
}

fn doc(id: Uuid, created: &str, status: &str) -> Value {
  json!({
    "report_id": id,
    "type": "kesehatan",
    "title": "Puskesmas tutup",
    "description": "Tidak ada petugas",
    "visibility": "public",
    "reporter": { "user_id": Uuid::new_v4(), "name": "Sari" },
    "location": { "latitude": -6.91, "longitude": 107.61, "address": "Jl. Asia Afrika" },
    "media": [],
    "status": { "current": status },
    "timeline": [{
      "status": "submitted",
      "actor": { "actor_role": "citizen" },
      "timestamp": created
    }],
    "votes": { "upvote_count": 3, "voters": [] },
    "authority": { "assigned_agency": "Dinas Kesehatan" },
    "escalation": { "is_escalated": false },
    "created_at": created
  })
}

fn app(w: Arc<SqliteWarehouse>, source: FixedSource) -> Router {
  let state = EtlState { warehouse: w.clone(), source: Arc::new(source), options: BatchOptions::default() };
  Router::new()
    .nest("/analytics", analytics_router(w))
    .nest("/etl", etl_router(state))
}

async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
  let req = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
  let res = app.oneshot(req).await.unwrap();
  let status = res.status();
  let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
  let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, body)
}

// ─── ETL ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn etl_run_isolates_bad_documents() {
  let w = warehouse().await;
  let good = Uuid::new_v4();
  let source = FixedSource(Ok(vec![
    doc(good, "2026-03-01T08:00:00Z", "submitted"),
    json!({ "report_id": Uuid::new_v4(), "type": "kesehatan" }),
  ]));

  let (status, body) = send(app(w.clone(), source), "POST", "/etl/run").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["processed"], 1);
  assert_eq!(body["succeeded"], json!([good]));
  assert_eq!(body["failed"].as_array().unwrap().len(), 1);
  assert!(body["message"].as_str().unwrap().contains("1 failed"));
}

#[tokio::test]
async fn etl_run_reports_upstream_failure_as_bad_gateway() {
  let w = warehouse().await;
  let (status, body) =
    send(app(w, FixedSource(Err("connection refused".into()))), "POST", "/etl/run").await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);
  assert!(body["message"].as_str().unwrap().contains("connection refused"));
  assert!(body["error"].is_string());
}

#[tokio::test]
async fn etl_run_abort_on_first_is_server_error() {
  let w = warehouse().await;
  let state = EtlState {
    warehouse: w.clone(),
    source:    Arc::new(FixedSource(Ok(vec![json!({ "title": "broken" })]))),
    options:   BatchOptions { failure: FailurePolicy::AbortOnFirst, ..BatchOptions::default() },
  };
  let (status, _) = send(etl_router(state), "POST", "/run").await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn etl_run_rejects_get() {
  let w = warehouse().await;
  let (status, _) = send(app(w, FixedSource(Ok(vec![]))), "GET", "/etl/run").await;
  assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

// ─── Analytics ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn overview_on_empty_warehouse_is_all_zero() {
  let w = warehouse().await;
  let (status, body) = send(app(w, FixedSource(Ok(vec![]))), "GET", "/analytics/overview").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["totalReports"], 0);
  assert_eq!(body["pendingReports"], 0);
  assert!(body["updatedAt"].is_string());
}

#[tokio::test]
async fn overview_honours_date_window() {
  let w = warehouse().await;
  let source = FixedSource(Ok(vec![
    doc(Uuid::new_v4(), "2026-01-10T08:00:00Z", "submitted"),
    doc(Uuid::new_v4(), "2026-02-10T08:00:00Z", "submitted"),
  ]));
  let (status, _) = send(app(w.clone(), source), "POST", "/etl/run").await;
  assert_eq!(status, StatusCode::OK);

  let router = app(w.clone(), FixedSource(Ok(vec![])));
  let (_, all) = send(router.clone(), "GET", "/analytics/overview").await;
  assert_eq!(all["totalReports"], 2);

  let (_, jan) =
    send(router, "GET", "/analytics/overview?startDate=2026-01-01&endDate=2026-01-31").await;
  assert_eq!(jan["totalReports"], 1);
}

#[tokio::test]
async fn malformed_window_is_bad_request() {
  let w = warehouse().await;
  let router = app(w, FixedSource(Ok(vec![])));

  let (status, body) = send(router.clone(), "GET", "/analytics/ranking?startDate=yesterday").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["message"].is_string());

  let (status, _) =
    send(router, "GET", "/analytics/heatmap?startDate=2026-05-01&endDate=2026-04-01").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn every_windowed_endpoint_answers() {
  let w = warehouse().await;
  let router = app(w, FixedSource(Ok(vec![])));
  for path in [
    "ranking",
    "sla-compliance",
    "mttr-by-type",
    "report-type-distribution",
    "heatmap",
    "escalation",
    "overview",
  ] {
    let (status, _) = send(router.clone(), "GET", &format!("/analytics/{path}")).await;
    assert_eq!(status, StatusCode::OK, "{path}");
  }
}

#[tokio::test]
async fn recent_reports_respects_limit() {
  let w = warehouse().await;
  let source = FixedSource(Ok(vec![
    doc(Uuid::new_v4(), "2026-03-01T08:00:00Z", "submitted"),
    doc(Uuid::new_v4(), "2026-03-02T08:00:00Z", "in_progress"),
    doc(Uuid::new_v4(), "2026-03-03T08:00:00Z", "resolved"),
  ]));
  send(app(w.clone(), source), "POST", "/etl/run").await;

  let (status, body) =
    send(app(w, FixedSource(Ok(vec![]))), "GET", "/analytics/recent-reports?limit=2").await;
  assert_eq!(status, StatusCode::OK);
  let data = body["data"].as_array().unwrap();
  assert_eq!(data.len(), 2);
  assert_eq!(data[0]["status"], "resolved");
}

#[tokio::test]
async fn ranking_lists_assigned_agency() {
  let w = warehouse().await;
  let source = FixedSource(Ok(vec![doc(Uuid::new_v4(), "2026-03-01T08:00:00Z", "submitted")]));
  send(app(w.clone(), source), "POST", "/etl/run").await;

  let (_, body) = send(app(w, FixedSource(Ok(vec![]))), "GET", "/analytics/ranking").await;
  let data = body["data"].as_array().unwrap();
  assert_eq!(data.len(), 1);
  assert_eq!(data[0]["agencyName"], "Dinas Kesehatan");
  assert_eq!(data[0]["rank"], 1);
}
