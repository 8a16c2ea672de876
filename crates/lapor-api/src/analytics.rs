//! Handlers for `/analytics/*`. Each one parses the date window, asks the
//! aggregation engine, and returns its response shape unchanged.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use lapor_core::{
  analytics::{
    heatmap::HeatmapResponse,
    ranking::{RankingResponse, SlaComplianceResponse},
    summary::{OverviewResponse, RecentReportsResponse},
    trend::EscalationResponse,
    types::{DistributionResponse, MttrResponse},
  },
  analytics as agg,
  store::Warehouse,
  window::DateWindow,
};
use serde::Deserialize;

use crate::error::ApiError;

/// `?startDate=&endDate=`, both optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowParams {
  pub start_date: Option<String>,
  pub end_date:   Option<String>,
}

impl WindowParams {
  pub fn window(&self) -> Result<DateWindow, ApiError> {
    Ok(DateWindow::parse(self.start_date.as_deref(), self.end_date.as_deref())?)
  }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentParams {
  pub limit: Option<i64>,
}

pub async fn ranking<W: Warehouse>(
  State(warehouse): State<Arc<W>>,
  Query(params): Query<WindowParams>,
) -> Result<Json<RankingResponse>, ApiError> {
  let window = params.window()?;
  let response = agg::ranking::ranking(&*warehouse, window)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(response))
}

pub async fn sla_compliance<W: Warehouse>(
  State(warehouse): State<Arc<W>>,
  Query(params): Query<WindowParams>,
) -> Result<Json<SlaComplianceResponse>, ApiError> {
  let window = params.window()?;
  let response = agg::ranking::sla_compliance(&*warehouse, window)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(response))
}

pub async fn mttr_by_type<W: Warehouse>(
  State(warehouse): State<Arc<W>>,
  Query(params): Query<WindowParams>,
) -> Result<Json<MttrResponse>, ApiError> {
  let window = params.window()?;
  let response = agg::types::mttr_by_type(&*warehouse, window)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(response))
}

pub async fn report_type_distribution<W: Warehouse>(
  State(warehouse): State<Arc<W>>,
  Query(params): Query<WindowParams>,
) -> Result<Json<DistributionResponse>, ApiError> {
  let window = params.window()?;
  let response = agg::types::report_type_distribution(&*warehouse, window)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(response))
}

pub async fn heatmap<W: Warehouse>(
  State(warehouse): State<Arc<W>>,
  Query(params): Query<WindowParams>,
) -> Result<Json<HeatmapResponse>, ApiError> {
  let window = params.window()?;
  let response = agg::heatmap::heatmap(&*warehouse, window)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(response))
}

pub async fn escalation<W: Warehouse>(
  State(warehouse): State<Arc<W>>,
  Query(params): Query<WindowParams>,
) -> Result<Json<EscalationResponse>, ApiError> {
  let window = params.window()?;
  let response = agg::trend::escalation(&*warehouse, window)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(response))
}

pub async fn overview<W: Warehouse>(
  State(warehouse): State<Arc<W>>,
  Query(params): Query<WindowParams>,
) -> Result<Json<OverviewResponse>, ApiError> {
  let window = params.window()?;
  let response = agg::summary::overview(&*warehouse, window)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(response))
}

/// Not windowed: always the newest reports.
pub async fn recent_reports<W: Warehouse>(
  State(warehouse): State<Arc<W>>,
  Query(params): Query<RecentParams>,
) -> Result<Json<RecentReportsResponse>, ApiError> {
  let response = agg::summary::recent_reports(&*warehouse, params.limit)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(response))
}
