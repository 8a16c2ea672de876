//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("upstream unavailable: {0}")]
  Upstream(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }

  fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn label(&self) -> &'static str {
    match self {
      ApiError::BadRequest(_) => "Invalid request",
      ApiError::Upstream(_) => "Failed to fetch upstream reports",
      ApiError::Store(_) => "Internal server error",
    }
  }
}

impl From<lapor_core::Error> for ApiError {
  fn from(err: lapor_core::Error) -> Self {
    match err {
      lapor_core::Error::InvalidWindow(msg) => ApiError::BadRequest(msg),
      lapor_core::Error::UpstreamFetch(msg) => ApiError::Upstream(msg),
      other => ApiError::store(other),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let message = match &self {
      ApiError::BadRequest(m) | ApiError::Upstream(m) => m.clone(),
      ApiError::Store(e) => e.to_string(),
    };
    let body = json!({ "error": self.label(), "message": message });
    (self.status(), Json(body)).into_response()
  }
}
