//! Error types and axum `IntoResponse` implementation.

use axum::{
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  #[error("upstream request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("upstream answered {0}")]
  UpstreamStatus(reqwest::StatusCode),
  #[error("unexpected upstream body: {0}")]
  UnexpectedBody(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        let mut res = (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"lapor\""),
        );
        res
      }
      other => (StatusCode::BAD_GATEWAY, other.to_string()).into_response(),
    }
  }
}
