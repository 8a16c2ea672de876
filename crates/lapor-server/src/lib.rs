//! HTTP front end for the Lapor warehouse: configuration, upstream client,
//! auth, and the composed router served by the `lapor` binary.

pub mod auth;
pub mod error;
pub mod upstream;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware};
use lapor_api::{EtlState, analytics_router, etl_router};
use lapor_core::{
  batch::{BatchOptions, FailurePolicy, ReportSource},
  store::Warehouse,
  warehouse::{AuthorityPolicy, IngestPolicy, ReplayPolicy},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_basic_auth};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `lapor.toml` and `LAPOR_*`
/// environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  pub upstream:           UpstreamConfig,
  pub etl:                EtlConfig,
  pub auth_username:      Option<String>,
  pub auth_password_hash: Option<String>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:               "127.0.0.1".to_string(),
      port:               5003,
      store_path:         PathBuf::from("~/.local/share/lapor/warehouse.db"),
      upstream:           UpstreamConfig::default(),
      etl:                EtlConfig::default(),
      auth_username:      None,
      auth_password_hash: None,
    }
  }
}

impl ServerConfig {
  /// Basic-auth credentials, if both halves are configured.
  pub fn auth(&self) -> Option<AuthConfig> {
    match (&self.auth_username, &self.auth_password_hash) {
      (Some(username), Some(hash)) => Some(AuthConfig {
        username:      username.clone(),
        password_hash: hash.clone(),
      }),
      _ => None,
    }
  }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UpstreamConfig {
  /// Base URL of the report service; `/reports/list` is appended.
  pub base_url:     String,
  pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
  fn default() -> Self {
    Self { base_url: "http://localhost:5001/api".to_string(), timeout_secs: 30 }
  }
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(default)]
pub struct EtlConfig {
  pub authority_policy: AuthorityPolicy,
  pub replay_policy:    ReplayPolicy,
  pub failure_policy:   FailurePolicy,
}

impl EtlConfig {
  pub fn batch_options(&self) -> BatchOptions {
    BatchOptions {
      policy:  IngestPolicy { authority: self.authority_policy, replay: self.replay_policy },
      failure: self.failure_policy,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Compose the full application: analytics open, ETL behind basic auth when
/// `auth` is set, request tracing on everything.
pub fn router<W, R>(
  warehouse: Arc<W>,
  source: Arc<R>,
  options: BatchOptions,
  auth: Option<AuthConfig>,
) -> Router
where
  W: Warehouse + 'static,
  R: ReportSource + 'static,
{
  let etl = etl_router(EtlState { warehouse: warehouse.clone(), source, options });
  let etl = match auth {
    Some(auth) => etl.layer(middleware::from_fn_with_state(Arc::new(auth), require_basic_auth)),
    None => etl,
  };

  Router::new()
    .nest("/api/analytics", analytics_router(warehouse))
    .nest("/api/etl", etl)
    .layer(TraceLayer::new_for_http())
}
