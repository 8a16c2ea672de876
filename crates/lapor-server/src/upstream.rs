//! [`HttpReportSource`]: pulls raw report documents from the upstream report
//! service over HTTP.

use std::time::Duration;

use lapor_core::batch::ReportSource;
use serde_json::Value;
use tracing::debug;

use crate::{
  UpstreamConfig,
  error::{Error, Result},
};

pub struct HttpReportSource {
  client:   reqwest::Client,
  list_url: String,
}

impl HttpReportSource {
  pub fn new(config: &UpstreamConfig) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    let list_url = format!("{}/reports/list", config.base_url.trim_end_matches('/'));
    Ok(Self { client, list_url })
  }

  pub fn list_url(&self) -> &str { &self.list_url }
}

impl ReportSource for HttpReportSource {
  type Error = Error;

  async fn fetch_reports(&self) -> Result<Vec<Value>> {
    debug!(url = %self.list_url, "fetching upstream reports");
    let res = self.client.get(&self.list_url).send().await?;
    let status = res.status();
    if !status.is_success() {
      return Err(Error::UpstreamStatus(status));
    }
    extract_documents(res.json().await?)
  }
}

/// Accept either a bare array or an envelope with a `data` array.
pub fn extract_documents(body: Value) -> Result<Vec<Value>> {
  match body {
    Value::Array(docs) => Ok(docs),
    Value::Object(mut map) => match map.remove("data") {
      Some(Value::Array(docs)) => Ok(docs),
      _ => Err(Error::UnexpectedBody("object without a `data` array".into())),
    },
    other => Err(Error::UnexpectedBody(format!("expected an array, got {other}"))),
  }
}
