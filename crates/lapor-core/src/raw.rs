//! The raw report document as served by the upstream reporting service.
//!
//! The document is denormalised: reporter, location, media, timeline, votes,
//! authority and escalation all travel together. The ingestion engine splits
//! it into dimension and fact rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawReport {
  pub report_id:   Uuid,
  /// Report type name, e.g. `"kebersihan"`.
  #[serde(rename = "type")]
  pub report_type: String,
  #[serde(default)]
  pub title:       Option<String>,
  #[serde(default)]
  pub description: Option<String>,
  pub visibility:  String,
  pub reporter:    RawReporter,
  #[serde(default)]
  pub location:    RawLocation,
  #[serde(default)]
  pub media:       Vec<RawMedia>,
  pub status:      RawStatus,
  #[serde(default)]
  pub timeline:    Vec<RawTimelineEntry>,
  #[serde(default)]
  pub votes:       RawVotes,
  #[serde(default)]
  pub authority:   RawAuthority,
  #[serde(default)]
  pub escalation:  RawEscalation,
  pub created_at:  DateTime<Utc>,
}

impl RawReport {
  /// Decode one document from an already-parsed JSON value.
  pub fn from_value(value: serde_json::Value) -> Result<Self> {
    Ok(serde_json::from_value(value)?)
  }

  /// Best-effort extraction of `report_id` from a document that may not
  /// decode as a whole.
  pub fn peek_id(value: &serde_json::Value) -> Option<Uuid> {
    value
      .get("report_id")
      .and_then(serde_json::Value::as_str)
      .and_then(|s| Uuid::parse_str(s).ok())
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawReporter {
  pub user_id: Uuid,
  pub name:    String,
  /// Accepted for compatibility; never persisted.
  #[serde(default)]
  pub contact: Option<RawContact>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawContact {
  pub email: Option<String>,
  pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLocation {
  pub latitude:  Option<f64>,
  pub longitude: Option<f64>,
  pub address:   Option<String>,
  /// Optional city name; preferred over coordinate matching when present.
  pub city:      Option<String>,
}

impl RawLocation {
  pub fn coordinates(&self) -> Option<(f64, f64)> {
    self.latitude.zip(self.longitude)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMedia {
  pub media_id:    Uuid,
  /// `image` | `video` | `audio`
  #[serde(rename = "type")]
  pub media_type:  String,
  #[serde(default)]
  pub url:         Option<String>,
  pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawStatus {
  pub current:    String,
  #[serde(default)]
  pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTimelineEntry {
  pub status:    String,
  pub actor:     RawActor,
  #[serde(default)]
  pub note:      Option<String>,
  pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawActor {
  #[serde(default)]
  pub actor_id:   Option<Uuid>,
  /// `citizen` | `officer` | `supervisor` | `system`
  pub actor_role: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawVotes {
  #[serde(default)]
  pub upvote_count: i64,
  #[serde(default)]
  pub voters:       Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAuthority {
  pub assigned_agency:     Option<String>,
  pub assigned_unit:       Option<String>,
  pub assigned_officer_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEscalation {
  #[serde(default)]
  pub is_escalated:      bool,
  pub escalated_to:      Option<String>,
  pub escalation_reason: Option<String>,
  pub escalated_at:      Option<DateTime<Utc>>,
}
