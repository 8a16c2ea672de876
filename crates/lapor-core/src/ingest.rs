//! The ingestion engine: one raw report in, dimension and fact rows out.
//!
//! [`ingest_report`] runs entirely against a [`WarehouseTx`]; the caller opens
//! the transaction, and commits it only if this returns `Ok`. Any error
//! (unknown dimension value, authority conflict under
//! [`AuthorityPolicy::Fail`], backend failure) leaves the caller to roll back,
//! so a report is either fully visible or not at all.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  dimension::{CityResolution, DimensionId, EnumDimension, NewAuthority, Reporter, nearest_city},
  raw::{RawAuthority, RawLocation, RawReport},
  warehouse::{
    AuthorityPolicy, EscalationEvent, IngestPolicy, MediaEvent, ReportFact, ReportReporter,
    StatusEvent, VoteEvent, WarehouseTx, WriteOutcome,
  },
};

/// The authority reference written onto a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "link", content = "authority_id", rename_all = "snake_case")]
pub enum AuthorityLink {
  /// The document names no agency.
  Unassigned,
  Existing(DimensionId),
  Created(DimensionId),
  /// An agency was named but its row could not be created; the report was
  /// written without a link.
  Skipped,
}

impl AuthorityLink {
  pub fn authority_id(self) -> Option<DimensionId> {
    match self {
      Self::Existing(id) | Self::Created(id) => Some(id),
      Self::Unassigned | Self::Skipped => None,
    }
  }
}

/// Summary of what one ingestion wrote. Counts only include rows that were
/// actually inserted, so a replay under the dedupe policy reports zeros.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReceipt {
  pub report_id:     Uuid,
  pub city:          CityResolution,
  pub authority:     AuthorityLink,
  pub report:        WriteOutcome,
  pub status_events: usize,
  pub media_events:  usize,
  pub vote_events:   usize,
  pub escalation:    bool,
}

/// Resolve an enumerated dimension value, failing if it was never seeded.
pub fn resolve_enum<T: WarehouseTx>(
  tx: &T,
  dimension: EnumDimension,
  name: &str,
) -> Result<DimensionId> {
  tx.lookup_dimension(dimension, name)
    .map_err(Error::transaction)?
    .ok_or_else(|| Error::MissingDimensionValue { dimension, name: name.to_owned() })
}

/// Exact city name first, then nearest centre, else unresolved.
pub fn resolve_city<T: WarehouseTx>(tx: &T, location: &RawLocation) -> Result<CityResolution> {
  if let Some(name) = location.city.as_deref().map(str::trim).filter(|n| !n.is_empty())
    && let Some(id) = tx.city_by_name(name).map_err(Error::transaction)?
  {
    return Ok(CityResolution::ByName(id));
  }

  let Some((lat, lng)) = location.coordinates() else {
    return Ok(CityResolution::Unresolved);
  };

  let cities = tx.cities().map_err(Error::transaction)?;
  Ok(
    nearest_city(&cities, lat, lng)
      .map(|c| CityResolution::Nearest(c.city_id))
      .unwrap_or(CityResolution::Unresolved),
  )
}

/// Find or create the authority row for the document's assigned agency.
pub fn resolve_authority<T: WarehouseTx>(
  tx: &T,
  raw: &RawAuthority,
  policy: AuthorityPolicy,
) -> Result<AuthorityLink> {
  let Some(agency) = raw
    .assigned_agency
    .as_deref()
    .map(str::trim)
    .filter(|a| !a.is_empty())
  else {
    return Ok(AuthorityLink::Unassigned);
  };

  let new = NewAuthority {
    agency:     agency.to_owned(),
    unit:       raw.assigned_unit.clone(),
    officer_id: raw.assigned_officer_id,
  };

  match policy {
    AuthorityPolicy::LookupExisting => {
      if let Some(id) = tx.authority_by_agency(agency).map_err(Error::transaction)? {
        return Ok(AuthorityLink::Existing(id));
      }
      match tx.insert_authority(&new).map_err(Error::transaction)? {
        Some(id) => Ok(AuthorityLink::Created(id)),
        None => Err(Error::DimensionConflict { agency: new.agency }),
      }
    }
    AuthorityPolicy::SkipLink => match tx.insert_authority(&new).map_err(Error::transaction)? {
      Some(id) => Ok(AuthorityLink::Created(id)),
      None => {
        warn!(agency, "authority already exists; report left without authority link");
        Ok(AuthorityLink::Skipped)
      }
    },
    AuthorityPolicy::Fail => match tx.insert_authority(&new).map_err(Error::transaction)? {
      Some(id) => Ok(AuthorityLink::Created(id)),
      None => Err(Error::DimensionConflict { agency: new.agency }),
    },
  }
}

/// Map one raw report into the warehouse.
///
/// Steps run in dependency order: enumerated dimensions, city, authority,
/// reporter, report fact, bridge, timeline, media, votes, escalation.
pub fn ingest_report<T: WarehouseTx>(
  tx: &T,
  report: &RawReport,
  policy: IngestPolicy,
) -> Result<IngestReceipt> {
  let report_id = report.report_id;

  let report_type_id = resolve_enum(tx, EnumDimension::ReportType, &report.report_type)?;
  let visibility_id = resolve_enum(tx, EnumDimension::Visibility, &report.visibility)?;
  let current_status_id = resolve_enum(tx, EnumDimension::Status, &report.status.current)?;

  let city = resolve_city(tx, &report.location)?;
  let authority = resolve_authority(tx, &report.authority, policy.authority)?;

  tx.upsert_reporter(&Reporter {
    reporter_id: report.reporter.user_id,
    name:        report.reporter.name.clone(),
  })
  .map_err(Error::transaction)?;

  let fact = ReportFact {
    report_id,
    report_type_id,
    visibility_id,
    current_status_id,
    authority_id: authority.authority_id(),
    city_id: city.city_id(),
    title: report.title.clone(),
    description: report.description.clone(),
    latitude: report.location.latitude,
    longitude: report.location.longitude,
    address: report.location.address.clone(),
    created_at: report.created_at,
    upvote_count: report.votes.upvote_count,
    is_escalated: report.escalation.is_escalated,
  };
  let report_outcome = tx.upsert_report(&fact).map_err(Error::transaction)?;

  tx.upsert_report_reporter(&ReportReporter {
    report_id,
    reporter_id: report.reporter.user_id,
  })
  .map_err(Error::transaction)?;

  let mut status_events = 0;
  for entry in &report.timeline {
    let event = StatusEvent {
      report_id,
      status_id: resolve_enum(tx, EnumDimension::Status, &entry.status)?,
      actor_role_id: resolve_enum(tx, EnumDimension::ActorRole, &entry.actor.actor_role)?,
      actor_id: entry.actor.actor_id,
      note: entry.note.clone(),
      event_timestamp: entry.timestamp,
    };
    if tx
      .write_status_event(&event, policy.replay)
      .map_err(Error::transaction)?
      .inserted()
    {
      status_events += 1;
    }
  }

  let mut media_events = 0;
  for media in &report.media {
    let event = MediaEvent {
      media_id: media.media_id,
      report_id,
      media_type: media.media_type.clone(),
      uploaded_at: media.uploaded_at,
    };
    if tx.upsert_media_event(&event).map_err(Error::transaction)?.inserted() {
      media_events += 1;
    }
  }

  let mut vote_events = 0;
  for voter_id in &report.votes.voters {
    let vote = VoteEvent { report_id, voter_id: *voter_id };
    if tx.upsert_vote_event(&vote).map_err(Error::transaction)?.inserted() {
      vote_events += 1;
    }
  }

  let mut escalation = false;
  if report.escalation.is_escalated {
    let event = EscalationEvent {
      report_id,
      escalated_to: report.escalation.escalated_to.clone(),
      reason:       report.escalation.escalation_reason.clone(),
      escalated_at: report.escalation.escalated_at,
    };
    escalation = tx
      .write_escalation_event(&event, policy.replay)
      .map_err(Error::transaction)?
      .inserted();
  }

  debug!(
    %report_id,
    ?city,
    ?authority,
    ?report_outcome,
    status_events,
    media_events,
    vote_events,
    escalation,
    "report ingested"
  );

  Ok(IngestReceipt {
    report_id,
    city,
    authority,
    report: report_outcome,
    status_events,
    media_events,
    vote_events,
    escalation,
  })
}
