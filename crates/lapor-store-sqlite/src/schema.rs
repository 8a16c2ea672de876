//! SQL schema for the Lapor warehouse.
//!
//! Executed once at connection startup. The version lives in
//! `PRAGMA user_version` so later migrations can be gated on it.

use lapor_core::dimension::EnumDimension;

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ── Enumerated dimensions (closed sets, seeded) ──────────────────────────

CREATE TABLE IF NOT EXISTS dim_report_type (
    report_type_id INTEGER PRIMARY KEY,
    name           TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS dim_visibility (
    visibility_id INTEGER PRIMARY KEY,
    name          TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS dim_status (
    status_id INTEGER PRIMARY KEY,
    name      TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS dim_actor_role (
    actor_role_id INTEGER PRIMARY KEY,
    name          TEXT NOT NULL UNIQUE
);

-- ── Lazily created dimensions ────────────────────────────────────────────

-- Display name only; contact details are never stored.
CREATE TABLE IF NOT EXISTS dim_reporter (
    reporter_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS dim_authority (
    authority_id INTEGER PRIMARY KEY,
    agency       TEXT NOT NULL UNIQUE,
    unit         TEXT,
    officer_id   TEXT
);

CREATE TABLE IF NOT EXISTS dim_city (
    city_id    INTEGER PRIMARY KEY,
    name       TEXT NOT NULL UNIQUE,
    province   TEXT NOT NULL,
    center_lat REAL NOT NULL,
    center_lng REAL NOT NULL
);

-- ── Facts ────────────────────────────────────────────────────────────────

-- Written once per report; never updated or deleted.
CREATE TABLE IF NOT EXISTS fact_reports (
    report_id         TEXT PRIMARY KEY,
    report_type_id    INTEGER NOT NULL REFERENCES dim_report_type(report_type_id),
    visibility_id     INTEGER NOT NULL REFERENCES dim_visibility(visibility_id),
    current_status_id INTEGER NOT NULL REFERENCES dim_status(status_id),
    authority_id      INTEGER REFERENCES dim_authority(authority_id),
    city_id           INTEGER REFERENCES dim_city(city_id),
    title             TEXT,
    description       TEXT,
    latitude          REAL,
    longitude         REAL,
    address           TEXT,
    created_at        TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    upvote_count      INTEGER NOT NULL DEFAULT 0,
    is_escalated      INTEGER NOT NULL DEFAULT 0
);

-- Natural key (report_id, status_id, event_timestamp) is deliberately not
-- unique: the append replay policy writes duplicates.
CREATE TABLE IF NOT EXISTS fact_status_events (
    status_event_id INTEGER PRIMARY KEY,
    report_id       TEXT NOT NULL REFERENCES fact_reports(report_id),
    status_id       INTEGER NOT NULL REFERENCES dim_status(status_id),
    actor_role_id   INTEGER NOT NULL REFERENCES dim_actor_role(actor_role_id),
    actor_id        TEXT,
    note            TEXT,
    event_timestamp TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS fact_media_events (
    media_id    TEXT PRIMARY KEY,
    report_id   TEXT NOT NULL REFERENCES fact_reports(report_id),
    media_type  TEXT NOT NULL,
    uploaded_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS fact_vote_events (
    report_id TEXT NOT NULL REFERENCES fact_reports(report_id),
    voter_id  TEXT NOT NULL,
    voted_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    PRIMARY KEY (report_id, voter_id)
);

CREATE TABLE IF NOT EXISTS fact_escalation_events (
    escalation_event_id INTEGER PRIMARY KEY,
    report_id           TEXT NOT NULL REFERENCES fact_reports(report_id),
    escalated_to        TEXT,
    reason              TEXT,
    escalated_at        TEXT
);

CREATE TABLE IF NOT EXISTS bridge_report_reporter (
    report_id   TEXT NOT NULL REFERENCES fact_reports(report_id),
    reporter_id TEXT NOT NULL REFERENCES dim_reporter(reporter_id),
    PRIMARY KEY (report_id, reporter_id)
);

CREATE INDEX IF NOT EXISTS fact_reports_created_idx   ON fact_reports(created_at);
CREATE INDEX IF NOT EXISTS fact_reports_authority_idx ON fact_reports(authority_id);
CREATE INDEX IF NOT EXISTS fact_reports_type_idx      ON fact_reports(report_type_id);
CREATE INDEX IF NOT EXISTS status_events_key_idx
    ON fact_status_events(report_id, status_id, event_timestamp);
CREATE INDEX IF NOT EXISTS escalation_events_report_idx
    ON fact_escalation_events(report_id);

PRAGMA user_version = 1;
";

/// `(table, id column)` backing an enumerated dimension.
pub fn enum_table(kind: EnumDimension) -> (&'static str, &'static str) {
  match kind {
    EnumDimension::ReportType => ("dim_report_type", "report_type_id"),
    EnumDimension::Visibility => ("dim_visibility", "visibility_id"),
    EnumDimension::Status => ("dim_status", "status_id"),
    EnumDimension::ActorRole => ("dim_actor_role", "actor_role_id"),
  }
}

/// Every table in the warehouse, dimensions first.
pub const TABLES: [&str; 13] = [
  "dim_report_type",
  "dim_visibility",
  "dim_status",
  "dim_actor_role",
  "dim_reporter",
  "dim_authority",
  "dim_city",
  "fact_reports",
  "fact_status_events",
  "fact_media_events",
  "fact_vote_events",
  "fact_escalation_events",
  "bridge_report_reporter",
];
