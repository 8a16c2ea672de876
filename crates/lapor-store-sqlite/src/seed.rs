//! Static dimension values. Seeding is idempotent: existing names are kept.

use lapor_core::dimension::EnumDimension;
use rusqlite::{Connection, params};
use serde::Serialize;

use crate::schema::enum_table;

const REPORT_TYPES: &[&str] = &["kriminalitas", "kebersihan", "kesehatan", "fasilitas", "lainnya"];
const VISIBILITIES: &[&str] = &["public", "private", "anonymous"];
const STATUSES: &[&str] =
  &["submitted", "verified", "in_progress", "resolved", "rejected", "escalated"];
const ACTOR_ROLES: &[&str] = &["citizen", "officer", "supervisor", "system"];

/// `(name, province, centre latitude, centre longitude)`
const CITIES: &[(&str, &str, f64, f64)] = &[
  // Java
  ("Jakarta Pusat", "DKI Jakarta", -6.1751, 106.865),
  ("Jakarta Selatan", "DKI Jakarta", -6.2615, 106.8106),
  ("Jakarta Timur", "DKI Jakarta", -6.225, 106.9004),
  ("Jakarta Barat", "DKI Jakarta", -6.1484, 106.7558),
  ("Jakarta Utara", "DKI Jakarta", -6.1214, 106.9229),
  ("Surabaya", "Jawa Timur", -7.2575, 112.7521),
  ("Bandung", "Jawa Barat", -6.9175, 107.6191),
  ("Semarang", "Jawa Tengah", -6.9666, 110.4196),
  ("Yogyakarta", "DI Yogyakarta", -7.7956, 110.3695),
  ("Bekasi", "Jawa Barat", -6.2383, 106.9756),
  ("Tangerang", "Banten", -6.1783, 106.63),
  ("Depok", "Jawa Barat", -6.4025, 106.7942),
  ("Malang", "Jawa Timur", -7.9778, 112.6349),
  ("Bogor", "Jawa Barat", -6.5971, 106.806),
  // Sumatra
  ("Medan", "Sumatera Utara", 3.5952, 98.6722),
  ("Palembang", "Sumatera Selatan", -2.9761, 104.7754),
  ("Pekanbaru", "Riau", 0.5071, 101.4478),
  ("Batam", "Kepulauan Riau", 1.0456, 104.0305),
  ("Padang", "Sumatera Barat", -0.9471, 100.4172),
  ("Bandar Lampung", "Lampung", -5.3971, 105.2668),
  // Kalimantan
  ("Balikpapan", "Kalimantan Timur", -1.2379, 116.8529),
  ("Banjarmasin", "Kalimantan Selatan", -3.3194, 114.59),
  ("Pontianak", "Kalimantan Barat", -0.0263, 109.3425),
  ("Samarinda", "Kalimantan Timur", -0.4948, 117.1436),
  // Sulawesi
  ("Makassar", "Sulawesi Selatan", -5.1477, 119.4327),
  ("Manado", "Sulawesi Utara", 1.4748, 124.8421),
  ("Palu", "Sulawesi Tengah", -0.8917, 119.8707),
  // Bali & Nusa Tenggara
  ("Denpasar", "Bali", -8.6705, 115.2126),
  ("Mataram", "Nusa Tenggara Barat", -8.5833, 116.1167),
  ("Kupang", "Nusa Tenggara Timur", -10.1772, 123.607),
  // Papua & Maluku
  ("Jayapura", "Papua", -2.5337, 140.7181),
  ("Ambon", "Maluku", -3.6954, 128.1814),
];

/// Rows newly inserted by one seeding pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
  pub report_types: usize,
  pub visibilities: usize,
  pub statuses:     usize,
  pub actor_roles:  usize,
  pub cities:       usize,
}

impl SeedSummary {
  pub fn total(&self) -> usize {
    self.report_types + self.visibilities + self.statuses + self.actor_roles + self.cities
  }
}

fn seed_enum(conn: &Connection, kind: EnumDimension, names: &[&str]) -> rusqlite::Result<usize> {
  let (table, _) = enum_table(kind);
  let mut stmt = conn.prepare(&format!("INSERT OR IGNORE INTO {table} (name) VALUES (?1)"))?;
  let mut inserted = 0;
  for name in names {
    inserted += stmt.execute(params![name])?;
  }
  Ok(inserted)
}

/// Seed every static dimension inside one transaction.
pub fn seed_dimensions(conn: &mut Connection) -> rusqlite::Result<SeedSummary> {
  let tx = conn.transaction()?;

  let mut summary = SeedSummary {
    report_types: seed_enum(&tx, EnumDimension::ReportType, REPORT_TYPES)?,
    visibilities: seed_enum(&tx, EnumDimension::Visibility, VISIBILITIES)?,
    statuses:     seed_enum(&tx, EnumDimension::Status, STATUSES)?,
    actor_roles:  seed_enum(&tx, EnumDimension::ActorRole, ACTOR_ROLES)?,
    cities:       0,
  };

  {
    let mut stmt = tx.prepare(
      "INSERT OR IGNORE INTO dim_city (name, province, center_lat, center_lng)
       VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (name, province, lat, lng) in CITIES {
      summary.cities += stmt.execute(params![name, province, lat, lng])?;
    }
  }

  tx.commit()?;
  Ok(summary)
}
