//! SQLite backend for the Lapor complaint warehouse.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Each ingested report gets its own
//! transaction; analytical reads are independent statements.

mod encode;
mod filter;
mod queries;
mod schema;
mod seed;
mod store;
mod tx;

pub mod error;

pub use error::{Error, Result};
pub use seed::SeedSummary;
pub use store::{SqliteWarehouse, TableCounts};

#[cfg(test)]
mod tests;
