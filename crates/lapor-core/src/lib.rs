//! Core types and trait definitions for the Lapor complaint warehouse.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the raw report document schema, the warehouse row contracts, the ingestion
//! engine, the batch orchestrator and the analytics formulas. Storage
//! backends (e.g. `lapor-store-sqlite`) plug in through the traits in
//! [`warehouse`] and [`store`].

pub mod analytics;
pub mod batch;
pub mod dimension;
pub mod error;
pub mod ingest;
pub mod raw;
pub mod store;
pub mod warehouse;
pub mod window;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
