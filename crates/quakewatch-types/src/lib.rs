//! Shared earthquake data types for the dashboard.
//!
//! This crate is the single source of truth for the payload served by the
//! `/earthquake_data` endpoint. The dashboard crate decodes responses into
//! these types and the web crate serializes the resulting view state.
//!
//! # Modules
//!
//! - [`snapshot`] -- The [`EarthquakeSnapshot`] payload and its nested types
//! - [`response`] -- [`DataResponse`], separating logical errors from snapshots
//! - [`timestamp`] -- Lenient timestamp parsing for server-provided dates

pub mod response;
pub mod snapshot;
pub mod timestamp;

// Re-export all public types at crate root for convenience.
pub use response::DataResponse;
pub use snapshot::{CityCode, ClosestCity, EarthquakeSnapshot, Reading};
pub use timestamp::parse_timestamp;
