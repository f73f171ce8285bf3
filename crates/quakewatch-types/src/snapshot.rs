//! The earthquake snapshot payload and its nested types.
//!
//! Top-level fields arrive in `snake_case`; the `camelCase` spellings are
//! accepted as aliases. City entries keep the upstream `camelCase` names
//! (`cityCode`).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EarthquakeSnapshot
// ---------------------------------------------------------------------------

/// One fetched earthquake-data payload.
///
/// A snapshot fully replaces whatever was rendered before it. Nothing is
/// merged and nothing is retained after rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarthquakeSnapshot {
    /// Mean magnitude over the recent earthquake window.
    #[serde(alias = "averageMagnitude")]
    pub average_magnitude: f64,

    /// Predicted time of the next earthquake, `None` when no prediction
    /// could be made.
    #[serde(default, alias = "nextEarthquake", with = "crate::timestamp::optional")]
    pub next_earthquake: Option<DateTime<Utc>>,

    /// Depth of the latest earthquake in kilometres.
    #[serde(alias = "earthquakeDepth")]
    pub earthquake_depth: Reading,

    /// Human-readable location of the latest earthquake.
    #[serde(default, alias = "earthquakeLocation")]
    pub earthquake_location: String,

    /// Magnitude of the latest earthquake.
    #[serde(alias = "earthquakeMagnitude")]
    pub earthquake_magnitude: f64,

    /// Number of earthquakes in the recent window.
    #[serde(alias = "recentEarthquakeCount")]
    pub recent_earthquake_count: u64,

    /// When the server produced this payload.
    #[serde(alias = "lastUpdate", with = "crate::timestamp::required")]
    pub last_update: DateTime<Utc>,

    /// The server's notion of "today".
    #[serde(alias = "todayDate", with = "crate::timestamp::required")]
    pub today_date: DateTime<Utc>,

    /// Cities nearest to the latest earthquake, in server order.
    #[serde(default, alias = "closestCities")]
    pub closest_cities: Vec<ClosestCity>,
}

// ---------------------------------------------------------------------------
// ClosestCity
// ---------------------------------------------------------------------------

/// A city near the latest earthquake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosestCity {
    /// City name.
    pub name: String,
    /// Upstream city identifier (plate code).
    #[serde(alias = "city_code")]
    pub city_code: CityCode,
    /// Distance from the epicentre in metres.
    pub distance: f64,
    /// City population.
    pub population: u64,
}

/// A city identifier, numeric or textual depending on the upstream feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CityCode {
    /// Numeric code such as a plate number.
    Number(i64),
    /// Free-form code.
    Text(String),
}

impl fmt::Display for CityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// A measured value that the server may replace with a placeholder.
///
/// The server substitutes text such as `"Unknown"` when the upstream record
/// lacks the measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    /// A numeric measurement.
    Number(f64),
    /// A textual placeholder.
    Text(String),
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}
