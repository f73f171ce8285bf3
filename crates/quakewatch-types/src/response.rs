//! Decoding of data endpoint responses.
//!
//! The endpoint answers either with a full snapshot or with a flat
//! `{"error": "<text>"}` object. When an `error` key is present the rest of
//! the body is ignored.

use serde_json::Value;

use crate::snapshot::EarthquakeSnapshot;

/// A decoded response from the data endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum DataResponse {
    /// The server reported a logical error; the text is shown verbatim.
    Failure(String),
    /// A valid snapshot.
    Snapshot(Box<EarthquakeSnapshot>),
}

impl DataResponse {
    /// Decode a response body.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the body is not JSON, or if it
    /// carries no `error` key and does not match [`EarthquakeSnapshot`].
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(body)?;
        Self::from_value(value)
    }

    /// Decode an already-parsed JSON value.
    ///
    /// A `null` error is treated as absent. A non-string error is shown as
    /// its JSON text.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value.get("error") {
            None | Some(Value::Null) => {}
            Some(Value::String(text)) => return Ok(Self::Failure(text.clone())),
            Some(other) => return Ok(Self::Failure(other.to_string())),
        }
        serde_json::from_value(value).map(|snapshot| Self::Snapshot(Box::new(snapshot)))
    }
}
