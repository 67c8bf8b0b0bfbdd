/// Core data types for the air-quality monitoring service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O, only types, a few constructors, and the crate error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Pollutant keys
// ---------------------------------------------------------------------------

/// Pollutants tracked by the reference tables, in table (declaration) order.
///
/// The derived `Ord` follows declaration order, so a `BTreeMap` keyed by
/// `PollutantKey` iterates in table order. Tie-breaks in the aggregator rely
/// on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollutantKey {
    Pm25,
    Pm10,
    No2,
    So2,
    O3,
    Co,
}

impl PollutantKey {
    /// All keys in table order.
    pub const ALL: [PollutantKey; 6] = [
        PollutantKey::Pm25,
        PollutantKey::Pm10,
        PollutantKey::No2,
        PollutantKey::So2,
        PollutantKey::O3,
        PollutantKey::Co,
    ];

    /// Provider code for this pollutant, e.g. `"pm25"`.
    pub fn code(&self) -> &'static str {
        match self {
            PollutantKey::Pm25 => "pm25",
            PollutantKey::Pm10 => "pm10",
            PollutantKey::No2 => "no2",
            PollutantKey::So2 => "so2",
            PollutantKey::O3 => "o3",
            PollutantKey::Co => "co",
        }
    }

    /// Parses a provider code. Returns `None` for anything outside the
    /// reference table (temperature, humidity, wind, ...).
    pub fn from_code(code: &str) -> Option<PollutantKey> {
        PollutantKey::ALL.into_iter().find(|k| k.code() == code)
    }
}

impl std::fmt::Display for PollutantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Sparse mapping of pollutant → observed value. Missing keys mean the
/// station did not report that pollutant.
pub type PollutantMap = BTreeMap<PollutantKey, f64>;

// ---------------------------------------------------------------------------
// Reference table types
// ---------------------------------------------------------------------------

/// Safe exposure limit for a single pollutant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollutantLimit {
    pub key: PollutantKey,
    pub safe_limit: f64,
    pub unit: &'static str,
    pub display_name: &'static str,
}

/// One AQI category band. Bounds are inclusive integers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AqiCategoryBand {
    pub min: u32,
    pub max: u32,
    pub level: &'static str,
    pub color: &'static str,
    pub health_statement: &'static str,
}

/// A health recommendation shown alongside an AQI band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthInsight {
    pub icon: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

// ---------------------------------------------------------------------------
// Measurement types
// ---------------------------------------------------------------------------

/// WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// One immutable measurement for a single point in time.
///
/// Produced once per successful fetch or per synthetic generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSnapshot {
    pub aqi: f64,
    pub pollutants: PollutantMap,
    pub timestamp: DateTime<Utc>,
    pub location_name: String,
    pub coordinates: Option<Coordinates>,
}

impl MeasurementSnapshot {
    /// Observed value for `key`, if the station reported it.
    pub fn pollutant(&self, key: PollutantKey) -> Option<f64> {
        self.pollutants.get(&key).copied()
    }
}

/// A monitoring station returned by a provider search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSummary {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

// ---------------------------------------------------------------------------
// Alert types
// ---------------------------------------------------------------------------

/// Alert severity levels, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Danger,
}

/// A dashboard alert. Recomputed in full on every snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub icon: &'static str,
    pub message: &'static str,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when resolving, fetching, or persisting measurements.
///
/// None of these are fatal to the engine: fetch failures are recovered via
/// cache or synthetic fallback, and the rest are reported for display.
#[derive(Debug, Clone, PartialEq)]
pub enum AqError {
    /// Coordinates outside lat ∈ [-90, 90], lng ∈ [-180, 180].
    InvalidCoordinates { lat: f64, lng: f64 },
    /// Non-2xx HTTP response from the provider.
    HttpError(u16),
    /// Transport-level failure (DNS, TLS, connection reset, ...).
    Network(String),
    /// The live fetch exceeded its timeout.
    Timeout,
    /// The response parsed but lacked expected fields.
    MalformedPayload(String),
    /// A pollutant code outside the reference table.
    UnknownPollutantKey(String),
    /// The persisted key-value store failed to read or write.
    Store(String),
}

impl AqError {
    /// True for the failures the refresh cycle recovers from via fallback.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            AqError::HttpError(_)
                | AqError::Network(_)
                | AqError::Timeout
                | AqError::MalformedPayload(_)
        )
    }
}

impl std::fmt::Display for AqError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AqError::InvalidCoordinates { lat, lng } => {
                write!(f, "Invalid coordinates: lat={}, lng={}", lat, lng)
            }
            AqError::HttpError(code) => write!(f, "HTTP error: {}", code),
            AqError::Network(msg) => write!(f, "Network error: {}", msg),
            AqError::Timeout => write!(f, "Request timed out"),
            AqError::MalformedPayload(msg) => write!(f, "Malformed payload: {}", msg),
            AqError::UnknownPollutantKey(key) => write!(f, "Unknown pollutant key: {}", key),
            AqError::Store(msg) => write!(f, "Store error: {}", msg),
        }
    }
}

impl std::error::Error for AqError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pollutant_codes_round_trip_through_from_code() {
        for key in PollutantKey::ALL {
            assert_eq!(PollutantKey::from_code(key.code()), Some(key));
        }
        assert_eq!(PollutantKey::from_code("t"), None);
        assert_eq!(PollutantKey::from_code("PM25"), None);
    }

    #[test]
    fn test_pollutant_key_order_matches_table_order() {
        let mut sorted = PollutantKey::ALL;
        sorted.sort();
        assert_eq!(sorted, PollutantKey::ALL);
    }

    #[test]
    fn test_fetch_failure_grouping() {
        assert!(AqError::Timeout.is_fetch_failure());
        assert!(AqError::HttpError(503).is_fetch_failure());
        assert!(AqError::MalformedPayload("no aqi".into()).is_fetch_failure());
        assert!(!AqError::InvalidCoordinates { lat: 91.0, lng: 0.0 }.is_fetch_failure());
        assert!(!AqError::Store("disk full".into()).is_fetch_failure());
    }

    #[test]
    fn test_error_display_is_human_readable() {
        assert_eq!(AqError::HttpError(500).to_string(), "HTTP error: 500");
        assert_eq!(
            AqError::InvalidCoordinates { lat: 91.0, lng: 0.0 }.to_string(),
            "Invalid coordinates: lat=91, lng=0"
        );
    }
}
