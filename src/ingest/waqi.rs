/// WAQI (World Air Quality Index) Data API Client
///
/// Retrieves current air-quality readings from the aqicn.org feed API,
/// either geolocated from the caller's IP, by station id, or by
/// coordinates, and searches stations by keyword.
///
/// API Documentation: https://aqicn.org/json-api/doc/
/// Feed: https://api.waqi.info/feed/{here|@id|geo:lat;lng}/?token=...

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::ingest::MeasurementProvider;
use crate::location::FetchTarget;
use crate::logging::{self, Component};
use crate::model::{AqError, Coordinates, MeasurementSnapshot, PollutantKey, PollutantMap, StationSummary};

pub const WAQI_BASE_URL: &str = "https://api.waqi.info";

/// Reference timeout for a live fetch.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// WAQI API Response Structures
// ============================================================================

/// Every WAQI response wraps its payload in `{status, data}`. On error,
/// `data` is a message string instead of an object.
#[derive(Debug, Deserialize)]
pub struct WaqiEnvelope {
    pub status: String,
    pub data: serde_json::Value,
}

/// Feed payload for one station
#[derive(Debug, Deserialize)]
pub struct WaqiFeed {
    /// Number, or "-" when the station has no current AQI
    pub aqi: serde_json::Value,
    pub city: Option<WaqiCity>,
    #[serde(default)]
    pub iaqi: HashMap<String, WaqiIaqiValue>,
    pub time: Option<WaqiTime>,
}

#[derive(Debug, Deserialize)]
pub struct WaqiCity {
    pub name: Option<String>,
    pub geo: Option<Vec<f64>>,
}

/// Individual AQI sub-index, e.g. `"pm25": {"v": 42}`
#[derive(Debug, Deserialize)]
pub struct WaqiIaqiValue {
    pub v: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct WaqiTime {
    pub iso: Option<String>,
}

/// One search hit
#[derive(Debug, Deserialize)]
pub struct WaqiSearchHit {
    pub uid: i64,
    pub station: WaqiSearchStation,
}

#[derive(Debug, Deserialize)]
pub struct WaqiSearchStation {
    pub name: String,
    #[serde(default)]
    pub geo: Vec<f64>,
}

// ============================================================================
// URL Construction
// ============================================================================

/// Builds the feed URL for a target, without the token query parameter.
///
/// Numeric station ids are prefixed with `@` as the API expects; ids that
/// already carry it, or city slugs, are used as given.
pub fn build_feed_url(base_url: &str, target: &FetchTarget) -> String {
    let base = base_url.trim_end_matches('/');
    match target {
        FetchTarget::Here => format!("{}/feed/here/", base),
        FetchTarget::Station(id) => {
            if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
                format!("{}/feed/@{}/", base, id)
            } else {
                format!("{}/feed/{}/", base, id)
            }
        }
        FetchTarget::Geo(c) => format!("{}/feed/geo:{};{}/", base, c.lat, c.lng),
    }
}

pub fn build_search_url(base_url: &str) -> String {
    format!("{}/search/", base_url.trim_end_matches('/'))
}

// ============================================================================
// Response Parsing
// ============================================================================

fn unwrap_envelope(body: &str) -> Result<serde_json::Value, AqError> {
    let envelope: WaqiEnvelope = serde_json::from_str(body)
        .map_err(|e| AqError::MalformedPayload(format!("not a WAQI response: {}", e)))?;

    if envelope.status != "ok" {
        let detail = envelope
            .data
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| envelope.data.to_string());
        return Err(AqError::MalformedPayload(format!(
            "API returned status '{}': {}",
            envelope.status, detail
        )));
    }
    Ok(envelope.data)
}

/// Parses a feed response body into a snapshot.
///
/// `fetched_at` stamps the snapshot when the response carries no usable
/// observation time. Sub-indices outside the pollutant table (temperature,
/// humidity, wind, ...) are dropped.
pub fn parse_feed_response(
    body: &str,
    fetched_at: DateTime<Utc>,
) -> Result<MeasurementSnapshot, AqError> {
    let data = unwrap_envelope(body)?;
    let feed: WaqiFeed = serde_json::from_value(data)
        .map_err(|e| AqError::MalformedPayload(format!("unexpected feed shape: {}", e)))?;

    let aqi = feed
        .aqi
        .as_f64()
        .ok_or_else(|| AqError::MalformedPayload(format!("no numeric AQI (got {})", feed.aqi)))?;

    let mut pollutants = PollutantMap::new();
    for (code, value) in &feed.iaqi {
        match (PollutantKey::from_code(code), value.v.as_f64()) {
            (Some(key), Some(v)) => {
                pollutants.insert(key, v);
            }
            (None, _) => {
                let err = AqError::UnknownPollutantKey(code.clone());
                logging::debug(Component::Waqi, None, &format!("ignoring sub-index: {}", err));
            }
            (Some(_), None) => {
                logging::debug(
                    Component::Waqi,
                    None,
                    &format!("ignoring non-numeric value for {}: {}", code, value.v),
                );
            }
        }
    }

    let timestamp = feed
        .time
        .as_ref()
        .and_then(|t| t.iso.as_deref())
        .and_then(|iso| DateTime::parse_from_rfc3339(iso).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(fetched_at);

    let (location_name, coordinates) = match feed.city {
        Some(city) => {
            let coordinates = match city.geo.as_deref() {
                Some([lat, lng, ..]) => Some(Coordinates { lat: *lat, lng: *lng }),
                _ => None,
            };
            (city.name.unwrap_or_default(), coordinates)
        }
        None => (String::new(), None),
    };

    Ok(MeasurementSnapshot {
        aqi,
        pollutants,
        timestamp,
        location_name: if location_name.is_empty() {
            "Unknown Location".to_string()
        } else {
            location_name
        },
        coordinates,
    })
}

/// Parses a search response body into station summaries. Hits without
/// coordinates are skipped.
pub fn parse_search_response(body: &str) -> Result<Vec<StationSummary>, AqError> {
    let data = unwrap_envelope(body)?;
    let hits: Vec<WaqiSearchHit> = serde_json::from_value(data)
        .map_err(|e| AqError::MalformedPayload(format!("unexpected search shape: {}", e)))?;

    Ok(hits
        .into_iter()
        .filter_map(|hit| match hit.station.geo.as_slice() {
            [lat, lng, ..] => Some(StationSummary {
                id: hit.uid.to_string(),
                name: hit.station.name,
                lat: *lat,
                lng: *lng,
            }),
            _ => None,
        })
        .collect())
}

// ============================================================================
// API Client
// ============================================================================

fn transport_error(err: reqwest::Error) -> AqError {
    if err.is_timeout() {
        AqError::Timeout
    } else {
        AqError::Network(err.to_string())
    }
}

/// Blocking WAQI client with a bounded request timeout.
pub struct WaqiClient {
    client: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

impl WaqiClient {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, AqError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AqError::Network(format!("building HTTP client: {}", e)))?;
        Ok(WaqiClient {
            client,
            base_url: base_url.to_string(),
            token: token.to_string(),
        })
    }

    fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, AqError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .header("Accept", "application/json")
            .send()
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(AqError::HttpError(response.status().as_u16()));
        }

        response.text().map_err(transport_error)
    }
}

impl MeasurementProvider for WaqiClient {
    fn fetch_measurement(&self, target: &FetchTarget) -> Result<MeasurementSnapshot, AqError> {
        let url = build_feed_url(&self.base_url, target);
        let body = self.get_text(&url, &[("token", self.token.as_str())])?;
        parse_feed_response(&body, Utc::now())
    }

    fn search_stations(&self, query: &str) -> Result<Vec<StationSummary>, AqError> {
        let url = build_search_url(&self.base_url);
        let body = self.get_text(&url, &[("keyword", query), ("token", self.token.as_str())])?;
        parse_search_response(&body)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fetched_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    const BEIJING_FEED: &str = r#"{
        "status": "ok",
        "data": {
            "aqi": 158,
            "idx": 1451,
            "dominentpol": "pm25",
            "city": {"geo": [39.954592, 116.468117], "name": "Beijing (北京)"},
            "iaqi": {
                "pm25": {"v": 158},
                "pm10": {"v": 61},
                "no2": {"v": 18.3},
                "t": {"v": 21.5},
                "h": {"v": 44}
            },
            "time": {"s": "2024-05-01 20:00:00", "tz": "+08:00", "iso": "2024-05-01T20:00:00+08:00"}
        }
    }"#;

    #[test]
    fn test_parse_feed_extracts_aqi_pollutants_and_location() {
        let snap = parse_feed_response(BEIJING_FEED, fetched_at()).expect("valid feed");
        assert_eq!(snap.aqi, 158.0);
        assert_eq!(snap.location_name, "Beijing (北京)");
        assert_eq!(snap.coordinates, Some(Coordinates { lat: 39.954592, lng: 116.468117 }));
        assert_eq!(snap.pollutant(PollutantKey::Pm25), Some(158.0));
        assert_eq!(snap.pollutant(PollutantKey::No2), Some(18.3));
        assert_eq!(snap.pollutants.len(), 3, "t and h are not pollutants");
    }

    #[test]
    fn test_parse_feed_converts_observation_time_to_utc() {
        let snap = parse_feed_response(BEIJING_FEED, fetched_at()).expect("valid feed");
        assert_eq!(snap.timestamp, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_feed_without_time_uses_fetch_time() {
        let body = r#"{"status":"ok","data":{"aqi":12,"iaqi":{}}}"#;
        let snap = parse_feed_response(body, fetched_at()).expect("valid feed");
        assert_eq!(snap.timestamp, fetched_at());
        assert_eq!(snap.location_name, "Unknown Location");
        assert!(snap.pollutants.is_empty());
    }

    #[test]
    fn test_error_status_is_malformed_payload() {
        let body = r#"{"status":"error","data":"Invalid key"}"#;
        let err = parse_feed_response(body, fetched_at()).unwrap_err();
        assert_eq!(
            err,
            AqError::MalformedPayload("API returned status 'error': Invalid key".to_string())
        );
    }

    #[test]
    fn test_dash_aqi_is_malformed_payload() {
        let body = r#"{"status":"ok","data":{"aqi":"-","iaqi":{}}}"#;
        assert!(matches!(
            parse_feed_response(body, fetched_at()),
            Err(AqError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_non_json_body_is_malformed_payload() {
        assert!(matches!(
            parse_feed_response("<html>502 Bad Gateway</html>", fetched_at()),
            Err(AqError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_build_feed_url_for_each_target() {
        assert_eq!(
            build_feed_url(WAQI_BASE_URL, &FetchTarget::Here),
            "https://api.waqi.info/feed/here/"
        );
        assert_eq!(
            build_feed_url("https://api.waqi.info/", &FetchTarget::Station("1451".into())),
            "https://api.waqi.info/feed/@1451/"
        );
        assert_eq!(
            build_feed_url(WAQI_BASE_URL, &FetchTarget::Station("@1451".into())),
            "https://api.waqi.info/feed/@1451/"
        );
        assert_eq!(
            build_feed_url(
                WAQI_BASE_URL,
                &FetchTarget::Geo(Coordinates { lat: 40.69, lng: -89.59 })
            ),
            "https://api.waqi.info/feed/geo:40.69;-89.59/"
        );
    }

    #[test]
    fn test_parse_search_skips_hits_without_geo() {
        let body = r#"{"status":"ok","data":[
            {"uid": 5724, "aqi": "31", "station": {"name": "London Marylebone Road", "geo": [51.5225, -0.154611]}},
            {"uid": 99, "aqi": "-", "station": {"name": "Nowhere"}}
        ]}"#;
        let stations = parse_search_response(body).expect("valid search");
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].id, "5724");
        assert_eq!(stations[0].name, "London Marylebone Road");
    }
}
