/// Offline integration tests for the full refresh pipeline
///
/// These tests drive `Monitor` end to end with a provider that replays
/// canned WAQI feed bodies through the real parser, and with the JSON file
/// store on a temp directory. No network or database is needed.
///
/// Run with: cargo test --test pipeline_integration

use aqmon_service::analysis::composition::{composition, dominant_pollutant};
use aqmon_service::analysis::trend::{TrendConfig, TrendTracker};
use aqmon_service::cache::MeasurementCache;
use aqmon_service::classify::category_of;
use aqmon_service::engine::{DataSource, DashboardReport, Monitor, RefreshOutcome};
use aqmon_service::ingest::MeasurementProvider;
use aqmon_service::ingest::waqi::parse_feed_response;
use aqmon_service::location::{FetchTarget, LocationDescriptor};
use aqmon_service::model::{
    AlertSeverity, AqError, MeasurementSnapshot, PollutantKey, PollutantMap, StationSummary,
};
use aqmon_service::store::{JsonFileStore, MemoryStore};
use aqmon_service::synthetic::SyntheticGenerator;

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::cell::RefCell;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 5, 9, 0, 0).unwrap()
}

fn feed_body(aqi: u32, pm25: f64) -> String {
    format!(
        r#"{{
            "status": "ok",
            "data": {{
                "aqi": {aqi},
                "city": {{"geo": [40.6936, -89.589], "name": "Peoria, Illinois"}},
                "iaqi": {{"pm25": {{"v": {pm25}}}, "o3": {{"v": 31}}, "w": {{"v": 3.1}}}},
                "time": {{"iso": "2024-11-05T03:00:00-06:00"}}
            }}
        }}"#
    )
}

/// Replays feed bodies in order and records every target it was asked for.
struct ReplayProvider {
    bodies: RefCell<Vec<Result<String, AqError>>>,
    targets: RefCell<Vec<FetchTarget>>,
}

impl ReplayProvider {
    fn new(mut bodies: Vec<Result<String, AqError>>) -> Self {
        bodies.reverse();
        ReplayProvider {
            bodies: RefCell::new(bodies),
            targets: RefCell::new(Vec::new()),
        }
    }
}

impl MeasurementProvider for ReplayProvider {
    fn fetch_measurement(&self, target: &FetchTarget) -> Result<MeasurementSnapshot, AqError> {
        self.targets.borrow_mut().push(target.clone());
        let body = self.bodies.borrow_mut().pop().unwrap_or(Err(AqError::Timeout))?;
        parse_feed_response(&body, fixed_now())
    }

    fn search_stations(&self, _query: &str) -> Result<Vec<StationSummary>, AqError> {
        Ok(Vec::new())
    }
}

fn report_of(outcome: RefreshOutcome) -> (DashboardReport, Option<AqError>) {
    match outcome {
        RefreshOutcome::Refreshed { report, error } => (*report, error),
        RefreshOutcome::Discarded { generation, current } => {
            panic!("unexpected discard: ticket {} current {}", generation, current)
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[test]
fn test_live_feed_produces_full_report() {
    let provider = ReplayProvider::new(vec![Ok(feed_body(160, 40.0))]);
    let mut monitor = Monitor::new(
        provider,
        MeasurementCache::new(MemoryStore::new()),
        TrendConfig::default(),
    );

    let (report, error) = report_of(monitor.refresh(fixed_now()).expect("refresh"));

    assert!(error.is_none());
    assert_eq!(report.source, DataSource::Live);
    assert_eq!(report.location.name, "Peoria, Illinois");
    assert_eq!(report.classified.category.level, "Unhealthy");
    assert_eq!(report.classified.health_impact, "Unhealthy");
    assert_eq!(report.classified.dominant, Some(PollutantKey::Pm25));
    assert_eq!(
        report.classified.snapshot.timestamp,
        Utc.with_ymd_and_hms(2024, 11, 5, 9, 0, 0).unwrap()
    );
    assert_eq!(report.insights.len(), 3);
    assert_eq!(report.comparisons.len(), 3);

    let severities: Vec<AlertSeverity> = report.alerts.iter().map(|a| a.severity).collect();
    assert_eq!(severities, vec![AlertSeverity::Warning, AlertSeverity::Warning]);

    let json = serde_json::to_value(&report).expect("report serializes");
    assert_eq!(json["source"], "live");
    assert_eq!(json["classified"]["dominant"], "pm25");
}

#[test]
fn test_state_survives_restart_with_file_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.json");

    {
        let provider = ReplayProvider::new(vec![Ok(feed_body(55, 12.0))]);
        let mut monitor = Monitor::new(
            provider,
            MeasurementCache::new(JsonFileStore::new(&path)),
            TrendConfig::default(),
        );
        monitor
            .select_location(LocationDescriptor::coordinates(40.69, -89.59, "Peoria"))
            .expect("valid selection");
        monitor.refresh(fixed_now()).expect("refresh");
    }

    // Provider is down after the restart: the stale cache is the fallback.
    let provider = ReplayProvider::new(vec![Err(AqError::Network("connection refused".into()))]);
    let mut monitor = Monitor::new(
        provider,
        MeasurementCache::new(JsonFileStore::new(&path)),
        TrendConfig::default(),
    );
    assert_eq!(monitor.selection().descriptor().display_name, "Peoria");

    let later = fixed_now() + Duration::hours(1);
    assert!(monitor.provisional(later).is_none());
    let (report, error) = report_of(monitor.refresh(later).expect("refresh"));
    assert!(matches!(error, Some(AqError::Network(_))));
    assert_eq!(report.source, DataSource::Cache);
    assert_eq!(report.classified.snapshot.aqi, 55.0);
}

#[test]
fn test_coordinates_target_reaches_provider() {
    let provider = ReplayProvider::new(vec![Ok(feed_body(20, 4.0))]);
    let mut monitor = Monitor::new(
        provider,
        MeasurementCache::new(MemoryStore::new()),
        TrendConfig::default(),
    );
    monitor
        .select_location(LocationDescriptor::coordinates(40.69, -89.59, "Peoria"))
        .expect("valid selection");
    let ticket = monitor.begin_refresh().expect("ticket");
    let result = monitor.fetch(&ticket);
    let (report, _) = report_of(monitor.complete_refresh(ticket, result, fixed_now()));

    assert_eq!(report.generation, 1);
    assert_eq!(report.classified.category.level, "Good");
}

#[test]
fn test_invalid_coordinates_never_reach_provider() {
    for (lat, lng) in [(91.0, 0.0), (0.0, 200.0)] {
        let mut monitor = Monitor::new(
            ReplayProvider::new(vec![Ok(feed_body(20, 4.0))]),
            MeasurementCache::new(MemoryStore::new()),
            TrendConfig::default(),
        );
        assert_eq!(
            monitor.select_location(LocationDescriptor::coordinates(lat, lng, "Bad")),
            Err(AqError::InvalidCoordinates { lat, lng })
        );
        assert_eq!(monitor.selection().descriptor(), &LocationDescriptor::ambient());

        let (report, _) = report_of(monitor.refresh(fixed_now()).expect("refresh"));
        assert_eq!(report.source, DataSource::Live);
    }
}

#[test]
fn test_switching_location_does_not_serve_previous_cache() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.json");

    {
        let mut monitor = Monitor::new(
            ReplayProvider::new(vec![Ok(feed_body(180, 90.0))]),
            MeasurementCache::new(JsonFileStore::new(&path)),
            TrendConfig::default(),
        );
        monitor
            .select_location(LocationDescriptor::station("1437", "Beijing"))
            .expect("valid selection");
        monitor.refresh(fixed_now()).expect("refresh");
        monitor
            .select_location(LocationDescriptor::coordinates(51.5, -0.12, "London"))
            .expect("valid selection");
    }

    let mut monitor = Monitor::new(
        ReplayProvider::new(vec![Err(AqError::Timeout)]),
        MeasurementCache::new(JsonFileStore::new(&path)),
        TrendConfig::default(),
    );
    assert_eq!(monitor.selection().descriptor().display_name, "London");
    assert!(monitor.provisional(fixed_now()).is_none());

    let (report, _) = report_of(monitor.refresh(fixed_now()).expect("refresh"));
    assert_eq!(report.source, DataSource::Synthetic);
    assert_eq!(report.location.name, "London");
}

#[test]
fn test_synthetic_fallback_is_reproducible() {
    let build = || {
        Monitor::new(
            ReplayProvider::new(vec![Err(AqError::HttpError(500))]),
            MeasurementCache::new(MemoryStore::new()),
            TrendConfig::default(),
        )
        .with_synthetic(SyntheticGenerator::seeded(2024))
    };

    let (a, _) = report_of(build().refresh(fixed_now()).expect("refresh"));
    let (b, _) = report_of(build().refresh(fixed_now()).expect("refresh"));
    assert_eq!(a.source, DataSource::Synthetic);
    assert_eq!(a.classified.snapshot, b.classified.snapshot);
}

// ---------------------------------------------------------------------------
// Component properties
// ---------------------------------------------------------------------------

#[test]
fn test_category_bands_are_exhaustive() {
    let mut previous_max = None;
    for aqi in 0..=600 {
        let band = category_of(aqi as f64);
        assert!(aqi > 500 || (band.min..=band.max).contains(&aqi));
        if let Some(prev) = previous_max {
            assert!(band.max >= prev, "bands must not go backwards at {}", aqi);
        }
        previous_max = Some(band.max);
    }
    assert_eq!(category_of(0.0).level, "Good");
    assert_eq!(category_of(501.0).level, "Hazardous");
}

#[test]
fn test_composition_sums_to_100_or_0() {
    let cases: Vec<Vec<(PollutantKey, f64)>> = vec![
        vec![],
        vec![(PollutantKey::Pm25, 0.0)],
        vec![(PollutantKey::Pm25, 40.0), (PollutantKey::Pm10, 10.0)],
        vec![
            (PollutantKey::No2, 3.3),
            (PollutantKey::So2, 17.0),
            (PollutantKey::O3, 250.0),
            (PollutantKey::Co, 0.4),
        ],
    ];
    for case in cases {
        let map: PollutantMap = case.into_iter().collect();
        let total: f64 = composition(&map).values().sum();
        assert!(total == 0.0 || (total - 100.0).abs() < 1e-9, "total {}", total);
    }

    let map: PollutantMap = [(PollutantKey::Pm25, 40.0), (PollutantKey::Pm10, 10.0)]
        .into_iter()
        .collect();
    assert_eq!(dominant_pollutant(&map), Some(PollutantKey::Pm25));
    assert_eq!(dominant_pollutant(&PollutantMap::new()), None);
}

#[test]
fn test_history_keeps_last_24_hourly_entries() {
    let mut tracker = TrendTracker::new(TrendConfig::default());
    for hour in 0..25 {
        tracker.append(50.0 + hour as f64, fixed_now() + Duration::hours(hour));
    }
    assert_eq!(tracker.len(), 24);
    assert_eq!(tracker.entries()[0].timestamp, fixed_now() + Duration::hours(1));
    assert!(tracker.entries().iter().all(|e| !e.synthetic));
}
