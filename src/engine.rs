/// Refresh engine: selection → fetch → classify → trend → alerts → report.
///
/// `Monitor` owns every piece of mutable state (selection context, cache,
/// trend history) and drives one refresh cycle at a time. A refresh is
/// split into three steps so a caller can run the fetch elsewhere:
///
/// 1. `begin_refresh` resolves the active selection into a `FetchTicket`
///    tagged with the selection generation. Invalid coordinates fail here,
///    before any fetch.
/// 2. `fetch` performs the provider call for a ticket.
/// 3. `complete_refresh` applies the result. A ticket whose generation is
///    no longer current is discarded without touching cache or history.
///
/// On fetch failure the report falls back to the newest cached measurement
/// of any age for the active selection, then to a synthetic snapshot.
/// Fallback data is never appended to the trend history.
///
/// History entries are stamped with the provider's observation time, so
/// polling the same observation twice does not add a second sample.

use chrono::{DateTime, Utc};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::fmt;

use crate::alert;
use crate::analysis::composition::{self, Composition};
use crate::analysis::trend::{
    HistoryEntry, TrendConfig, TrendSignal, TrendStats, TrendTracker,
};
use crate::cache::MeasurementCache;
use crate::classify::{self, PollutantSeverity};
use crate::compare::{self, Comparator, Comparison, FixedComparator};
use crate::ingest::MeasurementProvider;
use crate::location::{
    FetchTarget, LocationDescriptor, LocationDisplay, LocationKind, SelectionContext,
    resolve_fetch_target,
};
use crate::logging::{self, Component};
use crate::model::{
    Alert, AqError, AqiCategoryBand, Coordinates, HealthInsight, MeasurementSnapshot,
    PollutantKey, StationSummary,
};
use crate::reference::{limit_for, pollutant_icon};
use crate::store::KeyValueStore;
use crate::synthetic::SyntheticGenerator;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Where the reported snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Cache,
    Synthetic,
}

impl DataSource {
    pub fn label(&self) -> &'static str {
        match self {
            DataSource::Live => "live",
            DataSource::Cache => "cache",
            DataSource::Synthetic => "synthetic",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One pollutant row of the breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollutantReading {
    pub key: PollutantKey,
    pub display_name: &'static str,
    pub icon: &'static str,
    pub unit: &'static str,
    pub value: f64,
    pub safe_limit: f64,
    /// Percentage of the safe limit, capped for display.
    pub percent_of_limit: f64,
    pub severity: PollutantSeverity,
}

/// A snapshot with everything the classifier and aggregator derive from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedSnapshot {
    pub snapshot: MeasurementSnapshot,
    pub category: AqiCategoryBand,
    pub health_impact: &'static str,
    pub pollutants: Vec<PollutantReading>,
    pub dominant: Option<PollutantKey>,
    pub primary_driver: Option<(PollutantKey, f64)>,
    pub composition: Composition,
}

/// Classifies a snapshot. Pure; pollutants are listed in table order.
pub fn classify_snapshot(snapshot: MeasurementSnapshot) -> ClassifiedSnapshot {
    let pollutants = snapshot
        .pollutants
        .iter()
        .map(|(key, value)| {
            let limit = limit_for(*key);
            PollutantReading {
                key: *key,
                display_name: limit.display_name,
                icon: pollutant_icon(*key),
                unit: limit.unit,
                value: *value,
                safe_limit: limit.safe_limit,
                percent_of_limit: classify::percent_of_safe_limit(key.code(), *value)
                    .unwrap_or(0.0),
                severity: classify::severity_for(*key, *value),
            }
        })
        .collect();

    let composition = composition::composition(&snapshot.pollutants);
    ClassifiedSnapshot {
        category: classify::category_of(snapshot.aqi).clone(),
        health_impact: classify::health_impact_text(snapshot.aqi),
        pollutants,
        dominant: composition::dominant_pollutant(&snapshot.pollutants),
        primary_driver: composition::primary_driver(&composition),
        composition,
        snapshot,
    }
}

/// Everything the presentation layer needs for one refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub generation: u64,
    pub source: DataSource,
    pub location: LocationDisplay,
    pub classified: ClassifiedSnapshot,
    pub trend: Option<TrendStats>,
    pub history: Vec<HistoryEntry>,
    pub alerts: Vec<Alert>,
    pub insights: Vec<HealthInsight>,
    pub comparisons: Vec<Comparison>,
}

/// A fetch issued for a specific selection generation.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub generation: u64,
    pub target: FetchTarget,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// The report to display. `error` is the recoverable fetch failure when
    /// the report is built from fallback data.
    Refreshed {
        report: Box<DashboardReport>,
        error: Option<AqError>,
    },
    /// The ticket's selection was superseded before the result arrived.
    Discarded { generation: u64, current: u64 },
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

pub struct Monitor<P, S> {
    provider: P,
    cache: MeasurementCache<S>,
    selection: SelectionContext,
    tracker: TrendTracker,
    comparator: Box<dyn Comparator>,
    synthetic: SyntheticGenerator<ChaCha8Rng>,
}

impl<P: MeasurementProvider, S: KeyValueStore> Monitor<P, S> {
    /// Builds a monitor, restoring the persisted selection if there is one.
    pub fn new(provider: P, mut cache: MeasurementCache<S>, trend: TrendConfig) -> Self {
        let descriptor = cache.load_location().unwrap_or_default();
        logging::info(
            Component::Engine,
            Some(&descriptor.display_name),
            "Monitor started",
        );
        Monitor {
            provider,
            cache,
            selection: SelectionContext::new(descriptor),
            tracker: TrendTracker::new(trend),
            comparator: Box::new(FixedComparator::default()),
            synthetic: SyntheticGenerator::from_entropy(),
        }
    }

    pub fn with_comparator(mut self, comparator: Box<dyn Comparator>) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn with_synthetic(mut self, synthetic: SyntheticGenerator<ChaCha8Rng>) -> Self {
        self.synthetic = synthetic;
        self
    }

    pub fn selection(&self) -> &SelectionContext {
        &self.selection
    }

    pub fn tracker(&self) -> &TrendTracker {
        &self.tracker
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Makes `descriptor` the active selection and persists it. History from
    /// the previous selection is cleared. Returns the new generation.
    ///
    /// A descriptor that cannot be resolved (out-of-range coordinates) is
    /// rejected; the previous selection stays active and stored.
    pub fn select_location(&mut self, descriptor: LocationDescriptor) -> Result<u64, AqError> {
        resolve_fetch_target(&descriptor).inspect_err(|e| {
            logging::log_failure(
                Component::Engine,
                &descriptor.display_name,
                "select location",
                e,
            );
        })?;
        if let Err(e) = self.cache.save_location(&descriptor) {
            logging::log_failure(
                Component::Store,
                &descriptor.display_name,
                "save location",
                &e,
            );
        }
        logging::info(
            Component::Engine,
            Some(&descriptor.display_name),
            "Location selected",
        );
        self.tracker.clear();
        Ok(self.selection.select(descriptor))
    }

    /// Station search, passed through to the provider. A blank query
    /// returns nothing without a request.
    pub fn search_stations(&self, query: &str) -> Result<Vec<StationSummary>, AqError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.provider.search_stations(query).inspect_err(|e| {
            logging::log_failure(Component::Waqi, query, "station search", e);
        })
    }

    // -----------------------------------------------------------------------
    // Refresh cycle
    // -----------------------------------------------------------------------

    /// The fresh cached measurement, shown while a live fetch is pending.
    /// Does not touch the trend history.
    pub fn provisional(&mut self, now: DateTime<Utc>) -> Option<DashboardReport> {
        let snapshot = self.cache.fresh(self.selection.descriptor(), now)?;
        Some(self.build_report(snapshot, DataSource::Cache))
    }

    /// Resolves the active selection into a ticket for the fetch step.
    pub fn begin_refresh(&self) -> Result<FetchTicket, AqError> {
        let descriptor = self.selection.descriptor();
        let target = resolve_fetch_target(descriptor).inspect_err(|e| {
            logging::log_failure(
                Component::Engine,
                &descriptor.display_name,
                "resolve location",
                e,
            );
        })?;
        Ok(FetchTicket {
            generation: self.selection.generation(),
            target,
        })
    }

    pub fn fetch(&self, ticket: &FetchTicket) -> Result<MeasurementSnapshot, AqError> {
        self.provider.fetch_measurement(&ticket.target)
    }

    /// Applies a fetch result to the engine state and builds the report.
    pub fn complete_refresh(
        &mut self,
        ticket: FetchTicket,
        result: Result<MeasurementSnapshot, AqError>,
        now: DateTime<Utc>,
    ) -> RefreshOutcome {
        let current = self.selection.generation();
        if !self.selection.is_current(ticket.generation) {
            logging::debug(
                Component::Engine,
                Some(&self.selection.descriptor().display_name),
                &format!(
                    "Discarding result for superseded selection (generation {}, current {})",
                    ticket.generation, current
                ),
            );
            return RefreshOutcome::Discarded {
                generation: ticket.generation,
                current,
            };
        }

        match result {
            Ok(snapshot) => {
                if let Err(e) =
                    self.cache
                        .store_measurement(&snapshot, self.selection.descriptor(), now)
                {
                    logging::log_failure(
                        Component::Cache,
                        &snapshot.location_name,
                        "cache write",
                        &e,
                    );
                }
                self.tracker.append(snapshot.aqi, snapshot.timestamp);
                let report = self.build_report(snapshot, DataSource::Live);
                RefreshOutcome::Refreshed {
                    report: Box::new(report),
                    error: None,
                }
            }
            Err(err) => {
                let display_name = self.selection.descriptor().display_name.clone();
                let component = if err.is_fetch_failure() {
                    Component::Waqi
                } else {
                    Component::Engine
                };
                logging::log_failure(component, &display_name, "fetch measurement", &err);

                let (snapshot, source) = match self.cache.fallback(self.selection.descriptor()) {
                    Some(cached) => (cached, DataSource::Cache),
                    None => {
                        let coordinates = descriptor_coordinates(self.selection.descriptor());
                        let synthetic = self.synthetic.generate(&display_name, coordinates, now);
                        (synthetic, DataSource::Synthetic)
                    }
                };
                let report = self.build_report(snapshot, source);
                RefreshOutcome::Refreshed {
                    report: Box::new(report),
                    error: Some(err),
                }
            }
        }
    }

    /// One full cycle: ticket, fetch, complete.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> Result<RefreshOutcome, AqError> {
        let ticket = self.begin_refresh()?;
        let result = self.fetch(&ticket);
        Ok(self.complete_refresh(ticket, result, now))
    }

    fn build_report(&mut self, snapshot: MeasurementSnapshot, source: DataSource) -> DashboardReport {
        let trend = self.tracker.stats();
        // The history only moves on live data, so its signal is only
        // meaningful for a live report.
        let signal = match source {
            DataSource::Live => self.tracker.signal(),
            DataSource::Cache | DataSource::Synthetic => None,
        };
        if let Some(TrendSignal::RapidDeterioration { change }) = signal {
            logging::warn(
                Component::Trend,
                Some(&snapshot.location_name),
                &format!("AQI rose {:.0} points since the previous sample", change),
            );
        }
        let alerts = alert::evaluate(&snapshot, signal);
        let location = LocationDisplay::new(
            self.selection.descriptor(),
            &snapshot.location_name,
            snapshot.coordinates,
        );
        let insights = classify::health_insights(snapshot.aqi).to_vec();
        let comparisons = compare::compare(self.comparator.as_mut(), snapshot.aqi, trend.as_ref());

        logging::log_refresh_summary(&location.name, source.label(), snapshot.aqi, alerts.len());

        DashboardReport {
            generation: self.selection.generation(),
            source,
            location,
            classified: classify_snapshot(snapshot),
            trend,
            history: self.tracker.entries().to_vec(),
            alerts,
            insights,
            comparisons,
        }
    }
}

fn descriptor_coordinates(descriptor: &LocationDescriptor) -> Option<Coordinates> {
    match descriptor.kind {
        LocationKind::Coordinates { lat, lng } => Some(Coordinates { lat, lng }),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
