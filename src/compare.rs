/// Comparative analysis: how the current AQI stacks up against reference
/// values.
///
/// The reference values (a city average, the nearest station) are not
/// measured data. They come from a pluggable `Comparator` so the engine's
/// output stays deterministic under test while the daemon can keep the
/// dashboard's decorative jitter.

use rand::Rng;
use serde::Serialize;

use crate::analysis::trend::{TrendDirection, TrendStats};

/// Relative difference under which two values count as similar, in percent.
pub const SIMILAR_PERCENT: f64 = 10.0;

/// Default simulated city-average AQI.
pub const DEFAULT_CITY_AVERAGE: f64 = 75.0;

/// Nearest-station values differ from the current AQI by at most this much.
pub const NEARBY_SPREAD: f64 = 15.0;

// ---------------------------------------------------------------------------
// Comparator
// ---------------------------------------------------------------------------

/// Source of reference AQI values for comparison.
pub trait Comparator {
    fn city_average(&mut self, current_aqi: f64) -> f64;
    fn nearest_station(&mut self, current_aqi: f64) -> f64;
}

/// Fixed references: a constant city average and a constant offset for the
/// nearest station.
#[derive(Debug, Clone)]
pub struct FixedComparator {
    pub city_average: f64,
    pub nearby_offset: f64,
}

impl Default for FixedComparator {
    fn default() -> Self {
        FixedComparator {
            city_average: DEFAULT_CITY_AVERAGE,
            nearby_offset: 0.0,
        }
    }
}

impl Comparator for FixedComparator {
    fn city_average(&mut self, _current_aqi: f64) -> f64 {
        self.city_average
    }

    fn nearest_station(&mut self, current_aqi: f64) -> f64 {
        current_aqi + self.nearby_offset
    }
}

/// Simulated references: fixed city average, nearest station jittered by
/// up to ±`NEARBY_SPREAD` around the current AQI.
pub struct RandomComparator<R> {
    rng: R,
    city_average: f64,
}

impl<R: Rng> RandomComparator<R> {
    pub fn new(rng: R) -> Self {
        RandomComparator {
            rng,
            city_average: DEFAULT_CITY_AVERAGE,
        }
    }
}

impl<R: Rng> Comparator for RandomComparator<R> {
    fn city_average(&mut self, _current_aqi: f64) -> f64 {
        self.city_average
    }

    fn nearest_station(&mut self, current_aqi: f64) -> f64 {
        current_aqi + self.rng.gen_range(-NEARBY_SPREAD..=NEARBY_SPREAD)
    }
}

// ---------------------------------------------------------------------------
// Comparison results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonStatus {
    Similar,
    Better,
    Worse,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub title: &'static str,
    pub icon: &'static str,
    pub status: ComparisonStatus,
    pub description: String,
}

/// Relative difference of `current` from `reference`, in percent.
/// A zero reference yields 0 for equal values and ±100 otherwise.
fn percent_difference(current: f64, reference: f64) -> f64 {
    if reference == 0.0 {
        return if current == 0.0 { 0.0 } else { 100.0_f64.copysign(current) };
    }
    (current - reference) / reference * 100.0
}

/// Lower AQI is better.
pub fn comparison_status(current: f64, reference: f64) -> ComparisonStatus {
    if percent_difference(current, reference).abs() < SIMILAR_PERCENT {
        ComparisonStatus::Similar
    } else if current < reference {
        ComparisonStatus::Better
    } else {
        ComparisonStatus::Worse
    }
}

pub fn comparison_description(current: f64, reference: f64, against: &str) -> String {
    let percent = percent_difference(current, reference).abs();
    match comparison_status(current, reference) {
        ComparisonStatus::Similar => format!("Similar to {} (±{:.0}%)", against, percent),
        ComparisonStatus::Better => format!("{:.0}% better than {}", percent, against),
        ComparisonStatus::Worse => format!("{:.0}% worse than {}", percent, against),
    }
}

fn against(title: &'static str, icon: &'static str, current: f64, reference: f64, label: &str) -> Comparison {
    Comparison {
        title,
        icon,
        status: comparison_status(current, reference),
        description: comparison_description(current, reference, label),
    }
}

/// The three dashboard comparisons: city average, nearest station, and the
/// 24-hour trend.
pub fn compare(
    comparator: &mut dyn Comparator,
    current_aqi: f64,
    trend: Option<&TrendStats>,
) -> Vec<Comparison> {
    let city = comparator.city_average(current_aqi);
    let nearby = comparator.nearest_station(current_aqi);

    let (status, description) = match trend {
        Some(stats) => {
            let status = match stats.direction {
                TrendDirection::Stable => ComparisonStatus::Similar,
                TrendDirection::Worsening => ComparisonStatus::Worse,
                TrendDirection::Improving => ComparisonStatus::Better,
            };
            (status, stats.description.clone())
        }
        None => (
            ComparisonStatus::Similar,
            "Insufficient data for trend analysis".to_string(),
        ),
    };

    vec![
        against("City Average Comparison", "fas fa-city", current_aqi, city, "city average"),
        against("Nearest Station", "fas fa-map-marker-alt", current_aqi, nearby, "nearest station"),
        Comparison {
            title: "24-Hour Trend",
            icon: "fas fa-chart-line",
            status,
            description,
        },
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
