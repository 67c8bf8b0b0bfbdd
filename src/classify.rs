/// AQI and pollutant classification.
///
/// Every function here is total: out-of-range input clamps to the nearest
/// band, and unknown pollutant codes produce an "unknown" severity rather
/// than an error.

use serde::Serialize;

use crate::model::{AqiCategoryBand, HealthInsight, PollutantKey};
use crate::reference::{AQI_CATEGORY_BANDS, HEALTH_INSIGHTS, find_limit, limit_for};

/// Percent-of-safe-limit values are capped here for display.
pub const MAX_LIMIT_PERCENTAGE: f64 = 200.0;

// ---------------------------------------------------------------------------
// AQI categories
// ---------------------------------------------------------------------------

/// Index into `AQI_CATEGORY_BANDS` for an AQI value.
///
/// Negative and NaN values map to the first band; values above the last
/// band's max clamp to the last band.
pub fn category_index(aqi: f64) -> usize {
    if aqi.is_nan() || aqi <= 0.0 {
        return 0;
    }
    AQI_CATEGORY_BANDS
        .iter()
        .position(|band| aqi <= band.max as f64)
        .unwrap_or(AQI_CATEGORY_BANDS.len() - 1)
}

/// The AQI band containing `aqi`.
pub fn category_of(aqi: f64) -> &'static AqiCategoryBand {
    &AQI_CATEGORY_BANDS[category_index(aqi)]
}

/// Short health-impact label for the AQI card.
pub fn health_impact_text(aqi: f64) -> &'static str {
    match category_index(aqi) {
        0 => "Minimal Impact",
        1 => "Minor Concern",
        2 => "Moderate Impact",
        3 => "Unhealthy",
        4 => "Very Unhealthy",
        _ => "Hazardous",
    }
}

/// The health insights for the band containing `aqi`.
pub fn health_insights(aqi: f64) -> &'static [HealthInsight] {
    &HEALTH_INSIGHTS[category_index(aqi)]
}

// ---------------------------------------------------------------------------
// Pollutant severity
// ---------------------------------------------------------------------------

/// Severity of a single pollutant relative to its safe limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    Low,
    Elevated,
    High,
    Dangerous,
    Unknown,
}

/// Display-ready pollutant severity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollutantSeverity {
    pub level: SeverityLevel,
    pub label: &'static str,
    pub color: &'static str,
}

impl PollutantSeverity {
    fn from_level(level: SeverityLevel) -> Self {
        let (label, color) = match level {
            SeverityLevel::Low => ("Low", "#10b981"),
            SeverityLevel::Elevated => ("Elevated", "#f59e0b"),
            SeverityLevel::High => ("High", "#ef4444"),
            SeverityLevel::Dangerous => ("Dangerous", "#7e0023"),
            SeverityLevel::Unknown => ("Unknown", "#9ca3af"),
        };
        PollutantSeverity { level, label, color }
    }
}

/// Classifies an observed value against the pollutant's safe limit:
///
///   ratio < 0.5 → low
///   ratio < 1   → elevated
///   ratio < 2   → high
///   otherwise   → dangerous
pub fn severity_for(key: PollutantKey, value: f64) -> PollutantSeverity {
    let ratio = value / limit_for(key).safe_limit;
    let level = if ratio < 0.5 {
        SeverityLevel::Low
    } else if ratio < 1.0 {
        SeverityLevel::Elevated
    } else if ratio < 2.0 {
        SeverityLevel::High
    } else {
        SeverityLevel::Dangerous
    };
    PollutantSeverity::from_level(level)
}

/// Like `severity_for`, keyed by provider code. Codes outside the reference
/// table yield an `Unknown` severity.
pub fn severity_of(code: &str, value: f64) -> PollutantSeverity {
    match PollutantKey::from_code(code) {
        Some(key) => severity_for(key, value),
        None => PollutantSeverity::from_level(SeverityLevel::Unknown),
    }
}

/// Observed value as a percentage of the safe limit, capped at
/// `MAX_LIMIT_PERCENTAGE`. `None` for unknown codes.
pub fn percent_of_safe_limit(code: &str, value: f64) -> Option<f64> {
    find_limit(code).map(|limit| (value / limit.safe_limit * 100.0).min(MAX_LIMIT_PERCENTAGE))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_good_and_501_is_hazardous() {
        assert_eq!(category_of(0.0).level, "Good");
        assert_eq!(category_of(501.0).level, "Hazardous");
        assert_eq!(category_of(10_000.0).level, "Hazardous");
    }

    #[test]
    fn test_negative_and_nan_clamp_to_first_band() {
        assert_eq!(category_of(-12.0).level, "Good");
        assert_eq!(category_of(f64::NAN).level, "Good");
    }

    #[test]
    fn test_band_edges_are_inclusive() {
        assert_eq!(category_of(50.0).level, "Good");
        assert_eq!(category_of(51.0).level, "Moderate");
        assert_eq!(category_of(150.0).level, "Unhealthy for Sensitive Groups");
        assert_eq!(category_of(151.0).level, "Unhealthy");
        assert_eq!(category_of(300.0).level, "Very Unhealthy");
        assert_eq!(category_of(301.0).level, "Hazardous");
    }

    #[test]
    fn test_fractional_values_fall_into_upper_neighbor() {
        // 50.5 sits in the integer gap between Good and Moderate.
        assert_eq!(category_of(50.5).level, "Moderate");
    }

    #[test]
    fn test_every_integer_maps_to_exactly_one_band() {
        for aqi in 0..=600u32 {
            let containing = AQI_CATEGORY_BANDS
                .iter()
                .filter(|b| aqi >= b.min && aqi <= b.max)
                .count();
            let band = category_of(aqi as f64);
            if aqi <= 500 {
                assert_eq!(containing, 1, "aqi {} should be in exactly one band", aqi);
                assert!(aqi >= band.min && aqi <= band.max);
            } else {
                assert_eq!(band.level, "Hazardous");
            }
        }
    }

    #[test]
    fn test_health_impact_text_tracks_bands() {
        assert_eq!(health_impact_text(12.0), "Minimal Impact");
        assert_eq!(health_impact_text(175.0), "Unhealthy");
        assert_eq!(health_impact_text(450.0), "Hazardous");
        assert_eq!(health_insights(12.0)[0].title, "Outdoor Activities");
        assert_eq!(health_insights(999.0)[1].title, "Shelter in Place");
    }

    #[test]
    fn test_severity_ratio_thresholds() {
        // pm25 safe limit is 15.
        assert_eq!(severity_of("pm25", 7.0).level, SeverityLevel::Low);
        assert_eq!(severity_of("pm25", 7.5).level, SeverityLevel::Elevated);
        assert_eq!(severity_of("pm25", 14.9).level, SeverityLevel::Elevated);
        assert_eq!(severity_of("pm25", 15.0).level, SeverityLevel::High);
        assert_eq!(severity_of("pm25", 30.0).level, SeverityLevel::Dangerous);
    }

    #[test]
    fn test_unknown_code_is_unknown_severity_not_error() {
        let severity = severity_of("humidity", 80.0);
        assert_eq!(severity.level, SeverityLevel::Unknown);
        assert_eq!(severity.label, "Unknown");
    }

    #[test]
    fn test_percent_of_safe_limit_is_capped() {
        assert_eq!(percent_of_safe_limit("pm10", 45.0), Some(100.0));
        assert_eq!(percent_of_safe_limit("co", 40.0), Some(MAX_LIMIT_PERCENTAGE));
        assert_eq!(percent_of_safe_limit("w", 3.0), None);
    }
}
