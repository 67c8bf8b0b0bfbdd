/// AQI and pollutant threshold alerts.
///
/// Rules are evaluated in a fixed order which is also the display order.
/// Every matching rule fires; no rule suppresses another except the two
/// AQI rules, which are mutually exclusive.

use crate::analysis::trend::TrendSignal;
use crate::model::{Alert, AlertSeverity, MeasurementSnapshot, PollutantKey};

/// AQI above this raises a danger alert.
pub const VERY_UNHEALTHY_AQI: f64 = 200.0;

/// AQI above this (and not above `VERY_UNHEALTHY_AQI`) raises a warning.
pub const UNHEALTHY_AQI: f64 = 150.0;

/// PM2.5 above this (µg/m³) raises a mask warning.
pub const PM25_MASK_THRESHOLD: f64 = 35.0;

const VERY_UNHEALTHY: Alert = Alert {
    severity: AlertSeverity::Danger,
    icon: "fas fa-exclamation-triangle",
    message: "HEALTH WARNING: Air quality is very unhealthy. Limit outdoor exposure.",
};

const UNHEALTHY: Alert = Alert {
    severity: AlertSeverity::Warning,
    icon: "fas fa-exclamation-circle",
    message: "Air quality is unhealthy. Sensitive groups should avoid prolonged outdoor activity.",
};

const HIGH_PM25: Alert = Alert {
    severity: AlertSeverity::Warning,
    icon: "fas fa-mask",
    message: "High PM2.5 levels detected. Consider wearing a mask outdoors.",
};

const RAPID_DETERIORATION: Alert = Alert {
    severity: AlertSeverity::Info,
    icon: "fas fa-arrow-up",
    message: "Air quality is deteriorating rapidly. Monitor conditions closely.",
};

/// Evaluates every alert rule against a snapshot and the current trend
/// signal, returning the alerts in display order:
///
///   1. aqi > 200                → danger
///   2. else aqi > 150           → warning
///   3. pm2.5 > 35               → warning
///   4. rapid deterioration      → info
///
/// Stateless: the same inputs always produce the same list.
pub fn evaluate(snapshot: &MeasurementSnapshot, signal: Option<TrendSignal>) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if snapshot.aqi > VERY_UNHEALTHY_AQI {
        alerts.push(VERY_UNHEALTHY);
    } else if snapshot.aqi > UNHEALTHY_AQI {
        alerts.push(UNHEALTHY);
    }

    if snapshot
        .pollutant(PollutantKey::Pm25)
        .is_some_and(|v| v > PM25_MASK_THRESHOLD)
    {
        alerts.push(HIGH_PM25);
    }

    if let Some(TrendSignal::RapidDeterioration { .. }) = signal {
        alerts.push(RAPID_DETERIORATION);
    }

    alerts
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
