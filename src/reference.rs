/// Static reference tables for the air-quality monitoring service.
///
/// Pollutant safe limits, AQI category bands, and the health insights shown
/// for each band. This is the single source of truth for thresholds; all
/// other modules should look values up here rather than hardcoding them.
///
/// Sources:
///   - Safe limits: WHO 2021 global air quality guidelines
///   - AQI bands and colors: US EPA AQI scale

use crate::model::{AqiCategoryBand, HealthInsight, PollutantKey, PollutantLimit};

// ---------------------------------------------------------------------------
// Pollutant safe limits
// ---------------------------------------------------------------------------

/// Safe limits for every tracked pollutant, in `PollutantKey` order.
pub static POLLUTANT_LIMITS: &[PollutantLimit] = &[
    PollutantLimit {
        key: PollutantKey::Pm25,
        safe_limit: 15.0,
        unit: "µg/m³",
        display_name: "PM2.5",
    },
    PollutantLimit {
        key: PollutantKey::Pm10,
        safe_limit: 45.0,
        unit: "µg/m³",
        display_name: "PM10",
    },
    PollutantLimit {
        key: PollutantKey::No2,
        safe_limit: 25.0,
        unit: "µg/m³",
        display_name: "NO₂",
    },
    PollutantLimit {
        key: PollutantKey::So2,
        safe_limit: 40.0,
        unit: "µg/m³",
        display_name: "SO₂",
    },
    PollutantLimit {
        key: PollutantKey::O3,
        safe_limit: 100.0,
        unit: "µg/m³",
        display_name: "O₃",
    },
    PollutantLimit {
        key: PollutantKey::Co,
        safe_limit: 4.0,
        unit: "mg/m³",
        display_name: "CO",
    },
];

/// Looks up the limit for a pollutant. Every `PollutantKey` has an entry.
pub fn limit_for(key: PollutantKey) -> &'static PollutantLimit {
    // POLLUTANT_LIMITS is declared in PollutantKey order.
    &POLLUTANT_LIMITS[key as usize]
}

/// Looks up the limit for a provider code such as `"pm25"`.
/// Returns `None` for codes outside the table.
pub fn find_limit(code: &str) -> Option<&'static PollutantLimit> {
    PollutantKey::from_code(code).map(limit_for)
}

// ---------------------------------------------------------------------------
// AQI category bands
// ---------------------------------------------------------------------------

/// The six AQI bands, contiguous over 0–500.
pub static AQI_CATEGORY_BANDS: &[AqiCategoryBand] = &[
    AqiCategoryBand {
        min: 0,
        max: 50,
        level: "Good",
        color: "#00e400",
        health_statement: "Air quality is satisfactory",
    },
    AqiCategoryBand {
        min: 51,
        max: 100,
        level: "Moderate",
        color: "#ffff00",
        health_statement: "Acceptable air quality",
    },
    AqiCategoryBand {
        min: 101,
        max: 150,
        level: "Unhealthy for Sensitive Groups",
        color: "#ff7e00",
        health_statement: "Members of sensitive groups may experience effects",
    },
    AqiCategoryBand {
        min: 151,
        max: 200,
        level: "Unhealthy",
        color: "#ff0000",
        health_statement: "Everyone may begin to experience effects",
    },
    AqiCategoryBand {
        min: 201,
        max: 300,
        level: "Very Unhealthy",
        color: "#8f3f97",
        health_statement: "Health alert: serious risk",
    },
    AqiCategoryBand {
        min: 301,
        max: 500,
        level: "Hazardous",
        color: "#7e0023",
        health_statement: "Health warning of emergency conditions",
    },
];

// ---------------------------------------------------------------------------
// Health insights
// ---------------------------------------------------------------------------

/// Three insights per AQI band, indexed like `AQI_CATEGORY_BANDS`.
pub static HEALTH_INSIGHTS: [[HealthInsight; 3]; 6] = [
    [
        HealthInsight {
            icon: "fas fa-running",
            title: "Outdoor Activities",
            description: "Perfect for outdoor exercise and activities",
        },
        HealthInsight {
            icon: "fas fa-lungs",
            title: "Breathing Comfort",
            description: "Air quality is excellent for everyone",
        },
        HealthInsight {
            icon: "fas fa-child",
            title: "Children & Elderly",
            description: "Safe for all age groups to be outdoors",
        },
    ],
    [
        HealthInsight {
            icon: "fas fa-walking",
            title: "Moderate Activity",
            description: "Generally acceptable for outdoor activities",
        },
        HealthInsight {
            icon: "fas fa-lungs",
            title: "Minor Concern",
            description: "Unusually sensitive people should consider limiting activity",
        },
        HealthInsight {
            icon: "fas fa-tree",
            title: "Indoor Air",
            description: "Consider opening windows for ventilation",
        },
    ],
    [
        HealthInsight {
            icon: "fas fa-mask",
            title: "Sensitive Groups",
            description: "Children, elderly, and those with respiratory issues should limit outdoor exposure",
        },
        HealthInsight {
            icon: "fas fa-heart",
            title: "Heart & Lung",
            description: "People with heart or lung disease should avoid prolonged exertion",
        },
        HealthInsight {
            icon: "fas fa-home",
            title: "Indoor Precautions",
            description: "Use air purifiers and keep windows closed during high pollution hours",
        },
    ],
    [
        HealthInsight {
            icon: "fas fa-exclamation-triangle",
            title: "Health Alert",
            description: "Everyone may experience health effects",
        },
        HealthInsight {
            icon: "fas fa-procedures",
            title: "Medical Attention",
            description: "Seek medical help if experiencing breathing difficulties",
        },
        HealthInsight {
            icon: "fas fa-house-user",
            title: "Stay Indoors",
            description: "Limit outdoor activities, use air purifiers indoors",
        },
    ],
    [
        HealthInsight {
            icon: "fas fa-skull-crossbones",
            title: "Health Warning",
            description: "Serious health effects on everyone",
        },
        HealthInsight {
            icon: "fas fa-ban",
            title: "Avoid Outdoors",
            description: "Remain indoors and keep activity levels low",
        },
        HealthInsight {
            icon: "fas fa-hospital",
            title: "Emergency",
            description: "Contact healthcare provider if symptoms worsen",
        },
    ],
    [
        HealthInsight {
            icon: "fas fa-radiation-alt",
            title: "Emergency Conditions",
            description: "Health warning of emergency conditions",
        },
        HealthInsight {
            icon: "fas fa-house-damage",
            title: "Shelter in Place",
            description: "Stay indoors with windows and doors closed",
        },
        HealthInsight {
            icon: "fas fa-ambulance",
            title: "Medical Emergency",
            description: "Seek immediate medical attention for breathing issues",
        },
    ],
];

/// Display icon for a pollutant card.
pub fn pollutant_icon(key: PollutantKey) -> &'static str {
    match key {
        PollutantKey::Pm25 => "fas fa-smog",
        PollutantKey::Pm10 => "fas fa-wind",
        PollutantKey::No2 => "fas fa-industry",
        PollutantKey::So2 => "fas fa-factory",
        PollutantKey::O3 => "fas fa-sun",
        PollutantKey::Co => "fas fa-car",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
