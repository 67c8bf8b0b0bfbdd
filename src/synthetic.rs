/// Synthetic fallback measurements.
///
/// When a live fetch fails and nothing has ever been cached, the dashboard
/// still needs a snapshot. `SyntheticGenerator` builds one with every
/// pollutant present and values drawn uniformly from the documented ranges
/// below. The randomness source is injected: use `seeded` for
/// reproducible output in tests and `from_entropy` in the daemon.

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::ops::RangeInclusive;

use crate::model::{Coordinates, MeasurementSnapshot, PollutantKey, PollutantMap};

/// Range of generated AQI values.
pub const SYNTHETIC_AQI_RANGE: RangeInclusive<f64> = 20.0..=180.0;

/// Range of generated values per pollutant, in the table's units.
pub fn synthetic_range(key: PollutantKey) -> RangeInclusive<f64> {
    match key {
        PollutantKey::Pm25 => 5.0..=80.0,
        PollutantKey::Pm10 => 10.0..=120.0,
        PollutantKey::No2 => 5.0..=60.0,
        PollutantKey::So2 => 2.0..=40.0,
        PollutantKey::O3 => 10.0..=120.0,
        PollutantKey::Co => 0.2..=8.0,
    }
}

pub struct SyntheticGenerator<R> {
    rng: R,
}

impl SyntheticGenerator<ChaCha8Rng> {
    /// Deterministic generator: the same seed yields the same snapshots.
    pub fn seeded(seed: u64) -> Self {
        SyntheticGenerator::new(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        SyntheticGenerator::new(ChaCha8Rng::from_entropy())
    }
}

impl<R: Rng> SyntheticGenerator<R> {
    pub fn new(rng: R) -> Self {
        SyntheticGenerator { rng }
    }

    /// Builds a snapshot for `location_name` stamped at `now`.
    ///
    /// AQI is whole-numbered like provider data; pollutant values keep one
    /// decimal place.
    pub fn generate(
        &mut self,
        location_name: &str,
        coordinates: Option<Coordinates>,
        now: DateTime<Utc>,
    ) -> MeasurementSnapshot {
        let aqi = self.rng.gen_range(SYNTHETIC_AQI_RANGE).round();
        let pollutants: PollutantMap = PollutantKey::ALL
            .into_iter()
            .map(|key| {
                let value = self.rng.gen_range(synthetic_range(key));
                (key, (value * 10.0).round() / 10.0)
            })
            .collect();

        MeasurementSnapshot {
            aqi,
            pollutants,
            timestamp: now,
            location_name: location_name.to_string(),
            coordinates,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
