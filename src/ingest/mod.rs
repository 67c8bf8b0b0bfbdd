/// Measurement providers.
///
/// The engine depends only on the `MeasurementProvider` trait; concrete
/// network clients live in submodules.
///
/// Submodules:
/// - `waqi`: World Air Quality Index feed API client.

pub mod waqi;

use crate::location::FetchTarget;
use crate::model::{AqError, MeasurementSnapshot, StationSummary};

/// Opaque fetch capability consumed by the refresh engine.
pub trait MeasurementProvider {
    /// Fetches the latest measurement for a resolved target.
    fn fetch_measurement(&self, target: &FetchTarget) -> Result<MeasurementSnapshot, AqError>;

    /// Searches monitoring stations by free-text keyword.
    fn search_stations(&self, query: &str) -> Result<Vec<StationSummary>, AqError>;
}
