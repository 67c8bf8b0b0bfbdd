/// Measurement analysis for the air-quality monitoring service.
///
/// This module turns snapshots into the aggregated views the dashboard
/// shows. Nothing here performs I/O or reads the clock.
///
/// Submodules:
/// - `composition`: dominant pollutant, composition shares, primary driver.
/// - `trend`: bounded AQI history and its statistics.

pub mod composition;
pub mod trend;
