/// Alerting: threshold rules over a snapshot, and freshness of cached data.
///
/// Submodules:
/// - `thresholds`: the ordered alert rule set.
/// - `stalenesses`: TTL checks for cache entries.

pub use thresholds::evaluate;

pub mod stalenesses;
pub mod thresholds;
