/// Read-through measurement cache and persisted location selection.
///
/// One cache entry exists per key and is overwritten on every successful
/// fetch. Each entry records the selection it was fetched for and is only
/// served while that selection is active. An entry is *fresh* while younger
/// than the TTL and may then be shown as a provisional live value; once
/// stale it is only used as fallback data when a live fetch fails.
///
/// Store failures never propagate out of the read paths: they are logged
/// and treated as a cache miss, so a broken state file degrades the
/// dashboard rather than stopping it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::stalenesses::{DEFAULT_TTL_SECS, is_stale_at};
use crate::location::LocationDescriptor;
use crate::logging::{self, Component};
use crate::model::{AqError, MeasurementSnapshot};
use crate::store::KeyValueStore;

/// Store key for the cached measurement.
pub const MEASUREMENT_KEY: &str = "measurement";

/// Store key for the selected location descriptor.
pub const LOCATION_KEY: &str = "selected_location";

/// A cached payload with the time it was stored and the selection it
/// belongs to. Entries written without a location match no selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub stored_at: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<LocationDescriptor>,
    pub payload: T,
}

impl<T> CacheEntry<T> {
    pub fn is_stale_at(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        is_stale_at(self.stored_at, ttl, now)
    }

    pub fn is_for(&self, location: &LocationDescriptor) -> bool {
        self.location.as_ref() == Some(location)
    }
}

pub struct MeasurementCache<S> {
    store: S,
    ttl: Duration,
}

impl<S: KeyValueStore> MeasurementCache<S> {
    pub fn new(store: S) -> Self {
        Self::with_ttl(store, Duration::seconds(DEFAULT_TTL_SECS))
    }

    pub fn with_ttl(store: S, ttl: Duration) -> Self {
        MeasurementCache { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // -----------------------------------------------------------------------
    // Measurement entry
    // -----------------------------------------------------------------------

    /// Overwrites the cached measurement and resets its staleness clock.
    pub fn store_measurement(
        &mut self,
        snapshot: &MeasurementSnapshot,
        location: &LocationDescriptor,
        now: DateTime<Utc>,
    ) -> Result<(), AqError> {
        let entry = CacheEntry {
            stored_at: now,
            location: Some(location.clone()),
            payload: snapshot,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| AqError::Store(format!("serializing cache entry: {}", e)))?;
        self.store.put(MEASUREMENT_KEY, &json)
    }

    /// The cached measurement entry regardless of age or location.
    pub fn entry(&mut self) -> Option<CacheEntry<MeasurementSnapshot>> {
        let raw = match self.store.get(MEASUREMENT_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                logging::log_failure(Component::Cache, MEASUREMENT_KEY, "cache read", &e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                let err = AqError::Store(format!("decoding cache entry: {}", e));
                logging::log_failure(Component::Cache, MEASUREMENT_KEY, "cache read", &err);
                None
            }
        }
    }

    /// The snapshot cached for `location` if it is still fresh at `now`.
    pub fn fresh(
        &mut self,
        location: &LocationDescriptor,
        now: DateTime<Utc>,
    ) -> Option<MeasurementSnapshot> {
        let ttl = self.ttl;
        self.entry()
            .filter(|entry| entry.is_for(location) && !entry.is_stale_at(ttl, now))
            .map(|entry| entry.payload)
    }

    /// The snapshot cached for `location` at any age, for use as fallback
    /// data.
    pub fn fallback(&mut self, location: &LocationDescriptor) -> Option<MeasurementSnapshot> {
        self.entry()
            .filter(|entry| entry.is_for(location))
            .map(|entry| entry.payload)
    }

    // -----------------------------------------------------------------------
    // Selected location
    // -----------------------------------------------------------------------

    /// Persists the selected location, replacing any previous one.
    pub fn save_location(&mut self, descriptor: &LocationDescriptor) -> Result<(), AqError> {
        let json = serde_json::to_string(descriptor)
            .map_err(|e| AqError::Store(format!("serializing location: {}", e)))?;
        self.store.put(LOCATION_KEY, &json)
    }

    /// The persisted location, or `None` if never saved or unreadable.
    pub fn load_location(&mut self) -> Option<LocationDescriptor> {
        let raw = match self.store.get(LOCATION_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                logging::log_failure(Component::Store, LOCATION_KEY, "location read", &e);
                return None;
            }
        };
        serde_json::from_str(&raw).ok()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
