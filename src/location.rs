/// Location selection and fetch-target resolution.
///
/// A `LocationDescriptor` says *what* the user picked; `resolve_fetch_target`
/// turns it into the provider request (`FetchTarget`) without touching the
/// network. Coordinates are validated here, so an invalid pair is rejected
/// before any fetch is attempted.
///
/// The active selection lives in an explicit `SelectionContext` rather than
/// in global state. Each selection bumps a generation counter; fetches are
/// tagged with the generation they were issued for so late results from a
/// superseded selection can be recognised and dropped.

use serde::{Deserialize, Serialize};

use crate::model::{AqError, Coordinates};

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// What kind of location the user selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LocationKind {
    /// Use the caller's ambient position (provider geolocates the request).
    Ambient,
    /// A specific monitoring station by provider id.
    Station { station_id: String },
    /// An explicit coordinate pair.
    Coordinates { lat: f64, lng: f64 },
}

/// The currently selected location. Persisted and replaced wholesale on
/// every selection, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationDescriptor {
    #[serde(flatten)]
    pub kind: LocationKind,
    pub display_name: String,
    #[serde(default)]
    pub details: Option<String>,
}

impl LocationDescriptor {
    pub fn ambient() -> Self {
        LocationDescriptor {
            kind: LocationKind::Ambient,
            display_name: "Current Location".to_string(),
            details: None,
        }
    }

    pub fn station(station_id: &str, display_name: &str) -> Self {
        LocationDescriptor {
            kind: LocationKind::Station {
                station_id: station_id.to_string(),
            },
            display_name: display_name.to_string(),
            details: None,
        }
    }

    pub fn coordinates(lat: f64, lng: f64, display_name: &str) -> Self {
        LocationDescriptor {
            kind: LocationKind::Coordinates { lat, lng },
            display_name: display_name.to_string(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: &str) -> Self {
        self.details = Some(details.to_string());
        self
    }
}

impl Default for LocationDescriptor {
    fn default() -> Self {
        LocationDescriptor::ambient()
    }
}

// ---------------------------------------------------------------------------
// Fetch target resolution
// ---------------------------------------------------------------------------

/// Provider request derived from a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchTarget {
    /// Query by the caller's current position.
    Here,
    /// Query by station id.
    Station(String),
    /// Query by validated lat/lng pair.
    Geo(Coordinates),
}

/// Checks lat ∈ [-90, 90] and lng ∈ [-180, 180]. NaN is rejected.
pub fn validate_coordinates(lat: f64, lng: f64) -> Result<Coordinates, AqError> {
    if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) {
        Ok(Coordinates { lat, lng })
    } else {
        Err(AqError::InvalidCoordinates { lat, lng })
    }
}

/// Maps a descriptor to its provider request. Pure: performs no I/O.
pub fn resolve_fetch_target(descriptor: &LocationDescriptor) -> Result<FetchTarget, AqError> {
    match &descriptor.kind {
        LocationKind::Ambient => Ok(FetchTarget::Here),
        LocationKind::Station { station_id } => Ok(FetchTarget::Station(station_id.clone())),
        LocationKind::Coordinates { lat, lng } => {
            validate_coordinates(*lat, *lng).map(FetchTarget::Geo)
        }
    }
}

// ---------------------------------------------------------------------------
// Selection context
// ---------------------------------------------------------------------------

/// The single active selection plus its generation counter.
#[derive(Debug, Clone, Default)]
pub struct SelectionContext {
    descriptor: LocationDescriptor,
    generation: u64,
}

impl SelectionContext {
    pub fn new(descriptor: LocationDescriptor) -> Self {
        SelectionContext {
            descriptor,
            generation: 0,
        }
    }

    pub fn descriptor(&self) -> &LocationDescriptor {
        &self.descriptor
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replaces the active descriptor and returns the new generation.
    pub fn select(&mut self, descriptor: LocationDescriptor) -> u64 {
        self.descriptor = descriptor;
        self.generation += 1;
        self.generation
    }

    /// True if `generation` still identifies the active selection.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

/// Location metadata handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationDisplay {
    pub name: String,
    pub details: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl LocationDisplay {
    /// Prefers the provider's location name and coordinates; falls back to
    /// the descriptor for anything the snapshot lacks.
    pub fn new(
        descriptor: &LocationDescriptor,
        snapshot_name: &str,
        snapshot_coordinates: Option<Coordinates>,
    ) -> Self {
        let name = if snapshot_name.trim().is_empty() {
            descriptor.display_name.clone()
        } else {
            snapshot_name.to_string()
        };
        let coordinates = snapshot_coordinates.or(match descriptor.kind {
            LocationKind::Coordinates { lat, lng } => Some(Coordinates { lat, lng }),
            _ => None,
        });
        LocationDisplay {
            name,
            details: descriptor.details.clone(),
            coordinates,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_kind_resolves_to_matching_target() {
        assert_eq!(
            resolve_fetch_target(&LocationDescriptor::ambient()),
            Ok(FetchTarget::Here)
        );
        assert_eq!(
            resolve_fetch_target(&LocationDescriptor::station("1437", "Beijing")),
            Ok(FetchTarget::Station("1437".to_string()))
        );
        assert_eq!(
            resolve_fetch_target(&LocationDescriptor::coordinates(40.69, -89.59, "Peoria")),
            Ok(FetchTarget::Geo(Coordinates { lat: 40.69, lng: -89.59 }))
        );
    }

    #[test]
    fn test_out_of_range_coordinates_are_rejected() {
        for (lat, lng) in [(91.0, 0.0), (0.0, 200.0), (-90.5, 10.0), (f64::NAN, 0.0)] {
            let result = resolve_fetch_target(&LocationDescriptor::coordinates(lat, lng, "bad"));
            assert!(
                matches!(result, Err(AqError::InvalidCoordinates { .. })),
                "({}, {}) should be rejected, got {:?}",
                lat,
                lng,
                result
            );
        }
    }

    #[test]
    fn test_coordinate_bounds_are_inclusive() {
        assert!(validate_coordinates(90.0, 180.0).is_ok());
        assert!(validate_coordinates(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_descriptor_serializes_with_kind_tag() {
        let d = LocationDescriptor::station("@5724", "London").with_details("Marylebone Road");
        let json = serde_json::to_value(&d).expect("serializable");
        assert_eq!(json["kind"], "station");
        assert_eq!(json["station_id"], "@5724");
        assert_eq!(json["details"], "Marylebone Road");

        let back: LocationDescriptor = serde_json::from_value(json).expect("deserializable");
        assert_eq!(back, d);
    }

    #[test]
    fn test_select_bumps_generation_and_replaces_descriptor() {
        let mut ctx = SelectionContext::default();
        let first = ctx.generation();
        let next = ctx.select(LocationDescriptor::station("1437", "Beijing"));
        assert_eq!(next, first + 1);
        assert!(!ctx.is_current(first));
        assert!(ctx.is_current(next));
        assert_eq!(ctx.descriptor().display_name, "Beijing");
    }

    #[test]
    fn test_display_falls_back_to_descriptor() {
        let d = LocationDescriptor::coordinates(51.5, -0.12, "London");
        let display = LocationDisplay::new(&d, "", None);
        assert_eq!(display.name, "London");
        assert_eq!(display.coordinates, Some(Coordinates { lat: 51.5, lng: -0.12 }));

        let display = LocationDisplay::new(&d, "London Bloomsbury", None);
        assert_eq!(display.name, "London Bloomsbury");
    }
}
