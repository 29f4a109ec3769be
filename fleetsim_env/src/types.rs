//! Common types for the FleetSim environment abstraction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a tracking record.
///
/// Uses UUID v4 for global uniqueness without coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackingId(pub Uuid);

impl TrackingId {
    /// Creates a new random TrackingId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a TrackingId from a UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Creates a deterministic TrackingId from a seed (for simulation).
    pub fn from_seed(seed: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&seed.to_le_bytes());
        bytes[8..16].copy_from_slice(&seed.wrapping_mul(0x517cc1b727220a95).to_le_bytes());
        Self(Uuid::from_bytes(bytes))
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Folds the id into a 64-bit seed extension for per-record RNG streams.
    pub fn seed_extension(&self) -> u64 {
        let bytes = self.0.into_bytes();
        let mut lo = [0u8; 8];
        let mut hi = [0u8; 8];
        lo.copy_from_slice(&bytes[0..8]);
        hi.copy_from_slice(&bytes[8..16]);
        u64::from_le_bytes(lo) ^ u64::from_le_bytes(hi)
    }
}

impl Default for TrackingId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TrackingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Show first 8 chars for readability
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Unique identifier for the shipment that owns a tracking record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShipmentId(pub Uuid);

impl ShipmentId {
    /// Creates a new random ShipmentId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a deterministic ShipmentId from a seed (for simulation).
    pub fn from_seed(seed: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&seed.to_le_bytes());
        bytes[8..16].copy_from_slice(&seed.wrapping_mul(0x9e3779b97f4a7c15).to_le_bytes());
        Self(Uuid::from_bytes(bytes))
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ShipmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ShipmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// A single point on a route, in signed decimal degrees (WGS84).
///
/// This is the wire-level primitive shared by the engine, the route
/// acquisition collaborator, and the storage layer. Immutable once part
/// of a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Latitude, degrees in [-90, 90]
    pub lat: f64,

    /// Longitude, degrees in [-180, 180]
    pub lng: f64,
}

impl Waypoint {
    /// Creates a new waypoint.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns true if both coordinates are finite and within WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl std::fmt::Display for Waypoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_id_from_seed_deterministic() {
        let a = TrackingId::from_seed(7);
        let b = TrackingId::from_seed(7);
        let c = TrackingId::from_seed(8);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.seed_extension(), b.seed_extension());
    }

    #[test]
    fn test_waypoint_validation() {
        assert!(Waypoint::new(52.52, 13.405).is_valid());
        assert!(Waypoint::new(-90.0, 180.0).is_valid());
        assert!(!Waypoint::new(f64::NAN, 0.0).is_valid());
        assert!(!Waypoint::new(91.0, 0.0).is_valid());
        assert!(!Waypoint::new(0.0, -180.5).is_valid());
    }
}
