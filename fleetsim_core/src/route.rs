//! Route - validated road polyline with cached distance geometry.

use crate::geomath;
use fleetsim_env::Waypoint;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a polyline from the route acquisition collaborator
/// cannot be used as a route.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RouteError {
    #[error("Route needs at least 2 waypoints, got {0}")]
    TooFewWaypoints(usize),

    #[error("Invalid coordinate at waypoint {index}: ({lat}, {lng})")]
    InvalidCoordinate { index: usize, lat: f64, lng: f64 },

    #[error("Zero-length segment at index {0}")]
    ZeroLengthSegment(usize),
}

/// An ordered road-following polyline from origin to destination.
///
/// Invariants, enforced at construction:
/// - at least 2 waypoints
/// - every coordinate finite and within WGS84 bounds
/// - consecutive waypoints distinct (no zero-length segments)
///
/// Segment lengths, cumulative distances, and the total distance are
/// computed once and cached. Immutable for its lifetime: a re-route
/// creates a new `Route` (with a new `version`), never a mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    waypoints: Vec<Waypoint>,

    /// segment_lengths[i] = metres between waypoint i and i+1
    segment_lengths: Vec<f64>,

    /// cumulative_m[i] = metres from origin to waypoint i
    cumulative_m: Vec<f64>,

    total_m: f64,

    /// Route identity for cache keying; a re-route bumps the version.
    version: u64,
}

impl Route {
    /// Validates a polyline and builds the cached distance geometry.
    pub fn new(waypoints: Vec<Waypoint>, version: u64) -> Result<Self, RouteError> {
        if waypoints.len() < 2 {
            return Err(RouteError::TooFewWaypoints(waypoints.len()));
        }
        for (index, wp) in waypoints.iter().enumerate() {
            if !wp.is_valid() {
                return Err(RouteError::InvalidCoordinate {
                    index,
                    lat: wp.lat,
                    lng: wp.lng,
                });
            }
        }

        let mut segment_lengths = Vec::with_capacity(waypoints.len() - 1);
        let mut cumulative_m = Vec::with_capacity(waypoints.len());
        cumulative_m.push(0.0);

        let mut total_m = 0.0;
        for i in 0..waypoints.len() - 1 {
            let length = geomath::distance_m(waypoints[i], waypoints[i + 1]);
            if length <= 0.0 {
                return Err(RouteError::ZeroLengthSegment(i));
            }
            total_m += length;
            segment_lengths.push(length);
            cumulative_m.push(total_m);
        }

        Ok(Self {
            waypoints,
            segment_lengths,
            cumulative_m,
            total_m,
            version,
        })
    }

    /// All waypoints, origin first.
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Waypoint at `index`.
    pub fn waypoint(&self, index: usize) -> Waypoint {
        self.waypoints[index]
    }

    /// Number of segments (waypoints - 1).
    pub fn segment_count(&self) -> usize {
        self.waypoints.len() - 1
    }

    /// Length of segment `index` in metres.
    pub fn segment_length(&self, index: usize) -> f64 {
        self.segment_lengths[index]
    }

    /// Metres from the origin to waypoint `index`.
    pub fn cumulative_m(&self, index: usize) -> f64 {
        self.cumulative_m[index]
    }

    /// Total route length in metres.
    pub fn total_m(&self) -> f64 {
        self.total_m
    }

    /// Route identity for cache keying.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The origin waypoint.
    pub fn origin(&self) -> Waypoint {
        self.waypoints[0]
    }

    /// The destination waypoint.
    pub fn destination(&self) -> Waypoint {
        self.waypoints[self.waypoints.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn equator_route() -> Route {
        Route::new(
            vec![
                Waypoint::new(0.0, 0.0),
                Waypoint::new(0.0, 1.0),
                Waypoint::new(0.0, 2.0),
            ],
            1,
        )
        .unwrap()
    }

    #[test]
    fn test_route_cached_geometry() {
        let route = equator_route();

        assert_eq!(route.segment_count(), 2);
        assert_eq!(route.cumulative_m(0), 0.0);
        assert_relative_eq!(
            route.cumulative_m(1),
            route.segment_length(0),
            epsilon = 1e-9
        );
        assert_relative_eq!(
            route.total_m(),
            route.segment_length(0) + route.segment_length(1),
            epsilon = 1e-9
        );
        // Two one-degree equator segments: ~222 km
        assert_relative_eq!(route.total_m(), 222_390.0, max_relative = 0.01);
    }

    #[test]
    fn test_route_rejects_too_few_waypoints() {
        let err = Route::new(vec![Waypoint::new(0.0, 0.0)], 1).unwrap_err();
        assert_eq!(err, RouteError::TooFewWaypoints(1));
    }

    #[test]
    fn test_route_rejects_invalid_coordinate() {
        let err = Route::new(
            vec![Waypoint::new(0.0, 0.0), Waypoint::new(f64::NAN, 1.0)],
            1,
        )
        .unwrap_err();
        assert!(matches!(err, RouteError::InvalidCoordinate { index: 1, .. }));
    }

    #[test]
    fn test_route_rejects_zero_length_segment() {
        let err = Route::new(
            vec![
                Waypoint::new(0.0, 0.0),
                Waypoint::new(0.0, 0.0),
                Waypoint::new(0.0, 1.0),
            ],
            1,
        )
        .unwrap_err();
        assert_eq!(err, RouteError::ZeroLengthSegment(0));
    }

    #[test]
    fn test_minimal_two_waypoint_route_is_valid() {
        let route = Route::new(vec![Waypoint::new(0.0, 0.0), Waypoint::new(0.0, 0.5)], 3).unwrap();

        assert_eq!(route.segment_count(), 1);
        assert_eq!(route.version(), 3);
        assert!(route.total_m() > 0.0);
    }
}
