//! Great-circle geometry primitives.
//!
//! Pure functions over [`Waypoint`]s: distance, interpolation, bearing.
//! All inputs are finite and in-range by contract of the caller (route
//! construction validates before any of these run).

use fleetsim_env::Waypoint;
use geo::{HaversineBearing, HaversineDistance, Point};

/// Great-circle (haversine) distance between two waypoints, in metres.
///
/// Symmetric and hemisphere-safe: `distance_m(a, b) == distance_m(b, a)`
/// regardless of coordinate signs.
pub fn distance_m(a: Waypoint, b: Waypoint) -> f64 {
    Point::new(a.lng, a.lat).haversine_distance(&Point::new(b.lng, b.lat))
}

/// Linear interpolation between two waypoints in lat/lng space.
///
/// `t` is clamped to [0, 1]. Road-following polylines have short segments
/// by construction, so the flat-space approximation holds.
pub fn interpolate(a: Waypoint, b: Waypoint, t: f64) -> Waypoint {
    let t = t.clamp(0.0, 1.0);
    Waypoint {
        lat: a.lat + (b.lat - a.lat) * t,
        lng: a.lng + (b.lng - a.lng) * t,
    }
}

/// Initial bearing from `a` to `b` in degrees, [0, 360), 0 = north.
pub fn bearing_deg(a: Waypoint, b: Waypoint) -> f64 {
    let bearing = Point::new(a.lng, a.lat).haversine_bearing(Point::new(b.lng, b.lat));
    bearing.rem_euclid(360.0)
}
