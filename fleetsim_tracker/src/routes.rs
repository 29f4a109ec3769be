//! Static route acquisition - the in-repo stand-in for a directions API.
//!
//! Production deployments resolve routes through an external driving
//! directions service; this collaborator serves deterministic road-shaped
//! polylines between a fixed table of cities so demos and tests never
//! touch the network.

use async_trait::async_trait;
use fleetsim_core::geomath;
use fleetsim_core::RouteSource;
use fleetsim_env::{EnvError, Waypoint};

struct City {
    name: &'static str,
    lat: f64,
    lng: f64,
}

const CITIES: &[City] = &[
    City { name: "chicago", lat: 41.8781, lng: -87.6298 },
    City { name: "indianapolis", lat: 39.7684, lng: -86.1581 },
    City { name: "columbus", lat: 39.9612, lng: -82.9988 },
    City { name: "pittsburgh", lat: 40.4406, lng: -79.9959 },
    City { name: "philadelphia", lat: 39.9526, lng: -75.1652 },
    City { name: "new york", lat: 40.7128, lng: -74.0060 },
    City { name: "baltimore", lat: 39.2904, lng: -76.6122 },
    City { name: "washington", lat: 38.9072, lng: -77.0369 },
];

/// Deterministic polyline generator between known city labels.
///
/// The straight line between the endpoints is densified to roughly
/// `spacing_m` between waypoints, with a gentle sinusoidal lateral bow so
/// the result has road-like headings instead of one long segment.
pub struct StaticRouteSource {
    /// Approximate distance between generated waypoints, metres
    spacing_m: f64,

    /// Peak lateral bow as a fraction of the endpoint distance
    curve_ratio: f64,
}

impl StaticRouteSource {
    pub fn new(spacing_m: f64, curve_ratio: f64) -> Self {
        Self {
            spacing_m,
            curve_ratio,
        }
    }

    fn lookup(label: &str) -> Option<&'static City> {
        CITIES.iter().find(|c| c.name.eq_ignore_ascii_case(label))
    }
}

impl Default for StaticRouteSource {
    fn default() -> Self {
        Self::new(20_000.0, 0.03)
    }
}

#[async_trait]
impl RouteSource for StaticRouteSource {
    async fn resolve_route(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<Vec<Waypoint>, EnvError> {
        let from = Self::lookup(origin)
            .ok_or_else(|| EnvError::route(format!("Unknown origin: {}", origin)))?;
        let to = Self::lookup(destination)
            .ok_or_else(|| EnvError::route(format!("Unknown destination: {}", destination)))?;

        let start = Waypoint::new(from.lat, from.lng);
        let end = Waypoint::new(to.lat, to.lng);
        let distance = geomath::distance_m(start, end);
        if distance <= 0.0 {
            return Err(EnvError::route(format!(
                "Degenerate route: {} -> {}",
                origin, destination
            )));
        }

        let segments = ((distance / self.spacing_m).ceil() as usize).clamp(1, 64);
        let d_lat = end.lat - start.lat;
        let d_lng = end.lng - start.lng;

        let mut waypoints = Vec::with_capacity(segments + 1);
        for i in 0..=segments {
            let t = i as f64 / segments as f64;
            // Lateral bow perpendicular to the straight line, zero at both
            // endpoints so the route starts and ends exactly on the cities
            let bow = self.curve_ratio * (t * std::f64::consts::PI).sin();
            waypoints.push(Waypoint::new(
                start.lat + d_lat * t - d_lng * bow,
                start.lng + d_lng * t + d_lat * bow,
            ));
        }
        Ok(waypoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetsim_core::Route;

    #[tokio::test]
    async fn test_resolve_known_lane() {
        let source = StaticRouteSource::default();
        let waypoints = source.resolve_route("chicago", "new york").await.unwrap();

        assert!(waypoints.len() >= 2);
        assert_eq!(waypoints[0], Waypoint::new(41.8781, -87.6298));
        assert_eq!(*waypoints.last().unwrap(), Waypoint::new(40.7128, -74.0060));

        // The polyline must construct into a valid route: no zero-length
        // segments, all coordinates in range
        let route = Route::new(waypoints, 1).unwrap();
        assert!(route.segment_count() > 1);
    }

    #[tokio::test]
    async fn test_resolve_is_case_insensitive() {
        let source = StaticRouteSource::default();
        let waypoints = source.resolve_route("Chicago", "NEW YORK").await.unwrap();
        assert!(waypoints.len() >= 2);
    }

    #[tokio::test]
    async fn test_unknown_label_errors() {
        let source = StaticRouteSource::default();
        let err = source.resolve_route("atlantis", "new york").await.unwrap_err();
        assert!(matches!(err, EnvError::RouteError(_)));
    }

    #[tokio::test]
    async fn test_same_city_is_degenerate() {
        let source = StaticRouteSource::default();
        let err = source.resolve_route("chicago", "chicago").await.unwrap_err();
        assert!(matches!(err, EnvError::RouteError(_)));
    }

    #[tokio::test]
    async fn test_resolution_is_deterministic() {
        let source = StaticRouteSource::default();
        let a = source.resolve_route("pittsburgh", "baltimore").await.unwrap();
        let b = source.resolve_route("pittsburgh", "baltimore").await.unwrap();
        assert_eq!(a, b);
    }
}
