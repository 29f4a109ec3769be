//! Zone classification - urban vs. highway context, junction detection.
//!
//! The speed model needs two context signals: which speed band applies at
//! the vehicle's position, and whether a sharp turn is coming up. Both are
//! pure geometry over the route; no reverse geocoding.

use crate::geomath;
use crate::route::Route;
use fleetsim_env::Waypoint;

/// Speed-band classification for a position on the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Urban,
    Highway,
}

/// Axis-aligned bounding box around a named metro area.
#[derive(Debug, Clone)]
pub struct CityBounds {
    pub name: &'static str,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl CityBounds {
    fn contains(&self, p: Waypoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&p.lat)
            && (self.min_lng..=self.max_lng).contains(&p.lng)
    }
}

/// Configuration for the zone classifier.
#[derive(Debug, Clone)]
pub struct ZoneConfig {
    /// Named city bounding boxes treated as urban
    pub cities: Vec<CityBounds>,

    /// Route fraction near origin/destination treated as urban
    /// regardless of true location ("last mile", default 0.15)
    pub urban_edge_ratio: f64,

    /// Turn angle below which an interior waypoint is a junction
    /// (180 deg = straight through, default 120)
    pub junction_angle_deg: f64,

    /// How many waypoints ahead to scan for junctions (default 5)
    pub junction_lookahead: usize,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            cities: vec![
                CityBounds {
                    name: "Chicago",
                    min_lat: 41.60,
                    max_lat: 42.10,
                    min_lng: -88.00,
                    max_lng: -87.50,
                },
                CityBounds {
                    name: "Indianapolis",
                    min_lat: 39.60,
                    max_lat: 39.95,
                    min_lng: -86.35,
                    max_lng: -85.90,
                },
                CityBounds {
                    name: "Columbus",
                    min_lat: 39.80,
                    max_lat: 40.15,
                    min_lng: -83.20,
                    max_lng: -82.75,
                },
                CityBounds {
                    name: "Pittsburgh",
                    min_lat: 40.30,
                    max_lat: 40.60,
                    min_lng: -80.15,
                    max_lng: -79.80,
                },
                CityBounds {
                    name: "Philadelphia",
                    min_lat: 39.85,
                    max_lat: 40.15,
                    min_lng: -75.35,
                    max_lng: -74.95,
                },
                CityBounds {
                    name: "New York",
                    min_lat: 40.50,
                    max_lat: 40.95,
                    min_lng: -74.30,
                    max_lng: -73.70,
                },
                CityBounds {
                    name: "Washington",
                    min_lat: 38.75,
                    max_lat: 39.00,
                    min_lng: -77.15,
                    max_lng: -76.90,
                },
            ],
            urban_edge_ratio: 0.15,
            junction_angle_deg: 120.0,
            junction_lookahead: 5,
        }
    }
}

/// Classifies positions into speed zones and detects upcoming junctions.
#[derive(Debug, Clone)]
pub struct ZoneClassifier {
    config: ZoneConfig,
}

impl ZoneClassifier {
    /// Creates a classifier with the given configuration.
    pub fn new(config: ZoneConfig) -> Self {
        Self { config }
    }

    /// Creates a classifier with the default city list.
    pub fn with_defaults() -> Self {
        Self::new(ZoneConfig::default())
    }

    /// Classifies a position given its overall route progress in [0, 1].
    ///
    /// Urban if the point falls inside any configured city box, or within
    /// the first/last `urban_edge_ratio` of the route (start and end of any
    /// journey behave like city driving without needing geocoding).
    pub fn classify(&self, p: Waypoint, progress_ratio: f64) -> Zone {
        let edge = self.config.urban_edge_ratio;
        if progress_ratio < edge || progress_ratio > 1.0 - edge {
            return Zone::Urban;
        }
        if self.config.cities.iter().any(|city| city.contains(p)) {
            return Zone::Urban;
        }
        Zone::Highway
    }

    /// Returns true if a turn sharper than the configured angle lies within
    /// `radius_m` of `p`, scanning up to `junction_lookahead` waypoints
    /// ahead of the current segment.
    ///
    /// Only ever used to *reduce* speed, never to increase it.
    pub fn near_junction(
        &self,
        route: &Route,
        segment_index: usize,
        p: Waypoint,
        radius_m: f64,
    ) -> bool {
        let last = route.waypoints().len() - 1;
        for step in 0..self.config.junction_lookahead {
            let j = segment_index + 1 + step;
            // Interior waypoints only: need a segment on both sides
            if j >= last {
                break;
            }
            let angle = turn_angle_deg(route.waypoint(j - 1), route.waypoint(j), route.waypoint(j + 1));
            if angle < self.config.junction_angle_deg
                && geomath::distance_m(p, route.waypoint(j)) <= radius_m
            {
                return true;
            }
        }
        false
    }

    /// The active configuration.
    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }
}

/// Angle at `b` between the rays b->a and b->c, in degrees.
///
/// 180 = straight through, 0 = full U-turn. Uses a local flat projection
/// (longitude scaled by cos latitude), which is accurate at segment scale.
fn turn_angle_deg(a: Waypoint, b: Waypoint, c: Waypoint) -> f64 {
    let lat_scale = b.lat.to_radians().cos();
    let v1 = (a.lat - b.lat, (a.lng - b.lng) * lat_scale);
    let v2 = (c.lat - b.lat, (c.lng - b.lng) * lat_scale);

    let n1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let n2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();
    if n1 == 0.0 || n2 == 0.0 {
        // Degenerate leg, treat as straight
        return 180.0;
    }

    let cos = ((v1.0 * v2.0 + v1.1 * v2.1) / (n1 * n2)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Route;
    use approx::assert_relative_eq;

    fn bent_route(after_bend: Waypoint) -> Route {
        // Eastward leg, a bend at (0.0, 1.0), then on to `after_bend`
        Route::new(
            vec![Waypoint::new(0.0, 0.0), Waypoint::new(0.0, 1.0), after_bend],
            1,
        )
        .unwrap()
    }

    #[test]
    fn test_turn_angle_straight_line() {
        let angle = turn_angle_deg(
            Waypoint::new(0.0, 0.0),
            Waypoint::new(0.0, 1.0),
            Waypoint::new(0.0, 2.0),
        );
        assert_relative_eq!(angle, 180.0, epsilon = 0.01);
    }

    #[test]
    fn test_turn_angle_right_angle() {
        let angle = turn_angle_deg(
            Waypoint::new(0.0, 0.0),
            Waypoint::new(0.0, 1.0),
            Waypoint::new(1.0, 1.0),
        );
        assert_relative_eq!(angle, 90.0, epsilon = 0.01);
    }

    #[test]
    fn test_classify_route_edges_are_urban() {
        let classifier = ZoneClassifier::with_defaults();
        // Open ocean point, nowhere near any city box
        let p = Waypoint::new(0.0, -30.0);

        assert_eq!(classifier.classify(p, 0.05), Zone::Urban);
        assert_eq!(classifier.classify(p, 0.95), Zone::Urban);
        assert_eq!(classifier.classify(p, 0.5), Zone::Highway);
    }

    #[test]
    fn test_classify_city_box_is_urban_mid_route() {
        let classifier = ZoneClassifier::with_defaults();
        let chicago_loop = Waypoint::new(41.88, -87.63);

        assert_eq!(classifier.classify(chicago_loop, 0.5), Zone::Urban);
    }

    #[test]
    fn test_sharp_bend_within_radius_is_junction() {
        let classifier = ZoneClassifier::with_defaults();
        // 90 degree turn north at (0.0, 1.0)
        let route = bent_route(Waypoint::new(1.0, 1.0));
        let near = Waypoint::new(0.0, 0.999);

        assert!(classifier.near_junction(&route, 0, near, 500.0));
    }

    #[test]
    fn test_sharp_bend_outside_radius_is_not_junction() {
        let classifier = ZoneClassifier::with_defaults();
        let route = bent_route(Waypoint::new(1.0, 1.0));
        let far = Waypoint::new(0.0, 0.5); // ~55 km from the bend

        assert!(!classifier.near_junction(&route, 0, far, 500.0));
    }

    #[test]
    fn test_near_straight_bend_is_never_a_junction() {
        let classifier = ZoneClassifier::with_defaults();
        // Gentle drift onward: the angle at (0,1) is ~174 degrees,
        // well above the 120 degree junction threshold
        let route = bent_route(Waypoint::new(0.1, 2.0));
        let at_bend = Waypoint::new(0.0, 1.0);

        assert!(!classifier.near_junction(&route, 0, at_bend, 10_000.0));
    }

    #[test]
    fn test_single_segment_route_has_no_junctions() {
        let classifier = ZoneClassifier::with_defaults();
        let route = Route::new(vec![Waypoint::new(0.0, 0.0), Waypoint::new(0.0, 1.0)], 1).unwrap();

        assert!(!classifier.near_junction(&route, 0, route.origin(), f64::MAX));
    }
}
