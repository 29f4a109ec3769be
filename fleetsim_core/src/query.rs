//! Query interface - the read model consumed by tracking UIs.

use crate::clock::SimulationClock;
use crate::progress::VehicleState;
use fleetsim_env::Waypoint;
use serde::Serialize;

/// Everything a tracking page needs to render one shipment.
///
/// `completed_path` ends at the interpolated current point and
/// `remaining_path` starts there, so the two polylines always join
/// exactly at the marker.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingSnapshot {
    pub current_position: Waypoint,
    pub progress_percent: f64,
    pub speed_kmh: f64,
    pub heading_deg: f64,
    pub completed_path: Vec<Waypoint>,
    pub remaining_path: Vec<Waypoint>,
    pub is_active: bool,

    /// Remaining time at the zone cruise speed; None once arrived
    pub eta_seconds: Option<f64>,
}

impl TrackingSnapshot {
    /// Captures the read model from a state.
    pub fn capture(state: &VehicleState, clock: &SimulationClock) -> Self {
        let eta_seconds = if state.is_active() {
            let cruise_kmh = clock.cruise_speed_kmh(state);
            Some(state.remaining_m() / (cruise_kmh / 3.6))
        } else {
            None
        };

        Self {
            current_position: state.position(),
            progress_percent: state.progress_percent(),
            speed_kmh: state.speed_kmh(),
            heading_deg: state.heading_deg(),
            completed_path: state.completed_path(),
            remaining_path: state.remaining_path(),
            is_active: state.is_active(),
            eta_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Route;
    use fleetsim_env::ShipmentId;
    use std::time::UNIX_EPOCH;

    fn snapshot_at(progress_m: f64) -> TrackingSnapshot {
        let route = Route::new(
            vec![
                Waypoint::new(0.0, 0.0),
                Waypoint::new(0.0, 1.0),
                Waypoint::new(0.0, 2.0),
            ],
            1,
        )
        .unwrap();
        let mut state = VehicleState::new(ShipmentId::from_seed(4), route, UNIX_EPOCH);
        state.advance(progress_m).unwrap();
        TrackingSnapshot::capture(&state, &SimulationClock::with_defaults())
    }

    #[test]
    fn test_snapshot_paths_join_at_marker() {
        let snap = snapshot_at(150_000.0);

        assert!(snap.is_active);
        assert_eq!(*snap.completed_path.last().unwrap(), snap.current_position);
        assert_eq!(snap.remaining_path[0], snap.current_position);
        assert!(snap.progress_percent > 50.0 && snap.progress_percent < 100.0);
        assert!(snap.eta_seconds.unwrap() > 0.0);
    }

    #[test]
    fn test_snapshot_after_arrival() {
        let snap = snapshot_at(1_000_000.0);

        assert!(!snap.is_active);
        assert_eq!(snap.progress_percent, 100.0);
        assert_eq!(snap.speed_kmh, 0.0);
        assert_eq!(snap.eta_seconds, None);
        // Nothing left ahead: every remaining point is the destination
        assert!(snap
            .remaining_path
            .iter()
            .all(|p| *p == snap.current_position));
    }

    #[test]
    fn test_snapshot_serializes_to_json() {
        let snap = snapshot_at(10_000.0);
        let json = serde_json::to_string(&snap).unwrap();

        assert!(json.contains("progress_percent"));
        assert!(json.contains("current_position"));
    }
}
