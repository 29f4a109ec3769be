//! Property checks over the engine contract.
//!
//! Generated advance sequences and speed histories exercise the
//! monotonicity and bounds guarantees the drivers depend on.

use fleetsim_core::{Route, SpeedConfig, SpeedModel, VehicleState, Zone};
use fleetsim_env::{ShipmentId, Waypoint};
use proptest::prelude::*;
use std::time::UNIX_EPOCH;

fn test_route() -> Route {
    Route::new(
        vec![
            Waypoint::new(0.0, 0.0),
            Waypoint::new(0.0, 0.4),
            Waypoint::new(0.3, 0.4),
            Waypoint::new(0.3, 0.8),
        ],
        1,
    )
    .unwrap()
}

proptest! {
    /// Any sequence of non-negative deltas moves distance monotonically
    /// up to (and never past) the route total, keeping the segment pair
    /// and the traveled distance consistent.
    #[test]
    fn prop_distance_monotone_and_consistent(
        deltas in prop::collection::vec(0.0f64..30_000.0, 1..120)
    ) {
        let route = test_route();
        let total = route.total_m();
        let mut state = VehicleState::new(ShipmentId::from_seed(1), route, UNIX_EPOCH);

        let mut previous = 0.0;
        for delta in deltas {
            state.advance(delta).unwrap();

            prop_assert!(state.distance_traveled_m() >= previous);
            prop_assert!(state.distance_traveled_m() <= total);

            if state.is_active() {
                let i = state.segment_index();
                prop_assert!(state.route().cumulative_m(i) <= state.distance_traveled_m());
                prop_assert!(state.distance_traveled_m() < state.route().cumulative_m(i + 1));
                prop_assert!((0.0..1.0).contains(&state.segment_progress()));
            } else {
                prop_assert_eq!(state.distance_traveled_m(), total);
                prop_assert_eq!(state.segment_progress(), 1.0);
                prop_assert_eq!(state.speed_kmh(), 0.0);
            }
            previous = state.distance_traveled_m();
        }
    }

    /// Speed stays inside [0, highway max] and never changes faster than
    /// the configured acceleration/deceleration bounds, whatever zone and
    /// junction inputs the drivers feed it.
    #[test]
    fn prop_speed_bounded_and_rate_limited(
        seed in any::<u64>(),
        inputs in prop::collection::vec((prop::bool::ANY, prop::bool::ANY), 1..200)
    ) {
        let config = SpeedConfig::default();
        let (_, highway_max) = config.highway_kmh;
        let max_delta = config.accel_kmh_per_s.max(config.decel_kmh_per_s);
        let mut model = SpeedModel::new(config, seed);

        let mut speed = 0.0;
        for (urban, near_junction) in inputs {
            let zone = if urban { Zone::Urban } else { Zone::Highway };
            let tick = model.tick(speed, zone, near_junction, 1.0);

            prop_assert!(tick.speed_kmh >= 0.0);
            prop_assert!(tick.speed_kmh <= highway_max + 1e-9);
            prop_assert!((tick.speed_kmh - speed).abs() <= max_delta + 1e-9);
            prop_assert!(tick.distance_m >= 0.0);

            speed = tick.speed_kmh;
        }
    }
}
