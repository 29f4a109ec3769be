//! Simulation clock - resumable catch-up after idle gaps.
//!
//! The tracking page must show the same position whether the server ticked
//! continuously or was restarted, and whether the client animated every
//! frame or was backgrounded for an hour. `resume` reconstructs the state
//! "as if" the simulation had been running, in one bounded step: elapsed
//! idle time is treated as cruising at the zone's representative average
//! speed, never as a replay of randomized per-tick behavior.

use crate::progress::{ProgressError, TrackingStatus, VehicleState};
use crate::speed::SpeedConfig;
use crate::zone::ZoneClassifier;
use std::time::{Duration, SystemTime};

/// Result of a resume call.
#[derive(Debug, Clone, Copy)]
pub struct ResumeOutcome {
    /// Idle gap that was caught up (zero under clock skew)
    pub elapsed: Duration,

    /// Metres advanced by the catch-up step
    pub advanced_m: f64,

    /// Status after the catch-up
    pub status: TrackingStatus,
}

/// Replays elapsed wall-clock time onto a saved state in one bounded step.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    classifier: ZoneClassifier,
    config: SpeedConfig,
}

impl SimulationClock {
    /// Creates a clock from a zone classifier and speed configuration.
    pub fn new(classifier: ZoneClassifier, config: SpeedConfig) -> Self {
        Self { classifier, config }
    }

    /// Creates a clock with default zones and speeds.
    pub fn with_defaults() -> Self {
        Self::new(ZoneClassifier::with_defaults(), SpeedConfig::default())
    }

    /// The zone classifier shared with the per-tick driver.
    pub fn classifier(&self) -> &ZoneClassifier {
        &self.classifier
    }

    /// The speed configuration shared with the per-tick driver.
    pub fn speed_config(&self) -> &SpeedConfig {
        &self.config
    }

    /// The deterministic average speed for the state's current zone.
    pub fn cruise_speed_kmh(&self, state: &VehicleState) -> f64 {
        let zone = self
            .classifier
            .classify(state.position(), state.progress_ratio());
        self.config.cruise_speed_kmh(zone)
    }

    /// Catches a saved state up to `now`.
    ///
    /// Equivalent (within tolerance) to ticking continuously from
    /// `state.last_updated` to `now`, but costs O(segments) regardless of
    /// the gap length. Clock skew (`now` earlier than the saved timestamp)
    /// clamps elapsed time to zero - state never moves backward.
    /// Idempotent: repeating the call with the same `now` changes nothing.
    pub fn resume(
        &self,
        state: &mut VehicleState,
        now: SystemTime,
    ) -> Result<ResumeOutcome, ProgressError> {
        if !state.is_active() {
            return Ok(ResumeOutcome {
                elapsed: Duration::ZERO,
                advanced_m: 0.0,
                status: TrackingStatus::Arrived,
            });
        }

        let elapsed = match now.duration_since(state.last_updated()) {
            Ok(elapsed) => elapsed,
            // Clock skew: the state never moves backward, and the saved
            // timestamp keeps its lead so a later resume cannot
            // double-count the gap
            Err(_) => {
                return Ok(ResumeOutcome {
                    elapsed: Duration::ZERO,
                    advanced_m: 0.0,
                    status: state.status(),
                });
            }
        };

        let avg_kmh = self.cruise_speed_kmh(state);
        let advanced_m = avg_kmh / 3.6 * elapsed.as_secs_f64();
        let status = state.apply_tick(advanced_m, avg_kmh, now)?;

        Ok(ResumeOutcome {
            elapsed,
            advanced_m,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Route;
    use crate::speed::SpeedModel;
    use crate::zone::Zone;
    use approx::assert_relative_eq;
    use fleetsim_env::{ShipmentId, Waypoint};
    use std::time::UNIX_EPOCH;

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

    /// Pins every speed band to 60 km/h so catch-up math is exact.
    fn flat_60_clock() -> SimulationClock {
        let config = SpeedConfig {
            urban_kmh: (60.0, 60.0),
            highway_kmh: (60.0, 60.0),
            stop_probability: 0.0,
            micro_variation_std: 0.0,
            ..SpeedConfig::default()
        };
        SimulationClock::new(ZoneClassifier::with_defaults(), config)
    }

    fn started_state() -> VehicleState {
        let started = UNIX_EPOCH + Duration::from_secs(1_704_067_200);
        VehicleState::new(ShipmentId::from_seed(9), equator_route(), started)
    }

    #[test]
    fn test_resume_two_hours_at_average_speed() {
        let clock = flat_60_clock();
        let mut state = started_state();
        let now = state.last_updated() + Duration::from_secs(2 * 3600);

        let outcome = clock.resume(&mut state, now).unwrap();

        // 2 h at 60 km/h: 120 km into a ~222 km route
        assert_eq!(outcome.status, TrackingStatus::Active);
        assert_relative_eq!(state.distance_traveled_m(), 120_000.0, max_relative = 0.001);
        assert_eq!(state.segment_index(), 1);
        assert_relative_eq!(state.segment_progress(), 0.08, epsilon = 0.01);
        assert_eq!(state.last_updated(), now);
    }

    #[test]
    fn test_resume_overshoot_arrives_exactly() {
        let clock = flat_60_clock();
        let mut state = started_state();
        let now = state.last_updated() + Duration::from_secs(10 * 3600);

        // 10 h at 60 km/h = 600 km, far beyond the ~222 km total
        let outcome = clock.resume(&mut state, now).unwrap();

        assert_eq!(outcome.status, TrackingStatus::Arrived);
        assert_eq!(state.distance_traveled_m(), state.route().total_m());
        assert_eq!(state.segment_index(), 1);
        assert_eq!(state.segment_progress(), 1.0);
        assert_eq!(state.speed_kmh(), 0.0);
    }

    #[test]
    fn test_resume_idempotent_for_same_now() {
        let clock = flat_60_clock();
        let mut state = started_state();
        let now = state.last_updated() + Duration::from_secs(3600);

        clock.resume(&mut state, now).unwrap();
        let first = state.clone();

        let outcome = clock.resume(&mut state, now).unwrap();

        assert_eq!(state, first);
        assert_eq!(outcome.advanced_m, 0.0);
    }

    #[test]
    fn test_resume_clamps_clock_skew() {
        let clock = flat_60_clock();
        let mut state = started_state();
        let before = state.clone();

        // `now` earlier than the saved timestamp: state must not move back,
        // and the timestamp must keep its lead
        let skewed = state.last_updated() - Duration::from_secs(300);
        let outcome = clock.resume(&mut state, skewed).unwrap();

        assert_eq!(outcome.elapsed, Duration::ZERO);
        assert_eq!(outcome.advanced_m, 0.0);
        assert_eq!(state, before);
    }

    #[test]
    fn test_resume_on_arrived_state_is_untouched() {
        let clock = flat_60_clock();
        let mut state = started_state();
        state.advance(state.route().total_m() + 1.0).unwrap();
        let arrived = state.clone();

        let now = state.last_updated() + Duration::from_secs(86_400);
        let outcome = clock.resume(&mut state, now).unwrap();

        assert_eq!(outcome.status, TrackingStatus::Arrived);
        assert_eq!(state, arrived);
    }

    #[test]
    fn test_ticking_matches_resume_within_tolerance() {
        // Resume equivalence: N one-second ticks must land within 2%
        // progress of a single resume over the same span. The speed band
        // is pinned so the randomized draw equals the cruise speed and
        // only smoothing/boundary effects differ.
        let clock = flat_60_clock();

        let mut ticked = started_state();
        let mut model = SpeedModel::new(clock.speed_config().clone(), 42);
        let elapsed_s = 1800u64;

        let mut now = ticked.last_updated();
        let mut speed = 60.0; // already cruising
        for _ in 0..elapsed_s {
            now += Duration::from_secs(1);
            let zone = clock
                .classifier()
                .classify(ticked.position(), ticked.progress_ratio());
            assert_eq!(zone, Zone::Urban); // early route edge is urban
            let tick = model.tick(speed, zone, false, 1.0);
            ticked.apply_tick(tick.distance_m, tick.speed_kmh, now).unwrap();
            speed = tick.speed_kmh;
        }

        let mut resumed = started_state();
        let target = resumed.last_updated() + Duration::from_secs(elapsed_s);
        clock.resume(&mut resumed, target).unwrap();

        let diff = (ticked.progress_percent() - resumed.progress_percent()).abs();
        assert!(diff < 2.0, "tick vs resume diverged by {diff}%");
    }
}
