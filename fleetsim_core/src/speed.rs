//! Speed model - zone-aware target speeds with bounded smoothing.
//!
//! Each vehicle owns one `SpeedModel` value carrying its own seeded RNG
//! stream; there is no shared simulator state, so records can be advanced
//! in parallel. The model's working memory (base target, traffic-stop
//! timer) is transient: it is never persisted and never replayed during
//! idle-gap catch-up.

use crate::zone::Zone;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// Tunable parameters for the speed model.
#[derive(Debug, Clone)]
pub struct SpeedConfig {
    /// Urban base speed range in km/h (default 20-50)
    pub urban_kmh: (f64, f64),

    /// Highway base speed range in km/h (default 60-90)
    pub highway_kmh: (f64, f64),

    /// Multiplier applied to the target near a junction (default 0.6)
    pub junction_factor: f64,

    /// Radius around the vehicle within which a junction slows it (metres)
    pub junction_radius_m: f64,

    /// Probability of a traffic stop starting, per tick (default 0.02)
    pub stop_probability: f64,

    /// Traffic stop duration range in seconds (default 5-30)
    pub stop_duration_s: (f64, f64),

    /// Maximum acceleration in km/h per second (default 4.0)
    pub accel_kmh_per_s: f64,

    /// Maximum deceleration in km/h per second (default 8.0 - braking
    /// beats accelerating)
    pub decel_kmh_per_s: f64,

    /// Target floor while moving, km/h; keeps floating point creep from
    /// parking the vehicle mid-route (default 5.0)
    pub min_speed_kmh: f64,

    /// How often the base target is redrawn, seconds (default 20)
    pub retarget_interval_s: f64,

    /// Standard deviation of per-tick micro-variation, km/h (default 1.5)
    pub micro_variation_std: f64,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            urban_kmh: (20.0, 50.0),
            highway_kmh: (60.0, 90.0),
            junction_factor: 0.6,
            junction_radius_m: 120.0,
            stop_probability: 0.02,
            stop_duration_s: (5.0, 30.0),
            accel_kmh_per_s: 4.0,
            decel_kmh_per_s: 8.0,
            min_speed_kmh: 5.0,
            retarget_interval_s: 20.0,
            micro_variation_std: 1.5,
        }
    }
}

impl SpeedConfig {
    /// The base speed range for a zone.
    pub fn range_kmh(&self, zone: Zone) -> (f64, f64) {
        match zone {
            Zone::Urban => self.urban_kmh,
            Zone::Highway => self.highway_kmh,
        }
    }

    /// Midpoint of the zone range: the deterministic average speed used
    /// for idle-gap catch-up (no randomness, no stops).
    pub fn cruise_speed_kmh(&self, zone: Zone) -> f64 {
        let (lo, hi) = self.range_kmh(zone);
        (lo + hi) / 2.0
    }
}

/// One tick's output: the smoothed speed and the distance it covers.
#[derive(Debug, Clone, Copy)]
pub struct SpeedTick {
    pub speed_kmh: f64,
    pub distance_m: f64,
}

/// Per-vehicle speed simulator.
///
/// Constructed once per `VehicleState` with a seed derived from the
/// tracking id, so two records never share a random stream and a seeded
/// simulation replays identically.
#[derive(Debug, Clone)]
pub struct SpeedModel {
    config: SpeedConfig,

    rng: ChaCha8Rng,

    /// Micro-variation sampler; None when the configured std is unusable
    micro: Option<Normal<f64>>,

    /// Current base target, redrawn on the retarget interval
    target_kmh: f64,

    /// Model time at which the base target is redrawn
    retarget_at_s: f64,

    /// Zone the base target was drawn for
    last_zone: Option<Zone>,

    /// Model time at which the active traffic stop lapses
    stop_until_s: Option<f64>,

    /// Accumulated model time in seconds
    clock_s: f64,
}

impl SpeedModel {
    /// Creates a model with the given configuration and RNG seed.
    pub fn new(config: SpeedConfig, seed: u64) -> Self {
        let micro = Normal::new(0.0, config.micro_variation_std.max(0.0)).ok();
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            micro,
            target_kmh: 0.0,
            retarget_at_s: 0.0,
            last_zone: None,
            stop_until_s: None,
            clock_s: 0.0,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &SpeedConfig {
        &self.config
    }

    /// True while a traffic stop is in effect.
    pub fn is_stopped(&self) -> bool {
        self.stop_until_s.is_some()
    }

    /// Advances the model by `dt_s` seconds and returns the new speed plus
    /// the distance covered at that speed.
    ///
    /// Pipeline per spec: redraw base target on the interval (or zone
    /// change), apply the junction slowdown, roll for a traffic stop
    /// (suppressed while one is active), add micro-variation, then move
    /// the actual speed toward the target bounded by accel/decel.
    pub fn tick(&mut self, current_kmh: f64, zone: Zone, near_junction: bool, dt_s: f64) -> SpeedTick {
        let dt = if dt_s.is_finite() && dt_s > 0.0 { dt_s } else { 0.0 };
        self.clock_s += dt;

        // Expire a lapsed traffic stop
        if let Some(until) = self.stop_until_s {
            if self.clock_s >= until {
                self.stop_until_s = None;
            }
        }

        // Redraw the base target on the interval, or when the zone changes
        if self.clock_s >= self.retarget_at_s || self.last_zone != Some(zone) {
            let (lo, hi) = self.config.range_kmh(zone);
            self.target_kmh = self.rng.gen_range(lo..=hi);
            self.retarget_at_s = self.clock_s + self.config.retarget_interval_s;
            self.last_zone = Some(zone);
        }

        // Roll for a new traffic stop; suppressed while one is active
        if self.stop_until_s.is_none() && dt > 0.0 {
            let p = self.config.stop_probability.clamp(0.0, 1.0);
            if p > 0.0 && self.rng.gen_bool(p) {
                let (lo, hi) = self.config.stop_duration_s;
                let duration = self.rng.gen_range(lo..=hi);
                self.stop_until_s = Some(self.clock_s + duration);
            }
        }

        let target = if self.stop_until_s.is_some() {
            0.0
        } else {
            let mut t = self.target_kmh;
            if near_junction {
                t *= self.config.junction_factor;
            }
            if let Some(micro) = &self.micro {
                t += micro.sample(&mut self.rng);
            }
            let (_, hi) = self.config.range_kmh(zone);
            t.clamp(self.config.min_speed_kmh, hi)
        };

        // Bounded smoothing toward the target
        let current = current_kmh.max(0.0);
        let speed = if target >= current {
            (current + self.config.accel_kmh_per_s * dt).min(target)
        } else {
            (current - self.config.decel_kmh_per_s * dt).max(target)
        };
        let speed = speed.max(0.0);

        SpeedTick {
            speed_kmh: speed,
            distance_m: speed / 3.6 * dt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> SpeedConfig {
        // No stops, no micro-variation: smoothing behavior in isolation
        SpeedConfig {
            stop_probability: 0.0,
            micro_variation_std: 0.0,
            ..SpeedConfig::default()
        }
    }

    #[test]
    fn test_speed_model_deterministic_with_seed() {
        let mut a = SpeedModel::new(SpeedConfig::default(), 42);
        let mut b = SpeedModel::new(SpeedConfig::default(), 42);

        let mut speed_a = 0.0;
        let mut speed_b = 0.0;
        for _ in 0..120 {
            let ta = a.tick(speed_a, Zone::Highway, false, 1.0);
            let tb = b.tick(speed_b, Zone::Highway, false, 1.0);
            assert_eq!(ta.speed_kmh, tb.speed_kmh);
            assert_eq!(ta.distance_m, tb.distance_m);
            speed_a = ta.speed_kmh;
            speed_b = tb.speed_kmh;
        }
    }

    #[test]
    fn test_speed_stays_within_zone_ceiling() {
        let mut model = SpeedModel::new(SpeedConfig::default(), 7);
        let (_, highway_max) = model.config().highway_kmh;

        let mut speed = 0.0;
        for _ in 0..600 {
            let tick = model.tick(speed, Zone::Highway, false, 1.0);
            assert!(tick.speed_kmh >= 0.0);
            assert!(tick.speed_kmh <= highway_max + 1e-9);
            speed = tick.speed_kmh;
        }
    }

    #[test]
    fn test_speed_change_bounded_by_accel_and_decel() {
        let config = SpeedConfig::default();
        let max_delta = config.accel_kmh_per_s.max(config.decel_kmh_per_s);
        let mut model = SpeedModel::new(config, 99);

        let mut speed = 0.0;
        for _ in 0..600 {
            let tick = model.tick(speed, Zone::Urban, false, 1.0);
            assert!(
                (tick.speed_kmh - speed).abs() <= max_delta + 1e-9,
                "speed jumped {} -> {}",
                speed,
                tick.speed_kmh
            );
            speed = tick.speed_kmh;
        }
    }

    #[test]
    fn test_accelerates_toward_target_from_standstill() {
        let mut model = SpeedModel::new(quiet_config(), 1);

        let tick = model.tick(0.0, Zone::Highway, false, 1.0);
        // One second of acceleration from 0
        assert_eq!(tick.speed_kmh, model.config().accel_kmh_per_s);
        assert!(tick.distance_m > 0.0);
    }

    #[test]
    fn test_junction_reduces_target() {
        let mut config = quiet_config();
        // Degenerate range pins the base target
        config.highway_kmh = (80.0, 80.0);
        let mut with_junction = SpeedModel::new(config.clone(), 5);
        let mut without = SpeedModel::new(config, 5);

        // Long enough for both to converge on their targets
        let mut sj = 80.0;
        let mut sn = 80.0;
        for _ in 0..30 {
            sj = with_junction.tick(sj, Zone::Highway, true, 1.0).speed_kmh;
            sn = without.tick(sn, Zone::Highway, false, 1.0).speed_kmh;
        }

        assert_eq!(sn, 80.0);
        assert_eq!(sj, 80.0 * 0.6);
    }

    #[test]
    fn test_traffic_stop_forces_speed_to_zero() {
        let config = SpeedConfig {
            stop_probability: 1.0,
            stop_duration_s: (10.0, 10.0),
            micro_variation_std: 0.0,
            ..SpeedConfig::default()
        };
        let mut model = SpeedModel::new(config, 3);

        // First tick triggers the stop; braking at 8 km/h per second
        // brings 40 km/h to a standstill within 5 ticks
        let mut speed = 40.0;
        for _ in 0..6 {
            speed = model.tick(speed, Zone::Urban, false, 1.0).speed_kmh;
        }
        assert_eq!(speed, 0.0);
        assert!(model.is_stopped());
    }

    #[test]
    fn test_stop_rolls_suppressed_while_stopped() {
        let config = SpeedConfig {
            stop_probability: 1.0,
            stop_duration_s: (20.0, 20.0),
            micro_variation_std: 0.0,
            ..SpeedConfig::default()
        };
        let mut model = SpeedModel::new(config, 11);

        let mut speed = 30.0;
        speed = model.tick(speed, Zone::Urban, false, 1.0).speed_kmh;
        assert!(model.is_stopped());

        // While stopped, further rolls must not extend the window: after
        // the 20 s window the stop has lapsed at least for one expiry check
        for _ in 0..19 {
            speed = model.tick(speed, Zone::Urban, false, 1.0).speed_kmh;
        }
        assert_eq!(speed, 0.0);
    }

    #[test]
    fn test_cruise_speed_is_range_midpoint() {
        let config = SpeedConfig::default();
        assert_eq!(config.cruise_speed_kmh(Zone::Urban), 35.0);
        assert_eq!(config.cruise_speed_kmh(Zone::Highway), 75.0);
    }

    #[test]
    fn test_target_floor_keeps_vehicle_moving() {
        let config = SpeedConfig {
            stop_probability: 0.0,
            micro_variation_std: 50.0, // noisy enough to draw negative
            ..SpeedConfig::default()
        };
        let mut model = SpeedModel::new(config, 21);

        let mut speed = 30.0;
        for _ in 0..300 {
            speed = model.tick(speed, Zone::Urban, false, 1.0).speed_kmh;
            assert!(speed > 0.0, "vehicle parked without a traffic stop");
        }
    }
}
