//! Route progress - the vehicle state machine.
//!
//! `VehicleState` owns its route and its position within it. The canonical
//! position is the pair (segment_index, segment_progress);
//! `distance_traveled_m` and `heading_deg` are recomputed from it after
//! every transition, never independently mutated, so the two forms can
//! never drift apart.

use crate::geomath;
use crate::route::Route;
use fleetsim_env::{ShipmentId, Waypoint};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use thiserror::Error;

/// Lifecycle status of a tracking record.
///
/// `Arrived` is terminal: distance equals the route total, the final
/// segment is fully consumed, and speed is exactly 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingStatus {
    Active,
    Arrived,
}

/// Errors raised when an advance is fed a defective distance delta.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProgressError {
    #[error("Distance delta must be finite and non-negative, got {0}")]
    InvalidDelta(f64),
}

/// Simulated position of one in-transit shipment along its route.
///
/// Single writer at any time: the orchestrator moves the state (and its
/// speed model) into exactly one update per cycle, so no locking is
/// needed around transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    /// Owning shipment (one tracking record per in-transit shipment)
    shipment: ShipmentId,

    /// The route; immutable for this state's lifetime. A re-route
    /// creates a new state with a new route version.
    route: Route,

    /// Segment currently being traversed, 0 <= i < segment_count
    segment_index: usize,

    /// Fraction of the current segment completed, in [0, 1)
    /// (exactly 1.0 only in the terminal Arrived state)
    segment_progress: f64,

    /// Derived: metres traveled from the origin, <= route total
    distance_traveled_m: f64,

    /// Current instantaneous speed, km/h
    speed_kmh: f64,

    /// Derived: direction of travel in [0, 360), 0 = north
    heading_deg: f64,

    /// Wall-clock time the state was last advanced
    last_updated: SystemTime,

    status: TrackingStatus,
}

impl VehicleState {
    /// Creates a fresh state at the route origin.
    pub fn new(shipment: ShipmentId, route: Route, started_at: SystemTime) -> Self {
        let heading_deg = geomath::bearing_deg(route.waypoint(0), route.waypoint(1));
        Self {
            shipment,
            route,
            segment_index: 0,
            segment_progress: 0.0,
            distance_traveled_m: 0.0,
            speed_kmh: 0.0,
            heading_deg,
            last_updated: started_at,
            status: TrackingStatus::Active,
        }
    }

    /// Consumes a non-negative distance delta, crossing segment boundaries
    /// as needed and detecting final arrival.
    ///
    /// Bounded by the segment count per call, never by elapsed time: a
    /// single large catch-up delta costs O(segments). A delta that would
    /// cross all remaining segments clamps to the final waypoint and
    /// transitions to `Arrived`. Once arrived, this is a no-op.
    pub fn advance(&mut self, distance_delta_m: f64) -> Result<TrackingStatus, ProgressError> {
        if !distance_delta_m.is_finite() || distance_delta_m < 0.0 {
            return Err(ProgressError::InvalidDelta(distance_delta_m));
        }
        if self.status == TrackingStatus::Arrived || distance_delta_m == 0.0 {
            return Ok(self.status);
        }

        let mut remaining = distance_delta_m;
        loop {
            let seg_len = self.route.segment_length(self.segment_index);
            let left_in_segment = seg_len * (1.0 - self.segment_progress);
            if remaining < left_in_segment {
                self.segment_progress += remaining / seg_len;
                break;
            }
            remaining -= left_in_segment;
            if self.segment_index + 1 < self.route.segment_count() {
                self.segment_index += 1;
                self.segment_progress = 0.0;
            } else {
                self.arrive();
                return Ok(TrackingStatus::Arrived);
            }
        }

        self.sync_derived();
        Ok(TrackingStatus::Active)
    }

    /// One driver tick: advance by the covered distance, then record the
    /// new speed and timestamp. Once arrived, a no-op (the terminal state
    /// stays byte-for-byte stable under repeated ticks).
    pub fn apply_tick(
        &mut self,
        distance_delta_m: f64,
        speed_kmh: f64,
        now: SystemTime,
    ) -> Result<TrackingStatus, ProgressError> {
        if self.status == TrackingStatus::Arrived {
            return Ok(TrackingStatus::Arrived);
        }
        let status = self.advance(distance_delta_m)?;
        if status == TrackingStatus::Active {
            self.speed_kmh = speed_kmh.max(0.0);
        }
        self.last_updated = now;
        Ok(status)
    }

    /// Clamp to the terminal state at the final waypoint.
    fn arrive(&mut self) {
        self.segment_index = self.route.segment_count() - 1;
        self.segment_progress = 1.0;
        self.distance_traveled_m = self.route.total_m();
        self.speed_kmh = 0.0;
        self.heading_deg = geomath::bearing_deg(
            self.route.waypoint(self.segment_index),
            self.route.waypoint(self.segment_index + 1),
        );
        self.status = TrackingStatus::Arrived;
    }

    /// Recomputes the derived fields from the canonical position pair.
    fn sync_derived(&mut self) {
        let seg_len = self.route.segment_length(self.segment_index);
        self.distance_traveled_m = (self.route.cumulative_m(self.segment_index)
            + self.segment_progress * seg_len)
            .min(self.route.total_m());
        self.heading_deg = geomath::bearing_deg(
            self.route.waypoint(self.segment_index),
            self.route.waypoint(self.segment_index + 1),
        );
    }

    /// Interpolated current position on the route.
    pub fn position(&self) -> Waypoint {
        geomath::interpolate(
            self.route.waypoint(self.segment_index),
            self.route.waypoint(self.segment_index + 1),
            self.segment_progress,
        )
    }

    /// Journey completion in [0, 1].
    pub fn progress_ratio(&self) -> f64 {
        (self.distance_traveled_m / self.route.total_m()).clamp(0.0, 1.0)
    }

    /// Journey completion in [0, 100].
    pub fn progress_percent(&self) -> f64 {
        self.progress_ratio() * 100.0
    }

    /// Metres left to the destination.
    pub fn remaining_m(&self) -> f64 {
        (self.route.total_m() - self.distance_traveled_m).max(0.0)
    }

    /// Waypoints already passed, ending with the interpolated current point.
    pub fn completed_path(&self) -> Vec<Waypoint> {
        let mut path: Vec<Waypoint> = self.route.waypoints()[..=self.segment_index].to_vec();
        path.push(self.position());
        path
    }

    /// The interpolated current point, then the waypoints still ahead.
    pub fn remaining_path(&self) -> Vec<Waypoint> {
        let mut path = vec![self.position()];
        path.extend_from_slice(&self.route.waypoints()[self.segment_index + 1..]);
        path
    }

    pub fn shipment(&self) -> ShipmentId {
        self.shipment
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn segment_index(&self) -> usize {
        self.segment_index
    }

    pub fn segment_progress(&self) -> f64 {
        self.segment_progress
    }

    pub fn distance_traveled_m(&self) -> f64 {
        self.distance_traveled_m
    }

    pub fn speed_kmh(&self) -> f64 {
        self.speed_kmh
    }

    pub fn heading_deg(&self) -> f64 {
        self.heading_deg
    }

    pub fn last_updated(&self) -> SystemTime {
        self.last_updated
    }

    pub fn status(&self) -> TrackingStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == TrackingStatus::Active
    }
}
