//! Client-style replay driver - smooth animation between server reads.
//!
//! The tracking page animates the marker between server-confirmed
//! positions by running the very same engine locally, frame by frame. The
//! local copy is never authoritative: every fresh server read replaces it
//! (`resync`), and regaining foreground visibility after a suspension
//! catches up through `SimulationClock::resume`, never by naively
//! continuing from the stale frame clock.

use fleetsim_core::{
    ProgressError, ResumeOutcome, SimulationClock, SpeedModel, TrackingSnapshot, VehicleState,
};
use std::time::{Duration, SystemTime};

/// Per-frame animation driver over a non-authoritative state copy.
pub struct ReplayDriver {
    state: VehicleState,
    model: SpeedModel,
    clock: SimulationClock,

    /// Local animation clock, anchored to the server state's timestamp
    frame_now: SystemTime,
}

impl ReplayDriver {
    /// Starts animating from a server-confirmed state.
    pub fn new(server_state: VehicleState, clock: SimulationClock, seed: u64) -> Self {
        let model = SpeedModel::new(clock.speed_config().clone(), seed);
        let frame_now = server_state.last_updated();
        Self {
            state: server_state,
            model,
            clock,
            frame_now,
        }
    }

    /// Advances the local copy by one animation frame.
    pub fn frame(&mut self, dt: Duration) -> Result<&VehicleState, ProgressError> {
        let now = self.frame_now + dt;
        if self.state.is_active() {
            let position = self.state.position();
            let zone = self
                .clock
                .classifier()
                .classify(position, self.state.progress_ratio());
            let near_junction = self.clock.classifier().near_junction(
                self.state.route(),
                self.state.segment_index(),
                position,
                self.model.config().junction_radius_m,
            );
            let tick = self
                .model
                .tick(self.state.speed_kmh(), zone, near_junction, dt.as_secs_f64());
            self.state.apply_tick(tick.distance_m, tick.speed_kmh, now)?;
        }
        self.frame_now = now;
        Ok(&self.state)
    }

    /// Adopts a fresh authoritative read from the server.
    pub fn resync(&mut self, server_state: VehicleState) {
        self.frame_now = server_state.last_updated();
        self.state = server_state;
    }

    /// Foreground-visibility catch-up after the process was suspended.
    pub fn wake(&mut self, now: SystemTime) -> Result<ResumeOutcome, ProgressError> {
        let outcome = self.clock.resume(&mut self.state, now)?;
        self.frame_now = self.state.last_updated();
        Ok(outcome)
    }

    /// The current (non-authoritative) state.
    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    /// Read model for rendering.
    pub fn snapshot(&self) -> TrackingSnapshot {
        TrackingSnapshot::capture(&self.state, &self.clock)
    }
}
