//! Core environment context trait for FleetSim drivers.

use async_trait::async_trait;
use std::future::Future;
use std::time::{Duration, SystemTime};

/// The central interface for environment interaction.
///
/// This trait abstracts the "real world" so that the tracking drivers can
/// run in both production (tokio) and simulation (virtual clock)
/// environments.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time`, OS entropy
/// - **Simulation**: `VirtualContext` (in `fleetsim_tracker`) - manually
///   advanced virtual clock, seed-derived randomness
///
/// # Determinism
///
/// All methods that would normally introduce non-determinism (time,
/// randomness) are controlled by the implementation, so a simulated
/// journey replays identically from the same seed.
#[async_trait]
pub trait TrackerContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// Used for loop deadlines and duration measurements.
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Returns the wall-clock time used to stamp `VehicleState.last_updated`.
    ///
    /// Critical for the resume/catch-up contract: elapsed idle time is
    /// always `system_time() - last_updated`.
    /// In simulation, this is derived from virtual clock + epoch offset.
    fn system_time(&self) -> SystemTime;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances the virtual clock
    async fn sleep(&self, duration: Duration);

    /// Spawns a background task.
    fn spawn<F>(&self, name: &str, future: F)
    where
        F: Future<Output = ()> + Send + 'static;

    /// Derives a deterministic RNG seed from a seed extension.
    ///
    /// Each vehicle's speed model carries its own RNG; the extension is
    /// derived from the tracking id so two records never share a stream.
    /// In production the result is entropy-derived and *not* reproducible.
    fn derive_sim_seed(&self, seed_extension: u64) -> u64;

    /// Returns the context's master seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    /// In simulation, returns the master seed.
    fn seed(&self) -> u64;
}
