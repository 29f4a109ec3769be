//! Virtual context implementing TrackerContext for deterministic runs.

use async_trait::async_trait;
use fleetsim_env::TrackerContext;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Simulation context backed by a manually advanced virtual clock.
///
/// This implements `TrackerContext` using:
/// - A virtual clock advanced by `sleep` (or explicitly via `advance_time`)
/// - Seed-derived randomness, so a run replays identically from its seed
///
/// Used by the CLI's fast-forward mode and by the orchestrator tests:
/// hours of simulated journey complete in milliseconds of wall time.
pub struct VirtualContext {
    /// Master seed for this simulation
    seed: u64,

    /// Current virtual time (nanoseconds since simulation start)
    virtual_time_ns: Arc<Mutex<u64>>,

    /// Epoch offset (virtual time 0 maps to this wall-clock time)
    epoch: SystemTime,
}

impl VirtualContext {
    /// Creates a new VirtualContext with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            virtual_time_ns: Arc::new(Mutex::new(0)),
            epoch: UNIX_EPOCH + Duration::from_secs(1_704_067_200), // 2024-01-01 00:00:00 UTC
        }
    }

    /// Creates an Arc-wrapped context for sharing.
    pub fn shared(seed: u64) -> Arc<Self> {
        Arc::new(Self::new(seed))
    }

    /// Advances virtual time by the given duration.
    pub fn advance_time(&self, duration: Duration) {
        let mut time = self.virtual_time_ns.lock().unwrap();
        *time += duration.as_nanos() as u64;
    }

    /// Sets the virtual time to a specific value.
    pub fn set_time(&self, time_ns: u64) {
        let mut time = self.virtual_time_ns.lock().unwrap();
        *time = time_ns;
    }
}

impl Clone for VirtualContext {
    fn clone(&self) -> Self {
        Self {
            seed: self.seed,
            virtual_time_ns: Arc::clone(&self.virtual_time_ns),
            epoch: self.epoch,
        }
    }
}

#[async_trait]
impl TrackerContext for VirtualContext {
    fn now(&self) -> Duration {
        Duration::from_nanos(*self.virtual_time_ns.lock().unwrap())
    }

    fn system_time(&self) -> SystemTime {
        self.epoch + self.now()
    }

    async fn sleep(&self, duration: Duration) {
        // In simulation, sleep advances virtual time instantly
        self.advance_time(duration);
    }

    fn spawn<F>(&self, name: &str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let _name = name.to_string();
        tokio::spawn(async move {
            future.await;
        });
    }

    fn derive_sim_seed(&self, seed_extension: u64) -> u64 {
        // Combine master seed with extension for a per-record stream
        self.seed.wrapping_mul(0x517cc1b727220a95) ^ seed_extension
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}
