//! FleetSim Tracker - the drivers around the position engine.
//!
//! `fleetsim_core` owns the math; this crate owns the two drivers that
//! consume it and the collaborator implementations behind them:
//! - `TrackingOrchestrator`: the server-side periodic tick loop
//! - `ReplayDriver`: the client-style per-frame animation replay
//! - `VirtualContext`: deterministic virtual clock for simulation/tests
//! - sled and in-memory implementations of the storage seams

pub mod context;
pub mod orchestrator;
pub mod replay;
pub mod routes;
pub mod store;

#[cfg(test)]
mod engine_props;

pub use context::VirtualContext;
pub use orchestrator::{CycleReport, RunSummary, TrackerConfig, TrackingOrchestrator};
pub use replay::ReplayDriver;
pub use routes::StaticRouteSource;
pub use store::{MemoryLedger, MemoryStore, SledLedger, SledTrackingStore};
