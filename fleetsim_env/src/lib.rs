//! FleetSim Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction allowing the FleetSim
//! engines to run in both **Production** (tokio) and **Simulation**
//! (virtual clock) environments.
//!
//! # Core Concept
//!
//! The position simulator must produce a consistent answer whether it is
//! ticked continuously or reconstructed after an arbitrary idle gap. To
//! test that property, all sources of non-determinism are intercepted:
//! - Time (`now()`, `system_time()`, `sleep()`)
//! - Randomness (`derive_sim_seed()`)
//!
//! By deriving all entropy from a single 64-bit seed, any simulated journey
//! becomes reproducible via its seed number.
//!
//! # Example
//!
//! ```ignore
//! use fleetsim_env::TrackerContext;
//! use std::time::Duration;
//!
//! async fn tick_loop<Ctx: TrackerContext>(ctx: &Ctx) {
//!     loop {
//!         advance_active_records(ctx.system_time());
//!         ctx.sleep(Duration::from_secs(1)).await;
//!     }
//! }
//! ```

mod context;
mod error;
mod tokio_impl;
mod types;

pub use context::TrackerContext;
pub use error::EnvError;
pub use tokio_impl::TokioContext;
pub use types::{ShipmentId, TrackingId, Waypoint};
