//! FleetSim Core - Vehicle Position Simulation Engine
//!
//! This library is the single source of truth for simulated shipment
//! positions. It solves the consistency problem of the tracking page:
//! 1. **Continuous ticking**: zone-aware randomized speeds, bounded
//!    acceleration, probabilistic traffic stops
//! 2. **Resumable replay**: after an arbitrary idle gap (restart, closed
//!    tab, backgrounded app) the same state is reconstructed in one
//!    bounded step, never by replaying every intermediate tick
//!
//! Both the server-side periodic driver and the client-side animation
//! driver consume this engine; only the driver differs, never the math.

pub mod clock;
pub mod collaborators;
pub mod geomath;
pub mod progress;
pub mod query;
pub mod route;
pub mod speed;
pub mod zone;

// Re-export key types for convenience
pub use clock::{ResumeOutcome, SimulationClock};
pub use collaborators::{CompletionEvent, DeliveryLedger, DeliveryStatus, RouteSource, TrackingStore};
pub use progress::{ProgressError, TrackingStatus, VehicleState};
pub use query::TrackingSnapshot;
pub use route::{Route, RouteError};
pub use speed::{SpeedConfig, SpeedModel, SpeedTick};
pub use zone::{Zone, ZoneClassifier, ZoneConfig};
