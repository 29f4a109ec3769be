//! Collaborator seams - traits for the systems around the engine.
//!
//! Route geometry acquisition, record storage, and delivery notification
//! are external concerns; the engine only speaks to them through these
//! traits so the same orchestrator runs against production backends or
//! in-memory test doubles.

use crate::progress::VehicleState;
use async_trait::async_trait;
use fleetsim_env::{EnvError, ShipmentId, TrackingId, Waypoint};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Resolves an origin/destination pair into a road-following polyline.
///
/// May fail, and may legitimately return a minimal 2-waypoint straight
/// "route" (single segment). Resolution happens once, before a record
/// enters the active set; the per-tick path never touches this trait.
#[async_trait]
pub trait RouteSource: Send + Sync {
    async fn resolve_route(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<Vec<Waypoint>, EnvError>;
}

/// Read/write access to tracking records, keyed by tracking id.
#[async_trait]
pub trait TrackingStore: Send + Sync {
    /// Creates or replaces a record unconditionally.
    async fn insert(&self, id: TrackingId, state: &VehicleState) -> Result<(), EnvError>;

    /// Loads a record, or None if it does not exist (e.g. cancelled).
    async fn load(&self, id: TrackingId) -> Result<Option<VehicleState>, EnvError>;

    /// Conditional write: lands only if the stored record still exists and
    /// is still ACTIVE. Returns whether the write happened.
    ///
    /// This is the cancellation barrier: a record deleted or completed
    /// mid-cycle must never be resurrected by a stale in-flight update.
    async fn save_if_active(&self, id: TrackingId, state: &VehicleState) -> Result<bool, EnvError>;

    /// Ids of all records currently ACTIVE.
    async fn list_active(&self) -> Result<Vec<TrackingId>, EnvError>;

    /// Whether a record exists at all (any status).
    async fn exists(&self, id: TrackingId) -> Result<bool, EnvError>;

    /// Deletes a record (shipment cancelled or archived).
    async fn remove(&self, id: TrackingId) -> Result<(), EnvError>;
}

/// Delivery status recorded in the completion event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    #[serde(rename = "DELIVERED")]
    Delivered,
}

/// Append-only completion log entry, written exactly once per arrival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub shipment_id: ShipmentId,
    pub status: DeliveryStatus,
    pub location: String,
    pub timestamp: SystemTime,
}

impl CompletionEvent {
    /// The event emitted when a vehicle reaches its destination.
    pub fn delivered(shipment_id: ShipmentId, timestamp: SystemTime) -> Self {
        Self {
            shipment_id,
            status: DeliveryStatus::Delivered,
            location: "Destination".to_string(),
            timestamp,
        }
    }
}

/// Side effects of the ACTIVE -> ARRIVED transition.
#[async_trait]
pub trait DeliveryLedger: Send + Sync {
    /// Marks the owning shipment as delivered.
    async fn mark_delivered(&self, shipment: ShipmentId) -> Result<(), EnvError>;

    /// Appends a completion event to the event log.
    async fn append_event(&self, event: CompletionEvent) -> Result<(), EnvError>;
}
