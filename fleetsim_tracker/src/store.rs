//! Storage collaborator implementations.
//!
//! Two backends per seam: an embedded sled database for durable
//! deployments and an in-memory map for tests and throwaway runs.
//! Records are JSON-encoded; the conditional `save_if_active` write is
//! the cancellation barrier the orchestrator relies on.

use async_trait::async_trait;
use fleetsim_core::{CompletionEvent, DeliveryLedger, TrackingStore, VehicleState};
use fleetsim_env::{EnvError, ShipmentId, TrackingId};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

// ============================================================================
// IN-MEMORY BACKEND
// ============================================================================

/// In-memory tracking store for tests and `--memory` runs.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<TrackingId, VehicleState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TrackingStore for MemoryStore {
    async fn insert(&self, id: TrackingId, state: &VehicleState) -> Result<(), EnvError> {
        self.records.lock().unwrap().insert(id, state.clone());
        Ok(())
    }

    async fn load(&self, id: TrackingId) -> Result<Option<VehicleState>, EnvError> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    async fn save_if_active(&self, id: TrackingId, state: &VehicleState) -> Result<bool, EnvError> {
        let mut records = self.records.lock().unwrap();
        match records.get(&id) {
            Some(existing) if existing.is_active() => {
                records.insert(id, state.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_active(&self) -> Result<Vec<TrackingId>, EnvError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, state)| state.is_active())
            .map(|(id, _)| *id)
            .collect())
    }

    async fn exists(&self, id: TrackingId) -> Result<bool, EnvError> {
        Ok(self.records.lock().unwrap().contains_key(&id))
    }

    async fn remove(&self, id: TrackingId) -> Result<(), EnvError> {
        self.records.lock().unwrap().remove(&id);
        Ok(())
    }
}

/// In-memory delivery ledger for tests.
#[derive(Default)]
pub struct MemoryLedger {
    delivered: Mutex<HashSet<ShipmentId>>,
    events: Mutex<Vec<CompletionEvent>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the event log (test inspection).
    pub fn events(&self) -> Vec<CompletionEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Whether a shipment has been marked delivered.
    pub fn is_delivered(&self, shipment: ShipmentId) -> bool {
        self.delivered.lock().unwrap().contains(&shipment)
    }
}

#[async_trait]
impl DeliveryLedger for MemoryLedger {
    async fn mark_delivered(&self, shipment: ShipmentId) -> Result<(), EnvError> {
        self.delivered.lock().unwrap().insert(shipment);
        Ok(())
    }

    async fn append_event(&self, event: CompletionEvent) -> Result<(), EnvError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

// ============================================================================
// SLED BACKEND
// ============================================================================

/// Sled-backed persistent tracking store.
///
/// Records are keyed by the tracking id's UUID bytes and stored as JSON.
pub struct SledTrackingStore {
    tree: sled::Tree,
}

impl SledTrackingStore {
    /// Opens (or creates) a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, EnvError> {
        let db = sled::open(path)
            .map_err(|e| EnvError::storage(format!("Failed to open sled DB: {}", e)))?;
        Self::from_db(&db)
    }

    /// Builds the store from an already-open database (shared with the ledger).
    pub fn from_db(db: &sled::Db) -> Result<Self, EnvError> {
        let tree = db
            .open_tree("tracking_states")
            .map_err(|e| EnvError::storage(format!("Failed to open tree: {}", e)))?;
        Ok(Self { tree })
    }

    /// Creates a temporary store (for testing).
    #[cfg(test)]
    pub fn open_temp() -> Result<Self, EnvError> {
        let config = sled::Config::new().temporary(true);
        let db = config
            .open()
            .map_err(|e| EnvError::storage(format!("Failed to open temp DB: {}", e)))?;
        Self::from_db(&db)
    }

    fn key(id: TrackingId) -> [u8; 16] {
        id.as_uuid().into_bytes()
    }

    fn encode(state: &VehicleState) -> Result<Vec<u8>, EnvError> {
        serde_json::to_vec(state).map_err(|e| EnvError::serialization(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<VehicleState, EnvError> {
        serde_json::from_slice(bytes).map_err(|e| EnvError::serialization(e.to_string()))
    }
}

#[async_trait]
impl TrackingStore for SledTrackingStore {
    async fn insert(&self, id: TrackingId, state: &VehicleState) -> Result<(), EnvError> {
        self.tree
            .insert(Self::key(id), Self::encode(state)?)
            .map_err(|e| EnvError::storage(format!("Insert failed: {}", e)))?;
        self.tree
            .flush()
            .map_err(|e| EnvError::storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }

    async fn load(&self, id: TrackingId) -> Result<Option<VehicleState>, EnvError> {
        let value = self
            .tree
            .get(Self::key(id))
            .map_err(|e| EnvError::storage(format!("Read failed: {}", e)))?;
        value.map(|bytes| Self::decode(&bytes)).transpose()
    }

    async fn save_if_active(&self, id: TrackingId, state: &VehicleState) -> Result<bool, EnvError> {
        match self.load(id).await? {
            Some(existing) if existing.is_active() => {
                self.insert(id, state).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_active(&self) -> Result<Vec<TrackingId>, EnvError> {
        let mut active = Vec::new();
        for result in self.tree.iter() {
            let (key, value) =
                result.map_err(|e| EnvError::storage(format!("Iteration failed: {}", e)))?;
            if key.len() != 16 {
                continue;
            }
            let mut bytes = [0u8; 16];
            bytes.copy_from_slice(&key);
            let state = Self::decode(&value)?;
            if state.is_active() {
                active.push(TrackingId::from_uuid(uuid::Uuid::from_bytes(bytes)));
            }
        }
        Ok(active)
    }

    async fn exists(&self, id: TrackingId) -> Result<bool, EnvError> {
        self.tree
            .contains_key(Self::key(id))
            .map_err(|e| EnvError::storage(format!("Read failed: {}", e)))
    }

    async fn remove(&self, id: TrackingId) -> Result<(), EnvError> {
        self.tree
            .remove(Self::key(id))
            .map_err(|e| EnvError::storage(format!("Remove failed: {}", e)))?;
        self.tree
            .flush()
            .map_err(|e| EnvError::storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }
}

/// Sled-backed delivery ledger: delivered-shipment markers plus an
/// append-only completion event tree keyed by a monotonic id.
pub struct SledLedger {
    db: sled::Db,
    delivered: sled::Tree,
    events: sled::Tree,
}

impl SledLedger {
    /// Builds the ledger from an already-open database.
    pub fn from_db(db: &sled::Db) -> Result<Self, EnvError> {
        let delivered = db
            .open_tree("shipments_delivered")
            .map_err(|e| EnvError::storage(format!("Failed to open tree: {}", e)))?;
        let events = db
            .open_tree("completion_events")
            .map_err(|e| EnvError::storage(format!("Failed to open tree: {}", e)))?;
        Ok(Self {
            db: db.clone(),
            delivered,
            events,
        })
    }

    /// Number of logged completion events.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

#[async_trait]
impl DeliveryLedger for SledLedger {
    async fn mark_delivered(&self, shipment: ShipmentId) -> Result<(), EnvError> {
        self.delivered
            .insert(shipment.as_uuid().into_bytes(), &[1u8])
            .map_err(|e| EnvError::storage(format!("Insert failed: {}", e)))?;
        self.delivered
            .flush()
            .map_err(|e| EnvError::storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }

    async fn append_event(&self, event: CompletionEvent) -> Result<(), EnvError> {
        let seq = self
            .db
            .generate_id()
            .map_err(|e| EnvError::storage(format!("Id generation failed: {}", e)))?;
        let value =
            serde_json::to_vec(&event).map_err(|e| EnvError::serialization(e.to_string()))?;
        self.events
            .insert(seq.to_be_bytes(), value)
            .map_err(|e| EnvError::storage(format!("Append failed: {}", e)))?;
        self.events
            .flush()
            .map_err(|e| EnvError::storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }
}
