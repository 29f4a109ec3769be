//! Tracking orchestrator - the server-side periodic tick driver.
//!
//! Each cycle loads the active records, advances every one independently
//! through the shared engine, and writes the results back through the
//! storage seam. Records have no dependencies on each other: each update
//! owns its state and speed model for the duration of the cycle (the
//! model is moved out of the map and returned), so at most one in-flight
//! update per record exists by construction.

use fleetsim_core::{
    CompletionEvent, DeliveryLedger, SimulationClock, SpeedConfig, SpeedModel, TrackingStatus,
    TrackingSnapshot, TrackingStore, VehicleState, ZoneClassifier, ZoneConfig,
};
use fleetsim_env::{EnvError, TrackerContext, TrackingId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Configuration for the tracking orchestrator.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Interval between cycles (default 1 s)
    pub tick_interval: Duration,

    /// Gaps longer than this many tick intervals are caught up with the
    /// deterministic average-speed jump instead of a single noisy tick
    /// (default 3)
    pub catch_up_factor: u32,

    /// Speed model parameters shared by all records
    pub speed: SpeedConfig,

    /// Zone classification parameters
    pub zones: ZoneConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            catch_up_factor: 3,
            speed: SpeedConfig::default(),
            zones: ZoneConfig::default(),
        }
    }
}

/// Per-cycle counters.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct CycleReport {
    /// Records seen this cycle
    pub processed: usize,

    /// Records advanced and written back
    pub advanced: usize,

    /// Records that reached their destination this cycle
    pub arrivals: usize,

    /// Records skipped (cancelled, completed concurrently, or vanished)
    pub skipped: usize,

    /// Records that failed and were left for the next cycle
    pub failures: usize,
}

/// Aggregate counters for a whole run.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct RunSummary {
    pub cycles: u64,
    pub arrivals: usize,
    pub failures: usize,
}

/// How a single record's update ended.
enum RecordKind {
    Advanced,
    Arrived,
    Skipped,
    Failed,
}

struct RecordOutcome {
    id: TrackingId,
    model: SpeedModel,
    kind: RecordKind,
}

/// The periodic tick driver.
///
/// Generic over the context so the identical loop runs under tokio in
/// production and under the virtual clock in simulation.
pub struct TrackingOrchestrator<Ctx: TrackerContext> {
    ctx: Arc<Ctx>,
    store: Arc<dyn TrackingStore>,
    ledger: Arc<dyn DeliveryLedger>,
    clock: SimulationClock,
    config: TrackerConfig,

    /// Per-record speed models (transient working memory; a record whose
    /// model is missing after a restart simply gets a fresh one)
    models: HashMap<TrackingId, SpeedModel>,
}

impl<Ctx: TrackerContext> TrackingOrchestrator<Ctx> {
    /// Creates an orchestrator over the given collaborators.
    pub fn new(
        ctx: Arc<Ctx>,
        store: Arc<dyn TrackingStore>,
        ledger: Arc<dyn DeliveryLedger>,
        config: TrackerConfig,
    ) -> Self {
        let clock = SimulationClock::new(
            ZoneClassifier::new(config.zones.clone()),
            config.speed.clone(),
        );
        Self {
            ctx,
            store,
            ledger,
            clock,
            config,
            models: HashMap::new(),
        }
    }

    /// The simulation clock shared with query consumers.
    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Registers a new tracking record and seeds its speed model.
    pub async fn register(&mut self, id: TrackingId, state: &VehicleState) -> Result<(), EnvError> {
        self.store.insert(id, state).await?;
        self.models.insert(id, self.fresh_model(id));
        debug!(%id, shipment = %state.shipment(), "tracking record registered");
        Ok(())
    }

    /// Read model for one tracking id, or None if the record is gone.
    pub async fn snapshot(&self, id: TrackingId) -> Result<Option<TrackingSnapshot>, EnvError> {
        Ok(self
            .store
            .load(id)
            .await?
            .map(|state| TrackingSnapshot::capture(&state, &self.clock)))
    }

    fn fresh_model(&self, id: TrackingId) -> SpeedModel {
        SpeedModel::new(
            self.config.speed.clone(),
            self.ctx.derive_sim_seed(id.seed_extension()),
        )
    }

    /// Runs one cycle over every active record.
    ///
    /// Records are processed concurrently across the runtime's workers;
    /// every failure is recoverable-and-skip, so one bad record never
    /// blocks the rest of the fleet.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let now = self.ctx.system_time();
        let mut report = CycleReport::default();

        let ids = match self.store.list_active().await {
            Ok(ids) => ids,
            Err(error) => {
                warn!(%error, "failed to list active records; cycle skipped");
                report.failures += 1;
                return report;
            }
        };

        let mut tasks = Vec::with_capacity(ids.len());
        for id in ids {
            let model = self
                .models
                .remove(&id)
                .unwrap_or_else(|| self.fresh_model(id));
            let store = Arc::clone(&self.store);
            let ledger = Arc::clone(&self.ledger);
            let clock = self.clock.clone();
            let tick_interval = self.config.tick_interval;
            let catch_up_factor = self.config.catch_up_factor;

            tasks.push(tokio::spawn(advance_record(
                store,
                ledger,
                clock,
                id,
                model,
                now,
                tick_interval,
                catch_up_factor,
            )));
        }

        for task in tasks {
            match task.await {
                Ok(outcome) => {
                    report.processed += 1;
                    match outcome.kind {
                        RecordKind::Advanced => {
                            report.advanced += 1;
                            self.models.insert(outcome.id, outcome.model);
                        }
                        RecordKind::Arrived => report.arrivals += 1,
                        RecordKind::Skipped => report.skipped += 1,
                        RecordKind::Failed => {
                            report.failures += 1;
                            self.models.insert(outcome.id, outcome.model);
                        }
                    }
                }
                Err(error) => {
                    warn!(%error, "record update task aborted");
                    report.processed += 1;
                    report.failures += 1;
                }
            }
        }

        report
    }

    /// Drives cycles until `duration` elapses or no active records remain.
    pub async fn run(&mut self, duration: Duration) -> RunSummary {
        let deadline = self.ctx.now() + duration;
        let mut summary = RunSummary::default();

        loop {
            let report = self.run_cycle().await;
            summary.cycles += 1;
            summary.arrivals += report.arrivals;
            summary.failures += report.failures;

            if report.processed == 0 {
                debug!("no active records; stopping");
                break;
            }
            if self.ctx.now() >= deadline {
                break;
            }
            self.ctx.sleep(self.config.tick_interval).await;
        }

        summary
    }
}

/// Advances one record and performs its side effects.
///
/// Owns the record's state and model for the whole update, write-back
/// included; the conditional store write is the only synchronization with
/// cancellation.
#[allow(clippy::too_many_arguments)]
async fn advance_record(
    store: Arc<dyn TrackingStore>,
    ledger: Arc<dyn DeliveryLedger>,
    clock: SimulationClock,
    id: TrackingId,
    mut model: SpeedModel,
    now: SystemTime,
    tick_interval: Duration,
    catch_up_factor: u32,
) -> RecordOutcome {
    let outcome = |kind, model| RecordOutcome { id, model, kind };

    let mut state = match store.load(id).await {
        Ok(Some(state)) => state,
        Ok(None) => {
            debug!(%id, "record vanished (cancelled); skipping");
            return outcome(RecordKind::Skipped, model);
        }
        Err(error) => {
            warn!(%id, %error, "failed to load record");
            return outcome(RecordKind::Failed, model);
        }
    };

    if !state.is_active() {
        // Terminal record still in the listing; drop it from our set
        return outcome(RecordKind::Skipped, model);
    }

    let elapsed = now
        .duration_since(state.last_updated())
        .unwrap_or(Duration::ZERO);

    let advanced = if elapsed > tick_interval * catch_up_factor {
        debug!(%id, gap_s = elapsed.as_secs_f64(), "idle gap; deterministic catch-up");
        clock.resume(&mut state, now).map(|o| o.status)
    } else {
        let position = state.position();
        let zone = clock.classifier().classify(position, state.progress_ratio());
        let near_junction = clock.classifier().near_junction(
            state.route(),
            state.segment_index(),
            position,
            model.config().junction_radius_m,
        );
        let tick = model.tick(state.speed_kmh(), zone, near_junction, elapsed.as_secs_f64());
        state.apply_tick(tick.distance_m, tick.speed_kmh, now)
    };

    let status = match advanced {
        Ok(status) => status,
        Err(error) => {
            // Defective delta means a defective upstream route; surface it
            // and leave the record for the next cycle
            warn!(%id, %error, "advance rejected; record skipped this cycle");
            return outcome(RecordKind::Failed, model);
        }
    };

    match store.save_if_active(id, &state).await {
        Ok(true) => {}
        Ok(false) => {
            debug!(%id, "record cancelled or completed concurrently; update discarded");
            return outcome(RecordKind::Skipped, model);
        }
        Err(error) => {
            warn!(%id, %error, "failed to persist record");
            return outcome(RecordKind::Failed, model);
        }
    }

    if status == TrackingStatus::Arrived {
        info!(%id, shipment = %state.shipment(), "vehicle arrived at destination");
        if let Err(error) = ledger.mark_delivered(state.shipment()).await {
            warn!(%id, %error, "failed to mark shipment delivered");
            return outcome(RecordKind::Failed, model);
        }
        let event = CompletionEvent::delivered(state.shipment(), now);
        if let Err(error) = ledger.append_event(event).await {
            warn!(%id, %error, "failed to append completion event");
        }
        return outcome(RecordKind::Arrived, model);
    }

    outcome(RecordKind::Advanced, model)
}
