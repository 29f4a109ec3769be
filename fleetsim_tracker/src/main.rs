//! FleetSim Tracker CLI
//!
//! Drives the shipment tracking loop over a set of demo lanes, on either
//! the virtual clock (fast-forward, deterministic) or the real clock.

use clap::Parser;
use fleetsim_core::{
    DeliveryLedger, Route, RouteSource, TrackingSnapshot, TrackingStore, VehicleState,
};
use fleetsim_env::{EnvError, ShipmentId, TokioContext, TrackerContext, TrackingId};
use fleetsim_tracker::{
    MemoryLedger, MemoryStore, RunSummary, SledLedger, SledTrackingStore, StaticRouteSource,
    TrackerConfig, TrackingOrchestrator, VirtualContext,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Demo lanes between the known cities, cycled per shipment.
const LANES: &[(&str, &str)] = &[
    ("chicago", "new york"),
    ("indianapolis", "philadelphia"),
    ("columbus", "washington"),
    ("pittsburgh", "baltimore"),
    ("chicago", "pittsburgh"),
    ("columbus", "new york"),
];

/// FleetSim shipment tracking loop
#[derive(Parser, Debug)]
#[command(name = "fleetsim-tracker")]
#[command(about = "Simulate in-transit shipment positions", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Number of demo shipments to put in transit
    #[arg(short = 'n', long, default_value = "3")]
    shipments: usize,

    /// Tick interval in milliseconds
    #[arg(short, long, default_value = "1000")]
    tick_ms: u64,

    /// Simulated duration in seconds
    #[arg(short, long, default_value = "14400")]
    duration: f64,

    /// Persist records to a sled database at this path (default: in-memory)
    #[arg(long)]
    data_dir: Option<String>,

    /// Drive the loop with the real clock instead of the virtual one
    #[arg(long)]
    realtime: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON summary on stdout
    #[arg(long)]
    json: bool,
}

/// Final state of one demo shipment.
#[derive(Debug, serde::Serialize)]
struct ShipmentReport {
    tracking_id: TrackingId,
    origin: &'static str,
    destination: &'static str,
    snapshot: Option<TrackingSnapshot>,
}

#[derive(Debug, serde::Serialize)]
struct DemoReport {
    seed: u64,
    summary: RunSummary,
    shipments: Vec<ShipmentReport>,
}

async fn run_demo<Ctx: TrackerContext>(
    ctx: Arc<Ctx>,
    store: Arc<dyn TrackingStore>,
    ledger: Arc<dyn DeliveryLedger>,
    args: &Args,
) -> Result<DemoReport, EnvError> {
    let config = TrackerConfig {
        tick_interval: Duration::from_millis(args.tick_ms),
        ..TrackerConfig::default()
    };
    let mut tracker = TrackingOrchestrator::new(Arc::clone(&ctx), store, ledger, config);

    let routes = StaticRouteSource::default();
    let mut registered = Vec::new();

    for i in 0..args.shipments {
        let (origin, destination) = LANES[i % LANES.len()];

        let waypoints = match routes.resolve_route(origin, destination).await {
            Ok(waypoints) => waypoints,
            Err(error) => {
                // A degenerate lane must not take the rest of the fleet down
                warn!(%origin, %destination, %error, "route acquisition failed; lane skipped");
                continue;
            }
        };
        let route = match Route::new(waypoints, 1) {
            Ok(route) => route,
            Err(error) => {
                warn!(%origin, %destination, %error, "route rejected; lane skipped");
                continue;
            }
        };

        let id = TrackingId::from_seed(args.seed.wrapping_add(i as u64));
        let shipment = ShipmentId::from_seed(args.seed.wrapping_add(i as u64));
        let state = VehicleState::new(shipment, route, ctx.system_time());

        info!(
            %id, %origin, %destination,
            distance_km = state.route().total_m() / 1000.0,
            "shipment in transit"
        );
        tracker.register(id, &state).await?;
        registered.push((id, origin, destination));
    }

    let summary = tracker
        .run(Duration::from_secs_f64(args.duration.max(0.0)))
        .await;

    let mut shipments = Vec::with_capacity(registered.len());
    for (id, origin, destination) in registered {
        let snapshot = tracker.snapshot(id).await?;
        if let Some(snap) = &snapshot {
            info!(
                %id, %origin, %destination,
                progress = format!("{:.1}%", snap.progress_percent),
                arrived = !snap.is_active,
                "final position"
            );
        }
        shipments.push(ShipmentReport {
            tracking_id: id,
            origin,
            destination,
            snapshot,
        });
    }

    Ok(DemoReport {
        seed: args.seed,
        summary,
        shipments,
    })
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    // Determine base seed
    let seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos() as u64
    } else {
        args.seed
    };
    let args = Args { seed, ..args };

    info!(
        seed,
        shipments = args.shipments,
        realtime = args.realtime,
        "FleetSim tracker starting"
    );

    // Storage backends: sled when a data dir is given, in-memory otherwise
    let (store, ledger): (Arc<dyn TrackingStore>, Arc<dyn DeliveryLedger>) =
        match &args.data_dir {
            Some(path) => {
                let db = match sled::open(path) {
                    Ok(db) => db,
                    Err(e) => {
                        error!("Failed to open data dir {}: {}", path, e);
                        std::process::exit(1);
                    }
                };
                let store = SledTrackingStore::from_db(&db).unwrap_or_else(|e| {
                    error!("Failed to open tracking store: {}", e);
                    std::process::exit(1);
                });
                let ledger = SledLedger::from_db(&db).unwrap_or_else(|e| {
                    error!("Failed to open delivery ledger: {}", e);
                    std::process::exit(1);
                });
                (Arc::new(store), Arc::new(ledger))
            }
            None => (
                Arc::new(MemoryStore::new()),
                Arc::new(MemoryLedger::new()),
            ),
        };

    let result = if args.realtime {
        run_demo(TokioContext::shared(), store, ledger, &args).await
    } else {
        run_demo(VirtualContext::shared(seed), store, ledger, &args).await
    };

    match result {
        Ok(report) => {
            if args.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{}", json),
                    Err(e) => error!("Failed to serialize report: {}", e),
                }
            } else {
                info!(
                    cycles = report.summary.cycles,
                    arrivals = report.summary.arrivals,
                    failures = report.summary.failures,
                    "run complete"
                );
            }
            if report.summary.failures > 0 {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("Tracker run failed: {}", e);
            std::process::exit(1);
        }
    }
}
