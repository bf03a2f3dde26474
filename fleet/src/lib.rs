//! Orchestrator: wires every shared resource, spawns one task per worker
//! and station (plus an optional ingester), and exposes a capability
//! record (`FleetHandle`) the dashboard and control surface drive.
//!
//! Grounded on the teacher's `main.rs` wiring helpers
//! (`init_store`/`start_executor_router`/`start_scheduler_loop`) and the
//! `Arc<SessionStore>` capability-passing idiom used throughout
//! `executor.rs`.

pub mod config;

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use charging::{ChargingPool, StationSnapshot};
use config::AppConfig;
use corelib::{Part, Request, SimError, TerminalSet, WorkerHandle, WorkerSnapshot};
use inventory::Inventory;
use req_queue::RequestQueue;
use worker::{WorkerConfig, WorkerContext};

/// Read-only view of one catalog line, safe for the dashboard.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InventoryLine {
    pub part_id: String,
    pub name: String,
    pub level: u32,
}

/// Combined point-in-time view served to external dashboard viewers over
/// the JSON boundary (SPEC_FULL §3/§4.10): robots, stations, inventory,
/// and queued requests, each already `serde`-derived individually.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct DashboardSnapshot {
    pub robots: Vec<WorkerSnapshot>,
    pub stations: Vec<StationSnapshot>,
    pub inventory: Vec<InventoryLine>,
    pub queued_requests: Vec<Request>,
}

/// Shared capability record passed to every worker and station task —
/// the "capability record" design note, avoiding a worker/orchestrator
/// reference cycle.
#[derive(Clone)]
pub struct FleetHandle {
    queue: Arc<RequestQueue>,
    inventory: Arc<Inventory>,
    charging: Arc<ChargingPool>,
    terminal: Arc<TerminalSet>,
    workers: Arc<Vec<Arc<WorkerHandle>>>,
    config: Arc<AppConfig>,
    cancel: CancellationToken,
}

impl FleetHandle {
    /// Submits a new request, mirroring the control API's "ingest a new
    /// `(part, qty)` request" entry point.
    pub fn submit(&self, part: Part, qty: i64) -> Result<Request, SimError> {
        let request = Request::create(Some(part), qty)?;
        self.queue.offer(request.clone());
        Ok(request)
    }

    pub fn robots(&self) -> Vec<WorkerSnapshot> {
        self.workers.iter().map(|w| w.snapshot()).collect()
    }

    pub fn stations(&self) -> Vec<StationSnapshot> {
        self.charging.snapshot()
    }

    pub fn inventory(&self) -> Vec<InventoryLine> {
        self.inventory
            .snapshot()
            .into_iter()
            .map(|(part, level)| InventoryLine { part_id: part.id, name: part.name, level })
            .collect()
    }

    pub fn queued_requests(&self) -> Vec<Request> {
        self.queue.snapshot()
    }

    pub fn terminal_records(&self) -> Vec<Request> {
        self.terminal.snapshot()
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    pub fn dashboard_snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            robots: self.robots(),
            stations: self.stations(),
            inventory: self.inventory(),
            queued_requests: self.queued_requests(),
        }
    }

    /// Serializes the dashboard snapshot to JSON, for external viewers
    /// that poll over HTTP rather than linking this crate directly.
    pub fn dashboard_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.dashboard_snapshot())
    }

    /// Writes the terminal set to a binary report file. Never propagates
    /// failure into the simulation core; logs and swallows it instead.
    pub fn write_report(&self, path: &Path) {
        let records = self.terminal.snapshot();
        if let Err(err) = report::write_report_file(path, &records) {
            warn!(error = %err, path = %path.display(), "report write failed");
        }
    }
}

/// A running simulation: the shared resources plus every task spawned
/// for it. `start`/`stop` are the lifecycle entry points; `stop` is
/// terminal (a stopped `Fleet` is not restarted — recreate one instead).
pub struct Fleet {
    handle: FleetHandle,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Fleet {
    /// Wires Inventory, RequestQueue, ChargingPool, and the terminal set,
    /// spawns one task per worker and station (and, if configured, the
    /// file ingester), and returns both the running `Fleet` and a handle
    /// to it.
    #[instrument(skip(config, catalog))]
    pub fn start(config: AppConfig, catalog: impl IntoIterator<Item = (Part, u32)>) -> Self {
        info!(
            robot_count = config.robot_count,
            station_count = config.station_count,
            "starting fleet"
        );

        let cancel = CancellationToken::new();
        let queue = Arc::new(RequestQueue::new());
        let inventory = Arc::new(Inventory::new(config.capacity_hint, catalog));
        let charging = Arc::new(ChargingPool::new(
            config.station_count,
            config.charge_tick,
            config.charge_per_tick,
        ));
        let terminal = Arc::new(TerminalSet::new());

        let workers: Vec<Arc<WorkerHandle>> = (0..config.robot_count.max(1))
            .map(|i| Arc::new(WorkerHandle::new(format!("Robot-{i}"), config.max_battery)))
            .collect();

        let handle = FleetHandle {
            queue: queue.clone(),
            inventory: inventory.clone(),
            charging: charging.clone(),
            terminal: terminal.clone(),
            workers: Arc::new(workers.clone()),
            config: Arc::new(config.clone()),
            cancel: cancel.clone(),
        };

        let mut tasks = charging.spawn(cancel.clone());

        let worker_ctx = WorkerContext {
            queue: queue.clone(),
            inventory: inventory.clone(),
            charging: charging.clone(),
            terminal: terminal.clone(),
            config: WorkerConfig {
                low_battery_threshold: config.low_battery_threshold,
                avg_battery_drain: config.avg_battery_drain,
                task_duration: config.task_duration,
                idle_poll: config.idle_poll,
                charging_timeout: config.charging_timeout,
            },
        };

        for w in &workers {
            tasks.push(worker::spawn(w.clone(), worker_ctx.clone(), cancel.clone()));
        }

        if let Some(path) = config.ingest_path.clone() {
            let ingest_cfg = ingest::IngestConfig {
                path,
                poll_interval: config.ingest_poll,
            };
            tasks.push(ingest::spawn(ingest_cfg, queue.clone(), inventory.clone(), cancel.clone()));
        }

        Self {
            handle,
            tasks: Mutex::new(tasks),
        }
    }

    pub fn handle(&self) -> FleetHandle {
        self.handle.clone()
    }

    /// Signals cancellation to every worker, station, and ingester task,
    /// then joins all of them so shutdown is observably complete before
    /// returning. Every WORKING worker interrupted mid-task has already
    /// recorded a FAILED terminal entry by the time its task exits, so
    /// the "no id left PENDING/IN_PROGRESS" invariant holds once this
    /// returns.
    pub async fn stop(&self) {
        info!("stopping fleet");
        self.handle.cancel.cancel();

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(err) = task.await {
                warn!(error = %err, "task panicked during shutdown");
            }
        }
        info!("fleet stopped");
    }
}
