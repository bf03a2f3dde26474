//! Worker state machine: task acquisition, execution, and
//! battery-driven charging.
//!
//! Grounded on the teacher's `ExecutorWorker` loop in `executor.rs` (an
//! owned task looping on a channel with a `tokio::select!` cancellation
//! arm) generalized from a single work channel to this crate's richer
//! IDLE/WORKING/LOW_BATTERY/WAITING_FOR_CHARGE/CHARGING cycle.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use charging::ChargingPool;
use corelib::{Request, RequestStatus, RobotStatus, SimError, TerminalSet, WorkerHandle};
use inventory::Inventory;
use req_queue::RequestQueue;

/// Tunable constants governing worker dynamics. Defaults mirror §4 of the
/// coordination-kernel design (`LOW_BATTERY_THRESHOLD`, `AVG_BATTERY_DRAIN`, ...).
#[derive(Clone, Copy, Debug)]
pub struct WorkerConfig {
    pub low_battery_threshold: u32,
    pub avg_battery_drain: u32,
    pub task_duration: Duration,
    pub idle_poll: Duration,
    pub charging_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            low_battery_threshold: 30,
            avg_battery_drain: 15,
            task_duration: Duration::from_millis(100),
            idle_poll: Duration::from_millis(50),
            charging_timeout: Duration::from_secs(15),
        }
    }
}

/// Shared capability record every worker task is handed at spawn time —
/// avoids a worker <-> orchestrator reference cycle (the fleet owns the
/// workers; the workers only ever see this bundle of shared resources).
#[derive(Clone)]
pub struct WorkerContext {
    pub queue: Arc<RequestQueue>,
    pub inventory: Arc<Inventory>,
    pub charging: Arc<ChargingPool>,
    pub terminal: Arc<TerminalSet>,
    pub config: WorkerConfig,
}

/// Spawns the per-worker task. Runs until `cancel` fires; a WORKING
/// worker interrupted mid-task always leaves a FAILED terminal record.
pub fn spawn(handle: Arc<WorkerHandle>, ctx: WorkerContext, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(worker_id = %handle.id, "worker online");
        run(handle.clone(), ctx, cancel).await;
        info!(worker_id = %handle.id, "worker offline");
    })
}

#[instrument(skip(handle, ctx, cancel), fields(worker_id = %handle.id))]
async fn run(handle: Arc<WorkerHandle>, ctx: WorkerContext, cancel: CancellationToken) {
    loop {
        if cancel.is_cancelled() {
            return;
        }

        if handle.battery() <= ctx.config.low_battery_threshold {
            if !seek_charge(&handle, &ctx, &cancel).await {
                return;
            }
            continue;
        }

        match acquire_task(&handle, &ctx, &cancel).await {
            AcquireOutcome::Acquired(task) => {
                if !execute_task(&handle, &ctx, task, &cancel).await {
                    return;
                }
            }
            AcquireOutcome::None => {}
        }
    }
}

enum AcquireOutcome {
    Acquired(Request),
    None,
}

/// Task acquisition critical path: poll the queue first (serializes
/// acquisition contention), then reserve stock. Polling first prevents
/// two workers fighting over one request; reserving second prevents two
/// workers succeeding when stock can't cover both. A poll miss waits on
/// `awaitOrPoll` instead of spinning; if that wakes with a request in
/// hand it is reserved immediately rather than discarded.
#[instrument(skip(handle, ctx, cancel), fields(worker_id = %handle.id))]
async fn acquire_task(handle: &Arc<WorkerHandle>, ctx: &WorkerContext, cancel: &CancellationToken) -> AcquireOutcome {
    let request = match ctx.queue.poll() {
        Some(r) => r,
        None => {
            let polled = tokio::select! {
                _ = cancel.cancelled() => return AcquireOutcome::None,
                r = ctx.queue.await_or_poll(ctx.config.idle_poll) => r,
            };
            match polled {
                Some(r) => r,
                None => return AcquireOutcome::None,
            }
        }
    };

    match ctx.inventory.reserve(&request.part, request.qty as i64) {
        Ok(_) => {
            let in_progress = request.with_status(RequestStatus::InProgress);
            ctx.terminal.record(in_progress.clone());
            handle.begin_task(in_progress.clone());
            debug!(request_id = %in_progress.id, "task accepted");
            AcquireOutcome::Acquired(in_progress)
        }
        Err(SimError::InsufficientStock { part_id, requested, available }) => {
            warn!(request_id = %request.id, part_id, requested, available, "insufficient stock, failing request");
            ctx.terminal.record(request.with_status(RequestStatus::Failed));
            AcquireOutcome::None
        }
        Err(other) => {
            warn!(request_id = %request.id, error = %other, "unexpected reserve error, failing request");
            ctx.terminal.record(request.with_status(RequestStatus::Failed));
            AcquireOutcome::None
        }
    }
}

/// Runs one simulated task interval. Returns `false` if cancellation cut
/// the task short (caller should stop the worker loop after recording the
/// FAILED terminal entry, which this function has already done).
#[instrument(skip(handle, ctx, cancel), fields(worker_id = %handle.id, request_id = %task.id))]
async fn execute_task(handle: &Arc<WorkerHandle>, ctx: &WorkerContext, task: Request, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => {
            ctx.terminal.record(task.with_status(RequestStatus::Failed));
            handle.clear_task();
            warn!("task interrupted by shutdown, recorded FAILED");
            false
        }
        _ = tokio::time::sleep(ctx.config.task_duration) => {
            let drain = sample_drain(ctx.config.avg_battery_drain);
            let battery = handle.drain_battery(drain);
            ctx.terminal.record(task.with_status(RequestStatus::Completed));
            handle.clear_task();

            if battery <= ctx.config.low_battery_threshold {
                handle.set_status(RobotStatus::LowBattery);
            } else {
                handle.set_status(RobotStatus::Idle);
            }

            debug!(battery, "task completed");
            true
        }
    }
}

fn sample_drain(avg: u32) -> u32 {
    let lo = avg.saturating_sub(5) as i64;
    let hi = avg as i64 + 5;
    rand::rng().random_range(lo..hi).max(0) as u32
}

/// LOW_BATTERY -> WAITING_FOR_CHARGE -> CHARGING -> IDLE. Returns `false`
/// if cancellation fired while seeking a charge (caller should exit).
#[instrument(skip(handle, ctx, cancel), fields(worker_id = %handle.id))]
async fn seek_charge(handle: &Arc<WorkerHandle>, ctx: &WorkerContext, cancel: &CancellationToken) -> bool {
    handle.set_status(RobotStatus::LowBattery);

    loop {
        if cancel.is_cancelled() {
            return false;
        }

        handle.set_status(RobotStatus::WaitingForCharge);

        let admitted = tokio::select! {
            _ = cancel.cancelled() => return false,
            admitted = ctx.charging.enqueue(handle.clone(), ctx.config.charging_timeout) => admitted,
        };

        if !admitted {
            // Timeout: not in the queue, per the pool's contract. Fall
            // back to LOW_BATTERY and retry.
            handle.set_status(RobotStatus::LowBattery);
            continue;
        }

        // A station has committed to charging us; wait for it to finish
        // (it owns `status`/`battery` until release).
        loop {
            if handle.status() != RobotStatus::Charging && handle.status() != RobotStatus::WaitingForCharge {
                break;
            }
            if cancel.is_cancelled() {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        return true;
    }
}
